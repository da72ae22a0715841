use crate::reconcile::ComparisonSummary;
use parking_lot::RwLock;
use polars::prelude::PolarsError;
use serde_json::{Error as SerdeJsonError, Value};
use std::collections::HashMap;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    DataFrame(PolarsError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Csv(csv::Error),
    InvalidData(String),
    NotFound(String),
    Conflict(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::DataFrame(err) => write!(f, "dataframe conversion error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            PersistenceError::NotFound(key) => write!(f, "no document stored under '{key}'"),
            PersistenceError::Conflict(key) => write!(f, "document '{key}' already exists"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<PolarsError> for PersistenceError {
    fn from(value: PolarsError) -> Self {
        Self::DataFrame(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Key/value JSON document store, shaped like the DHIS2 data store.
pub trait DocumentStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<Value>>;
    /// Fails with `Conflict` if the key already exists.
    fn create(&self, key: &str, document: &Value) -> PersistenceResult<()>;
    /// Fails with `NotFound` if the key does not exist.
    fn update(&self, key: &str, document: &Value) -> PersistenceResult<()>;
    /// Read, transform and write one document as a single atomic step.
    /// `apply` sees the current document (if any) and returns the one to
    /// store; an error from `apply` leaves the stored document untouched.
    fn modify(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<Value>) -> PersistenceResult<Value>,
    ) -> PersistenceResult<Value>;
}

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<Value>> {
        Ok(self.documents.read().get(key).cloned())
    }

    fn create(&self, key: &str, document: &Value) -> PersistenceResult<()> {
        let mut documents = self.documents.write();
        if documents.contains_key(key) {
            return Err(PersistenceError::Conflict(key.to_string()));
        }
        documents.insert(key.to_string(), document.clone());
        Ok(())
    }

    fn update(&self, key: &str, document: &Value) -> PersistenceResult<()> {
        let mut documents = self.documents.write();
        match documents.get_mut(key) {
            Some(slot) => {
                *slot = document.clone();
                Ok(())
            }
            None => Err(PersistenceError::NotFound(key.to_string())),
        }
    }

    fn modify(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<Value>) -> PersistenceResult<Value>,
    ) -> PersistenceResult<Value> {
        let mut documents = self.documents.write();
        let next = apply(documents.get(key).cloned())?;
        documents.insert(key.to_string(), next.clone());
        Ok(next)
    }
}

/// Document key under which the summaries for one org unit and period live.
pub fn summary_key(org_unit: &str, period: &str) -> String {
    format!("comparisons/{org_unit}/{period}")
}

/// Append `summary` to the history stored under its (org unit, period) key.
pub fn record_summary<S: DocumentStore + ?Sized>(
    store: &S,
    summary: &ComparisonSummary,
) -> PersistenceResult<usize> {
    let key = summary_key(&summary.org_unit, &summary.period);
    let entry = serde_json::to_value(summary)?;
    let mut len = 0;
    store.modify(&key, &mut |current| match current {
        Some(Value::Array(mut history)) => {
            history.push(entry.clone());
            len = history.len();
            Ok(Value::Array(history))
        }
        Some(_) => Err(PersistenceError::InvalidData(format!(
            "document '{key}' is not a summary history"
        ))),
        None => {
            len = 1;
            Ok(Value::Array(vec![entry.clone()]))
        }
    })?;
    if len == 1 {
        log::info!("created comparison summary history under {key}");
    } else {
        log::info!("recorded comparison summary #{len} under {key}");
    }
    Ok(len)
}

pub fn load_summaries<S: DocumentStore + ?Sized>(
    store: &S,
    org_unit: &str,
    period: &str,
) -> PersistenceResult<Vec<ComparisonSummary>> {
    let key = summary_key(org_unit, period);
    match store.get(&key)? {
        Some(document) => Ok(serde_json::from_value(document)?),
        None => Err(PersistenceError::NotFound(key)),
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_rows_from_csv, load_rows_from_json, load_sources_from_json, save_report_to_csv,
    save_report_to_json,
};
