use super::{DocumentStore, PersistenceError, PersistenceResult};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde_json::Value;
use std::sync::Mutex;

pub struct SqliteDocumentStore {
    connection: Mutex<Connection>,
}

impl SqliteDocumentStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                document_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<std::sync::MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite mutex poisoned".into()))
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<Value>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT document_json FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn create(&self, key: &str, document: &Value) -> PersistenceResult<()> {
        let json = serde_json::to_string(document)?;
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO documents (key, document_json, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, json, chrono::Utc::now().to_rfc3339()],
        )?;
        if inserted == 0 {
            return Err(PersistenceError::Conflict(key.to_string()));
        }
        Ok(())
    }

    fn update(&self, key: &str, document: &Value) -> PersistenceResult<()> {
        let json = serde_json::to_string(document)?;
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE documents SET document_json = ?1, updated_at = ?2 WHERE key = ?3",
            params![json, chrono::Utc::now().to_rfc3339(), key],
        )?;
        if updated == 0 {
            return Err(PersistenceError::NotFound(key.to_string()));
        }
        Ok(())
    }

    fn modify(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<Value>) -> PersistenceResult<Value>,
    ) -> PersistenceResult<Value> {
        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front, so other connections to
        // the same file cannot interleave between the read and the write.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current: Option<String> = tx
            .query_row(
                "SELECT document_json FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        let current = match current {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };
        let next = apply(current)?;
        tx.execute(
            "INSERT INTO documents (key, document_json, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                 document_json = excluded.document_json,
                 updated_at = excluded.updated_at",
            params![key, serde_json::to_string(&next)?, chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(next)
    }
}
