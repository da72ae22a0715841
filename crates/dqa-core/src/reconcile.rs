//! Four-way reconciliation of Register, Summary, Reported and Correction
//! values keyed by (data element, category option combo, org unit, period).

use crate::sources::{DataSourceRow, SourceKind, SourceRows};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonKey {
    pub data_element: String,
    pub category_option_combo: String,
    pub org_unit: String,
    pub period: String,
}

impl ComparisonKey {
    pub const DELIMITER: char = '|';

    pub fn new(
        data_element: impl Into<String>,
        category_option_combo: impl Into<String>,
        org_unit: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            data_element: data_element.into(),
            category_option_combo: category_option_combo.into(),
            org_unit: org_unit.into(),
            period: period.into(),
        }
    }

    pub fn from_row(row: &DataSourceRow) -> Self {
        Self::new(
            row.data_element.as_str(),
            row.category_option_combo.as_str(),
            row.org_unit.as_str(),
            row.period.as_str(),
        )
    }
}

impl fmt::Display for ComparisonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = Self::DELIMITER;
        write!(
            f,
            "{}{d}{}{d}{}{d}{}",
            self.data_element, self.category_option_combo, self.org_unit, self.period
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResultRow {
    #[serde(flatten)]
    pub key: ComparisonKey,
    pub register: Option<f64>,
    pub summary: Option<f64>,
    pub reported: Option<f64>,
    pub correction: Option<f64>,
    pub missing_count: u8,
    pub mismatch: bool,
}

impl ComparisonResultRow {
    fn from_values(key: ComparisonKey, values: [Option<f64>; 4]) -> Self {
        let missing_count = values.iter().filter(|v| v.is_none()).count() as u8;
        let mismatch = distinct_count(values.iter().flatten().copied()) > 1;
        let [register, summary, reported, correction] = values;
        Self {
            key,
            register,
            summary,
            reported,
            correction,
            missing_count,
            mismatch,
        }
    }

    pub fn value(&self, kind: SourceKind) -> Option<f64> {
        self.values()[kind.index()]
    }

    /// Values in `SourceKind::ALL` order.
    pub fn values(&self) -> [Option<f64>; 4] {
        [self.register, self.summary, self.reported, self.correction]
    }

    pub fn present_values(&self) -> Vec<f64> {
        self.values().into_iter().flatten().collect()
    }

    pub fn has_missing(&self) -> bool {
        self.missing_count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub total: usize,
    pub mismatches: usize,
    /// Keys where at least one source has no value.
    pub missing: usize,
    pub period: String,
    pub org_unit: String,
    pub run_at: DateTime<Utc>,
    pub duration_ms: f64,
}

impl ComparisonSummary {
    pub fn to_cli_summary(&self) -> String {
        format!(
            "period={}, org_unit={}, total={}, mismatches={}, missing={}, duration={:.3}ms",
            self.period, self.org_unit, self.total, self.mismatches, self.missing, self.duration_ms
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub summary: ComparisonSummary,
    pub rows: Vec<ComparisonResultRow>,
}

impl ComparisonReport {
    pub fn row(&self, key: &ComparisonKey) -> Option<&ComparisonResultRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    pub fn mismatched_rows(&self) -> impl Iterator<Item = &ComparisonResultRow> {
        self.rows.iter().filter(|r| r.mismatch)
    }
}

/// Period and org unit a comparison is stamped with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonScope {
    pub period: String,
    pub org_unit: String,
}

impl ComparisonScope {
    pub fn new(period: impl Into<String>, org_unit: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            org_unit: org_unit.into(),
        }
    }
}

pub struct ReconciliationEngine<'a> {
    sources: &'a SourceRows,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(sources: &'a SourceRows) -> Self {
        Self { sources }
    }

    pub fn compare(&self, scope: &ComparisonScope) -> ComparisonReport {
        let started = Instant::now();
        let run_at = Utc::now();

        let indexes: Vec<HashMap<ComparisonKey, f64>> = SourceKind::ALL
            .iter()
            .map(|kind| index_rows(self.sources.rows(*kind)))
            .collect();

        let keys: BTreeSet<&ComparisonKey> = indexes.iter().flat_map(|idx| idx.keys()).collect();

        let rows: Vec<ComparisonResultRow> = keys
            .into_iter()
            .map(|key| {
                let mut values = [None; 4];
                for (slot, index) in values.iter_mut().zip(&indexes) {
                    *slot = index.get(key).copied();
                }
                ComparisonResultRow::from_values(key.clone(), values)
            })
            .collect();

        let summary = ComparisonSummary {
            total: rows.len(),
            mismatches: rows.iter().filter(|r| r.mismatch).count(),
            missing: rows.iter().filter(|r| r.has_missing()).count(),
            period: scope.period.clone(),
            org_unit: scope.org_unit.clone(),
            run_at,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        };

        log::debug!(
            "compared {} rows for {}/{}: {} keys, {} mismatches, {} missing",
            self.sources.row_count(),
            scope.org_unit,
            scope.period,
            summary.total,
            summary.mismatches,
            summary.missing
        );

        ComparisonReport { summary, rows }
    }
}

/// Convenience wrapper around [`ReconciliationEngine::compare`].
pub fn compare(sources: &SourceRows, scope: &ComparisonScope) -> ComparisonReport {
    ReconciliationEngine::new(sources).compare(scope)
}

fn index_rows(rows: &[DataSourceRow]) -> HashMap<ComparisonKey, f64> {
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        // Later rows for the same key replace earlier ones.
        index.insert(ComparisonKey::from_row(row), row.numeric_value());
    }
    index
}

fn distinct_count(values: impl Iterator<Item = f64>) -> usize {
    let mut bits: Vec<u64> = values
        .map(|v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
        .collect();
    bits.sort_unstable();
    bits.dedup();
    bits.len()
}
