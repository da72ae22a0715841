pub mod batch;
pub mod config;
pub mod expansion;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod period;
pub mod persistence;
pub mod reconcile;
mod report;
pub mod sources;
pub mod variance;

pub use batch::{AssessmentReconciliation, ComparisonTotals, reconcile_assessment, reconcile_periods};
pub use config::{AssessmentConfig, AssessmentConfigError, load_assessment_config};
pub use expansion::{Expansion, ExpansionOutcome, expand, try_expand};
pub use period::{Period, PeriodError, PeriodType, SubPeriod, canonical_period_id};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteDocumentStore;
pub use persistence::{
    DocumentStore, MemoryDocumentStore, PersistenceError, PersistenceResult, load_rows_from_csv,
    load_rows_from_json, load_sources_from_json, load_summaries, record_summary,
    save_report_to_csv, save_report_to_json, summary_key,
};
pub use reconcile::{
    ComparisonKey, ComparisonReport, ComparisonResultRow, ComparisonScope, ComparisonSummary,
    ReconciliationEngine, compare,
};
pub use sources::{DataSourceRow, DataValue, SourceKind, SourceRows};
pub use variance::{AcceptableVariance, spread_pct};
