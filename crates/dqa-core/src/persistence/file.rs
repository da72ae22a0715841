use super::{PersistenceError, PersistenceResult};
use crate::reconcile::ComparisonReport;
use crate::sources::{DataSourceRow, DataValue, SourceRows};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Accepted JSON layouts for a single row-set.
#[derive(Deserialize)]
#[serde(untagged)]
enum RowsDocument {
    Rows(Vec<DataSourceRow>),
    DataValueSet {
        #[serde(rename = "dataValues")]
        data_values: Vec<DataSourceRow>,
    },
}

/// Reads a JSON array of rows, or a DHIS2 data value set (`{"dataValues": [...]}`).
pub fn load_rows_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<DataSourceRow>> {
    let file = File::open(path)?;
    let document: RowsDocument = serde_json::from_reader(file)?;
    let rows = match document {
        RowsDocument::Rows(rows) => rows,
        RowsDocument::DataValueSet { data_values } => data_values,
    };
    validate_rows(&rows)?;
    Ok(rows)
}

/// Reads all four row-sets from one `{register, summary, reported, correction}` object.
pub fn load_sources_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<SourceRows> {
    let file = File::open(path)?;
    let sources: SourceRows = serde_json::from_reader(file)?;
    validate_rows(&sources.register)?;
    validate_rows(&sources.summary)?;
    validate_rows(&sources.reported)?;
    validate_rows(&sources.correction)?;
    Ok(sources)
}

#[derive(Default, Serialize, Deserialize)]
struct SourceCsvRecord {
    #[serde(rename = "dataElement", alias = "data_element")]
    data_element: String,
    #[serde(rename = "categoryOptionCombo", alias = "category_option_combo")]
    category_option_combo: String,
    #[serde(rename = "orgUnit", alias = "org_unit")]
    org_unit: String,
    period: String,
    #[serde(default)]
    value: String,
}

impl SourceCsvRecord {
    fn into_row(self) -> DataSourceRow {
        let value = if self.value.trim().is_empty() {
            None
        } else {
            Some(DataValue::Text(self.value))
        };
        DataSourceRow {
            data_element: self.data_element.trim().to_string(),
            category_option_combo: self.category_option_combo.trim().to_string(),
            org_unit: self.org_unit.trim().to_string(),
            period: self.period.trim().to_string(),
            value,
        }
    }
}

pub fn load_rows_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<DataSourceRow>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for record in reader.deserialize::<SourceCsvRecord>() {
        rows.push(record?.into_row());
    }
    validate_rows(&rows)?;
    Ok(rows)
}

pub fn save_report_to_json<P: AsRef<Path>>(
    report: &ComparisonReport,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

#[derive(Default, Serialize, Deserialize)]
struct ComparisonCsvRecord {
    key: String,
    data_element: String,
    category_option_combo: String,
    org_unit: String,
    period: String,
    register: String,
    summary: String,
    reported: String,
    correction: String,
    missing_count: u8,
    mismatch: bool,
}

pub fn save_report_to_csv<P: AsRef<Path>>(
    report: &ComparisonReport,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for row in &report.rows {
        writer.serialize(ComparisonCsvRecord {
            key: row.key.to_string(),
            data_element: row.key.data_element.clone(),
            category_option_combo: row.key.category_option_combo.clone(),
            org_unit: row.key.org_unit.clone(),
            period: row.key.period.clone(),
            register: format_option_f64(row.register),
            summary: format_option_f64(row.summary),
            reported: format_option_f64(row.reported),
            correction: format_option_f64(row.correction),
            missing_count: row.missing_count,
            mismatch: row.mismatch,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn validate_rows(rows: &[DataSourceRow]) -> PersistenceResult<()> {
    for (idx, row) in rows.iter().enumerate() {
        let fields = [
            ("dataElement", &row.data_element),
            ("categoryOptionCombo", &row.category_option_combo),
            ("orgUnit", &row.org_unit),
            ("period", &row.period),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(PersistenceError::InvalidData(format!(
                    "row #{idx} has an empty {name}"
                )));
            }
        }
    }
    Ok(())
}

fn format_option_f64(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
