use crate::period::canonical_period_id;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four parallel channels capturing the same facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Register,
    Summary,
    Reported,
    Correction,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Register,
        SourceKind::Summary,
        SourceKind::Reported,
        SourceKind::Correction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Register => "register",
            SourceKind::Summary => "summary",
            SourceKind::Reported => "reported",
            SourceKind::Correction => "correction",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            SourceKind::Register => 0,
            SourceKind::Summary => 1,
            SourceKind::Reported => 2,
            SourceKind::Correction => 3,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "register" => Ok(SourceKind::Register),
            "summary" => Ok(SourceKind::Summary),
            "reported" => Ok(SourceKind::Reported),
            "correction" => Ok(SourceKind::Correction),
            other => Err(format!("unknown source '{other}'")),
        }
    }
}

/// Raw value as it arrives from an import or the metadata API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Number(f64),
    Text(String),
    /// Booleans, objects, arrays: kept as received, compared as 0.
    Other(serde_json::Value),
}

impl DataValue {
    /// Numeric interpretation; anything unparsable or non-finite counts as 0.
    pub fn numeric(&self) -> f64 {
        let value = match self {
            DataValue::Number(n) => *n,
            DataValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(0.0)
                }
            }
            DataValue::Other(_) => 0.0,
        };
        if value.is_finite() { value } else { 0.0 }
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Number(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceRow {
    pub data_element: String,
    pub category_option_combo: String,
    pub org_unit: String,
    pub period: String,
    #[serde(default)]
    pub value: Option<DataValue>,
}

impl DataSourceRow {
    pub fn new(
        data_element: impl Into<String>,
        category_option_combo: impl Into<String>,
        org_unit: impl Into<String>,
        period: impl Into<String>,
        value: impl Into<DataValue>,
    ) -> Self {
        Self {
            data_element: data_element.into(),
            category_option_combo: category_option_combo.into(),
            org_unit: org_unit.into(),
            period: period.into(),
            value: Some(value.into()),
        }
    }

    /// Value used for comparison. A present row with no usable value is 0.
    pub fn numeric_value(&self) -> f64 {
        self.value.as_ref().map_or(0.0, DataValue::numeric)
    }
}

/// The four row-sets compared for a single assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRows {
    #[serde(default)]
    pub register: Vec<DataSourceRow>,
    #[serde(default)]
    pub summary: Vec<DataSourceRow>,
    #[serde(default)]
    pub reported: Vec<DataSourceRow>,
    #[serde(default)]
    pub correction: Vec<DataSourceRow>,
}

impl SourceRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, kind: SourceKind) -> &[DataSourceRow] {
        match kind {
            SourceKind::Register => &self.register,
            SourceKind::Summary => &self.summary,
            SourceKind::Reported => &self.reported,
            SourceKind::Correction => &self.correction,
        }
    }

    pub fn rows_mut(&mut self, kind: SourceKind) -> &mut Vec<DataSourceRow> {
        match kind {
            SourceKind::Register => &mut self.register,
            SourceKind::Summary => &mut self.summary,
            SourceKind::Reported => &mut self.reported,
            SourceKind::Correction => &mut self.correction,
        }
    }

    pub fn with(mut self, kind: SourceKind, rows: Vec<DataSourceRow>) -> Self {
        *self.rows_mut(kind) = rows;
        self
    }

    pub fn row_count(&self) -> usize {
        SourceKind::ALL.iter().map(|k| self.rows(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Copy of the rows belonging to exactly one (period, org unit).
    /// Period tokens are matched and rewritten in canonical form.
    pub fn scoped(&self, period: &str, org_unit: &str) -> SourceRows {
        let period = canonical_period_id(period);
        let pick = |rows: &[DataSourceRow]| {
            rows.iter()
                .filter(|r| r.org_unit == org_unit)
                .filter_map(|r| {
                    let row_period = canonical_period_id(&r.period);
                    (row_period == period).then(|| DataSourceRow {
                        period: row_period,
                        ..r.clone()
                    })
                })
                .collect::<Vec<_>>()
        };
        SourceRows {
            register: pick(&self.register),
            summary: pick(&self.summary),
            reported: pick(&self.reported),
            correction: pick(&self.correction),
        }
    }
}
