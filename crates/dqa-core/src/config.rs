use crate::period::PeriodType;
use crate::variance::AcceptableVariance;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub period: String,
    pub frequency: PeriodType,
    pub dataset_period_type: PeriodType,
    pub org_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptable_variance_pct: Option<f64>,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            id: "assessment".to_string(),
            name: "New Assessment".to_string(),
            period: "2025Q1".to_string(),
            frequency: PeriodType::Quarterly,
            dataset_period_type: PeriodType::Monthly,
            org_unit: "ROOT".to_string(),
            acceptable_variance_pct: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentConfigError {
    MissingField(&'static str),
    InvalidVariance(f64),
    Io(String),
    Parse(String),
}

impl fmt::Display for AssessmentConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentConfigError::MissingField(field) => {
                write!(f, "assessment {field} must not be empty")
            }
            AssessmentConfigError::InvalidVariance(pct) => write!(
                f,
                "acceptable variance {pct} must be a finite, non-negative percentage"
            ),
            AssessmentConfigError::Io(message) => write!(f, "io error: {message}"),
            AssessmentConfigError::Parse(message) => write!(f, "invalid assessment json: {message}"),
        }
    }
}

impl std::error::Error for AssessmentConfigError {}

impl AssessmentConfig {
    pub fn validate(&self) -> Result<(), AssessmentConfigError> {
        if self.id.trim().is_empty() {
            return Err(AssessmentConfigError::MissingField("id"));
        }
        if self.period.trim().is_empty() {
            return Err(AssessmentConfigError::MissingField("period"));
        }
        if self.org_unit.trim().is_empty() {
            return Err(AssessmentConfigError::MissingField("org unit"));
        }
        if let Some(pct) = self.acceptable_variance_pct {
            if !pct.is_finite() || pct < 0.0 {
                return Err(AssessmentConfigError::InvalidVariance(pct));
            }
        }
        Ok(())
    }

    pub fn variance(&self) -> Option<AcceptableVariance> {
        self.acceptable_variance_pct.map(AcceptableVariance::new)
    }
}

pub fn load_assessment_config<P: AsRef<Path>>(
    path: P,
) -> Result<AssessmentConfig, AssessmentConfigError> {
    let file = File::open(path).map_err(|err| AssessmentConfigError::Io(err.to_string()))?;
    let config: AssessmentConfig = serde_json::from_reader(file)
        .map_err(|err| AssessmentConfigError::Parse(err.to_string()))?;
    config.validate()?;
    Ok(config)
}
