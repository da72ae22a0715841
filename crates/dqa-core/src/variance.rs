use crate::reconcile::{ComparisonReport, ComparisonResultRow};
use serde::{Deserialize, Serialize};

/// Caller-configured tolerance applied on top of raw mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptableVariance {
    pub pct: f64,
}

impl AcceptableVariance {
    pub fn new(pct: f64) -> Self {
        Self { pct }
    }

    pub fn exceeds(&self, row: &ComparisonResultRow) -> bool {
        spread_pct(row) > self.pct
    }
}

impl Default for AcceptableVariance {
    fn default() -> Self {
        Self { pct: 0.0 }
    }
}

/// Spread of the present values relative to the largest magnitude, in percent.
pub fn spread_pct(row: &ComparisonResultRow) -> f64 {
    let values = row.present_values();
    if values.len() < 2 {
        return 0.0;
    }
    let max = values.iter().copied().fold(f64::MIN, f64::max);
    let min = values.iter().copied().fold(f64::MAX, f64::min);
    if max == min {
        return 0.0;
    }
    let scale = max.abs().max(min.abs());
    (max - min) / scale * 100.0
}

impl ComparisonReport {
    pub fn beyond_tolerance(&self, variance: &AcceptableVariance) -> usize {
        self.rows.iter().filter(|r| variance.exceeds(r)).count()
    }
}
