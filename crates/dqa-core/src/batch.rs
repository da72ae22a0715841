//! Reconciliation of a whole assessment: one comparison per sub-period,
//! run in parallel.

use crate::config::{AssessmentConfig, AssessmentConfigError};
use crate::expansion::{Expansion, expand};
use crate::period::SubPeriod;
use crate::reconcile::{ComparisonReport, ComparisonScope, ReconciliationEngine};
use crate::sources::SourceRows;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonTotals {
    pub total: usize,
    pub mismatches: usize,
    pub missing: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beyond_tolerance: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentReconciliation {
    pub assessment_id: String,
    pub expansion: Expansion,
    /// One report per sub-period, in sub-period order.
    pub reports: Vec<ComparisonReport>,
    pub totals: ComparisonTotals,
}

/// Compare the rows of each period separately for one org unit.
pub fn reconcile_periods(
    periods: &[SubPeriod],
    org_unit: &str,
    sources: &SourceRows,
) -> Vec<ComparisonReport> {
    periods
        .par_iter()
        .map(|period| {
            let scoped = sources.scoped(&period.id, org_unit);
            let scope = ComparisonScope::new(period.id.as_str(), org_unit);
            ReconciliationEngine::new(&scoped).compare(&scope)
        })
        .collect()
}

pub fn reconcile_assessment(
    config: &AssessmentConfig,
    sources: &SourceRows,
) -> Result<AssessmentReconciliation, AssessmentConfigError> {
    config.validate()?;
    let expansion = expand(&config.period, config.frequency, config.dataset_period_type);
    let reports = reconcile_periods(&expansion.periods, &config.org_unit, sources);

    let variance = config.variance();
    let mut totals = ComparisonTotals {
        beyond_tolerance: variance.map(|_| 0),
        ..ComparisonTotals::default()
    };
    for report in &reports {
        totals.total += report.summary.total;
        totals.mismatches += report.summary.mismatches;
        totals.missing += report.summary.missing;
        if let (Some(variance), Some(count)) = (variance.as_ref(), totals.beyond_tolerance.as_mut())
        {
            *count += report.beyond_tolerance(variance);
        }
    }

    log::info!(
        "assessment {} reconciled over {} period(s): total={}, mismatches={}, missing={}",
        config.id,
        reports.len(),
        totals.total,
        totals.mismatches,
        totals.missing
    );

    Ok(AssessmentReconciliation {
        assessment_id: config.id.clone(),
        expansion,
        reports,
        totals,
    })
}
