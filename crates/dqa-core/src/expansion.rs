//! Decomposition of a coarse assessment period into dataset-granularity
//! sub-periods.
//!
//! [`expand`] never fails: malformed tokens and unsupported
//! (frequency, period type) pairs degrade to the original period, and the
//! returned [`Expansion`] says which of those happened.

use crate::period::{Period, PeriodError, PeriodType, SubPeriod, days_of_month};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Weeks assigned to each quarter when a quarterly assessment is entered
/// against a weekly dataset. 4 x 13 = 52, so week 53 is never produced.
pub const WEEKS_PER_QUARTER: u32 = 13;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExpansionOutcome {
    /// The period was decomposed into finer sub-periods.
    Expanded,
    /// Assessment frequency is not coarser than the dataset period type.
    NotRequired,
    /// No decomposition rule exists for this pair.
    Unsupported,
    /// The period token could not be interpreted.
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expansion {
    pub periods: Vec<SubPeriod>,
    pub outcome: ExpansionOutcome,
    /// True when the single-period result stands in for a decomposition
    /// that should have happened.
    pub degraded: bool,
}

impl Expansion {
    fn expanded(periods: Vec<SubPeriod>) -> Self {
        Self {
            periods,
            outcome: ExpansionOutcome::Expanded,
            degraded: false,
        }
    }

    fn single(period: &str, frequency: PeriodType, outcome: ExpansionOutcome) -> Self {
        let display_name = Period::parse(period, frequency)
            .map(|p| p.display_name())
            .unwrap_or_else(|_| period.to_string());
        let degraded = matches!(
            outcome,
            ExpansionOutcome::Unsupported | ExpansionOutcome::Fallback { .. }
        );
        Self {
            periods: vec![SubPeriod::new(period, display_name, frequency)],
            outcome,
            degraded,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn ids(&self) -> Vec<&str> {
        self.periods.iter().map(|p| p.id.as_str()).collect()
    }
}

/// Expand `period` (a token at `frequency`) into the sub-periods required for
/// a dataset collected at `dataset_period_type`.
pub fn expand(period: &str, frequency: PeriodType, dataset_period_type: PeriodType) -> Expansion {
    if !frequency.is_coarser_than(dataset_period_type) {
        return Expansion::single(period, frequency, ExpansionOutcome::NotRequired);
    }

    match try_expand(period, frequency, dataset_period_type) {
        Ok(Some(periods)) if !periods.is_empty() => {
            log::debug!(
                "expanded {period} ({frequency}) into {} {dataset_period_type} periods",
                periods.len()
            );
            Expansion::expanded(periods)
        }
        Ok(Some(_)) => {
            log::warn!("expansion of {period} ({frequency}) produced no periods");
            Expansion::single(
                period,
                frequency,
                ExpansionOutcome::Fallback {
                    reason: "expansion produced no periods".into(),
                },
            )
        }
        Ok(None) => {
            log::warn!(
                "no decomposition from {frequency} to {dataset_period_type}; keeping {period}"
            );
            Expansion::single(period, frequency, ExpansionOutcome::Unsupported)
        }
        Err(err) => {
            log::warn!("period expansion fell back to {period}: {err}");
            Expansion::single(
                period,
                frequency,
                ExpansionOutcome::Fallback {
                    reason: err.to_string(),
                },
            )
        }
    }
}

/// Strict variant of [`expand`]: `Ok(None)` for unsupported pairs, `Err` for
/// malformed tokens.
pub fn try_expand(
    period: &str,
    frequency: PeriodType,
    dataset_period_type: PeriodType,
) -> Result<Option<Vec<SubPeriod>>, PeriodError> {
    let parsed = Period::parse(period, frequency)?;

    let periods: Vec<Period> = match (parsed, dataset_period_type) {
        (Period::Quarter { year, quarter }, PeriodType::Monthly) => {
            let first = (quarter - 1) * 3 + 1;
            (first..first + 3)
                .map(|month| Period::Month { year, month })
                .collect()
        }
        (Period::Quarter { year, quarter }, PeriodType::Weekly) => {
            let first = (quarter - 1) * WEEKS_PER_QUARTER + 1;
            (first..=quarter * WEEKS_PER_QUARTER)
                .map(|week| Period::Week { year, week })
                .collect()
        }
        (Period::Year(year), PeriodType::Quarterly) => (1..=4)
            .map(|quarter| Period::Quarter { year, quarter })
            .collect(),
        (Period::Year(year), PeriodType::Monthly) => {
            (1..=12).map(|month| Period::Month { year, month }).collect()
        }
        (Period::Month { year, month }, PeriodType::Weekly) => {
            let days = days_of_month(year, month).ok_or_else(|| PeriodError::Malformed {
                token: period.to_string(),
                period_type: frequency,
                reason: "month has no calendar days".into(),
            })?;
            let mut weeks: Vec<Period> = Vec::with_capacity(6);
            for day in days {
                let iso = day.iso_week();
                let week = Period::Week {
                    year: iso.year(),
                    week: iso.week(),
                };
                if !weeks.contains(&week) {
                    weeks.push(week);
                }
            }
            weeks
        }
        (Period::Month { year, month }, PeriodType::Daily) => days_of_month(year, month)
            .ok_or_else(|| PeriodError::Malformed {
                token: period.to_string(),
                period_type: frequency,
                reason: "month has no calendar days".into(),
            })?
            .into_iter()
            .map(Period::Day)
            .collect(),
        _ => return Ok(None),
    };

    Ok(Some(periods.iter().map(Period::to_sub_period).collect()))
}
