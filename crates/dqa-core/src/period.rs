use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar resolution of a period, ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PeriodType {
    #[serde(alias = "daily", alias = "DAILY")]
    Daily,
    #[serde(alias = "weekly", alias = "WEEKLY")]
    Weekly,
    #[serde(alias = "monthly", alias = "MONTHLY")]
    Monthly,
    #[serde(alias = "quarterly", alias = "QUARTERLY")]
    Quarterly,
    #[serde(alias = "yearly", alias = "YEARLY", alias = "annually", alias = "Annually")]
    Yearly,
}

impl PeriodType {
    pub const ALL: [PeriodType; 5] = [
        PeriodType::Daily,
        PeriodType::Weekly,
        PeriodType::Monthly,
        PeriodType::Quarterly,
        PeriodType::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Daily => "Daily",
            PeriodType::Weekly => "Weekly",
            PeriodType::Monthly => "Monthly",
            PeriodType::Quarterly => "Quarterly",
            PeriodType::Yearly => "Yearly",
        }
    }

    /// True when `self` is strictly coarser than `other`.
    pub fn is_coarser_than(&self, other: PeriodType) -> bool {
        *self > other
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(PeriodType::Daily),
            "weekly" | "week" => Ok(PeriodType::Weekly),
            "monthly" | "month" => Ok(PeriodType::Monthly),
            "quarterly" | "quarter" => Ok(PeriodType::Quarterly),
            "yearly" | "year" | "annually" | "annual" => Ok(PeriodType::Yearly),
            other => Err(PeriodError::UnknownPeriodType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    UnknownPeriodType(String),
    Malformed {
        token: String,
        period_type: PeriodType,
        reason: String,
    },
}

impl PeriodError {
    fn malformed(token: &str, period_type: PeriodType, reason: impl Into<String>) -> Self {
        PeriodError::Malformed {
            token: token.to_string(),
            period_type,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::UnknownPeriodType(value) => write!(f, "unknown period type '{value}'"),
            PeriodError::Malformed {
                token,
                period_type,
                reason,
            } => write!(f, "malformed {period_type} period '{token}': {reason}"),
        }
    }
}

impl std::error::Error for PeriodError {}

/// A concrete calendar period at a specific granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Day(NaiveDate),
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year(i32),
}

impl Period {
    pub fn parse(token: &str, period_type: PeriodType) -> Result<Self, PeriodError> {
        let token = token.trim();
        if token.len() < 4 || !token.is_char_boundary(4) {
            return Err(PeriodError::malformed(token, period_type, "missing year"));
        }
        let (year_part, rest) = token.split_at(4);
        let year = parse_digits(year_part)
            .ok_or_else(|| PeriodError::malformed(token, period_type, "year must be 4 digits"))?
            as i32;

        match period_type {
            PeriodType::Yearly => {
                if !rest.is_empty() {
                    return Err(PeriodError::malformed(token, period_type, "expected YYYY"));
                }
                Ok(Period::Year(year))
            }
            PeriodType::Quarterly => {
                let quarter = rest
                    .strip_prefix('Q')
                    .filter(|q| q.len() == 1)
                    .and_then(parse_digits)
                    .ok_or_else(|| PeriodError::malformed(token, period_type, "expected YYYYQn"))?;
                if !(1..=4).contains(&quarter) {
                    return Err(PeriodError::malformed(
                        token,
                        period_type,
                        format!("quarter {quarter} out of range"),
                    ));
                }
                Ok(Period::Quarter { year, quarter })
            }
            PeriodType::Monthly => {
                let month = Some(rest)
                    .filter(|m| m.len() == 2)
                    .and_then(parse_digits)
                    .ok_or_else(|| PeriodError::malformed(token, period_type, "expected YYYYMM"))?;
                if !(1..=12).contains(&month) {
                    return Err(PeriodError::malformed(
                        token,
                        period_type,
                        format!("month {month} out of range"),
                    ));
                }
                Ok(Period::Month { year, month })
            }
            PeriodType::Weekly => {
                let week = rest
                    .strip_prefix('W')
                    .filter(|w| (1..=2).contains(&w.len()))
                    .and_then(parse_digits)
                    .ok_or_else(|| PeriodError::malformed(token, period_type, "expected YYYYWww"))?;
                if NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none() {
                    return Err(PeriodError::malformed(
                        token,
                        period_type,
                        format!("ISO week {week} does not exist in {year}"),
                    ));
                }
                Ok(Period::Week { year, week })
            }
            PeriodType::Daily => {
                if rest.len() != 4 || !rest.is_char_boundary(2) {
                    return Err(PeriodError::malformed(token, period_type, "expected YYYYMMDD"));
                }
                let (month_part, day_part) = rest.split_at(2);
                let date = parse_digits(month_part)
                    .zip(parse_digits(day_part))
                    .and_then(|(month, day)| NaiveDate::from_ymd_opt(year, month, day))
                    .ok_or_else(|| {
                        PeriodError::malformed(token, period_type, "not a calendar date")
                    })?;
                Ok(Period::Day(date))
            }
        }
    }

    pub fn period_type(&self) -> PeriodType {
        match self {
            Period::Day(_) => PeriodType::Daily,
            Period::Week { .. } => PeriodType::Weekly,
            Period::Month { .. } => PeriodType::Monthly,
            Period::Quarter { .. } => PeriodType::Quarterly,
            Period::Year(_) => PeriodType::Yearly,
        }
    }

    /// The canonical period token, e.g. `2025Q1` or `2025W05`.
    pub fn id(&self) -> String {
        match self {
            Period::Day(date) => date.format("%Y%m%d").to_string(),
            Period::Week { year, week } => format!("{year:04}W{week:02}"),
            Period::Month { year, month } => format!("{year:04}{month:02}"),
            Period::Quarter { year, quarter } => format!("{year:04}Q{quarter}"),
            Period::Year(year) => format!("{year:04}"),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Period::Day(date) => date.format("%d/%m/%Y").to_string(),
            Period::Week { year, week } => format!("Week {week:02} {year:04}"),
            Period::Month { year, month } => match NaiveDate::from_ymd_opt(*year, *month, 1) {
                Some(first) => first.format("%B %Y").to_string(),
                None => self.id(),
            },
            Period::Quarter { year, quarter } => format!("Q{quarter} {year:04}"),
            Period::Year(year) => format!("{year:04}"),
        }
    }

    /// First calendar day covered by the period.
    pub fn start_date(&self) -> Option<NaiveDate> {
        match *self {
            Period::Day(date) => Some(date),
            Period::Week { year, week } => NaiveDate::from_isoywd_opt(year, week, Weekday::Mon),
            Period::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1),
            Period::Quarter { year, quarter } => {
                quarter_months(quarter)
                    .and_then(|(first, _)| NaiveDate::from_ymd_opt(year, first, 1))
            }
            Period::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
        }
    }

    /// Last calendar day covered by the period (inclusive).
    pub fn end_date(&self) -> Option<NaiveDate> {
        match *self {
            Period::Day(date) => Some(date),
            Period::Week { year, week } => NaiveDate::from_isoywd_opt(year, week, Weekday::Sun),
            Period::Month { year, month } => last_day_of_month(year, month),
            Period::Quarter { year, quarter } => {
                quarter_months(quarter).and_then(|(_, last)| last_day_of_month(year, last))
            }
            Period::Year(year) => NaiveDate::from_ymd_opt(year, 12, 31),
        }
    }

    pub fn to_sub_period(&self) -> SubPeriod {
        SubPeriod {
            id: self.id(),
            display_name: self.display_name(),
            period_type: self.period_type(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// One concrete period produced by decomposing an assessment period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubPeriod {
    pub id: String,
    pub display_name: String,
    pub period_type: PeriodType,
}

impl SubPeriod {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        period_type: PeriodType,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            period_type,
        }
    }
}

/// Canonical form of a period token. Weekly tokens are zero-padded
/// (`2025W5` becomes `2025W05`); anything else comes back trimmed.
pub fn canonical_period_id(token: &str) -> String {
    let token = token.trim();
    match Period::parse(token, PeriodType::Weekly) {
        Ok(week) => week.id(),
        Err(_) => token.to_string(),
    }
}

/// First and last month of a quarter, `None` outside 1..=4.
fn quarter_months(quarter: u32) -> Option<(u32, u32)> {
    (1..=4)
        .contains(&quarter)
        .then(|| ((quarter - 1) * 3 + 1, quarter * 3))
}

pub(crate) fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }?;
    Some(first_of_next - Duration::days(1))
}

/// Every calendar day of a month, ascending.
pub(crate) fn days_of_month(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let mut date = NaiveDate::from_ymd_opt(year, month, 1)?;
    let mut days = Vec::with_capacity(31);
    while date.month() == month {
        days.push(date);
        date = date + Duration::days(1);
    }
    Some(days)
}

fn parse_digits(input: &str) -> Option<u32> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}
