//! Trailing calendar windows ("1W", "3M", "1Y", ...).

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::Dated;

/// Selectable chart period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "3y")]
    ThreeYears,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl Period {
    pub const ALL_PERIODS: [Period; 7] = [
        Period::OneWeek,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::ThreeYears,
        Period::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::OneWeek => "1w",
            Period::OneMonth => "1m",
            Period::ThreeMonths => "3m",
            Period::SixMonths => "6m",
            Period::OneYear => "1y",
            Period::ThreeYears => "3y",
            Period::All => "all",
        }
    }

    /// First date included in the window ending at `today`.
    ///
    /// Months and years roll the calendar back (clamping to the end of a
    /// shorter month, so Mar 31 minus one month is Feb 28/29) rather than
    /// subtracting a fixed number of days. `All` has no cutoff.
    pub fn cutoff(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::OneWeek => today.checked_sub_days(Days::new(7)),
            Period::OneMonth => today.checked_sub_months(Months::new(1)),
            Period::ThreeMonths => today.checked_sub_months(Months::new(3)),
            Period::SixMonths => today.checked_sub_months(Months::new(6)),
            Period::OneYear => today.checked_sub_months(Months::new(12)),
            Period::ThreeYears => today.checked_sub_months(Months::new(36)),
            Period::All => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown period '{0}' (expected one of 1w, 1m, 3m, 6m, 1y, 3y, all)")]
pub struct ParsePeriodError(pub String);

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Period::ALL_PERIODS
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| ParsePeriodError(s.to_string()))
    }
}

/// The trailing part of `items` that falls inside `period`, as of `now`.
///
/// `items` must be ascending by date (aligned output always is). The result
/// is always a contiguous suffix of the input; `Period::All` returns it whole.
pub fn window<T: Dated>(items: &[T], period: Period, now: DateTime<Utc>) -> &[T] {
    let Some(cutoff) = period.cutoff(now.date_naive()) else {
        return items;
    };
    let start = items.partition_point(|item| item.date() < cutoff);
    &items[start..]
}
