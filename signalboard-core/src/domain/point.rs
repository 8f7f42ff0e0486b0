//! Dated records of a fetched series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anything that sits on the calendar axis.
///
/// Windowing and alignment are written against this trait so they work on
/// raw points, aligned records and detector inputs alike.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// A normalized point of a single source series.
///
/// Field names are the schema's target names (`price`, `ma20`, `rsi`, ...).
/// `None` means the upstream value was absent, null or not a finite number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub fields: BTreeMap<String, Option<f64>>,
}

impl TimePoint {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter, mostly for fixtures.
    pub fn with(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied().flatten()
    }
}

impl Dated for TimePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// A record exactly as the analytics service returns it.
///
/// `date` is kept as text: it may be a bare date or a full timestamp, and a
/// malformed one must only drop this point, not the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    #[serde(default, deserialize_with = "date_text")]
    pub date: String,
    #[serde(flatten)]
    pub values: serde_json::Map<String, serde_json::Value>,
}

impl RawPoint {
    /// Finite numeric value of `key`, if any.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.values
            .get(key)
            .and_then(serde_json::Value::as_f64)
            .filter(|v| v.is_finite())
    }
}

/// Non-string dates become empty text, which later fails to parse.
fn date_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().unwrap_or_default().to_string())
}

/// Parse an ISO-8601 calendar date, truncating timestamps to the day.
///
/// Accepts `2024-03-01`, `2024-03-01T14:30:00Z`, `2024-03-01 09:00:00` and
/// anything else whose first ten characters form a `YYYY-MM-DD` date.
pub fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let head = text.get(..10)?;
    let rest = &text[10..];
    if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ')) {
        return None;
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
