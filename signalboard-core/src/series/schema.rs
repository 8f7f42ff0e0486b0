//! Per-source field schemas.
//!
//! Each fetched series declares which target fields it contributes and, for
//! every target, the raw keys to read in precedence order. Normalizing through
//! a schema is the only place raw JSON shapes are interpreted.

use serde::{Deserialize, Serialize};

use crate::domain::{parse_calendar_date, RawPoint, TimePoint};

/// One target field and where to read it from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Name of the field on normalized points and aligned records.
    pub name: String,
    /// Raw keys tried in order; the first finite number wins.
    pub aliases: Vec<String>,
    /// Value used when no alias yields a number.
    pub default: Option<f64>,
}

impl FieldSpec {
    /// A field read from a raw key of the same name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: vec![name.to_string()],
            default: None,
        }
    }

    pub fn aliases(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    fn read(&self, raw: &RawPoint) -> Option<f64> {
        self.aliases
            .iter()
            .find_map(|key| raw.number(key))
            .or(self.default)
    }
}

/// Declared shape of one source series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSchema {
    pub label: String,
    pub fields: Vec<FieldSpec>,
}

impl SourceSchema {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Normalize a raw record. `None` only if its date is unusable.
    pub fn normalize(&self, raw: &RawPoint) -> Option<TimePoint> {
        let date = parse_calendar_date(&raw.date)?;
        let fields = self
            .fields
            .iter()
            .map(|spec| (spec.name.clone(), spec.read(raw)))
            .collect();
        Some(TimePoint { date, fields })
    }

    // ── Built-in schemas for the analytics service endpoints ──

    /// Daily price history. `price` prefers the close.
    pub fn price() -> Self {
        Self::new("price")
            .field(FieldSpec::aliases("price", &["close", "price", "adj_close"]))
            .field(FieldSpec::new("open"))
            .field(FieldSpec::new("high"))
            .field(FieldSpec::new("low"))
            .field(FieldSpec::new("volume"))
    }

    /// A single moving-average series, e.g. `moving_average(20)` → `ma20`.
    pub fn moving_average(period: u32) -> Self {
        let name = format!("ma{period}");
        Self::new(name.clone()).field(FieldSpec::aliases(&name, &[name.as_str(), "value"]))
    }

    pub fn rsi() -> Self {
        Self::new("rsi").field(FieldSpec::aliases("rsi", &["rsi", "value"]))
    }

    pub fn macd() -> Self {
        Self::new("macd")
            .field(FieldSpec::aliases("macd", &["macd", "value"]))
            .field(FieldSpec::aliases("macd_signal", &["signal", "macd_signal"]))
            .field(FieldSpec::aliases(
                "macd_histogram",
                &["histogram", "macd_histogram"],
            ))
    }
}

/// A schema together with its normalized points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSeries {
    pub schema: SourceSchema,
    pub points: Vec<TimePoint>,
}

impl SourceSeries {
    /// A source that was not fetched (or failed): contributes only nulls.
    pub fn empty(schema: SourceSchema) -> Self {
        Self {
            schema,
            points: Vec::new(),
        }
    }

    pub fn from_points(schema: SourceSchema, points: Vec<TimePoint>) -> Self {
        Self { schema, points }
    }

    /// Normalize raw records, dropping those with malformed dates.
    pub fn from_raw(schema: SourceSchema, raw: &[RawPoint]) -> Self {
        let points: Vec<TimePoint> = raw.iter().filter_map(|r| schema.normalize(r)).collect();
        let dropped = raw.len() - points.len();
        if dropped > 0 {
            log::debug!(
                "{}: dropped {dropped} of {} points with malformed dates",
                schema.label,
                raw.len()
            );
        }
        Self { schema, points }
    }

    pub fn label(&self) -> &str {
        &self.schema.label
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawPoint {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn aliases_follow_precedence() {
        let schema = SourceSchema::price();
        let p = schema
            .normalize(&raw(r#"{"date":"2024-01-02","close":101.0,"price":99.0}"#))
            .unwrap();
        assert_eq!(p.value("price"), Some(101.0));

        // close null → falls through to price
        let p = schema
            .normalize(&raw(r#"{"date":"2024-01-02","close":null,"price":99.0}"#))
            .unwrap();
        assert_eq!(p.value("price"), Some(99.0));
    }

    #[test]
    fn zero_is_a_value_not_a_fallthrough() {
        let schema = SourceSchema::price();
        let p = schema
            .normalize(&raw(r#"{"date":"2024-01-02","close":0.0,"price":99.0}"#))
            .unwrap();
        assert_eq!(p.value("price"), Some(0.0));
    }

    #[test]
    fn every_declared_field_is_present() {
        let p = SourceSchema::price()
            .normalize(&raw(r#"{"date":"2024-01-02","close":10}"#))
            .unwrap();
        let names: Vec<&str> = p.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["high", "low", "open", "price", "volume"]);
        assert_eq!(p.value("volume"), None);
    }

    #[test]
    fn default_applies_when_no_alias_matches() {
        let schema = SourceSchema::new("x").field(FieldSpec::new("volume").with_default(0.0));
        let p = schema.normalize(&raw(r#"{"date":"2024-01-02"}"#)).unwrap();
        assert_eq!(p.value("volume"), Some(0.0));
    }

    #[test]
    fn non_numeric_values_degrade_to_none() {
        let p = SourceSchema::rsi()
            .normalize(&raw(r#"{"date":"2024-01-02","rsi":"high","value":true}"#))
            .unwrap();
        assert_eq!(p.value("rsi"), None);
    }

    #[test]
    fn moving_average_reads_generic_value_key() {
        let p = SourceSchema::moving_average(50)
            .normalize(&raw(r#"{"date":"2024-01-02","value":250.5}"#))
            .unwrap();
        assert_eq!(p.value("ma50"), Some(250.5));
    }

    #[test]
    fn from_raw_drops_malformed_dates() {
        let rows = vec![
            raw(r#"{"date":"2024-01-02","signal":1.0}"#),
            raw(r#"{"date":"not a date","signal":2.0}"#),
            raw(r#"{"date":"2024-01-04T00:00:00Z","macd_signal":3.0}"#),
        ];
        let series = SourceSeries::from_raw(SourceSchema::macd(), &rows);
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[0].value("macd_signal"), Some(1.0));
        assert_eq!(series.points[1].value("macd_signal"), Some(3.0));
    }
}
