//! News article as delivered by the news endpoint.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::point::parse_calendar_date;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(alias = "headline", default)]
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(
        alias = "date",
        default,
        deserialize_with = "lenient_date"
    )]
    pub published_at: Option<NaiveDate>,
    #[serde(alias = "link", default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: None,
            published_at: None,
            url: None,
            source: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// A bad publication date drops the date, not the article.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_calendar_date))
}
