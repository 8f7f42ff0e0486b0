//! The fetch layer's hand-off shape for one symbol.
//!
//! Every array may be missing or `null` (that fetch failed or was skipped);
//! the matching source then contributes only nulls after alignment. Elements
//! that do not fit their record shape are dropped one by one, and scalars of
//! the wrong shape read as unavailable. Only text that is not JSON at all is
//! rejected.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::indicators::lenient;
use crate::domain::{
    parse_calendar_date, Article, CrossEvent, CrossKind, CrossPair, ExternalIndicators, RawPoint,
};
use crate::pipeline::AnalysisInputs;
use crate::series::{SourceSchema, SourceSeries};

/// Crossover history as returned by the cross endpoint:
/// `{"ma50_ma200": [{"date": "...", "type": "golden"}], "ma20_ma60": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossLists {
    #[serde(deserialize_with = "lenient_elements")]
    pub ma50_ma200: Vec<RawPoint>,
    #[serde(deserialize_with = "lenient_elements")]
    pub ma20_ma60: Vec<RawPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputBundle {
    #[serde(deserialize_with = "lenient")]
    pub symbol: String,
    #[serde(alias = "price", deserialize_with = "lenient_elements")]
    pub prices: Vec<RawPoint>,
    #[serde(deserialize_with = "lenient_elements")]
    pub ma20: Vec<RawPoint>,
    #[serde(deserialize_with = "lenient_elements")]
    pub ma50: Vec<RawPoint>,
    #[serde(deserialize_with = "lenient_elements")]
    pub ma60: Vec<RawPoint>,
    #[serde(deserialize_with = "lenient_elements")]
    pub ma200: Vec<RawPoint>,
    #[serde(deserialize_with = "lenient_elements")]
    pub rsi: Vec<RawPoint>,
    #[serde(deserialize_with = "lenient_elements")]
    pub macd: Vec<RawPoint>,
    #[serde(deserialize_with = "lenient")]
    pub crosses: CrossLists,
    #[serde(alias = "news", deserialize_with = "lenient_elements")]
    pub articles: Vec<Article>,
    #[serde(deserialize_with = "lenient")]
    pub indicators: ExternalIndicators,
}

/// Keep the elements that deserialize; `null` or a non-array is empty.
fn lenient_elements<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => return Ok(Vec::new()),
        _ => {
            log::debug!("expected an array of records; treating as empty");
            return Ok(Vec::new());
        }
    };
    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|item| T::deserialize(item).ok())
        .collect();
    if kept.len() < total {
        log::debug!(
            "dropped {} of {total} malformed records",
            total - kept.len()
        );
    }
    Ok(kept)
}

fn cross_events(raw: &[RawPoint], pair: CrossPair) -> Vec<CrossEvent> {
    raw.iter()
        .filter_map(|point| {
            let date = parse_calendar_date(&point.date)?;
            let kind = match point
                .values
                .get("type")
                .or_else(|| point.values.get("kind"))
                .and_then(serde_json::Value::as_str)?
                .to_ascii_lowercase()
                .as_str()
            {
                "golden" => CrossKind::Golden,
                "death" => CrossKind::Death,
                _ => return None,
            };
            Some(CrossEvent { date, kind, pair })
        })
        .collect()
}

impl InputBundle {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Normalize every array with its built-in schema.
    ///
    /// Points and cross events with malformed dates are dropped.
    pub fn into_inputs(self) -> AnalysisInputs {
        let primary = SourceSeries::from_raw(SourceSchema::price(), &self.prices);
        let auxiliaries = vec![
            SourceSeries::from_raw(SourceSchema::moving_average(20), &self.ma20),
            SourceSeries::from_raw(SourceSchema::moving_average(50), &self.ma50),
            SourceSeries::from_raw(SourceSchema::moving_average(60), &self.ma60),
            SourceSeries::from_raw(SourceSchema::moving_average(200), &self.ma200),
            SourceSeries::from_raw(SourceSchema::rsi(), &self.rsi),
            SourceSeries::from_raw(SourceSchema::macd(), &self.macd),
        ];

        let mut crosses = cross_events(&self.crosses.ma50_ma200, CrossPair::Ma50Ma200);
        crosses.extend(cross_events(&self.crosses.ma20_ma60, CrossPair::Ma20Ma60));
        let supplied = self.crosses.ma50_ma200.len() + self.crosses.ma20_ma60.len();
        if crosses.len() < supplied {
            log::debug!(
                "{}: dropped {} malformed cross events",
                self.symbol,
                supplied - crosses.len()
            );
        }

        AnalysisInputs {
            symbol: self.symbol,
            primary,
            auxiliaries,
            crosses,
            articles: self.articles,
            indicators: self.indicators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CrossState, RsiZone};
    use chrono::NaiveDate;

    const BUNDLE: &str = r#"{
        "symbol": "SPY",
        "prices": [
            {"date": "2024-03-01T00:00:00Z", "close": 510.2, "volume": 1000},
            {"date": "2024-03-04", "close": 512.0, "volume": null},
            {"date": "garbage", "close": 1.0}
        ],
        "ma20": [{"date": "2024-03-04", "value": 505.5}],
        "rsi": null,
        "crosses": {
            "ma20_ma60": [
                {"date": "2024-03-04", "type": "golden"},
                {"date": "2024-03-05", "type": "sideways"},
                {"date": "not a date", "type": "death"}
            ]
        },
        "articles": [{"headline": "ETF inflows surge", "date": "2024-03-04"}],
        "indicators": {"rsi": 28.0, "macd_signal": "none", "risk_score": 12}
    }"#;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn bundle_normalizes_every_source() {
        let inputs = InputBundle::from_json(BUNDLE).unwrap().into_inputs();

        assert_eq!(inputs.symbol, "SPY");
        assert_eq!(inputs.primary.len(), 2);
        assert_eq!(inputs.primary.points[0].date, d(2024, 3, 1));
        assert_eq!(inputs.primary.points[0].value("price"), Some(510.2));
        assert_eq!(inputs.primary.points[1].value("volume"), None);

        assert_eq!(inputs.auxiliaries.len(), 6);
        assert_eq!(inputs.auxiliaries[0].points[0].value("ma20"), Some(505.5));
        assert!(inputs.auxiliaries[4].is_empty());

        assert_eq!(inputs.articles[0].title, "ETF inflows surge");
        assert_eq!(inputs.indicators.macd_signal, Some(CrossState::Neutral));
    }

    #[test]
    fn malformed_cross_events_are_dropped() {
        let inputs = InputBundle::from_json(BUNDLE).unwrap().into_inputs();
        assert_eq!(
            inputs.crosses,
            vec![CrossEvent {
                date: d(2024, 3, 4),
                kind: CrossKind::Golden,
                pair: CrossPair::Ma20Ma60,
            }]
        );
    }

    #[test]
    fn empty_object_is_an_empty_bundle() {
        let bundle = InputBundle::from_json("{}").unwrap();
        assert_eq!(bundle, InputBundle::default());
        let inputs = bundle.into_inputs();
        assert!(inputs.primary.is_empty());
        assert!(inputs.crosses.is_empty());
    }

    #[test]
    fn malformed_elements_are_dropped_individually() {
        let bundle = InputBundle::from_json(
            r#"{
                "symbol": "QQQ",
                "prices": [{"date": "2024-03-01", "close": 440.0}, null, 7, "x"],
                "ma20": [[1, 2], {"date": "2024-03-01", "value": 431.0}],
                "articles": [{"title": "Rally"}, {"title": 42}, null],
                "crosses": {"ma20_ma60": [true, {"date": "2024-03-01", "type": "death"}]}
            }"#,
        )
        .unwrap();
        assert_eq!(bundle.prices.len(), 1);
        assert_eq!(bundle.ma20.len(), 1);
        assert_eq!(bundle.articles.len(), 1);

        let inputs = bundle.into_inputs();
        assert_eq!(inputs.primary.points[0].value("price"), Some(440.0));
        assert_eq!(inputs.auxiliaries[0].points[0].value("ma20"), Some(431.0));
        assert_eq!(inputs.crosses.len(), 1);
    }

    #[test]
    fn malformed_scalars_degrade_to_none() {
        let bundle = InputBundle::from_json(
            r#"{
                "symbol": "IWM",
                "prices": [{"date": "2024-03-01", "close": 205.0}],
                "indicators": {"recommendation": "Neutral", "rsi": "55.1", "fgi": "greedy"}
            }"#,
        )
        .unwrap();
        assert!(bundle.indicators.recommendation.is_none());
        assert_eq!(bundle.indicators.rsi, Some(55.1));
        assert!(bundle.indicators.fgi.is_none());
        assert_eq!(bundle.prices.len(), 1);
    }

    #[test]
    fn wrong_shaped_sections_read_as_missing() {
        let bundle = InputBundle::from_json(
            r#"{"symbol": 12, "prices": {"date": "2024-03-01"}, "rsi": "55.1",
                "crosses": [], "indicators": "unavailable"}"#,
        )
        .unwrap();
        assert_eq!(bundle, InputBundle::default());
    }

    #[test]
    fn non_json_text_is_rejected() {
        assert!(InputBundle::from_json("<html>502 Bad Gateway</html>").is_err());
    }

    #[test]
    fn bundle_feeds_the_pipeline() {
        use crate::pipeline::{run_pipeline, PipelineConfig};
        use chrono::{TimeZone, Utc};

        let inputs = InputBundle::from_json(BUNDLE).unwrap().into_inputs();
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let vm = run_pipeline(&inputs, &PipelineConfig::default(), now);

        assert_eq!(vm.records.len(), 2);
        assert_eq!(vm.records[1].value("ma20"), Some(505.5));
        assert!(vm.records[1].fields.contains_key("rsi"));
        assert!(vm.records[1].cross.is_some());
        assert_eq!(vm.rsi.map(|r| r.zone), Some(RsiZone::Oversold));
        assert_eq!(vm.sentiment.positive_count, 1);
    }
}
