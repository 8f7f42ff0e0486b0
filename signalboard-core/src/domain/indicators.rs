//! Scalar indicator readings computed by the analytics service.
//!
//! None of these are recomputed locally. They are carried through to the
//! view-model, with at most a classification attached.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::point::Dated;

/// RSI below this is oversold.
pub const RSI_OVERSOLD: f64 = 30.0;
/// RSI above this is overbought.
pub const RSI_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiZone {
    /// `< 30` oversold, `> 70` overbought, anything else neutral.
    pub fn classify(value: f64) -> Self {
        if value > RSI_OVERBOUGHT {
            RsiZone::Overbought
        } else if value < RSI_OVERSOLD {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RsiZone::Oversold => "Oversold",
            RsiZone::Neutral => "Neutral",
            RsiZone::Overbought => "Overbought",
        }
    }
}

/// State of a crossover-type signal (MACD line vs signal, short MA vs long MA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossState {
    Golden,
    Death,
    #[serde(alias = "none")]
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossKind {
    Golden,
    Death,
}

impl CrossKind {
    pub fn label(self) -> &'static str {
        match self {
            CrossKind::Golden => "Golden cross",
            CrossKind::Death => "Death cross",
        }
    }
}

/// Which pair of moving averages crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossPair {
    Ma50Ma200,
    Ma20Ma60,
}

impl CrossPair {
    pub fn label(self) -> &'static str {
        match self {
            CrossPair::Ma50Ma200 => "MA50/MA200",
            CrossPair::Ma20Ma60 => "MA20/MA60",
        }
    }
}

/// A dated crossover reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossEvent {
    pub date: NaiveDate,
    pub kind: CrossKind,
    pub pair: CrossPair,
}

impl Dated for CrossEvent {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl Recommendation {
    /// Display name, matching the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Sell => "Sell",
            Recommendation::StrongSell => "Strong Sell",
        }
    }
}

/// Latest moving-average values, as reported upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverages {
    #[serde(deserialize_with = "lenient_number")]
    pub ma20: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub ma50: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub ma60: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub ma200: Option<f64>,
}

/// Everything the service computed for a symbol that is not a time series.
///
/// Every field is optional: a failed or partial fetch leaves it `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalIndicators {
    #[serde(deserialize_with = "lenient_number")]
    pub rsi: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub rsi_zone: Option<RsiZone>,
    #[serde(deserialize_with = "lenient")]
    pub macd_signal: Option<CrossState>,
    #[serde(deserialize_with = "lenient")]
    pub ma50_ma200: Option<CrossState>,
    #[serde(deserialize_with = "lenient")]
    pub ma20_ma60: Option<CrossState>,
    #[serde(deserialize_with = "lenient")]
    pub moving_averages: MovingAverages,
    #[serde(deserialize_with = "lenient_number")]
    pub risk_score: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub fgi: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub recommendation: Option<Recommendation>,
}

/// A finite number or numeric text; any other shape reads as `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|v| v.is_finite()))
}

/// Unknown variants and wrong shapes fall back to `T::default()`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}
