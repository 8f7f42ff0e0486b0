//! The per-symbol view-model and the fixed display classifications.

use serde::{Deserialize, Serialize};

use crate::detect::{Pattern, SentimentResult, SpikeEvent, VolumeAnnotation};
use crate::domain::{CrossEvent, CrossState, MovingAverages, Recommendation, RsiZone};
use crate::series::{AlignedRecord, Period};

pub const RISK_LOW_MAX: f64 = 30.0;
pub const RISK_MEDIUM_MAX: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskGrade {
    Low,
    Medium,
    High,
}

impl RiskGrade {
    /// `<= 30` Low, `<= 70` Medium, anything above High.
    pub fn from_score(score: f64) -> Self {
        if score <= RISK_LOW_MAX {
            RiskGrade::Low
        } else if score <= RISK_MEDIUM_MAX {
            RiskGrade::Medium
        } else {
            RiskGrade::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskGrade::Low => "Low",
            RiskGrade::Medium => "Medium",
            RiskGrade::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskReading {
    pub score: f64,
    pub grade: RiskGrade,
}

impl RiskReading {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            grade: RiskGrade::from_score(score),
        }
    }
}

/// Fear & Greed Index band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FgiBand {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl FgiBand {
    pub fn from_value(value: f64) -> Self {
        if value < 25.0 {
            FgiBand::ExtremeFear
        } else if value < 45.0 {
            FgiBand::Fear
        } else if value < 55.0 {
            FgiBand::Neutral
        } else if value < 75.0 {
            FgiBand::Greed
        } else {
            FgiBand::ExtremeGreed
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FgiBand::ExtremeFear => "Extreme Fear",
            FgiBand::Fear => "Fear",
            FgiBand::Neutral => "Neutral",
            FgiBand::Greed => "Greed",
            FgiBand::ExtremeGreed => "Extreme Greed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FgiReading {
    pub value: f64,
    pub band: FgiBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiReading {
    pub value: Option<f64>,
    pub zone: RsiZone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    StrongPositive,
    Positive,
    Caution,
    Negative,
    StrongNegative,
    /// No recommendation available.
    Muted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    CheckCircle,
    TrendingUp,
    Minus,
    TrendingDown,
    XCircle,
    Alert,
}

impl Tone {
    pub fn of(recommendation: Option<Recommendation>) -> Self {
        match recommendation {
            Some(Recommendation::StrongBuy) => Tone::StrongPositive,
            Some(Recommendation::Buy) => Tone::Positive,
            Some(Recommendation::Hold) => Tone::Caution,
            Some(Recommendation::Sell) => Tone::Negative,
            Some(Recommendation::StrongSell) => Tone::StrongNegative,
            None => Tone::Muted,
        }
    }
}

impl Icon {
    pub fn of(recommendation: Option<Recommendation>) -> Self {
        match recommendation {
            Some(Recommendation::StrongBuy) => Icon::CheckCircle,
            Some(Recommendation::Buy) => Icon::TrendingUp,
            Some(Recommendation::Hold) => Icon::Minus,
            Some(Recommendation::Sell) => Icon::TrendingDown,
            Some(Recommendation::StrongSell) => Icon::XCircle,
            None => Icon::Alert,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationBadge {
    pub recommendation: Recommendation,
    pub tone: Tone,
    pub icon: Icon,
}

impl RecommendationBadge {
    pub fn new(recommendation: Recommendation) -> Self {
        Self {
            recommendation,
            tone: Tone::of(Some(recommendation)),
            icon: Icon::of(Some(recommendation)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Recent slope of each moving-average line in the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaDirections {
    pub ma20: Option<Direction>,
    pub ma50: Option<Direction>,
    pub ma60: Option<Direction>,
    pub ma200: Option<Direction>,
}

/// Supplied cross states plus the crossover events inside the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossSummary {
    pub ma50_ma200: Option<CrossState>,
    pub ma20_ma60: Option<CrossState>,
    pub events: Vec<CrossEvent>,
}

/// Everything presentation needs for one symbol. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedViewModel {
    pub symbol: String,
    pub period: Period,
    /// Windowed timeline, hidden indicator fields removed.
    pub records: Vec<AlignedRecord>,
    pub patterns: Vec<Pattern>,
    pub volume: Vec<VolumeAnnotation>,
    pub spikes: Vec<SpikeEvent>,
    pub sentiment: SentimentResult,
    pub rsi: Option<RsiReading>,
    pub macd_signal: Option<CrossState>,
    pub crosses: CrossSummary,
    pub moving_averages: MovingAverages,
    pub ma_directions: MaDirections,
    pub risk: Option<RiskReading>,
    pub fgi: Option<FgiReading>,
    pub recommendation: Option<RecommendationBadge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_grade_is_a_step_function() {
        let grades: Vec<RiskGrade> = [0.0, 30.0, 31.0, 70.0, 71.0, 100.0]
            .into_iter()
            .map(RiskGrade::from_score)
            .collect();
        assert_eq!(
            grades,
            vec![
                RiskGrade::Low,
                RiskGrade::Low,
                RiskGrade::Medium,
                RiskGrade::Medium,
                RiskGrade::High,
                RiskGrade::High,
            ]
        );
    }

    #[test]
    fn risk_grade_fractional_edges() {
        assert_eq!(RiskGrade::from_score(30.0001), RiskGrade::Medium);
        assert_eq!(RiskGrade::from_score(70.0001), RiskGrade::High);
    }

    #[test]
    fn fgi_bands() {
        assert_eq!(FgiBand::from_value(0.0), FgiBand::ExtremeFear);
        assert_eq!(FgiBand::from_value(24.9), FgiBand::ExtremeFear);
        assert_eq!(FgiBand::from_value(25.0), FgiBand::Fear);
        assert_eq!(FgiBand::from_value(45.0), FgiBand::Neutral);
        assert_eq!(FgiBand::from_value(55.0), FgiBand::Greed);
        assert_eq!(FgiBand::from_value(75.0), FgiBand::ExtremeGreed);
        assert_eq!(FgiBand::from_value(100.0), FgiBand::ExtremeGreed);
    }

    #[test]
    fn recommendation_display_mapping() {
        let hold = RecommendationBadge::new(Recommendation::Hold);
        assert_eq!(hold.tone, Tone::Caution);
        assert_eq!(hold.icon, Icon::Minus);

        let strong_sell = RecommendationBadge::new(Recommendation::StrongSell);
        assert_eq!(strong_sell.tone, Tone::StrongNegative);
        assert_eq!(strong_sell.icon, Icon::XCircle);

        assert_eq!(Tone::of(None), Tone::Muted);
        assert_eq!(Icon::of(None), Icon::Alert);
    }
}
