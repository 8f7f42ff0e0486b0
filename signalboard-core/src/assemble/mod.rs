//! Composition of detector output and supplied indicators into the view-model.
//!
//! Nothing here computes a new statistic. It only classifies and labels
//! what it is given; anything absent stays `None`.

pub mod view_model;

pub use view_model::{
    CrossSummary, DerivedViewModel, Direction, FgiBand, FgiReading, Icon, MaDirections,
    RecommendationBadge, RiskGrade, RiskReading, RsiReading, Tone, RISK_LOW_MAX, RISK_MEDIUM_MAX,
};

use serde::{Deserialize, Serialize};

use crate::detect::{Pattern, SentimentResult, SpikeEvent, VolumeAnnotation};
use crate::domain::{CrossEvent, ExternalIndicators, MovingAverages, RsiZone};
use crate::series::{AlignedRecord, Period};

/// Points compared by [`ma_direction`] by default.
pub const DIRECTION_SPAN: usize = 5;

/// Which indicator series presentation shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSet {
    pub price: bool,
    pub ma20: bool,
    pub ma50: bool,
    pub ma60: bool,
    pub ma200: bool,
    pub volume: bool,
    pub rsi: bool,
    pub macd: bool,
}

impl Default for IndicatorSet {
    fn default() -> Self {
        Self::all()
    }
}

impl IndicatorSet {
    pub fn all() -> Self {
        Self {
            price: true,
            ma20: true,
            ma50: true,
            ma60: true,
            ma200: true,
            volume: true,
            rsi: true,
            macd: true,
        }
    }

    pub fn none() -> Self {
        Self {
            price: false,
            ma20: false,
            ma50: false,
            ma60: false,
            ma200: false,
            volume: false,
            rsi: false,
            macd: false,
        }
    }

    /// Record fields owned by a toggle; fields no toggle owns are always shown.
    fn toggles(&self) -> [(bool, &'static [&'static str]); 8] {
        [
            (self.price, &["price", "open", "high", "low"][..]),
            (self.ma20, &["ma20"][..]),
            (self.ma50, &["ma50"][..]),
            (self.ma60, &["ma60"][..]),
            (self.ma200, &["ma200"][..]),
            (self.volume, &["volume"][..]),
            (self.rsi, &["rsi"][..]),
            (self.macd, &["macd", "macd_signal", "macd_histogram"][..]),
        ]
    }

    pub fn shows(&self, field: &str) -> bool {
        self.toggles()
            .iter()
            .find(|(_, fields)| fields.contains(&field))
            .map_or(true, |(on, _)| *on)
    }
}

/// Copy of `records` without the fields of hidden indicators.
pub fn project_fields(records: &[AlignedRecord], visible: &IndicatorSet) -> Vec<AlignedRecord> {
    records
        .iter()
        .map(|record| AlignedRecord {
            date: record.date,
            fields: record
                .fields
                .iter()
                .filter(|(name, _)| visible.shows(name))
                .map(|(name, value)| (name.clone(), *value))
                .collect(),
            cross: record.cross,
        })
        .collect()
}

/// Direction of `field` over the trailing `span` records.
///
/// `None` with fewer than `span` records, a span shorter than two, or when
/// either end of the span has no value. A flat line counts as `Down`.
pub fn ma_direction(records: &[AlignedRecord], field: &str, span: usize) -> Option<Direction> {
    if span < 2 {
        return None;
    }
    let tail = records.get(records.len().checked_sub(span)?..)?;
    let first = tail.first()?.value(field)?;
    let last = tail.last()?.value(field)?;
    Some(if last > first {
        Direction::Up
    } else {
        Direction::Down
    })
}

fn latest(records: &[AlignedRecord], field: &str) -> Option<f64> {
    records.iter().rev().find_map(|r| r.value(field))
}

/// Detector output for one symbol, ready to be composed.
#[derive(Debug, Clone, Default)]
pub struct AssemblyParts {
    pub symbol: String,
    pub period: Period,
    /// Windowed timeline with every field still present.
    pub records: Vec<AlignedRecord>,
    pub patterns: Vec<Pattern>,
    pub volume: Vec<VolumeAnnotation>,
    pub spikes: Vec<SpikeEvent>,
    pub sentiment: SentimentResult,
    /// Crossover events inside the window.
    pub cross_events: Vec<CrossEvent>,
}

pub fn assemble(
    parts: AssemblyParts,
    indicators: &ExternalIndicators,
    visible: &IndicatorSet,
) -> DerivedViewModel {
    let rsi = match (indicators.rsi_zone, indicators.rsi) {
        (Some(zone), value) => Some(RsiReading { value, zone }),
        (None, Some(value)) => Some(RsiReading {
            value: Some(value),
            zone: RsiZone::classify(value),
        }),
        (None, None) => None,
    };

    let supplied = indicators.moving_averages;
    let moving_averages = MovingAverages {
        ma20: supplied.ma20.or_else(|| latest(&parts.records, "ma20")),
        ma50: supplied.ma50.or_else(|| latest(&parts.records, "ma50")),
        ma60: supplied.ma60.or_else(|| latest(&parts.records, "ma60")),
        ma200: supplied.ma200.or_else(|| latest(&parts.records, "ma200")),
    };

    let ma_directions = MaDirections {
        ma20: ma_direction(&parts.records, "ma20", DIRECTION_SPAN),
        ma50: ma_direction(&parts.records, "ma50", DIRECTION_SPAN),
        ma60: ma_direction(&parts.records, "ma60", DIRECTION_SPAN),
        ma200: ma_direction(&parts.records, "ma200", DIRECTION_SPAN),
    };

    DerivedViewModel {
        records: project_fields(&parts.records, visible),
        symbol: parts.symbol,
        period: parts.period,
        patterns: parts.patterns,
        volume: parts.volume,
        spikes: parts.spikes,
        sentiment: parts.sentiment,
        rsi,
        macd_signal: indicators.macd_signal,
        crosses: CrossSummary {
            ma50_ma200: indicators.ma50_ma200,
            ma20_ma60: indicators.ma20_ma60,
            events: parts.cross_events,
        },
        moving_averages,
        ma_directions,
        risk: indicators.risk_score.map(RiskReading::new),
        fgi: indicators.fgi.map(|value| FgiReading {
            value,
            band: FgiBand::from_value(value),
        }),
        recommendation: indicators.recommendation.map(RecommendationBadge::new),
    }
}
