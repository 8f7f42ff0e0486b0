//! Chart-shape heuristics: ascending wedge, descending wedge, box range.
//!
//! These are coarse structural checks on the most recent points, not fitted
//! trendlines. The window sizes and ratios are fixed policy constants.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Dated;
use crate::series::AlignedRecord;

/// Price sample fed to the pattern detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self {
            date,
            price,
            high: None,
            low: None,
        }
    }

    /// Intraday high, or the price when no high was reported.
    pub fn high_or_price(&self) -> f64 {
        self.high.filter(|h| h.is_finite()).unwrap_or(self.price)
    }

    /// Intraday low, or the price when no low was reported.
    pub fn low_or_price(&self) -> f64 {
        self.low.filter(|l| l.is_finite()).unwrap_or(self.price)
    }
}

impl Dated for PricePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Records with a usable price, in order.
pub fn price_points(records: &[AlignedRecord]) -> Vec<PricePoint> {
    records
        .iter()
        .filter_map(|r| {
            let price = r.value("price").filter(|p| p.is_finite())?;
            Some(PricePoint {
                date: r.date,
                price,
                high: r.value("high"),
                low: r.value("low"),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    WedgeUp,
    WedgeDown,
    BoxRange,
}

impl PatternKind {
    pub fn description(self) -> &'static str {
        match self {
            PatternKind::WedgeUp => "Ascending wedge",
            PatternKind::WedgeDown => "Descending wedge",
            PatternKind::BoxRange => "Box range",
        }
    }
}

/// A detected shape and the slice it was found on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: String,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Fewer points than this and nothing is attempted.
    pub min_points: usize,
    /// Only the most recent `lookback` points are analyzed.
    pub lookback: usize,
    /// Trailing points split in half for the wedge comparison.
    pub wedge_window: usize,
    /// One side of the envelope must move this many times faster than the other.
    pub wedge_ratio: f64,
    pub box_min_points: usize,
    /// Box range if `(max - min) / mean` is below this.
    pub box_max_range_ratio: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_points: 20,
            lookback: 60,
            wedge_window: 40,
            wedge_ratio: 1.5,
            box_min_points: 30,
            box_max_range_ratio: 0.05,
        }
    }
}

/// High/low envelope of the two halves of a slice.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Envelope {
    first_high: f64,
    first_low: f64,
    second_high: f64,
    second_low: f64,
}

impl Envelope {
    fn measure(slice: &[PricePoint]) -> Option<Self> {
        if slice.len() < 2 {
            return None;
        }
        let (first, second) = slice.split_at(slice.len() / 2);
        Some(Self {
            first_high: max_high(first),
            first_low: min_low(first),
            second_high: max_high(second),
            second_low: min_low(second),
        })
    }

    /// Highs and lows both rising, lows faster.
    fn is_rising_wedge(&self, ratio: f64) -> bool {
        self.second_high > self.first_high
            && self.second_low > self.first_low
            && (self.second_low - self.first_low) > (self.second_high - self.first_high) * ratio
    }

    /// Highs and lows both falling, highs faster.
    fn is_falling_wedge(&self, ratio: f64) -> bool {
        self.second_low < self.first_low
            && self.second_high < self.first_high
            && (self.first_high - self.second_high) > (self.first_low - self.second_low) * ratio
    }
}

fn max_high(points: &[PricePoint]) -> f64 {
    points
        .iter()
        .map(PricePoint::high_or_price)
        .fold(f64::NEG_INFINITY, f64::max)
}

fn min_low(points: &[PricePoint]) -> f64 {
    points
        .iter()
        .map(PricePoint::low_or_price)
        .fold(f64::INFINITY, f64::min)
}

fn pattern(kind: PatternKind, slice: &[PricePoint], upper: f64, lower: f64) -> Pattern {
    Pattern {
        kind,
        start_date: slice[0].date,
        end_date: slice[slice.len() - 1].date,
        description: kind.description().to_string(),
        upper: Some(upper),
        lower: Some(lower),
    }
}

/// Scan the trailing points for wedge and box shapes.
///
/// All three checks run independently, so any combination may be returned
/// (in the order wedge up, wedge down, box range).
pub fn detect_patterns(points: &[PricePoint], config: &PatternConfig) -> Vec<Pattern> {
    if points.len() < config.min_points.max(1) {
        log::debug!(
            "pattern scan skipped: {} points, need {}",
            points.len(),
            config.min_points
        );
        return Vec::new();
    }

    let recent = &points[points.len().saturating_sub(config.lookback)..];
    let mut patterns = Vec::new();

    let wedge_slice = &recent[recent.len().saturating_sub(config.wedge_window)..];
    if let Some(env) = Envelope::measure(wedge_slice) {
        if env.is_rising_wedge(config.wedge_ratio) {
            patterns.push(pattern(
                PatternKind::WedgeUp,
                wedge_slice,
                env.second_high,
                env.second_low,
            ));
        }
        if env.is_falling_wedge(config.wedge_ratio) {
            patterns.push(pattern(
                PatternKind::WedgeDown,
                wedge_slice,
                env.second_high,
                env.second_low,
            ));
        }
    }

    if !recent.is_empty() && recent.len() >= config.box_min_points {
        let max = recent.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);
        let min = recent.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
        let mean = recent.iter().map(|p| p.price).sum::<f64>() / recent.len() as f64;
        if mean > 0.0 && (max - min) / mean < config.box_max_range_ratio {
            patterns.push(pattern(PatternKind::BoxRange, recent, max, min));
        }
    }

    patterns
}
