//! Volume spike detection against a trailing average.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Dated;
use crate::series::AlignedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    pub date: NaiveDate,
    pub price: Option<f64>,
    pub volume: Option<f64>,
}

impl Dated for VolumePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

pub fn volume_points(records: &[AlignedRecord]) -> Vec<VolumePoint> {
    records
        .iter()
        .map(|r| VolumePoint {
            date: r.date,
            price: r.value("price"),
            volume: r.value("volume"),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Number of preceding points averaged; also the first index evaluated.
    pub window: usize,
    /// Spike if volume >= multiplier × trailing average.
    pub multiplier: f64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            window: 7,
            multiplier: 2.0,
        }
    }
}

/// A point of the input, annotated for the volume chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnnotation {
    pub date: NaiveDate,
    pub volume: Option<f64>,
    /// Mean volume of the `window` points before this one; `None` for the
    /// first `window` points.
    pub avg_volume: Option<f64>,
    pub is_spike: bool,
}

impl Dated for VolumeAnnotation {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpikeDirection {
    Up,
    Down,
}

/// A volume spike together with the day's price move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeEvent {
    pub date: NaiveDate,
    pub price: f64,
    /// Percent change from the previous point's price.
    pub change_pct: f64,
    pub direction: SpikeDirection,
}

/// Flag every point whose volume is at least `multiplier` times the mean of
/// the `window` points before it.
///
/// Missing volumes count as zero in the mean. A point flags only when its own
/// volume is present and positive, so an all-missing series marks nothing.
pub fn annotate_volume(points: &[VolumePoint], config: &VolumeConfig) -> Vec<VolumeAnnotation> {
    let window = config.window.max(1);
    let volumes: Vec<f64> = points
        .iter()
        .map(|p| p.volume.filter(|v| v.is_finite()).unwrap_or(0.0))
        .collect();

    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            if i < window {
                return VolumeAnnotation {
                    date: point.date,
                    volume: point.volume,
                    avg_volume: None,
                    is_spike: false,
                };
            }
            let avg = volumes[i - window..i].iter().sum::<f64>() / window as f64;
            VolumeAnnotation {
                date: point.date,
                volume: point.volume,
                avg_volume: Some(avg),
                is_spike: volumes[i] > 0.0 && volumes[i] >= avg * config.multiplier,
            }
        })
        .collect()
}

/// One event per flagged point whose price move can be measured.
///
/// Needs this point's price and a positive previous price; spikes without
/// them stay flagged in the annotations but produce no event.
pub fn spike_events(points: &[VolumePoint], annotations: &[VolumeAnnotation]) -> Vec<SpikeEvent> {
    annotations
        .iter()
        .enumerate()
        .filter(|(i, a)| a.is_spike && *i > 0 && *i < points.len())
        .filter_map(|(i, a)| {
            let price = points[i].price.filter(|p| p.is_finite())?;
            let prev = points[i - 1].price.filter(|p| p.is_finite() && *p > 0.0)?;
            let change_pct = (price - prev) / prev * 100.0;
            Some(SpikeEvent {
                date: a.date,
                price,
                change_pct,
                direction: if change_pct > 0.0 {
                    SpikeDirection::Up
                } else {
                    SpikeDirection::Down
                },
            })
        })
        .collect()
}
