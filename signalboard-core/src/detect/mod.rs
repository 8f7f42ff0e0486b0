//! Heuristic detectors run over the windowed timeline and the article batch.
//!
//! Each detector declines (empty output) on insufficient history instead of
//! returning an error.

pub mod pattern;
pub mod sentiment;
pub mod volume;

pub use pattern::{detect_patterns, price_points, Pattern, PatternConfig, PatternKind, PricePoint};
pub use sentiment::{
    score_articles, KeywordCount, SentimentConfig, SentimentLabel, SentimentResult,
    NEGATIVE_KEYWORDS, POSITIVE_KEYWORDS,
};
pub use volume::{
    annotate_volume, spike_events, volume_points, SpikeDirection, SpikeEvent, VolumeAnnotation,
    VolumeConfig, VolumePoint,
};

/// Consecutive calendar days starting Jan 1 of `year`.
#[cfg(test)]
pub fn dates_from(year: i32, n: usize) -> Vec<chrono::NaiveDate> {
    let start = chrono::NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
    (0..n as u64)
        .map(|i| start + chrono::Days::new(i))
        .collect()
}

/// `n` points at a constant price, no high/low.
#[cfg(test)]
pub fn flat_prices(n: usize, price: f64) -> Vec<PricePoint> {
    dates_from(2024, n)
        .into_iter()
        .map(|date| PricePoint::new(date, price))
        .collect()
}
