//! The full analysis pass for one symbol, plus batch and memoized variants.
//!
//! `run_pipeline` is pure: same inputs, same config, same reference date,
//! structurally equal output. `PipelineCache` relies on that to reuse results
//! keyed by a content hash of everything the pass reads.

use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::assemble::{assemble, AssemblyParts, DerivedViewModel, IndicatorSet};
use crate::config::{AppConfig, DetectorConfig};
use crate::detect::{
    annotate_volume, detect_patterns, price_points, score_articles, spike_events, volume_points,
};
use crate::domain::{Article, CrossEvent, ExternalIndicators, Symbol};
use crate::series::{align_series, attach_cross_markers, window, Period, SourceSeries};

/// Everything fetched for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInputs {
    pub symbol: Symbol,
    /// Defines the timeline; normally the price series.
    pub primary: SourceSeries,
    pub auxiliaries: Vec<SourceSeries>,
    pub crosses: Vec<CrossEvent>,
    pub articles: Vec<Article>,
    pub indicators: ExternalIndicators,
}

impl AnalysisInputs {
    pub fn new(symbol: impl Into<Symbol>, primary: SourceSeries) -> Self {
        Self {
            symbol: symbol.into(),
            primary,
            auxiliaries: Vec::new(),
            crosses: Vec::new(),
            articles: Vec::new(),
            indicators: ExternalIndicators::default(),
        }
    }
}

/// Explicit replacement for the dashboard's selector and toggle state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub period: Period,
    pub visible: IndicatorSet,
    pub detectors: DetectorConfig,
}

impl From<AppConfig> for PipelineConfig {
    fn from(config: AppConfig) -> Self {
        Self {
            period: config.period,
            visible: config.visible,
            detectors: config.detectors,
        }
    }
}

/// Align, window, detect, assemble.
///
/// Detectors only see the windowed records, so the period selector changes
/// which patterns and spikes are reported. Sentiment covers every article.
pub fn run_pipeline(
    inputs: &AnalysisInputs,
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> DerivedViewModel {
    let mut aligned = align_series(&inputs.primary, &inputs.auxiliaries);
    attach_cross_markers(&mut aligned, &inputs.crosses);

    let records = window(&aligned, config.period, now).to_vec();

    let patterns = detect_patterns(&price_points(&records), &config.detectors.pattern);
    let vol_points = volume_points(&records);
    let volume = annotate_volume(&vol_points, &config.detectors.volume);
    let spikes = spike_events(&vol_points, &volume);
    let sentiment = score_articles(&inputs.articles, &config.detectors.sentiment);

    let in_window: BTreeSet<NaiveDate> = records.iter().map(|r| r.date).collect();
    let mut cross_events: Vec<CrossEvent> = inputs
        .crosses
        .iter()
        .filter(|e| in_window.contains(&e.date))
        .copied()
        .collect();
    cross_events.sort_by_key(|e| e.date);

    log::debug!(
        "{}: {} of {} records in {}, {} patterns, {} spikes",
        inputs.symbol,
        records.len(),
        aligned.len(),
        config.period,
        patterns.len(),
        spikes.len()
    );

    assemble(
        AssemblyParts {
            symbol: inputs.symbol.clone(),
            period: config.period,
            records,
            patterns,
            volume,
            spikes,
            sentiment,
            cross_events,
        },
        &inputs.indicators,
        &config.visible,
    )
}

/// Analyze independent symbols in parallel. Output order matches input order.
pub fn run_batch(
    batch: &[AnalysisInputs],
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> Vec<DerivedViewModel> {
    batch
        .par_iter()
        .map(|inputs| run_pipeline(inputs, config, now))
        .collect()
}

/// Content hash of everything a pipeline run reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputsHash([u8; 32]);

#[derive(Serialize)]
struct HashedRun<'a> {
    inputs: &'a AnalysisInputs,
    config: &'a PipelineConfig,
    reference_date: NaiveDate,
}

impl InputsHash {
    /// Only the calendar day of `now` matters; two instants on the same day
    /// hash equal.
    pub fn compute(
        inputs: &AnalysisInputs,
        config: &PipelineConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_vec(&HashedRun {
            inputs,
            config,
            reference_date: now.date_naive(),
        })?;
        Ok(Self(*blake3::hash(&json).as_bytes()))
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for InputsHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

type Entries = HashMap<Symbol, (InputsHash, Arc<DerivedViewModel>)>;

/// Memoized `run_pipeline`, one entry per symbol.
///
/// An entry is reused while its inputs hash is unchanged; any change to the
/// inputs, config or reference day recomputes and replaces it.
#[derive(Debug, Default)]
pub struct PipelineCache {
    entries: Mutex<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &self,
        inputs: &AnalysisInputs,
        config: &PipelineConfig,
        now: DateTime<Utc>,
    ) -> Arc<DerivedViewModel> {
        let hash = match InputsHash::compute(inputs, config, now) {
            Ok(hash) => hash,
            Err(e) => {
                log::warn!("{}: cannot hash inputs ({e}), computing uncached", inputs.symbol);
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Arc::new(run_pipeline(inputs, config, now));
            }
        };

        if let Some((cached_hash, view)) = self.lock().get(&inputs.symbol) {
            if *cached_hash == hash {
                self.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("{}: cache hit {hash}", inputs.symbol);
                return Arc::clone(view);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("{}: cache miss {hash}", inputs.symbol);
        let view = Arc::new(run_pipeline(inputs, config, now));
        self.lock()
            .insert(inputs.symbol.clone(), (hash, Arc::clone(&view)));
        view
    }

    /// Drop the entry for `symbol`. Returns whether one existed.
    pub fn invalidate(&self, symbol: &str) -> bool {
        self.lock().remove(symbol).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
