//! SignalBoard Core: date alignment and heuristic signal detection for ETF dashboards.
//!
//! This crate turns independently fetched per-symbol data into one view-model:
//! - Per-source schemas that normalize raw JSON records
//! - Date alignment onto the primary (price) timeline, plus crossover markers
//! - Trailing period windows (1W … 3Y, All)
//! - Wedge/box pattern, volume spike and keyword sentiment detectors
//! - Assembly of detector output and supplied indicators into a `DerivedViewModel`
//! - A memoizing pipeline cache, TOML configuration and an injected key-value store
//!
//! Everything under `series`, `detect`, `assemble` and `pipeline` is pure and
//! infallible: degraded input produces `None` or empty output, never an error.

pub mod assemble;
pub mod bundle;
pub mod config;
pub mod detect;
pub mod domain;
pub mod pipeline;
pub mod series;
pub mod store;

pub use assemble::{assemble, DerivedViewModel, IndicatorSet};
pub use bundle::InputBundle;
pub use config::{AppConfig, ConfigError, DetectorConfig};
pub use pipeline::{run_batch, run_pipeline, AnalysisInputs, InputsHash, PipelineCache, PipelineConfig};
pub use series::Period;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, RecentSymbols, StoreError};
