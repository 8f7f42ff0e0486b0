//! BDD tests for the bundle → view-model pipeline.
//!
//! These tests verify the full pass a dashboard refresh performs:
//! - Normalizing a fetched bundle
//! - Windowing by the selected period before detection
//! - Degrading gracefully when sources are missing
//! - Memoizing by inputs hash

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use signalboard_core::assemble::{Direction, RiskGrade, Tone};
use signalboard_core::detect::{PatternKind, SpikeDirection};
use signalboard_core::domain::{CrossKind, CrossPair, RsiZone};
use signalboard_core::{
    run_batch, run_pipeline, AppConfig, InputBundle, PipelineCache, PipelineConfig, Period,
};

// ── Fixtures ─────────────────────────────────────────────────────────

const DAYS: u64 = 60;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Afternoon of the last bundle day (2024-02-29).
fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 29, 16, 0, 0).unwrap()
}

fn day(i: u64) -> String {
    (start() + Days::new(i)).format("%Y-%m-%d").to_string()
}

/// A quiet, range-bound ETF with one volume burst on the final day.
fn spy_bundle() -> Value {
    let prices: Vec<Value> = (0..DAYS)
        .map(|i| {
            let close = 500.0 + (i % 4) as f64;
            json!({
                "date": format!("{}T00:00:00Z", day(i)),
                "close": close,
                "high": close + 1.0,
                "low": close - 1.0,
                "volume": if i == DAYS - 1 { 9_000_000.0 } else { 3_000_000.0 },
            })
        })
        .collect();
    let ma20: Vec<Value> = (0..DAYS)
        .map(|i| json!({ "date": day(i), "value": 495.0 + i as f64 * 0.1 }))
        .collect();

    json!({
        "symbol": "SPY",
        "prices": prices,
        "ma20": ma20,
        "crosses": {
            "ma20_ma60": [{ "date": day(50), "type": "golden" }],
            "ma50_ma200": [{ "date": day(50), "type": "death" }]
        },
        "articles": [
            { "title": "ETF inflows surge as rally broadens" },
            { "title": "Analysts see strong growth ahead", "summary": "profit upgrades" },
            { "title": "Bond yields decline" }
        ],
        "indicators": {
            "rsi": 72.5,
            "macd_signal": "golden",
            "ma20_ma60": "golden",
            "risk_score": 45,
            "fgi": 62,
            "recommendation": "Buy"
        }
    })
}

fn bundle(value: Value) -> InputBundle {
    serde_json::from_value(value).expect("bundle should deserialize")
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn bdd_scenario_full_history_view_model() {
    // GIVEN a fetched bundle for SPY covering 60 trading days
    let inputs = bundle(spy_bundle()).into_inputs();

    // WHEN the pipeline runs over the whole history
    let vm = run_pipeline(&inputs, &PipelineConfig::default(), as_of());

    // THEN every primary date is present, in order, with its MA value aligned
    assert_eq!(vm.records.len(), DAYS as usize);
    assert!(vm.records.windows(2).all(|w| w[0].date < w[1].date));
    assert_eq!(vm.records[10].value("ma20"), Some(496.0));

    // AND the tight range is reported as a box
    assert!(vm.patterns.iter().any(|p| p.kind == PatternKind::BoxRange));

    // AND the final-day volume burst is a spike with an upward move
    assert_eq!(vm.spikes.len(), 1);
    assert_eq!(vm.spikes[0].date, start() + Days::new(DAYS - 1));
    assert_eq!(vm.spikes[0].direction, SpikeDirection::Up);

    // AND the MA20/MA60 cross wins the marker on the shared date
    let marker = vm.records[50].cross.expect("cross marker on day 50");
    assert_eq!(marker.pair, CrossPair::Ma20Ma60);
    assert_eq!(marker.kind, CrossKind::Golden);
    assert_eq!(vm.crosses.events.len(), 2);

    // AND the article batch leans positive
    assert_eq!(vm.sentiment.positive_count, 2);
    assert_eq!(vm.sentiment.negative_count, 1);

    // AND supplied scalars are classified, not recomputed
    assert_eq!(vm.rsi.map(|r| r.zone), Some(RsiZone::Overbought));
    assert_eq!(vm.risk.map(|r| r.grade), Some(RiskGrade::Medium));
    assert_eq!(vm.recommendation.map(|b| b.tone), Some(Tone::Positive));
    assert_eq!(vm.ma_directions.ma20, Some(Direction::Up));
}

#[test]
fn bdd_scenario_period_selector_narrows_detection() {
    // GIVEN the same bundle
    let inputs = bundle(spy_bundle()).into_inputs();

    // WHEN the user selects the one-week period
    let config = PipelineConfig {
        period: Period::OneWeek,
        ..PipelineConfig::default()
    };
    let vm = run_pipeline(&inputs, &config, as_of());

    // THEN only Feb 22..=Feb 29 remain
    assert_eq!(vm.records.len(), 8);
    assert_eq!(vm.records[0].date, NaiveDate::from_ymd_opt(2024, 2, 22).unwrap());

    // AND the pattern detector declines for lack of history
    assert!(vm.patterns.is_empty());

    // AND the last day still has seven prior points in the window, so it flags
    assert!(vm.volume[7].is_spike);
    assert!(vm.volume[..7].iter().all(|v| v.avg_volume.is_none()));

    // AND cross events before the window are not reported
    assert!(vm.crosses.events.is_empty());
}

#[test]
fn bdd_scenario_missing_sources_degrade_to_none() {
    // GIVEN a bundle where every fetch but prices failed
    let mut raw = spy_bundle();
    raw["ma20"] = Value::Null;
    raw["articles"] = Value::Null;
    raw["crosses"] = json!({});
    raw["indicators"] = json!({});
    let inputs = bundle(raw).into_inputs();

    // WHEN the pipeline runs
    let vm = run_pipeline(&inputs, &PipelineConfig::default(), as_of());

    // THEN the timeline survives with null MA values
    assert_eq!(vm.records.len(), DAYS as usize);
    assert!(vm.records.iter().all(|r| r.value("ma20").is_none()));

    // AND every indicator-derived reading is unavailable rather than defaulted
    assert!(vm.rsi.is_none());
    assert!(vm.risk.is_none());
    assert!(vm.fgi.is_none());
    assert!(vm.recommendation.is_none());
    assert!(vm.ma_directions.ma20.is_none());
    assert_eq!(vm.sentiment.total(), 0);
}

#[test]
fn bdd_scenario_hidden_indicators_from_config() {
    // GIVEN a config file hiding the MA20 line and the volume bars
    let app = AppConfig::from_toml_str(
        r#"
        period = "1m"

        [visible]
        ma20 = false
        volume = false
        "#,
    )
    .unwrap();
    let inputs = bundle(spy_bundle()).into_inputs();

    // WHEN the pipeline runs with it
    let vm = run_pipeline(&inputs, &PipelineConfig::from(app), as_of());

    // THEN the hidden series are gone from the records
    assert!(vm.records.iter().all(|r| !r.fields.contains_key("ma20")));
    assert!(vm.records.iter().all(|r| !r.fields.contains_key("volume")));
    assert!(vm.records.iter().all(|r| r.value("price").is_some()));

    // AND derived readings still use the full data
    assert_eq!(vm.ma_directions.ma20, Some(Direction::Up));
    assert_eq!(vm.spikes.len(), 1);
    assert_eq!(vm.period, Period::OneMonth);
}

#[test]
fn bdd_scenario_repeated_refresh_is_idempotent_and_cached() {
    // GIVEN a cache and unchanged inputs
    let cache = PipelineCache::new();
    let inputs = bundle(spy_bundle()).into_inputs();
    let config = PipelineConfig::default();

    // WHEN the dashboard refreshes twice
    let first = cache.get_or_compute(&inputs, &config, as_of());
    let second = cache.get_or_compute(&inputs, &config, as_of());

    // THEN the second refresh is served from the cache
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!((cache.hits(), cache.misses()), (1, 1));

    // AND an uncached rerun is structurally identical
    assert_eq!(*first, run_pipeline(&inputs, &config, as_of()));

    // WHEN a new article arrives
    let mut raw = spy_bundle();
    raw["articles"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "title": "Markets crash" }));
    let updated = bundle(raw).into_inputs();
    let third = cache.get_or_compute(&updated, &config, as_of());

    // THEN the entry is recomputed and replaced
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.sentiment.total(), 4);
    assert_eq!(cache.len(), 1);
}

#[test]
fn bdd_scenario_batch_of_symbols() {
    // GIVEN bundles for three symbols, one of them empty
    let mut qqq = spy_bundle();
    qqq["symbol"] = json!("QQQ");
    let batch = vec![
        bundle(spy_bundle()).into_inputs(),
        bundle(json!({ "symbol": "EMPTY" })).into_inputs(),
        bundle(qqq).into_inputs(),
    ];

    // WHEN they are analyzed together
    let out = run_batch(&batch, &PipelineConfig::default(), as_of());

    // THEN results come back in input order and the empty one degrades quietly
    let symbols: Vec<&str> = out.iter().map(|vm| vm.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["SPY", "EMPTY", "QQQ"]);
    assert!(out[1].records.is_empty());
    assert_eq!(out[0].records, out[2].records);
}
