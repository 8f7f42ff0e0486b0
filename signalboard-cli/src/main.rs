//! SignalBoard CLI: analyze fetched bundles and manage recent symbols.
//!
//! Commands:
//! - `analyze`: run the pipeline over a fetched JSON bundle and print the view-model
//! - `recent`: list (or clear) recently analyzed symbols
//! - `periods`: list the accepted period selectors

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use signalboard_core::{
    run_pipeline, AppConfig, DerivedViewModel, InputBundle, JsonFileStore, Period, PipelineConfig,
    RecentSymbols,
};

#[derive(Parser)]
#[command(
    name = "signalboard",
    about = "SignalBoard CLI: ETF series alignment and signal heuristics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis pipeline over a fetched input bundle.
    Analyze {
        /// Path to the bundle JSON (prices, moving averages, crosses, articles, indicators).
        #[arg(long)]
        input: PathBuf,

        /// Period selector: 1w, 1m, 3m, 6m, 1y, 3y, all. Overrides the config file.
        #[arg(long)]
        period: Option<Period>,

        /// Reference date (YYYY-MM-DD or RFC 3339). Defaults to now.
        #[arg(long)]
        now: Option<String>,

        /// TOML config with period, visible indicators and detector thresholds.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Key-value store file. Defaults to the user data directory.
        #[arg(long)]
        store: Option<PathBuf>,

        /// Pretty-print the JSON output.
        #[arg(long, default_value_t = false)]
        pretty: bool,

        /// Print a short text summary instead of JSON.
        #[arg(long, default_value_t = false, conflicts_with = "pretty")]
        summary: bool,
    },
    /// List recently analyzed symbols, most recent first.
    Recent {
        /// Key-value store file. Defaults to the user data directory.
        #[arg(long)]
        store: Option<PathBuf>,

        /// Forget the list instead of printing it.
        #[arg(long, default_value_t = false)]
        clear: bool,
    },
    /// List the accepted period selectors.
    Periods,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            period,
            now,
            config,
            store,
            pretty,
            summary,
        } => run_analyze(&input, period, now.as_deref(), config, store, pretty, summary),
        Commands::Recent { store, clear } => run_recent(store, clear),
        Commands::Periods => {
            for period in Period::ALL_PERIODS {
                println!("{period}");
            }
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    input: &Path,
    period: Option<Period>,
    now: Option<&str>,
    config_path: Option<PathBuf>,
    store_path: Option<PathBuf>,
    pretty: bool,
    summary: bool,
) -> Result<()> {
    let app = match &config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let mut config = PipelineConfig::from(app);
    if let Some(period) = period {
        config.period = period;
    }

    let now = match now {
        Some(text) => parse_reference(text)?,
        None => Utc::now(),
    };

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read bundle {}", input.display()))?;
    let mut bundle = InputBundle::from_json(&text)
        .with_context(|| format!("Failed to parse bundle {}", input.display()))?;
    if bundle.symbol.trim().is_empty() {
        bundle.symbol = symbol_from_path(input)?;
    }

    let inputs = bundle.into_inputs();
    log::info!(
        "analyzing {} ({} price points, {} articles) for {} as of {}",
        inputs.symbol,
        inputs.primary.len(),
        inputs.articles.len(),
        config.period,
        now.date_naive()
    );
    let view = run_pipeline(&inputs, &config, now);

    let store = JsonFileStore::open(resolve_store(store_path));
    if let Err(e) = RecentSymbols::default().push(&store, &view.symbol) {
        log::warn!("could not record {} as recent: {e}", view.symbol);
    }

    if summary {
        let mut text = String::new();
        write_summary(&mut text, &view)?;
        print!("{text}");
    } else if pretty {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", serde_json::to_string(&view)?);
    }
    Ok(())
}

fn run_recent(store_path: Option<PathBuf>, clear: bool) -> Result<()> {
    let path = resolve_store(store_path);
    let store = JsonFileStore::open(&path);
    let recent = RecentSymbols::default();

    if clear {
        recent.clear(&store)?;
        println!("Cleared recent symbols in {}", path.display());
        return Ok(());
    }

    let symbols = recent.list(&store);
    if symbols.is_empty() {
        println!("No recent symbols.");
    }
    for symbol in symbols {
        println!("{symbol}");
    }
    Ok(())
}

/// `YYYY-MM-DD` (taken as midnight UTC) or a full RFC 3339 timestamp.
fn parse_reference(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => match date.and_hms_opt(0, 0, 0) {
            Some(midnight) => Ok(midnight.and_utc()),
            None => bail!("invalid --now date: {text}"),
        },
        Err(_) => bail!("--now must be YYYY-MM-DD or RFC 3339, got '{text}'"),
    }
}

fn symbol_from_path(path: &Path) -> Result<String> {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.is_empty() => Ok(stem.to_ascii_uppercase()),
        _ => bail!(
            "bundle {} has no symbol and none can be derived from its name",
            path.display()
        ),
    }
}

fn resolve_store(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("signalboard")
            .join("store.json")
    })
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn write_summary(out: &mut impl Write, view: &DerivedViewModel) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "=== {} ({}) ===", view.symbol, view.period)?;
    match (view.records.first(), view.records.last()) {
        (Some(first), Some(last)) => writeln!(
            out,
            "Records:        {} ({} to {})",
            view.records.len(),
            first.date,
            last.date
        )?,
        _ => writeln!(out, "Records:        0")?,
    }
    writeln!(
        out,
        "Last price:     {}",
        fmt_opt(view.records.iter().rev().find_map(|r| r.value("price")))
    )?;
    writeln!(out)?;
    writeln!(out, "--- Signals ---")?;
    for pattern in &view.patterns {
        writeln!(
            out,
            "Pattern:        {} ({} to {})",
            pattern.description, pattern.start_date, pattern.end_date
        )?;
    }
    if view.patterns.is_empty() {
        writeln!(out, "Pattern:        none")?;
    }
    for spike in &view.spikes {
        writeln!(
            out,
            "Volume spike:   {} price {:.2} ({:+.2}%)",
            spike.date, spike.price, spike.change_pct
        )?;
    }
    for event in &view.crosses.events {
        writeln!(
            out,
            "Cross:          {} {} {}",
            event.date,
            event.kind.label(),
            event.pair.label()
        )?;
    }
    writeln!(out)?;
    writeln!(out, "--- Indicators ---")?;
    match view.rsi {
        Some(rsi) => writeln!(out, "RSI:            {} ({})", fmt_opt(rsi.value), rsi.zone.label())?,
        None => writeln!(out, "RSI:            n/a")?,
    }
    match view.risk {
        Some(risk) => writeln!(out, "Risk:           {:.0} ({})", risk.score, risk.grade.label())?,
        None => writeln!(out, "Risk:           n/a")?,
    }
    match view.fgi {
        Some(fgi) => writeln!(out, "Fear & Greed:   {:.0} ({})", fgi.value, fgi.band.label())?,
        None => writeln!(out, "Fear & Greed:   n/a")?,
    }
    match view.recommendation {
        Some(badge) => writeln!(out, "Recommendation: {}", badge.recommendation.label())?,
        None => writeln!(out, "Recommendation: n/a")?,
    }
    writeln!(out)?;
    writeln!(out, "--- News ---")?;
    writeln!(
        out,
        "Sentiment:      {} positive / {} neutral / {} negative",
        view.sentiment.positive_count, view.sentiment.neutral_count, view.sentiment.negative_count
    )?;
    let top: Vec<String> = view
        .sentiment
        .keywords
        .iter()
        .take(5)
        .map(|k| format!("{} ({})", k.keyword, k.count))
        .collect();
    if !top.is_empty() {
        writeln!(out, "Keywords:       {}", top.join(", "))?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reference_accepts_date_and_timestamp() {
        assert_eq!(
            parse_reference("2024-03-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_reference("2024-03-01T14:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
        );
        assert!(parse_reference("March 1st").is_err());
    }

    #[test]
    fn symbol_falls_back_to_file_stem() {
        assert_eq!(symbol_from_path(Path::new("/tmp/spy.json")).unwrap(), "SPY");
    }

    #[test]
    fn summary_prints_display_labels() {
        use signalboard_core::domain::{ExternalIndicators, Recommendation, RsiZone};
        use signalboard_core::series::{SourceSchema, SourceSeries};
        use signalboard_core::AnalysisInputs;

        let mut inputs = AnalysisInputs::new("SPY", SourceSeries::empty(SourceSchema::price()));
        inputs.indicators = ExternalIndicators {
            rsi: Some(75.0),
            rsi_zone: Some(RsiZone::Overbought),
            recommendation: Some(Recommendation::StrongBuy),
            ..ExternalIndicators::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let view = run_pipeline(&inputs, &PipelineConfig::default(), now);

        let mut text = String::new();
        write_summary(&mut text, &view).unwrap();
        assert!(text.contains("RSI:            75.00 (Overbought)"));
        assert!(text.contains("Recommendation: Strong Buy"));
        assert!(!text.contains("StrongBuy"));
    }

    #[test]
    fn explicit_store_path_wins() {
        let path = PathBuf::from("/tmp/custom.json");
        assert_eq!(resolve_store(Some(path.clone())), path);
        assert!(resolve_store(None).ends_with("signalboard/store.json"));
    }
}
