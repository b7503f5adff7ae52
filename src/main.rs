mod config;
mod error;
mod export;
mod indicator;
mod interpret;
mod model;
mod pipeline;
mod report;
mod source;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use model::{SeriesQuery, SourceKind};
use report::ReportSink;
use report::terminal::TerminalReport;
use source::PriceSource;
use source::binance::BinanceSource;
use source::coingecko::CoinGeckoSource;
use source::memo::MemoizedSource;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("analysis failed")]
    Analysis,
    #[display("export failed")]
    Export,
}

#[derive(Parser)]
#[command(name = "coin-analyzer", about = "Technical analysis report for a crypto asset")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Price source: binance | coingecko
    #[arg(long)]
    source: Option<String>,

    /// Trading pair (Binance) or coin id (CoinGecko)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Candle interval, e.g. 1h, 4h, 1d
    #[arg(short, long)]
    interval: Option<String>,

    /// Number of candles to request (50-500)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Days of history to request (30-180)
    #[arg(short, long)]
    days: Option<u32>,

    /// Write the series and indicator columns to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = load_config(&cli).change_context(AppError::Config)?;

    init_tracing(&config);

    let source = build_source(&config).change_context(AppError::Config)?;
    let query = build_query(&config);

    let analysis = pipeline::run(
        source.as_ref(),
        &query,
        &config.indicators,
        &config.interpretation,
    )
    .await
    .change_context(AppError::Analysis)?;

    TerminalReport.publish(&analysis);

    if let Some(path) = &cli.export {
        export::export_to_path(path, &analysis.series, &analysis.indicators)
            .change_context(AppError::Export)?;
        info!(path = %path.display(), rows = analysis.series.len(), "csv export written");
    }

    Ok(())
}

/// Read the config file, apply CLI overrides and validate the result.
///
/// A missing file is tolerated only at the default path.
fn load_config(cli: &Cli) -> Result<AppConfig, Report<error::ConfigError>> {
    let mut config = if cli.config == Path::new(DEFAULT_CONFIG_PATH) && !cli.config.exists() {
        AppConfig::default()
    } else {
        config::load(&cli.config)?
    };

    let source = &mut config.source;
    if let Some(kind) = &cli.source {
        source.kind = kind.clone();
    }
    if let Some(symbol) = &cli.symbol {
        source.symbol = symbol.clone();
    }
    if let Some(interval) = &cli.interval {
        source.interval = interval.clone();
    }
    if let Some(limit) = cli.limit {
        source.limit = limit;
    }
    if let Some(days) = cli.days {
        source.days = days;
    }

    config::validate(&config)?;
    Ok(config)
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

fn build_source(config: &AppConfig) -> Result<Box<dyn PriceSource>, Report<error::SourceError>> {
    let settings = &config.source;
    let timeout = Duration::from_secs(settings.timeout_secs);
    let ttl = Duration::from_secs(settings.cache_ttl_secs);

    let source: Box<dyn PriceSource> = match (settings.source_kind(), ttl.is_zero()) {
        (Some(SourceKind::CoinGecko), true) => {
            Box::new(CoinGeckoSource::new(&settings.currency, timeout)?)
        }
        (Some(SourceKind::CoinGecko), false) => Box::new(MemoizedSource::new(
            CoinGeckoSource::new(&settings.currency, timeout)?,
            ttl,
        )),
        (_, true) => Box::new(BinanceSource::new(timeout)?),
        (_, false) => Box::new(MemoizedSource::new(BinanceSource::new(timeout)?, ttl)),
    };
    Ok(source)
}

fn build_query(config: &AppConfig) -> SeriesQuery {
    let settings = &config.source;
    match (settings.source_kind(), settings.candle_interval()) {
        (Some(SourceKind::CoinGecko), _) => SeriesQuery::days(&settings.symbol, settings.days),
        (_, Some(interval)) => SeriesQuery::candles(&settings.symbol, interval, settings.limit),
        (_, None) => SeriesQuery::candles(
            &settings.symbol,
            model::Interval::Day1,
            settings.limit,
        ),
    }
}
