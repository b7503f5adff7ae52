use std::cmp::Ordering;
use std::ops::RangeInclusive;
use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{Interval, SourceKind};

/// Candle counts accepted for exchange-style sources.
pub const LIMIT_RANGE: RangeInclusive<usize> = 50..=500;
/// Day counts accepted for aggregator-style sources.
pub const DAYS_RANGE: RangeInclusive<u32> = 30..=180;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_source_kind() -> String {
    "binance".into()
}

fn default_symbol() -> String {
    "TRXUSDT".into()
}

fn default_interval() -> String {
    "1d".into()
}

fn default_limit() -> usize {
    100
}

fn default_days() -> u32 {
    90
}

fn default_currency() -> String {
    "usd".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_sma_short() -> usize {
    50
}

fn default_sma_long() -> usize {
    200
}

fn default_rsi_period() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_multiplier() -> f64 {
    2.0
}

fn default_fibonacci_ratios() -> Vec<f64> {
    vec![0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0]
}

fn default_overbought() -> f64 {
    70.0
}

fn default_oversold() -> f64 {
    30.0
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub indicators: IndicatorsConfig,
    #[serde(default)]
    pub interpretation: InterpretationConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Accepted values: `"binance"` | `"coingecko"`
    #[serde(default = "default_source_kind")]
    pub kind: String,
    /// Trading pair for Binance (`BTCUSDT`), coin id for CoinGecko (`bitcoin`).
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Memoize fetched series for this many seconds; 0 disables.
    #[serde(default)]
    pub cache_ttl_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            symbol: default_symbol(),
            interval: default_interval(),
            limit: default_limit(),
            days: default_days(),
            currency: default_currency(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: 0,
        }
    }
}

impl SourceConfig {
    /// Parsed source kind. Only meaningful after validation.
    pub fn source_kind(&self) -> Option<SourceKind> {
        SourceKind::from_str(&self.kind)
    }

    /// Parsed candle interval. Only meaningful after validation.
    pub fn candle_interval(&self) -> Option<Interval> {
        Interval::from_str(&self.interval)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdDevKind {
    /// Divide by `n - 1`.
    #[default]
    Sample,
    /// Divide by `n`.
    Population,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorsConfig {
    #[serde(default = "default_sma_short")]
    pub sma_short: usize,
    #[serde(default = "default_sma_long")]
    pub sma_long: usize,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_multiplier")]
    pub bollinger_multiplier: f64,
    #[serde(default)]
    pub bollinger_std: StdDevKind,
    #[serde(default = "default_fibonacci_ratios")]
    pub fibonacci_ratios: Vec<f64>,
}

impl Default for IndicatorsConfig {
    fn default() -> Self {
        Self {
            sma_short: default_sma_short(),
            sma_long: default_sma_long(),
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bollinger_period: default_bollinger_period(),
            bollinger_multiplier: default_bollinger_multiplier(),
            bollinger_std: StdDevKind::default(),
            fibonacci_ratios: default_fibonacci_ratios(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterpretationConfig {
    /// RSI at or above this value is overbought.
    #[serde(default = "default_overbought")]
    pub overbought: f64,
    /// RSI at or below this value is oversold.
    #[serde(default = "default_oversold")]
    pub oversold: f64,
}

impl Default for InterpretationConfig {
    fn default() -> Self {
        Self {
            overbought: default_overbought(),
            oversold: default_oversold(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(&config.general)?;
    validate_source(&config.source)?;
    validate_indicators(&config.indicators)?;
    validate_interpretation(&config.interpretation)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(general: &GeneralConfig) -> Result<(), Report<ConfigError>> {
    if !matches!(general.log_format.as_str(), "text" | "json") {
        return Err(invalid(format!(
            "general.log_format \"{}\" must be \"text\" or \"json\"",
            general.log_format
        )));
    }
    Ok(())
}

fn validate_source(source: &SourceConfig) -> Result<(), Report<ConfigError>> {
    if source.source_kind().is_none() {
        return Err(invalid(format!(
            "source.kind: unknown source \"{}\"",
            source.kind
        )));
    }
    if source.symbol.trim().is_empty() {
        return Err(invalid("source.symbol must not be empty".into()));
    }
    if source.candle_interval().is_none() {
        return Err(invalid(format!(
            "source.interval: unknown interval \"{}\"",
            source.interval
        )));
    }
    if !LIMIT_RANGE.contains(&source.limit) {
        return Err(invalid(format!(
            "source.limit {} outside {}..={}",
            source.limit,
            LIMIT_RANGE.start(),
            LIMIT_RANGE.end()
        )));
    }
    if !DAYS_RANGE.contains(&source.days) {
        return Err(invalid(format!(
            "source.days {} outside {}..={}",
            source.days,
            DAYS_RANGE.start(),
            DAYS_RANGE.end()
        )));
    }
    if source.timeout_secs == 0 {
        return Err(invalid("source.timeout_secs must be > 0".into()));
    }
    Ok(())
}

fn validate_indicators(indicators: &IndicatorsConfig) -> Result<(), Report<ConfigError>> {
    let periods = [
        ("sma_short", indicators.sma_short),
        ("sma_long", indicators.sma_long),
        ("rsi_period", indicators.rsi_period),
        ("macd_fast", indicators.macd_fast),
        ("macd_slow", indicators.macd_slow),
        ("macd_signal", indicators.macd_signal),
        ("bollinger_period", indicators.bollinger_period),
    ];
    if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
        return Err(invalid(format!("indicators.{name} must be > 0")));
    }
    if indicators.sma_short >= indicators.sma_long {
        return Err(invalid(
            "indicators.sma_short must be < indicators.sma_long".into(),
        ));
    }
    if indicators.macd_fast >= indicators.macd_slow {
        return Err(invalid(
            "indicators.macd_fast must be < indicators.macd_slow".into(),
        ));
    }
    if indicators.bollinger_std == StdDevKind::Sample && indicators.bollinger_period < 2 {
        return Err(invalid(
            "indicators.bollinger_period must be >= 2 for sample standard deviation".into(),
        ));
    }
    // NaN compares as None and is rejected too
    if indicators.bollinger_multiplier.partial_cmp(&0.0) != Some(Ordering::Greater) {
        return Err(invalid("indicators.bollinger_multiplier must be > 0".into()));
    }
    if indicators.fibonacci_ratios.is_empty() {
        return Err(invalid("indicators.fibonacci_ratios must not be empty".into()));
    }
    if let Some(r) = indicators
        .fibonacci_ratios
        .iter()
        .find(|r| !(0.0..=1.0).contains(*r))
    {
        return Err(invalid(format!(
            "indicators.fibonacci_ratios: {r} outside 0.0..=1.0"
        )));
    }
    Ok(())
}

fn validate_interpretation(interp: &InterpretationConfig) -> Result<(), Report<ConfigError>> {
    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    if !in_range(interp.overbought) || !in_range(interp.oversold) {
        return Err(invalid(
            "interpretation thresholds must lie within 0..=100".into(),
        ));
    }
    if interp.oversold >= interp.overbought {
        return Err(invalid(
            "interpretation.oversold must be < interpretation.overbought".into(),
        ));
    }
    Ok(())
}
