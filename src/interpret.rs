pub mod narrative;

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::config::InterpretationConfig;
use crate::indicator::IndicatorSnapshot;
use crate::indicator::fibonacci::{FibLevel, FibonacciLevels};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overbought => write!(f, "overbought"),
            Self::Oversold => write!(f, "oversold"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// MACD line relative to its signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Short moving average relative to the long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaTrend {
    Bullish,
    Bearish,
    Consolidation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandPosition {
    AboveUpper,
    Inside,
    BelowLower,
}

/// Where the price sits among the Fibonacci levels.
#[derive(Debug, Clone, PartialEq)]
pub enum FibBracket {
    Between {
        support: FibLevel,
        resistance: FibLevel,
    },
    /// No level strictly above the price.
    NewHigh { support: Option<FibLevel> },
    /// No level strictly below the price.
    NewLow { resistance: Option<FibLevel> },
    /// Every level equals the price (zero-width range).
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outlook {
    UpsideContinuation,
    AwaitConfirmation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpretationResult {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub crossover: Option<Crossover>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub ma_trend: Option<MaTrend>,
    pub band_position: Option<BandPosition>,
    pub nearest_level: Option<FibLevel>,
    pub bracket: FibBracket,
    pub outlook: Outlook,
}

/// Both thresholds are inclusive: `rsi >= overbought`, `rsi <= oversold`.
pub fn rsi_zone(rsi: f64, thresholds: &InterpretationConfig) -> RsiZone {
    if rsi >= thresholds.overbought {
        RsiZone::Overbought
    } else if rsi <= thresholds.oversold {
        RsiZone::Oversold
    } else {
        RsiZone::Neutral
    }
}

pub fn crossover(macd: f64, signal: f64) -> Crossover {
    match macd.partial_cmp(&signal) {
        Some(Ordering::Greater) => Crossover::Bullish,
        Some(Ordering::Less) => Crossover::Bearish,
        _ => Crossover::Neutral,
    }
}

pub fn ma_trend(short: f64, long: f64) -> MaTrend {
    match short.partial_cmp(&long) {
        Some(Ordering::Greater) => MaTrend::Bullish,
        Some(Ordering::Less) => MaTrend::Bearish,
        _ => MaTrend::Consolidation,
    }
}

pub fn band_position(price: f64, upper: f64, lower: f64) -> BandPosition {
    if price > upper {
        BandPosition::AboveUpper
    } else if price < lower {
        BandPosition::BelowLower
    } else {
        BandPosition::Inside
    }
}

/// Level closest to `price`; ties go to the lower ratio.
pub fn nearest_level(levels: &FibonacciLevels, price: f64) -> Option<&FibLevel> {
    levels.levels().iter().fold(None, |best: Option<&FibLevel>, level| {
        match best {
            Some(b) if (b.price - price).abs() <= (level.price - price).abs() => Some(b),
            _ => Some(level),
        }
    })
}

pub fn bracket(levels: &FibonacciLevels, price: f64) -> FibBracket {
    let support = levels
        .levels()
        .iter()
        .filter(|l| l.price < price)
        .max_by(|a, b| a.price.total_cmp(&b.price))
        .cloned();
    let resistance = levels
        .levels()
        .iter()
        .filter(|l| l.price > price)
        .min_by(|a, b| a.price.total_cmp(&b.price))
        .cloned();

    match (support, resistance) {
        (Some(support), Some(resistance)) => FibBracket::Between {
            support,
            resistance,
        },
        (None, None) => FibBracket::Flat,
        (support, None) => FibBracket::NewHigh { support },
        (None, resistance) => FibBracket::NewLow { resistance },
    }
}

/// Advisory template choice, not a forecast: upside continuation only when RSI
/// is known and not overbought, MACD is above its signal, and price is above
/// the short moving average.
pub fn outlook(
    rsi_zone: Option<RsiZone>,
    crossover: Option<Crossover>,
    price: f64,
    sma_short: Option<f64>,
) -> Outlook {
    let rsi_ok = matches!(rsi_zone, Some(zone) if zone != RsiZone::Overbought);
    let macd_ok = crossover == Some(Crossover::Bullish);
    let above_ma = sma_short.is_some_and(|ma| price > ma);
    if rsi_ok && macd_ok && above_ma {
        Outlook::UpsideContinuation
    } else {
        Outlook::AwaitConfirmation
    }
}

/// Categorical reading of the latest indicator row.
pub fn interpret(
    latest: &IndicatorSnapshot,
    price: f64,
    timestamp: DateTime<Utc>,
    levels: &FibonacciLevels,
    thresholds: &InterpretationConfig,
) -> InterpretationResult {
    let zone = latest.rsi.map(|rsi| rsi_zone(rsi, thresholds));
    let cross = latest
        .macd
        .zip(latest.macd_signal)
        .map(|(m, s)| crossover(m, s));
    let trend = latest
        .sma_short
        .zip(latest.sma_long)
        .map(|(short, long)| ma_trend(short, long));
    let band = latest
        .bb_upper
        .zip(latest.bb_lower)
        .map(|(upper, lower)| band_position(price, upper, lower));

    InterpretationResult {
        price,
        timestamp,
        rsi: latest.rsi,
        rsi_zone: zone,
        macd: latest.macd,
        macd_signal: latest.macd_signal,
        crossover: cross,
        sma_short: latest.sma_short,
        sma_long: latest.sma_long,
        ma_trend: trend,
        band_position: band,
        nearest_level: nearest_level(levels, price).cloned(),
        bracket: bracket(levels, price),
        outlook: outlook(zone, cross, price, latest.sma_short),
    }
}
