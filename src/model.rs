use std::fmt;

use chrono::{DateTime, Utc};
use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// Upstream provider of price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Binance,
    CoinGecko,
}

impl SourceKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "binance" => Some(Self::Binance),
            "coingecko" => Some(Self::CoinGecko),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binance => write!(f, "binance"),
            Self::CoinGecko => write!(f, "coingecko"),
        }
    }
}

/// Candle interval accepted by exchange-style sources.
///
/// String representations match the config file and CLI format (e.g. `"1m"`, `"1w"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    Min1,
    Min5,
    Min15,
    Hour1,
    Hour4,
    Day1,
    Week1,
}

impl Interval {
    /// Parse a config-format string into an `Interval`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Self::Min1),
            "5m" => Some(Self::Min5),
            "15m" => Some(Self::Min15),
            "1h" => Some(Self::Hour1),
            "4h" => Some(Self::Hour4),
            "1d" => Some(Self::Day1),
            "1w" => Some(Self::Week1),
            _ => None,
        }
    }

    /// Return the config-format string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min1 => "1m",
            Self::Min5 => "5m",
            Self::Min15 => "15m",
            Self::Hour1 => "1h",
            Self::Hour4 => "4h",
            Self::Day1 => "1d",
            Self::Week1 => "1w",
        }
    }

    /// Return the Binance kline interval string for this interval.
    pub fn binance_interval(self) -> &'static str {
        // Binance uses the same notation as the config file.
        self.as_str()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much history to request from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    /// Exchange-style: the last `limit` candles of the given interval.
    Candles { interval: Interval, limit: usize },
    /// Aggregator-style: the last `n` days of prices.
    Days(u32),
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Candles { interval, limit } => write!(f, "{limit}x{interval}"),
            Self::Days(days) => write!(f, "{days}d"),
        }
    }
}

/// A single request for price history. Also the memoization key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesQuery {
    pub identifier: String,
    pub window: Window,
}

impl SeriesQuery {
    pub fn candles(symbol: impl Into<String>, interval: Interval, limit: usize) -> Self {
        Self {
            identifier: symbol.into(),
            window: Window::Candles { interval, limit },
        }
    }

    pub fn days(coin_id: impl Into<String>, days: u32) -> Self {
        Self {
            identifier: coin_id.into(),
            window: Window::Days(days),
        }
    }
}

/// One observation. Close-only sources leave the OHLCV extras empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceSample {
    pub fn close_only(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    pub fn ohlcv(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close,
            volume: Some(volume),
        }
    }

    fn has_ohlcv(&self) -> bool {
        self.open.is_some() && self.high.is_some() && self.low.is_some() && self.volume.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesFlavor {
    Ohlcv,
    CloseOnly,
}

/// Ordered price history for one identifier.
///
/// Timestamps are strictly increasing; this is checked on construction.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    identifier: String,
    samples: Vec<PriceSample>,
}

impl PriceSeries {
    pub fn new(
        identifier: impl Into<String>,
        samples: Vec<PriceSample>,
    ) -> Result<Self, Report<SeriesError>> {
        if let Some(index) = samples
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            bail!(SeriesError::NotIncreasing { index: index + 1 });
        }
        Ok(Self {
            identifier: identifier.into(),
            samples,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&PriceSample> {
        self.samples.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.close).collect()
    }

    pub fn flavor(&self) -> SeriesFlavor {
        if !self.samples.is_empty() && self.samples.iter().all(PriceSample::has_ohlcv) {
            SeriesFlavor::Ohlcv
        } else {
            SeriesFlavor::CloseOnly
        }
    }
}


#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn interval_round_trip() {
        let intervals = [
            ("1m", Interval::Min1),
            ("5m", Interval::Min5),
            ("15m", Interval::Min15),
            ("1h", Interval::Hour1),
            ("4h", Interval::Hour4),
            ("1d", Interval::Day1),
            ("1w", Interval::Week1),
        ];
        for (s, interval) in intervals {
            assert_eq!(Interval::from_str(s), Some(interval));
            assert_eq!(interval.as_str(), s);
        }
    }

    #[test]
    fn interval_invalid_string_returns_none() {
        assert_eq!(Interval::from_str("3m"), None);
        assert_eq!(Interval::from_str(""), None);
    }

    #[test]
    fn source_kind_display() {
        assert_eq!(SourceKind::Binance.to_string(), "binance");
        assert_eq!(SourceKind::CoinGecko.to_string(), "coingecko");
        assert_eq!(SourceKind::from_str("coingecko"), Some(SourceKind::CoinGecko));
        assert_eq!(SourceKind::from_str("kraken"), None);
    }

    #[test]
    fn series_rejects_duplicate_timestamps() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let samples = vec![
            PriceSample::close_only(t, 1.0),
            PriceSample::close_only(t + Duration::days(1), 2.0),
            PriceSample::close_only(t + Duration::days(1), 3.0),
        ];
        let err = PriceSeries::new("X", samples).unwrap_err();
        assert!(matches!(
            err.current_context(),
            SeriesError::NotIncreasing { index: 2 }
        ));
    }

    #[test]
    fn series_rejects_out_of_order_timestamps() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let samples = vec![
            PriceSample::close_only(t + Duration::days(1), 1.0),
            PriceSample::close_only(t, 2.0),
        ];
        assert!(PriceSeries::new("X", samples).is_err());
    }

    #[test]
    fn empty_series_is_constructible() {
        let series = PriceSeries::new("X", Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.latest().is_none());
        assert_eq!(series.flavor(), SeriesFlavor::CloseOnly);
    }

    #[test]
    fn flavor_detects_ohlcv() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = PriceSeries::new(
            "X",
            vec![PriceSample::ohlcv(t, 1.0, 2.0, 0.5, 1.5, 10.0)],
        )
        .unwrap();
        assert_eq!(series.flavor(), SeriesFlavor::Ohlcv);

        let closes = fixtures::series_from_closes(&[1.0, 2.0]);
        assert_eq!(closes.flavor(), SeriesFlavor::CloseOnly);
        assert_eq!(closes.closes(), vec![1.0, 2.0]);
    }

    #[test]
    fn window_display() {
        let q = SeriesQuery::candles("BTCUSDT", Interval::Hour4, 100);
        assert_eq!(q.window.to_string(), "100x4h");
        assert_eq!(SeriesQuery::days("bitcoin", 90).window.to_string(), "90d");
    }
}
