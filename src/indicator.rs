pub mod bollinger;
pub mod fibonacci;
pub mod ma;
pub mod macd;
pub mod rsi;

use error_stack::Report;
use tracing::debug;

use crate::config::IndicatorsConfig;
use crate::error::IndicatorError;
use crate::model::PriceSeries;

use bollinger::BollingerBands;
use ma::Sma;
use macd::Macd;
use rsi::Rsi;

/// A technical analysis indicator over a price slice.
///
/// Prices must be in ascending chronological order (oldest first). The output
/// is aligned with the input: one entry per price, `None` where the indicator
/// does not yet have enough history.
pub trait Indicator: Send {
    /// Unique name of this indicator (e.g., "rsi", "sma").
    fn name(&self) -> &str;

    /// Number of samples needed before the output is fully warmed up.
    fn required_samples(&self) -> usize;

    fn calculate(&self, prices: &[f64]) -> Vec<Option<f64>>;
}

/// Every per-sample indicator column, aligned 1:1 with the source series.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub sma_short: Vec<Option<f64>>,
    pub sma_long: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_histogram: Vec<Option<f64>>,
    pub bb_mid: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
}

/// One row of an [`IndicatorSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
}

impl IndicatorSet {
    pub fn len(&self) -> usize {
        self.sma_short.len()
    }

    pub fn snapshot(&self, index: usize) -> Option<IndicatorSnapshot> {
        if index >= self.len() {
            return None;
        }
        Some(IndicatorSnapshot {
            sma_short: self.sma_short[index],
            sma_long: self.sma_long[index],
            rsi: self.rsi[index],
            macd: self.macd[index],
            macd_signal: self.macd_signal[index],
            macd_histogram: self.macd_histogram[index],
            bb_mid: self.bb_mid[index],
            bb_upper: self.bb_upper[index],
            bb_lower: self.bb_lower[index],
        })
    }

    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        self.len().checked_sub(1).and_then(|i| self.snapshot(i))
    }
}

/// Compute every indicator column for `series`.
///
/// Short history is not an error: affected entries are left `None`.
pub fn compute(
    series: &PriceSeries,
    config: &IndicatorsConfig,
) -> Result<IndicatorSet, Report<IndicatorError>> {
    let closes = series.closes();

    let sma_short = Sma::new(config.sma_short)?;
    let sma_long = Sma::new(config.sma_long)?;
    let rsi = Rsi::new(config.rsi_period)?;
    let macd = Macd::new(config.macd_fast, config.macd_slow, config.macd_signal)?;
    let bollinger = BollingerBands::new(
        config.bollinger_period,
        config.bollinger_multiplier,
        config.bollinger_std,
    )?;

    let indicators: [&dyn Indicator; 5] = [&sma_short, &sma_long, &rsi, &macd, &bollinger];
    for indicator in indicators {
        if closes.len() < indicator.required_samples() {
            debug!(
                symbol = %series.identifier(),
                indicator = indicator.name(),
                required = indicator.required_samples(),
                available = closes.len(),
                "insufficient history, leading values undefined"
            );
        }
    }

    let macd_lines = macd.calculate_full(&closes);
    let bands = bollinger.calculate_bands(&closes);

    Ok(IndicatorSet {
        sma_short: sma_short.calculate(&closes),
        sma_long: sma_long.calculate(&closes),
        rsi: rsi.calculate(&closes),
        macd: macd_lines.macd,
        macd_signal: macd_lines.signal,
        macd_histogram: macd_lines.histogram,
        bb_mid: bands.mid,
        bb_upper: bands.upper,
        bb_lower: bands.lower,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::series_from_closes;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let v = actual.expect("value should be defined");
        assert!((v - expected).abs() < 1e-9, "expected {expected}, got {v}");
    }

    #[test]
    fn every_column_is_aligned_with_series() {
        let series = series_from_closes(&(1..=30).map(f64::from).collect::<Vec<_>>());
        let set = compute(&series, &IndicatorsConfig::default()).unwrap();
        assert_eq!(set.len(), 30);
        for column in [
            &set.sma_short,
            &set.sma_long,
            &set.rsi,
            &set.macd,
            &set.macd_signal,
            &set.macd_histogram,
            &set.bb_mid,
            &set.bb_upper,
            &set.bb_lower,
        ] {
            assert_eq!(column.len(), 30);
        }
    }

    #[test]
    fn short_history_degrades_to_undefined_values() {
        let series = series_from_closes(&[1.0, 2.0, 3.0]);
        let set = compute(&series, &IndicatorsConfig::default()).unwrap();
        let latest = set.latest().unwrap();
        assert_eq!(latest.sma_short, None);
        assert_eq!(latest.sma_long, None);
        assert_eq!(latest.rsi, None);
        assert_eq!(latest.bb_mid, None);
        // EMA-based lines are seeded from the first sample.
        assert!(latest.macd.is_some());
    }

    #[test]
    fn constant_series_collapses_every_indicator() {
        let series = series_from_closes(&[42.0; 250]);
        let set = compute(&series, &IndicatorsConfig::default()).unwrap();
        let latest = set.latest().unwrap();
        assert_close(latest.sma_short, 42.0);
        assert_close(latest.sma_long, 42.0);
        assert_close(latest.rsi, 50.0);
        assert_close(latest.macd, 0.0);
        assert_close(latest.macd_signal, 0.0);
        assert_close(latest.bb_mid, 42.0);
        assert_close(latest.bb_upper, 42.0);
        assert_close(latest.bb_lower, 42.0);
    }

    #[test]
    fn short_window_of_five_over_ten_to_twenty() {
        let closes: Vec<f64> = (10..=20).map(f64::from).collect();
        let series = series_from_closes(&closes);
        let config = IndicatorsConfig {
            sma_short: 5,
            sma_long: 10,
            ..IndicatorsConfig::default()
        };
        let set = compute(&series, &config).unwrap();
        assert_close(set.latest().unwrap().sma_short, 18.0);
        assert_close(set.latest().unwrap().sma_long, 15.5);
    }

    #[test]
    fn invalid_config_is_reported() {
        let series = series_from_closes(&[1.0, 2.0]);
        let config = IndicatorsConfig {
            macd_fast: 26,
            macd_slow: 12,
            ..IndicatorsConfig::default()
        };
        assert!(compute(&series, &config).is_err());
    }

    #[test]
    fn empty_series_yields_empty_set() {
        let series = series_from_closes(&[]);
        let set = compute(&series, &IndicatorsConfig::default()).unwrap();
        assert_eq!(set.len(), 0);
        assert!(set.latest().is_none());
    }
}
