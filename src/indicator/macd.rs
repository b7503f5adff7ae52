use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::ma::Ema;

/// MACD line, signal line and histogram, each aligned with the input prices.
#[derive(Debug, Clone)]
pub struct MacdLines {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all periods must be > 0".into(),
            });
        }
        if fast_period >= slow_period {
            bail!(IndicatorError::InvalidParameter {
                name: "fast_period must be < slow_period".into(),
            });
        }
        Ok(Self {
            fast: Ema::new(fast_period)?,
            slow: Ema::new(slow_period)?,
            signal: Ema::new(signal_period)?,
            slow_period,
            signal_period,
        })
    }

    pub fn calculate_full(&self, prices: &[f64]) -> MacdLines {
        let fast = self.fast.calculate_values(prices);
        let slow = self.slow.calculate_values(prices);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = self.signal.calculate_values(&macd);
        let histogram = macd.iter().zip(&signal).map(|(m, s)| Some(m - s)).collect();

        MacdLines {
            macd: macd.into_iter().map(Some).collect(),
            signal: signal.into_iter().map(Some).collect(),
            histogram,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn required_samples(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    /// Returns MACD line values only.
    fn calculate(&self, prices: &[f64]) -> Vec<Option<f64>> {
        self.calculate_full(prices).macd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_invalid_fast_ge_slow() {
        assert!(Macd::new(26, 12, 9).is_err());
        assert!(Macd::new(12, 12, 9).is_err());
    }

    #[test]
    fn macd_period_zero_invalid() {
        assert!(Macd::new(0, 26, 9).is_err());
        assert!(Macd::new(12, 26, 0).is_err());
    }

    #[test]
    fn macd_flat_prices_returns_zero() {
        let macd = Macd::new(12, 26, 9).unwrap();
        let lines = macd.calculate_full(&[10.0_f64; 40]);
        for ((m, s), h) in lines.macd.iter().zip(&lines.signal).zip(&lines.histogram) {
            assert_eq!(*m, Some(0.0));
            assert_eq!(*s, Some(0.0));
            assert_eq!(*h, Some(0.0));
        }
    }

    #[test]
    fn macd_rising_prices_positive() {
        let macd = Macd::new(3, 5, 3).unwrap();
        let closes: Vec<f64> = (1..=30).map(f64::from).collect();
        let lines = macd.calculate_full(&closes);
        let last_macd = lines.macd[29].unwrap();
        let last_signal = lines.signal[29].unwrap();
        assert!(last_macd > 0.0);
        // Signal lags a rising MACD line.
        assert!(last_macd > last_signal);
    }

    #[test]
    fn macd_matches_ema_difference() {
        let macd = Macd::new(2, 4, 3).unwrap();
        let closes = [1.0, 3.0, 2.0, 5.0];
        let fast = Ema::new(2).unwrap().calculate_values(&closes);
        let slow = Ema::new(4).unwrap().calculate_values(&closes);
        let lines = macd.calculate_full(&closes);
        for i in 0..closes.len() {
            assert!((lines.macd[i].unwrap() - (fast[i] - slow[i])).abs() < 1e-12);
        }
    }

    #[test]
    fn macd_lines_aligned_with_input() {
        let macd = Macd::new(12, 26, 9).unwrap();
        let lines = macd.calculate_full(&[1.0, 2.0, 3.0]);
        assert_eq!(lines.macd.len(), 3);
        assert_eq!(lines.signal.len(), 3);
        assert_eq!(lines.histogram.len(), 3);
        assert_eq!(macd.required_samples(), 34);
    }
}
