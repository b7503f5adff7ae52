use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;

/// Neutral reading used when a window holds neither gains nor losses.
pub const RSI_NEUTRAL: f64 = 50.0;

/// RSI (Relative Strength Index) over simple rolling means of gains and losses.
///
/// The first defined value sits at index `period`, once `period` price deltas
/// are available.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn required_samples(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let mut out = vec![None; prices.len()];
        if prices.len() < self.required_samples() {
            return out;
        }

        let gains: Vec<f64> = prices.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect();
        let losses: Vec<f64> = prices.windows(2).map(|w| (w[0] - w[1]).max(0.0)).collect();

        for (i, (g, l)) in gains
            .windows(self.period)
            .zip(losses.windows(self.period))
            .enumerate()
        {
            let avg_gain = g.iter().sum::<f64>() / self.period as f64;
            let avg_loss = l.iter().sum::<f64>() / self.period as f64;
            out[i + self.period] = Some(rsi_value(avg_gain, avg_loss));
        }

        out
    }
}

/// `100 - 100 / (1 + gain/loss)`, saturating at 100 when there are no losses
/// and falling back to [`RSI_NEUTRAL`] when the window is flat.
pub fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { RSI_NEUTRAL } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rsi_period_zero_invalid() {
        assert!(Rsi::new(0).is_err());
    }

    #[test]
    fn rsi_insufficient_data_is_undefined() {
        let rsi = Rsi::new(14).unwrap();
        assert!(rsi.calculate(&[1.0; 14]).iter().all(Option::is_none));
    }

    #[test]
    fn rsi_first_value_at_period_index() {
        let rsi = Rsi::new(3).unwrap();
        let values = rsi.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(&values[..3], &[None, None, None]);
        assert_eq!(values[3], Some(100.0));
        assert_eq!(values[4], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let rsi = Rsi::new(3).unwrap();
        let values = rsi.calculate(&[4.0, 3.0, 2.0, 1.0]);
        assert!((values[3].unwrap() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_flat_window_is_neutral() {
        let rsi = Rsi::new(14).unwrap();
        let values = rsi.calculate(&[100.0; 20]);
        assert_eq!(values[19], Some(RSI_NEUTRAL));
    }

    #[test]
    fn rsi_known_value() {
        let rsi = Rsi::new(2).unwrap();
        // deltas +2, -1 -> avg_gain = 1.0, avg_loss = 0.5, rs = 2 -> 66.67
        let values = rsi.calculate(&[10.0, 12.0, 11.0]);
        assert!((values[2].unwrap() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_window_rolls_forward() {
        let rsi = Rsi::new(2).unwrap();
        // window at index 3 holds deltas -1, -1: pure losses
        let values = rsi.calculate(&[10.0, 12.0, 11.0, 10.0]);
        assert!((values[3].unwrap() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_value_conventions() {
        assert_eq!(rsi_value(0.0, 0.0), RSI_NEUTRAL);
        assert_eq!(rsi_value(1.0, 0.0), 100.0);
        assert!((rsi_value(1.0, 1.0) - 50.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn rsi_stays_within_bounds(
            prices in proptest::collection::vec(0.01f64..1_000_000.0, 2..120),
            period in 1usize..30,
        ) {
            let rsi = Rsi::new(period).unwrap();
            for value in rsi.calculate(&prices).into_iter().flatten() {
                prop_assert!((0.0..=100.0).contains(&value));
            }
        }

        #[test]
        fn increasing_prices_read_one_hundred(
            start in 1.0f64..1_000.0,
            steps in proptest::collection::vec(0.01f64..50.0, 15..80),
        ) {
            let prices: Vec<f64> = steps
                .iter()
                .scan(start, |price, step| {
                    *price += step;
                    Some(*price)
                })
                .collect();
            let rsi = Rsi::new(14).unwrap();
            for value in rsi.calculate(&prices).into_iter().flatten() {
                prop_assert_eq!(value, 100.0);
            }
        }
    }
}
