use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;

/// Simple Moving Average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn required_samples(&self) -> usize {
        self.period
    }

    fn calculate(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let mut out = vec![None; prices.len()];
        for (i, window) in prices.windows(self.period).enumerate() {
            out[i + self.period - 1] = Some(window.iter().sum::<f64>() / self.period as f64);
        }
        out
    }
}

/// Exponential Moving Average seeded from the first price.
///
/// `ema[0] = x[0]`, then `ema[i] = ema[i-1] + alpha * (x[i] - ema[i-1])` with
/// `alpha = 2 / (span + 1)`. Defined at every index of a non-empty input.
pub struct Ema {
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Result<Self, Report<IndicatorError>> {
        if span == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "span must be > 0".into(),
            });
        }
        Ok(Self { span })
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }

    /// Plain-valued EMA, same length as `prices`.
    pub fn calculate_values(&self, prices: &[f64]) -> Vec<f64> {
        let alpha = self.alpha();
        let mut out = Vec::with_capacity(prices.len());
        let mut last: Option<f64> = None;
        for &price in prices {
            // Incremental form keeps a constant input exactly constant.
            let ema = match last {
                Some(prev) => prev + alpha * (price - prev),
                None => price,
            };
            last = Some(ema);
            out.push(ema);
        }
        out
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        "ema"
    }

    fn required_samples(&self) -> usize {
        self.span
    }

    fn calculate(&self, prices: &[f64]) -> Vec<Option<f64>> {
        self.calculate_values(prices).into_iter().map(Some).collect()
    }
}
