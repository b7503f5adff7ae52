use std::cmp::Ordering;

use error_stack::{Report, bail};

use crate::config::StdDevKind;
use crate::error::IndicatorError;
use crate::indicator::Indicator;

#[derive(Debug, Clone)]
pub struct Bands {
    pub upper: Vec<Option<f64>>,
    pub mid: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
    std_dev: StdDevKind,
}

impl BollingerBands {
    pub fn new(
        period: usize,
        std_dev_multiplier: f64,
        std_dev: StdDevKind,
    ) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        if std_dev == StdDevKind::Sample && period < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "sample standard deviation needs period >= 2".into(),
            });
        }
        // NaN compares as None and is rejected too
        if std_dev_multiplier.partial_cmp(&0.0) != Some(Ordering::Greater) {
            bail!(IndicatorError::InvalidParameter {
                name: "std_dev_multiplier must be > 0".into(),
            });
        }
        Ok(Self {
            period,
            std_dev_multiplier,
            std_dev,
        })
    }

    pub fn calculate_bands(&self, prices: &[f64]) -> Bands {
        let len = prices.len();
        let mut bands = Bands {
            upper: vec![None; len],
            mid: vec![None; len],
            lower: vec![None; len],
        };

        let divisor = match self.std_dev {
            StdDevKind::Sample => (self.period - 1) as f64,
            StdDevKind::Population => self.period as f64,
        };

        for (i, window) in prices.windows(self.period).enumerate() {
            let idx = i + self.period - 1;
            let mid = window.iter().sum::<f64>() / self.period as f64;
            let variance = window.iter().map(|&p| (p - mid).powi(2)).sum::<f64>() / divisor;
            let width = self.std_dev_multiplier * variance.max(0.0).sqrt();
            bands.mid[idx] = Some(mid);
            bands.upper[idx] = Some(mid + width);
            bands.lower[idx] = Some(mid - width);
        }

        bands
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn required_samples(&self) -> usize {
        self.period
    }

    /// Returns middle band (SMA) values only.
    fn calculate(&self, prices: &[f64]) -> Vec<Option<f64>> {
        self.calculate_bands(prices).mid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_period_zero_invalid() {
        assert!(BollingerBands::new(0, 2.0, StdDevKind::Population).is_err());
    }

    #[test]
    fn bollinger_sample_needs_two_points() {
        assert!(BollingerBands::new(1, 2.0, StdDevKind::Sample).is_err());
        assert!(BollingerBands::new(1, 2.0, StdDevKind::Population).is_ok());
    }

    #[test]
    fn bollinger_negative_multiplier_invalid() {
        assert!(BollingerBands::new(20, -1.0, StdDevKind::Sample).is_err());
        assert!(BollingerBands::new(20, f64::NAN, StdDevKind::Sample).is_err());
    }

    #[test]
    fn bollinger_leading_entries_undefined() {
        let bb = BollingerBands::new(5, 2.0, StdDevKind::Sample).unwrap();
        let bands = bb.calculate_bands(&[1.0; 6]);
        assert!(bands.mid[..4].iter().all(Option::is_none));
        assert!(bands.mid[4].is_some());
    }

    #[test]
    fn bollinger_flat_prices_zero_width() {
        let bb = BollingerBands::new(3, 2.0, StdDevKind::Sample).unwrap();
        let bands = bb.calculate_bands(&[10.0_f64; 5]);
        for i in 2..5 {
            assert!((bands.upper[i].unwrap() - 10.0).abs() < 1e-9);
            assert!((bands.mid[i].unwrap() - 10.0).abs() < 1e-9);
            assert!((bands.lower[i].unwrap() - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn bollinger_sample_vs_population_width() {
        let prices = [1.0, 2.0, 3.0];
        // deviations -1, 0, 1 -> sum of squares 2
        let sample = BollingerBands::new(3, 1.0, StdDevKind::Sample)
            .unwrap()
            .calculate_bands(&prices);
        let population = BollingerBands::new(3, 1.0, StdDevKind::Population)
            .unwrap()
            .calculate_bands(&prices);
        assert!((sample.upper[2].unwrap() - 3.0).abs() < 1e-9);
        assert!((population.upper[2].unwrap() - (2.0 + (2.0_f64 / 3.0).sqrt())).abs() < 1e-9);
    }

    #[test]
    fn bollinger_bands_symmetry() {
        let bb = BollingerBands::new(3, 2.0, StdDevKind::Sample).unwrap();
        let bands = bb.calculate_bands(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        for i in 2..5 {
            let (upper, mid, lower) = (
                bands.upper[i].unwrap(),
                bands.mid[i].unwrap(),
                bands.lower[i].unwrap(),
            );
            assert!((upper - mid - (mid - lower)).abs() < 1e-9);
        }
    }
}
