use error_stack::{Report, bail};

use crate::error::IndicatorError;

/// Standard retracement ratios, shallowest first.
pub const DEFAULT_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub struct FibLevel {
    pub ratio: f64,
    /// Percentage label, e.g. `"61.8%"`.
    pub label: String,
    pub price: f64,
}

/// Retracement levels over the whole observed close range.
///
/// Levels are ordered by ascending ratio, so prices are non-increasing from
/// the high (`0.0%`) down to the low (`100.0%`).
#[derive(Debug, Clone, PartialEq)]
pub struct FibonacciLevels {
    high: f64,
    low: f64,
    levels: Vec<FibLevel>,
}

impl FibonacciLevels {
    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn levels(&self) -> &[FibLevel] {
        &self.levels
    }

    #[allow(dead_code)]
    pub fn level(&self, label: &str) -> Option<&FibLevel> {
        self.levels.iter().find(|l| l.label == label)
    }
}

pub struct Fibonacci {
    ratios: Vec<f64>,
}

impl Fibonacci {
    /// Ratios may come in any order. They are sorted, and ratios sharing a
    /// label keep only the smallest, except that 1.0 always survives.
    pub fn new(ratios: &[f64]) -> Result<Self, Report<IndicatorError>> {
        if ratios.is_empty() {
            bail!(IndicatorError::InvalidParameter {
                name: "at least one ratio is required".into(),
            });
        }
        if ratios.iter().any(|r| !(0.0..=1.0).contains(r)) {
            bail!(IndicatorError::InvalidParameter {
                name: "ratios must lie within 0.0..=1.0".into(),
            });
        }
        let mut ratios = ratios.to_vec();
        ratios.sort_by(f64::total_cmp);
        ratios.dedup_by(|later, kept| {
            if label(*later) != label(*kept) {
                return false;
            }
            // 1.0 pins the level exactly to the low
            if *later == 1.0 {
                *kept = 1.0;
            }
            true
        });
        Ok(Self { ratios })
    }

    /// Levels from the global max/min of `closes`.
    ///
    /// `None` for an empty slice or when the range is not finite.
    pub fn levels(&self, closes: &[f64]) -> Option<FibonacciLevels> {
        let (high, low) = closes.iter().fold(None, |acc: Option<(f64, f64)>, &c| {
            Some(match acc {
                Some((hi, lo)) => (hi.max(c), lo.min(c)),
                None => (c, c),
            })
        })?;
        let range = high - low;
        if !range.is_finite() {
            return None;
        }

        let levels = self
            .ratios
            .iter()
            .map(|&ratio| {
                let price = if ratio == 1.0 {
                    low
                } else {
                    (high - ratio * range).max(low).min(high)
                };
                FibLevel {
                    ratio,
                    label: label(ratio),
                    price,
                }
            })
            .collect();

        Some(FibonacciLevels { high, low, levels })
    }
}

fn label(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

impl Default for Fibonacci {
    fn default() -> Self {
        Self {
            ratios: DEFAULT_RATIOS.to_vec(),
        }
    }
}
