//! Standard-deviation outlier clamping.
//!
//! Coordinates are clamped into `[mean - f * std, mean + f * std]` before
//! any scale or bucket is computed, bounding the influence of a few extreme
//! values on the whole row.

use crate::error::{Error, Result};

/// Clamp configuration: the number of standard deviations kept around the mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierClamp {
    factor: f32,
}

impl OutlierClamp {
    /// Creates a clamp keeping `factor` standard deviations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] unless `factor` is finite and positive.
    pub fn new(factor: f32) -> Result<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::Config(format!(
                "std_outlier_factor must be finite and > 0, got {factor}"
            )));
        }
        Ok(Self { factor })
    }

    /// Clamp factor.
    #[must_use]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Returns `(low, high)` for `row`.
    ///
    /// Uses the sample mean and the unbiased (`n - 1`) standard deviation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `row` has fewer than two coordinates,
    /// since its standard deviation is undefined.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn bounds(&self, row: &[f32]) -> Result<(f32, f32)> {
        if row.len() < 2 {
            return Err(Error::Config(format!(
                "outlier clamping needs at least 2 coordinates per row, got {}",
                row.len()
            )));
        }

        let n = row.len() as f64;
        let mean = row.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let variance = row
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1.0);
        let spread = f64::from(self.factor) * variance.sqrt();

        Ok(((mean - spread) as f32, (mean + spread) as f32))
    }

    /// Returns a clamped copy of `row`.
    ///
    /// A NaN bound (the row holds a NaN or an infinity) turns every
    /// coordinate into NaN.
    pub fn apply(&self, row: &[f32]) -> Result<Vec<f32>> {
        let (low, high) = self.bounds(row)?;
        if low.is_nan() || high.is_nan() {
            return Ok(vec![f32::NAN; row.len()]);
        }
        Ok(row
            .iter()
            .map(|&v| {
                if v < low {
                    low
                } else if v > high {
                    high
                } else {
                    v
                }
            })
            .collect())
    }
}
