//! Feature Scaler
//!
//! Standardizes each feature with `(x - mean) / std` using parameters fitted on
//! the training rows. Population std is used; a zero std is stored as 1 so
//! constant features map to 0 instead of NaN.

use serde::{Deserialize, Serialize};

use super::{FeatureVector, NormalizedVector, N_FEATURES};

/// Per-feature mean and standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: [f64; N_FEATURES],
    pub std: [f64; N_FEATURES],
}

impl FeatureScaler {
    /// Identity scaler (mean 0, std 1)
    pub fn identity() -> Self {
        Self {
            mean: [0.0; N_FEATURES],
            std: [1.0; N_FEATURES],
        }
    }

    /// Fit on training rows. An empty slice yields the identity scaler.
    pub fn fit(rows: &[FeatureVector]) -> Self {
        if rows.is_empty() {
            return Self::identity();
        }

        let n = rows.len() as f64;
        let mut mean = [0.0; N_FEATURES];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row.0.iter()) {
                *m += x;
            }
        }
        for m in mean.iter_mut() {
            *m /= n;
        }

        let mut std = [0.0; N_FEATURES];
        for row in rows {
            for i in 0..N_FEATURES {
                let d = row.0[i] - mean[i];
                std[i] += d * d;
            }
        }
        for s in std.iter_mut() {
            *s = (*s / n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { mean, std }
    }

    pub fn scale(&self, vector: &FeatureVector) -> NormalizedVector {
        let mut out = [0.0; N_FEATURES];
        for i in 0..N_FEATURES {
            out[i] = self.scale_value(i, vector.0[i]);
        }
        NormalizedVector(out)
    }

    /// Scale one raw value of `feature`
    pub fn scale_value(&self, feature: usize, value: f64) -> f64 {
        (value - self.mean[feature]) / self.std[feature]
    }

    /// Structural check used when loading an artifact
    pub fn validate(&self) -> Result<(), String> {
        for i in 0..N_FEATURES {
            if !self.mean[i].is_finite() {
                return Err(format!("scaler mean[{}] is not finite", i));
            }
            if !(self.std[i].is_finite() && self.std[i] > 0.0) {
                return Err(format!("scaler std[{}] must be finite and positive", i));
            }
        }
        Ok(())
    }
}
