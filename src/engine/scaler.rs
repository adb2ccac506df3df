//! Feature scaler

use serde::{Deserialize, Serialize};

use super::{check_shape, FeatureRow, ModelError};

/// Fitted scaler parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },

    /// `x * scale + min` (fitted `min_` / `scale_` of a min-max scaler)
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    pub fn n_features(&self) -> usize {
        match self {
            Scaler::Standard { mean, .. } => mean.len(),
            Scaler::MinMax { min, .. } => min.len(),
        }
    }

    /// Parameter vectors, for bundle validation.
    pub(crate) fn vectors(&self) -> [(&'static str, &[f64]); 2] {
        match self {
            Scaler::Standard { mean, scale } => [
                ("scaler.mean", mean.as_slice()),
                ("scaler.scale", scale.as_slice()),
            ],
            Scaler::MinMax { min, scale } => [
                ("scaler.min", min.as_slice()),
                ("scaler.scale", scale.as_slice()),
            ],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scaler::Standard { .. } => "standard",
            Scaler::MinMax { .. } => "min_max",
        }
    }

    pub fn transform(&self, row: &FeatureRow) -> Result<FeatureRow, ModelError> {
        check_shape("scaler", row, self.n_features())?;

        let mut out = row.clone();
        match self {
            Scaler::Standard { mean, scale } => {
                for ((x, m), s) in out.iter_mut().zip(mean).zip(scale) {
                    // Constant columns were fitted with a zero scale
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    *x = (*x - m) / s;
                }
            }
            Scaler::MinMax { min, scale } => {
                for ((x, m), s) in out.iter_mut().zip(min).zip(scale) {
                    *x = *x * s + m;
                }
            }
        }
        Ok(out)
    }
}
