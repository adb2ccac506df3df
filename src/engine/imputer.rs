//! Missing-value imputer
//!
//! Fitted statistics per column; a NaN in column `i` becomes `statistics[i]`.

use serde::{Deserialize, Serialize};

use super::{check_shape, FeatureRow, ModelError};

/// How the statistics were computed at fit time. Informational only:
/// transform always substitutes the stored statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    #[default]
    Mean,
    Median,
    MostFrequent,
    Constant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    #[serde(default)]
    pub strategy: ImputeStrategy,
    pub statistics: Vec<f64>,
}

impl Imputer {
    pub fn n_features(&self) -> usize {
        self.statistics.len()
    }

    pub fn transform(&self, row: &FeatureRow) -> Result<FeatureRow, ModelError> {
        check_shape("imputer", row, self.n_features())?;

        let mut out = row.clone();
        for (value, stat) in out.iter_mut().zip(&self.statistics) {
            if value.is_nan() {
                *value = *stat;
            }
        }
        Ok(out)
    }
}
