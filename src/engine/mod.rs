//! Inference Engine - fitted model bundle
//!
//! The bundle is a JSON export of three fitted estimators (imputer, scaler,
//! classifier) plus the column order they were trained on. The rest of the
//! crate only sees it through [`RiskModel`], so handlers can be exercised
//! against a fake model.

pub mod bundle;
pub mod classifier;
pub mod imputer;
pub mod scaler;

use ndarray::Array1;
use thiserror::Error;

pub use bundle::{load_bundle, BundleError, LoadedBundle, ModelBundle};
pub use classifier::Classifier;
pub use imputer::Imputer;
pub use scaler::Scaler;

/// One ordered numeric record aligned to the bundle's feature order.
/// Missing values are `f64::NAN`.
pub type FeatureRow = Array1<f64>;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("{stage}: expected {expected} features, got {actual}")]
    ShapeMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{stage}: input contains NaN or infinity (feature '{feature}')")]
    NonFinite { stage: &'static str, feature: String },

    #[error("classifier returned probability {0} outside [0, 1]")]
    InvalidProbability(f64),
}

// ============================================================================
// CAPABILITY TRAIT
// ============================================================================

/// Narrow view over a fitted bundle.
///
/// Implementations are immutable after construction; every method takes
/// `&self` and may be called from many request handlers at once.
pub trait RiskModel: Send + Sync {
    /// Column names, in the order rows must be laid out.
    fn feature_order(&self) -> &[String];

    /// Fill missing (NaN) values using fitted statistics.
    fn impute(&self, row: &FeatureRow) -> Result<FeatureRow, ModelError>;

    /// Normalize an imputed row using fitted statistics.
    fn scale(&self, row: &FeatureRow) -> Result<FeatureRow, ModelError>;

    /// Positive-class probability for a scaled row.
    fn predict_probability(&self, row: &FeatureRow) -> Result<f64, ModelError>;

    /// Short classifier description for status endpoints.
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

/// Ensure a row has exactly `expected` columns.
pub(crate) fn check_shape(
    stage: &'static str,
    row: &FeatureRow,
    expected: usize,
) -> Result<(), ModelError> {
    if row.len() != expected {
        return Err(ModelError::ShapeMismatch {
            stage,
            expected,
            actual: row.len(),
        });
    }
    Ok(())
}

/// Reject rows carrying NaN/inf into a stage that cannot handle them.
pub(crate) fn check_finite(
    stage: &'static str,
    row: &FeatureRow,
    names: &[String],
) -> Result<(), ModelError> {
    match row.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(ModelError::NonFinite {
            stage,
            feature: names
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("column {}", idx)),
        }),
        None => Ok(()),
    }
}
