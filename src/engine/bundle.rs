//! Bundle loader
//!
//! Reads the JSON bundle once, validates that every part agrees on the
//! feature layout, and exposes it as a [`RiskModel`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::{
    check_finite, check_shape, Classifier, FeatureRow, Imputer, ModelError, RiskModel, Scaler,
};
use crate::features::{is_known_feature, DEFAULT_FEATURE_ORDER, FEATURE_COUNT};

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("cannot read model bundle {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model bundle: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model bundle: {0}")]
    Invalid(String),
}

/// On-disk layout. Key names match the parts of the exported bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub model: Classifier,
    pub scaler: Scaler,
    pub imputer: Imputer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl ModelBundle {
    /// Explicit feature list, or the built-in default order.
    pub fn feature_order(&self) -> Vec<String> {
        match &self.features {
            Some(features) => features.clone(),
            None => DEFAULT_FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A validated bundle plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedBundle {
    bundle: ModelBundle,
    features: Vec<String>,
    pub source: String,
    pub checksum: String,
    pub loaded_at: DateTime<Utc>,
}

/// Load a bundle from disk
pub fn load_bundle(path: &Path) -> Result<LoadedBundle, BundleError> {
    tracing::info!("Loading model bundle from: {}", path.display());

    let bytes = std::fs::read(path).map_err(|source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let loaded = LoadedBundle::from_slice(&bytes, path.display().to_string())?;

    tracing::info!(
        classifier = loaded.bundle.model.kind(),
        scaler = loaded.bundle.scaler.kind(),
        checksum = %loaded.checksum,
        "Model bundle loaded successfully"
    );

    Ok(loaded)
}

impl LoadedBundle {
    /// Parse and validate raw bundle bytes.
    pub fn from_slice(bytes: &[u8], source: impl Into<String>) -> Result<Self, BundleError> {
        let bundle: ModelBundle = serde_json::from_slice(bytes)?;
        let mut loaded = Self::from_bundle(bundle, source)?;
        loaded.checksum = hex::encode(Sha256::digest(bytes));
        Ok(loaded)
    }

    /// Validate an in-memory bundle.
    pub fn from_bundle(
        bundle: ModelBundle,
        source: impl Into<String>,
    ) -> Result<Self, BundleError> {
        let features = bundle.feature_order();
        validate(&bundle, &features).map_err(BundleError::Invalid)?;

        if bundle.features.is_none() {
            tracing::warn!("Bundle has no feature list, using default column order");
        }

        Ok(Self {
            bundle,
            features,
            source: source.into(),
            checksum: String::new(),
            loaded_at: Utc::now(),
        })
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }
}

fn validate(bundle: &ModelBundle, features: &[String]) -> Result<(), String> {
    if features.len() != FEATURE_COUNT {
        return Err(format!(
            "features: expected {} names, got {}",
            FEATURE_COUNT,
            features.len()
        ));
    }

    let mut seen = HashSet::new();
    for name in features {
        if !is_known_feature(name) {
            return Err(format!("features: unknown feature name '{}'", name));
        }
        if !seen.insert(name.as_str()) {
            return Err(format!("features: duplicate feature name '{}'", name));
        }
    }

    let n = features.len();
    let mut widths = vec![
        ("imputer.statistics", bundle.imputer.n_features()),
        ("model", bundle.model.n_features()),
    ];
    widths.extend(bundle.scaler.vectors().iter().map(|(name, v)| (*name, v.len())));
    for (part, width) in widths {
        if width != n {
            return Err(format!("{}: expected {} columns, got {}", part, n, width));
        }
    }

    if let Some(idx) = bundle.imputer.statistics.iter().position(|v| !v.is_finite()) {
        return Err(format!(
            "imputer.statistics: value for '{}' is not finite",
            features[idx]
        ));
    }

    for (part, values) in bundle.scaler.vectors() {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(format!("{}: values must be finite", part));
        }
    }

    bundle.model.validate().map_err(|e| format!("model: {}", e))
}

impl RiskModel for LoadedBundle {
    fn feature_order(&self) -> &[String] {
        &self.features
    }

    fn impute(&self, row: &FeatureRow) -> Result<FeatureRow, ModelError> {
        self.bundle.imputer.transform(row)
    }

    fn scale(&self, row: &FeatureRow) -> Result<FeatureRow, ModelError> {
        check_shape("scaler", row, self.features.len())?;
        check_finite("scaler", row, &self.features)?;
        self.bundle.scaler.transform(row)
    }

    fn predict_probability(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        check_shape("classifier", row, self.features.len())?;
        check_finite("classifier", row, &self.features)?;
        self.bundle.model.predict_probability(row)
    }

    fn describe(&self) -> String {
        format!("{} ({} scaler)", self.bundle.model.kind(), self.bundle.scaler.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use std::io::Write;

    fn bundle_json(features: Option<Vec<&str>>) -> serde_json::Value {
        let mut value = serde_json::json!({
            "model": { "kind": "logistic_regression", "coef": vec![0.1; 12], "intercept": 0.0 },
            "scaler": { "kind": "standard", "mean": vec![0.0; 12], "scale": vec![1.0; 12] },
            "imputer": { "strategy": "median", "statistics": vec![1.0; 12] },
        });
        if let Some(features) = features {
            value["features"] = serde_json::json!(features);
        }
        value
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bundle_json(None).to_string().as_bytes()).unwrap();

        let loaded = load_bundle(file.path()).unwrap();
        assert_eq!(loaded.feature_order().len(), FEATURE_COUNT);
        assert_eq!(loaded.feature_order()[0], "Age");
        assert_eq!(loaded.checksum.len(), 64);
        assert_eq!(loaded.describe(), "logistic_regression (standard scaler)");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_bundle(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, BundleError::Io { .. }));
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn test_missing_part_names_the_key() {
        let mut value = bundle_json(None);
        value.as_object_mut().unwrap().remove("scaler");
        let err = LoadedBundle::from_slice(value.to_string().as_bytes(), "mem").unwrap_err();
        assert!(matches!(err, BundleError::Parse(_)));
        assert!(err.to_string().contains("scaler"));
    }

    #[test]
    fn test_malformed_json() {
        let err = LoadedBundle::from_slice(b"not json", "mem").unwrap_err();
        assert!(matches!(err, BundleError::Parse(_)));
    }

    #[test]
    fn test_custom_feature_order() {
        let mut order: Vec<&str> = DEFAULT_FEATURE_ORDER.to_vec();
        order.reverse();
        let value = bundle_json(Some(order));
        let loaded = LoadedBundle::from_slice(value.to_string().as_bytes(), "mem").unwrap();
        assert_eq!(loaded.feature_order()[0], "AAT_Level");
        assert_eq!(loaded.feature_order()[11], "Age");
    }

    #[test]
    fn test_rejects_bad_feature_lists() {
        let short = bundle_json(Some(DEFAULT_FEATURE_ORDER[..11].to_vec()));
        let err = LoadedBundle::from_slice(short.to_string().as_bytes(), "mem").unwrap_err();
        assert!(err.to_string().contains("expected 12 names"));

        let mut unknown = DEFAULT_FEATURE_ORDER.to_vec();
        unknown[3] = "Heart_Rate";
        let value = bundle_json(Some(unknown));
        let err = LoadedBundle::from_slice(value.to_string().as_bytes(), "mem").unwrap_err();
        assert!(err.to_string().contains("Heart_Rate"));

        let mut dup = DEFAULT_FEATURE_ORDER.to_vec();
        dup[1] = "Age";
        let value = bundle_json(Some(dup));
        let err = LoadedBundle::from_slice(value.to_string().as_bytes(), "mem").unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_rejects_width_mismatch() {
        let mut value = bundle_json(None);
        value["model"]["coef"] = serde_json::json!(vec![0.1; 11]);
        let err = LoadedBundle::from_slice(value.to_string().as_bytes(), "mem").unwrap_err();
        assert!(err.to_string().contains("model: expected 12 columns, got 11"));
    }

    #[test]
    fn test_rejects_null_statistic() {
        let mut value = bundle_json(None);
        value["imputer"]["statistics"][4] = serde_json::Value::Null;
        // null is not an f64, so this fails while parsing
        assert!(LoadedBundle::from_slice(value.to_string().as_bytes(), "mem").is_err());
    }

    #[test]
    fn test_nan_blocked_before_classifier() {
        let loaded =
            LoadedBundle::from_slice(bundle_json(None).to_string().as_bytes(), "mem").unwrap();
        let mut row = Array1::from_elem(12, 0.5);
        row[2] = f64::NAN;

        let err = loaded.scale(&row).unwrap_err();
        assert_eq!(
            err,
            ModelError::NonFinite { stage: "scaler", feature: "Smoking_Pack_Years".to_string() }
        );
        assert!(loaded.predict_probability(&row).is_err());
    }
}
