//! Shared application state
//!
//! The bundle is loaded once and then only read, so it is shared behind an
//! `Arc` without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::engine::{load_bundle, BundleError, LoadedBundle, RiskModel};

/// Where the model came from
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub source: String,
    pub checksum: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Latency and outcome counters
#[derive(Debug, Default)]
pub struct InferenceStats {
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
    failure_count: AtomicU64,
}

impl InferenceStats {
    pub fn record(&self, elapsed: Duration, ok: bool) {
        self.latency_sum_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inference_count(&self) -> u64 {
        self.inference_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn avg_latency_ms(&self) -> f64 {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count();
        if count > 0 {
            (sum as f64 / count as f64) / 1000.0
        } else {
            0.0
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub model: Option<Arc<dyn RiskModel>>,
    pub model_info: Option<ModelInfo>,
    pub load_error: Option<String>,
    pub stats: Arc<InferenceStats>,
}

impl AppState {
    /// State around any model implementation
    pub fn new(config: Config, model: Arc<dyn RiskModel>, info: ModelInfo) -> Self {
        Self {
            config: Arc::new(config),
            model: Some(model),
            model_info: Some(info),
            load_error: None,
            stats: Arc::new(InferenceStats::default()),
        }
    }

    pub fn from_bundle(config: Config, bundle: LoadedBundle) -> Self {
        let info = ModelInfo {
            source: bundle.source.clone(),
            checksum: Some(bundle.checksum.clone()),
            loaded_at: Some(bundle.loaded_at),
        };
        Self::new(config, Arc::new(bundle), info)
    }

    /// State without a model; `/predict` reports `reason` on every call.
    pub fn degraded(config: Config, reason: impl Into<String>) -> Self {
        Self {
            config: Arc::new(config),
            model: None,
            model_info: None,
            load_error: Some(reason.into()),
            stats: Arc::new(InferenceStats::default()),
        }
    }

    /// Load the configured bundle. Failure is fatal unless
    /// `allow_degraded_start` is set.
    pub fn load(config: Config) -> Result<Self, BundleError> {
        match load_bundle(&config.model_path) {
            Ok(bundle) => Ok(Self::from_bundle(config, bundle)),
            Err(e) if config.allow_degraded_start => {
                tracing::error!("Error loading model: {}", e);
                tracing::warn!(
                    "Continuing without a model; check that {} exists",
                    config.model_path.display()
                );
                Ok(Self::degraded(config, e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("model_loaded", &self.is_model_loaded())
            .field("model_info", &self.model_info)
            .field("load_error", &self.load_error)
            .finish()
    }
}
