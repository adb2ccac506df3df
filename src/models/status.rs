//! Health and model status payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
    pub timestamp: i64,
}

/// Model status for operators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub source: String,
    pub checksum: Option<String>,
    pub classifier: String,
    pub features: Vec<String>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub inference_count: u64,
    pub failure_count: u64,
    pub avg_latency_ms: f64,
}
