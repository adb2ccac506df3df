//! Model status handler

use axum::{extract::State, Json};

use crate::models::ModelStatus;
use crate::{AppError, AppResult, AppState};

/// Describe the loaded bundle and inference counters
pub async fn status(State(state): State<AppState>) -> AppResult<Json<ModelStatus>> {
    let model = state.model.as_ref().ok_or_else(|| {
        AppError::ModelUnavailable(state.load_error.clone().unwrap_or_default())
    })?;
    let info = state.model_info.clone();

    Ok(Json(ModelStatus {
        model_loaded: true,
        source: info.as_ref().map(|i| i.source.clone()).unwrap_or_default(),
        checksum: info.as_ref().and_then(|i| i.checksum.clone()),
        classifier: model.describe(),
        features: model.feature_order().to_vec(),
        loaded_at: info.and_then(|i| i.loaded_at),
        inference_count: state.stats.inference_count(),
        failure_count: state.stats.failure_count(),
        avg_latency_ms: state.stats.avg_latency_ms(),
    }))
}
