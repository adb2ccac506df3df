//! Prediction handler

use std::time::Instant;

use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;

use crate::models::PredictResponse;
use crate::pipeline;
use crate::{AppError, AppResult, AppState};

/// Score one patient record.
///
/// The body is parsed as JSON whatever its Content-Type; any failure from
/// parsing through classification becomes a 500 carrying the error text.
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<PredictResponse>> {
    let model = state.model.clone().ok_or_else(|| {
        AppError::ModelUnavailable(
            state
                .load_error
                .clone()
                .unwrap_or_else(|| "no model configured".to_string()),
        )
    })?;

    let payload: Value = serde_json::from_slice(&body)?;
    if state.config.debug {
        tracing::debug!("Received Data: {}", payload);
    }

    let started = Instant::now();
    let job = tokio::task::spawn_blocking(move || pipeline::assess(&*model, &payload));

    let joined = match state.config.predict_timeout {
        Some(limit) => match tokio::time::timeout(limit, job).await {
            Ok(joined) => joined,
            Err(_) => {
                state.stats.record(started.elapsed(), false);
                return Err(AppError::Timeout(limit.as_millis()));
            }
        },
        None => job.await,
    };

    let outcome = match joined {
        Ok(outcome) => outcome,
        Err(e) => {
            state.stats.record(started.elapsed(), false);
            return Err(e.into());
        }
    };
    state.stats.record(started.elapsed(), outcome.is_ok());

    let assessment = outcome?;
    tracing::info!(
        risk_score = assessment.risk_score,
        result = %assessment.category,
        "Prediction complete"
    );

    Ok(Json(assessment.into()))
}
