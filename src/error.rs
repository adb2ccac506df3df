//! Error handling
//!
//! Every failure on the prediction surface is reported the same way:
//! HTTP 500 with `{"status": "error", "message": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::pipeline::PipelineError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    // Startup load failed and the server was allowed to continue
    #[error("model not loaded: {0}")]
    ModelUnavailable(String),

    // Body could not be parsed as JSON
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    // Mapping / preprocessing / classifier failures
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("prediction timed out after {0} ms")]
    Timeout(u128),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match &self {
            AppError::InvalidJson(_) | AppError::Pipeline(_) => {
                tracing::warn!("Prediction error: {}", message);
            }
            _ => tracing::error!("Prediction error: {}", message),
        }

        let body = Json(ErrorResponse::new(message));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(err.to_string())
    }
}
