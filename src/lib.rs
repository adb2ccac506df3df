//! COPD Risk Service
//!
//! HTTP inference over a fitted tabular model bundle.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      COPD RISK SERVICE                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  POST /predict (Axum)                                        │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  ┌──────────┐   ┌─────────┐   ┌────────┐   ┌────────────┐    │
//! │  │ features │ → │ imputer │ → │ scaler │ → │ classifier │    │
//! │  │ (mapping)│   └─────────┘   └────────┘   └─────┬──────┘    │
//! │  └──────────┘        model bundle (JSON)         ▼           │
//! │                                            ┌──────────┐      │
//! │                                            │   risk   │      │
//! │                                            │ (bands)  │      │
//! │                                            └──────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod risk;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict::predict))
        .route("/health", get(handlers::health::check))
        .route("/api/v1/model", get(handlers::model::status))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
