//! API payloads

pub mod prediction;
pub mod status;

pub use prediction::{ErrorResponse, PredictResponse};
pub use status::{HealthResponse, ModelStatus};
