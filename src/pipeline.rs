//! Prediction pipeline
//!
//! map → impute → scale → predict → band. Each stage must hand the next a
//! row of exactly `feature_order().len()` columns.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::engine::{check_shape, FeatureRow, ModelError, RiskModel};
use crate::features::{map_fields, MappingError};
use crate::risk::{risk_score, RiskCategory};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Final outcome of one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    pub probability: f64,
    pub risk_score: f64,
    pub category: RiskCategory,
}

impl Assessment {
    pub fn from_probability(probability: f64) -> Self {
        Self {
            probability,
            risk_score: risk_score(probability),
            category: RiskCategory::from_probability(probability),
        }
    }
}

/// Every intermediate row, for offline inspection.
#[derive(Debug, Clone)]
pub struct PipelineTrace {
    pub raw: FeatureRow,
    pub imputed: FeatureRow,
    pub scaled: FeatureRow,
    pub assessment: Assessment,
}

/// Score a parsed request body.
pub fn assess(model: &dyn RiskModel, payload: &Value) -> Result<Assessment, PipelineError> {
    trace(model, payload).map(|t| t.assessment)
}

/// Score a parsed request body, keeping intermediate rows.
pub fn trace(model: &dyn RiskModel, payload: &Value) -> Result<PipelineTrace, PipelineError> {
    let order = model.feature_order();
    let raw = map_fields(payload, order)?;
    trace_row(model, raw)
}

/// Run the model stages on an already mapped row.
pub fn trace_row(model: &dyn RiskModel, raw: FeatureRow) -> Result<PipelineTrace, PipelineError> {
    let width = model.feature_order().len();
    check_shape("mapper", &raw, width)?;

    let imputed = model.impute(&raw)?;
    check_shape("imputer", &imputed, width)?;

    let scaled = model.scale(&imputed)?;
    check_shape("scaler", &scaled, width)?;

    let probability = model.predict_probability(&scaled)?;
    if !(0.0..=1.0).contains(&probability) {
        return Err(ModelError::InvalidProbability(probability).into());
    }

    let assessment = Assessment::from_probability(probability);
    tracing::debug!(
        probability,
        risk_score = assessment.risk_score,
        category = %assessment.category,
        "Pipeline complete"
    );

    Ok(PipelineTrace { raw, imputed, scaled, assessment })
}
