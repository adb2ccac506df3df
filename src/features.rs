//! Field mapping - client JSON keys to model feature names
//!
//! The mapping is a static table so each field can be audited and tested on
//! its own. Row order always follows the bundle's feature order, never the
//! table's declaration order.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::engine::FeatureRow;

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 12;

/// `(client key, model feature)` pairs.
pub const FIELD_MAP: [(&str, &str); FEATURE_COUNT] = [
    ("age", "Age"),
    ("bmi", "BMI"),
    ("packYears", "Smoking_Pack_Years"),
    ("fev1Fvc", "FEV1_FVC_Ratio"),
    ("fev1", "FEV1_Percent_Predicted"),
    ("oxygen", "Oxygen_Saturation_SpO2"),
    ("mmrc", "mMRC_Scale"),
    ("exacerbations", "Exacerbations_History"),
    ("occupationalExposure", "Occupational_Exposure"),
    ("eosinophil", "Eosinophil_Count"),
    ("dlco", "DLCO_Level"),
    ("aat", "AAT_Level"),
];

/// Column order used when the bundle carries no feature list.
pub const DEFAULT_FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "Age",
    "BMI",
    "Smoking_Pack_Years",
    "FEV1_FVC_Ratio",
    "FEV1_Percent_Predicted",
    "Oxygen_Saturation_SpO2",
    "mMRC_Scale",
    "Exacerbations_History",
    "Occupational_Exposure",
    "Eosinophil_Count",
    "DLCO_Level",
    "AAT_Level",
];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MappingError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("could not convert string to float: '{value}' (field '{field}')")]
    NotNumeric { field: String, value: String },

    #[error("field '{field}' must be a number or null, got {kind}")]
    UnsupportedType { field: String, kind: &'static str },

    #[error("model feature '{0}' has no client field")]
    UnknownFeature(String),
}

/// Client key for a model feature name.
pub fn client_key(feature: &str) -> Option<&'static str> {
    FIELD_MAP
        .iter()
        .find(|(_, model)| *model == feature)
        .map(|(client, _)| *client)
}

pub fn is_known_feature(feature: &str) -> bool {
    client_key(feature).is_some()
}

/// Build a row aligned to `feature_order` from a parsed request body.
///
/// Absent keys and explicit nulls become `NaN`. Keys outside the table are
/// ignored.
pub fn map_fields(payload: &Value, feature_order: &[String]) -> Result<FeatureRow, MappingError> {
    let object = payload.as_object().ok_or(MappingError::NotAnObject)?;
    map_object(object, feature_order)
}

pub fn map_object(
    object: &Map<String, Value>,
    feature_order: &[String],
) -> Result<FeatureRow, MappingError> {
    feature_order
        .iter()
        .map(|feature| {
            let key = client_key(feature)
                .ok_or_else(|| MappingError::UnknownFeature(feature.clone()))?;
            to_number(key, object.get(key))
        })
        .collect::<Result<Vec<f64>, _>>()
        .map(FeatureRow::from)
}

/// Numeric coercion for one field.
fn to_number(field: &str, value: Option<&Value>) -> Result<f64, MappingError> {
    match value {
        None | Some(Value::Null) => Ok(f64::NAN),
        Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or(f64::NAN)),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| MappingError::NotNumeric {
            field: field.to_string(),
            value: s.clone(),
        }),
        Some(Value::Array(_)) => Err(MappingError::UnsupportedType {
            field: field.to_string(),
            kind: "array",
        }),
        Some(Value::Object(_)) => Err(MappingError::UnsupportedType {
            field: field.to_string(),
            kind: "object",
        }),
    }
}
