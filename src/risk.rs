//! Risk banding
//!
//! Canonical policy, applied to the raw probability (high to low):
//! - p > 0.70 → High Risk
//! - p > 0.30 → Moderate Risk
//! - otherwise → Low Risk
//!
//! The old probe script banded the *percentage* with inclusive cut points
//! at 61 and 31. That scheme disagrees with the service between 61% and 70%
//! and at exactly 31%/70%; it survives only as [`legacy_probe_band`] so the
//! probe can report the disagreement.

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the moderate band.
pub const HIGH_RISK_ABOVE: f64 = 0.70;

/// Upper bound (inclusive) of the low band.
pub const MODERATE_RISK_ABOVE: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskCategory {
    pub fn from_probability(probability: f64) -> Self {
        if probability > HIGH_RISK_ABOVE {
            RiskCategory::High
        } else if probability > MODERATE_RISK_ABOVE {
            RiskCategory::Moderate
        } else {
            RiskCategory::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low Risk",
            RiskCategory::Moderate => "Moderate Risk",
            RiskCategory::High => "High Risk",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability as a percentage, rounded to one decimal place.
///
/// Rounds the exact binary value of `probability * 100` half-to-even, so a
/// percentage stored just below a `.x5` tie rounds down.
pub fn risk_score(probability: f64) -> f64 {
    let percent = probability * 100.0;
    format!("{:.1}", percent).parse().unwrap_or(percent)
}

/// Probe-script banding on a percentage (>= 61 High, >= 31 Moderate).
/// Diagnostic only; never used for responses.
pub fn legacy_probe_band(percent: f64) -> RiskCategory {
    if percent >= 61.0 {
        RiskCategory::High
    } else if percent >= 31.0 {
        RiskCategory::Moderate
    } else {
        RiskCategory::Low
    }
}
