//! Offline probe - loads the bundle directly and scores one fixed record.
//!
//! Usage: `copd-risk-probe [BUNDLE_PATH]` (falls back to `MODEL_PATH`).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use copd_risk::config::Config;
use copd_risk::engine::{load_bundle, FeatureRow, RiskModel};
use copd_risk::pipeline;
use copd_risk::risk::legacy_probe_band;
use serde_json::json;

const RULE: &str = "============================================================";

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "copd_risk=warn".into()),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Config::from_env().model_path);

    println!("{}", RULE);
    println!("🔍 DIRECT MODEL TEST");
    println!("{}", RULE);

    let bundle = load_bundle(&path)
        .with_context(|| format!("Error loading model from {}", path.display()))?;
    println!("✅ Model loaded successfully! ({})", path.display());

    let parts = bundle.bundle();
    let features = if parts.features.is_some() {
        "bundled"
    } else {
        "default"
    };
    println!(
        "Parts: model={}, scaler={}, imputer={:?}, features={}",
        parts.model.kind(),
        parts.scaler.kind(),
        parts.imputer.strategy,
        features,
    );
    println!("Checksum: {}", bundle.checksum);

    let record = sample_record();
    println!("\n📤 TEST RECORD:");
    println!("{}", serde_json::to_string_pretty(&record)?);

    let t = pipeline::trace(&bundle, &record).context("Prediction failed")?;

    println!("\n🧮 FEATURE ROWS:");
    print_rows(
        bundle.feature_order(),
        &[("raw", &t.raw), ("imputed", &t.imputed), ("scaled", &t.scaled)],
    );

    let p = t.assessment.probability;
    println!("\n🎯 MODEL PREDICTION:");
    println!("Class probabilities: [{:.4}, {:.4}]", 1.0 - p, p);
    println!("Predicted class: {}", u8::from(p >= 0.5));
    println!("Confidence: {:.1}%", p.max(1.0 - p) * 100.0);
    println!("Risk score: {:.1}%", t.assessment.risk_score);
    println!("Risk level: {}", t.assessment.category);

    let legacy = legacy_probe_band(t.assessment.risk_score);
    if legacy != t.assessment.category {
        println!(
            "⚠️  Legacy banding (>=61 / >=31) would report '{}'; the service reports '{}'",
            legacy, t.assessment.category
        );
    }

    println!("\n{}", RULE);
    Ok(())
}

/// Same record the frontend sent during manual testing.
fn sample_record() -> serde_json::Value {
    json!({
        "age": 55,
        "bmi": 26,
        "mmrc": 2,
        "packYears": 20,
        "exacerbations": 1,
        "occupationalExposure": 0,
        "fev1Fvc": 0.65,
        "fev1": 70,
        "oxygen": 92,
        "eosinophil": 150,
        "dlco": 65,
        "aat": 120
    })
}

fn print_rows(names: &[String], rows: &[(&str, &FeatureRow)]) {
    print!("{:<24}", "feature");
    for (label, _) in rows {
        print!("{:>12}", label);
    }
    println!();

    for (i, name) in names.iter().enumerate() {
        print!("{:<24}", name);
        for (_, row) in rows {
            print!("{:>12.4}", row[i]);
        }
        println!();
    }
}
