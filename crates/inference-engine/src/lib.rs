//! Failure-Risk Inference Engine
//!
//! Wraps an opaque classifier behind a scoring and explanation contract and
//! guards the column layout the classifier was trained on.

mod engine;
mod explain;
mod model;

pub use engine::{RiskPrediction, ScoringContext, WhatIfOutcome};
pub use explain::{global_importance, Explanation, FeatureContribution};
pub use model::{Attribution, LinearModelArtifact, LinearRiskModel, RiskModel};

use sensor_ingest::MachineId;
use thiserror::Error;

/// Errors during scoring
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("Feature columns do not match the model: missing {missing:?}, unexpected {unexpected:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    #[error("Feature column order differs from the model: expected {expected:?}, got {actual:?}")]
    ColumnOrder {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("Model returned invalid probability {score} for row {row}")]
    InvalidScore { row: usize, score: f64 },
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),
    #[error("Machine {0} is not in the snapshot")]
    UnknownMachine(MachineId),
}
