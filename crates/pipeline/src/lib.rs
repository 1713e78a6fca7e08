//! FactoryGuard Batch Pipeline
//!
//! Wires ingestion, feature derivation, completion, snapshot selection,
//! scoring and tiering into single batch runs, and hosts the ambient
//! settings, logging and export plumbing.

mod export;
mod run;
mod settings;

pub use export::{
    write_predictions, write_predictions_to_path, write_simulation, write_training_set,
    write_training_set_to_path, TIMESTAMP_FORMAT,
};
pub use run::{Pipeline, ScoringReport, TrainingReport};
pub use settings::{CompletionSettings, LoggingSettings, Settings, ENV_PREFIX};

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors surfaced by a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] sensor_ingest::IngestError),
    #[error(transparent)]
    Feature(#[from] feature_engine::FeatureError),
    #[error(transparent)]
    Inference(#[from] inference_engine::InferenceError),
    #[error(transparent)]
    Alert(#[from] alerting::AlertError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logging initialisation failed: {0}")]
    Logging(String),
}

/// Initialize logging.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), PipelineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| PipelineError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| PipelineError::Logging(e.to_string()))
}
