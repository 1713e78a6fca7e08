//! Feature Engineering Engine
//!
//! Derives per-machine rolling, smoothing and lag features from raw sensor
//! readings, labels them for training, resolves warm-up gaps and reduces the
//! history to one snapshot row per machine for scoring.

mod completion;
mod config;
mod features;
mod labeler;
mod partition;
mod snapshot;
mod statistics;
mod training;

pub use completion::{CompletionReport, FillScope, GapFill};
pub use config::{FeatureConfig, LabelConfig};
pub use features::{FeatureBuilder, FeatureColumn, FeatureKind, FeatureRow, FeatureSchema, FeatureTable};
pub use labeler::{LabelSummary, TargetLabeler};
pub use partition::{partition_by_machine, Partition};
pub use snapshot::{select_latest, Snapshot, SnapshotRow};
pub use statistics::{ExponentialMovingAverage, LagBuffer, RollingWindow};
pub use training::TrainingSet;

use ring_buffer::RingBufferError;
use sensor_ingest::MachineId;
use thiserror::Error;

/// Errors raised by the feature pipeline
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),
    #[error("Row for machine {machine_id} has no value in column {column}")]
    Incomplete { machine_id: MachineId, column: String },
    #[error("Row for machine {machine_id} carries no training label")]
    Unlabeled { machine_id: MachineId },
    #[error(transparent)]
    Window(#[from] RingBufferError),
}
