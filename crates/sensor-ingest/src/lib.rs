//! Sensor Data Ingestion
//!
//! Provides the raw reading model, CSV loading, and the input schema
//! validation that guards the feature pipeline entry.

mod error;
mod loader;
mod reading;
mod validator;

pub use error::IngestError;
pub use loader::{read_readings, read_readings_from_path};
pub use reading::{Channel, MachineId, Reading};
pub use validator::{parse_timestamp, HeaderLayout, RecordValidator, REQUIRED_COLUMNS};
