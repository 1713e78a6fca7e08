//! CSV Reading Loader

use crate::error::IngestError;
use crate::reading::Reading;
use crate::validator::{HeaderLayout, RecordValidator};
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Load and validate every reading from a CSV source.
///
/// The whole batch is rejected on the first schema or cell error; no partial
/// result is ever returned.
pub fn read_readings<R: io::Read>(source: R) -> Result<Vec<Reading>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(source);

    let headers = rdr.headers()?.clone();
    let validator = RecordValidator::new(HeaderLayout::resolve(&headers)?);
    debug!("Input header validated: {:?}", headers);

    let mut readings = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        readings.push(validator.parse(idx + 1, &record)?);
    }

    info!("Loaded {} sensor readings", readings.len());
    Ok(readings)
}

/// Load readings from a CSV file on disk
pub fn read_readings_from_path(path: impl AsRef<Path>) -> Result<Vec<Reading>, IngestError> {
    let path = path.as_ref();
    info!("Reading sensor data from {}", path.display());
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_readings(io::BufReader::new(file))
}
