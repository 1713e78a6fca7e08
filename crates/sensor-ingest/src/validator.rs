//! Input Schema and Record Validation

use crate::error::IngestError;
use crate::reading::{MachineId, Reading};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;

/// Columns the input table must carry, no more and no less
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "machine_id",
    "timestamp",
    "temperature",
    "vibration",
    "pressure",
    "failure",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Positions of the required columns inside a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    machine_id: usize,
    timestamp: usize,
    temperature: usize,
    vibration: usize,
    pressure: usize,
    failure: usize,
    width: usize,
}

impl HeaderLayout {
    /// Resolve column positions by name.
    ///
    /// Column order is free, but the set must match [`REQUIRED_COLUMNS`]
    /// exactly: a missing, unexpected or duplicated column rejects the batch.
    pub fn resolve(headers: &StringRecord) -> Result<Self, IngestError> {
        let names: Vec<&str> = headers.iter().map(str::trim).collect();

        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(IngestError::DuplicateColumn((*name).to_string()));
            }
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !names.contains(*c))
            .map(|c| (*c).to_string())
            .collect();
        let unexpected: Vec<String> = names
            .iter()
            .filter(|n| !REQUIRED_COLUMNS.contains(*n))
            .map(|n| (*n).to_string())
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(IngestError::Schema { missing, unexpected });
        }

        let col = |name: &str| names.iter().position(|n| *n == name).unwrap_or_default();

        Ok(Self {
            machine_id: col("machine_id"),
            timestamp: col("timestamp"),
            temperature: col("temperature"),
            vibration: col("vibration"),
            pressure: col("pressure"),
            failure: col("failure"),
            width: names.len(),
        })
    }
}

/// Turns CSV records into validated readings
pub struct RecordValidator {
    layout: HeaderLayout,
}

impl RecordValidator {
    /// Create a validator for records laid out per `layout`
    pub fn new(layout: HeaderLayout) -> Self {
        Self { layout }
    }

    /// Parse one data record. `row` is the 1-based data row number used in errors.
    pub fn parse(&self, row: usize, record: &StringRecord) -> Result<Reading, IngestError> {
        if record.len() != self.layout.width {
            return Err(IngestError::FieldCount {
                row,
                expected: self.layout.width,
                actual: record.len(),
            });
        }

        let cell = |idx: usize| record.get(idx).map(str::trim).unwrap_or_default();

        let machine_id = cell(self.layout.machine_id);
        if machine_id.is_empty() {
            return Err(invalid(row, "machine_id", machine_id, "empty identifier"));
        }

        let timestamp_raw = cell(self.layout.timestamp);
        let timestamp = parse_timestamp(timestamp_raw)
            .ok_or_else(|| invalid(row, "timestamp", timestamp_raw, "unrecognised date-time"))?;

        Ok(Reading {
            machine_id: MachineId::new(machine_id),
            timestamp,
            temperature: parse_channel(row, "temperature", cell(self.layout.temperature))?,
            vibration: parse_channel(row, "vibration", cell(self.layout.vibration))?,
            pressure: parse_channel(row, "pressure", cell(self.layout.pressure))?,
            failure: parse_failure(row, cell(self.layout.failure))?,
        })
    }
}

/// Parse a timestamp cell.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.f]`, the `T`-separated variant, RFC 3339
/// (converted to UTC) and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_channel(row: usize, column: &'static str, raw: &str) -> Result<f64, IngestError> {
    let value: f64 = raw
        .parse()
        .map_err(|e: std::num::ParseFloatError| invalid(row, column, raw, &e.to_string()))?;
    if !value.is_finite() {
        return Err(invalid(row, column, raw, "non-finite reading"));
    }
    Ok(value)
}

fn parse_failure(row: usize, raw: &str) -> Result<u8, IngestError> {
    match raw.parse::<f64>() {
        Ok(v) if v == 0.0 => Ok(0),
        Ok(v) if v == 1.0 => Ok(1),
        _ => Err(invalid(row, "failure", raw, "expected 0 or 1")),
    }
}

fn invalid(row: usize, column: &'static str, value: &str, reason: &str) -> IngestError {
    IngestError::InvalidValue {
        row,
        column,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
