//! Raw Sensor Reading

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Opaque machine identifier.
///
/// Ordering is numeric when both ids are unsigned integers, so a fleet
/// numbered `1..=500` partitions as `1, 2, .., 10` rather than `1, 10, 2`.
/// Numeric ids sort before free-form ids; remaining ties fall back to the
/// raw string so that `Ord` stays consistent with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(String);

impl MachineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for MachineId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for MachineId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MachineId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Real-valued sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Temperature,
    Vibration,
    Pressure,
}

impl Channel {
    /// All channels in input column order
    pub const ALL: [Channel; 3] = [Channel::Temperature, Channel::Vibration, Channel::Pressure];

    /// Input column name
    pub fn column(&self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Vibration => "vibration",
            Channel::Pressure => "pressure",
        }
    }

    /// Short prefix used in derived feature names
    pub fn prefix(&self) -> &'static str {
        match self {
            Channel::Temperature => "temp",
            Channel::Vibration => "vib",
            Channel::Pressure => "press",
        }
    }
}

/// One timestamped sensor row for a machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub machine_id: MachineId,
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub vibration: f64,
    pub pressure: f64,
    /// 1 marks the failure event row
    pub failure: u8,
}

impl Reading {
    /// Value of a sensor channel
    pub fn channel(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Vibration => self.vibration,
            Channel::Pressure => self.pressure,
        }
    }

    /// True when a failure was recorded at this reading
    pub fn is_failure(&self) -> bool {
        self.failure == 1
    }
}
