//! Risk Tiers

use crate::AlertError;
use sensor_ingest::MachineId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier boundaries. A score must strictly exceed a boundary to enter the
/// tier above it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Scores above this are at least Medium (default: 0.40)
    pub medium: f64,
    /// Scores above this are High (default: 0.70)
    pub high: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            medium: 0.40,
            high: 0.70,
        }
    }
}

impl TierThresholds {
    /// Create validated thresholds
    pub fn new(medium: f64, high: f64) -> Result<Self, AlertError> {
        let thresholds = Self { medium, high };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Require `0 <= medium < high <= 1`
    pub fn validate(&self) -> Result<(), AlertError> {
        let ordered = self.medium.is_finite()
            && self.high.is_finite()
            && 0.0 <= self.medium
            && self.medium < self.high
            && self.high <= 1.0;
        if ordered {
            Ok(())
        } else {
            Err(AlertError::InvalidThresholds {
                medium: self.medium,
                high: self.high,
            })
        }
    }

    /// Tier of a single score
    pub fn classify(&self, score: f64) -> RiskTier {
        if score > self.high {
            RiskTier::High
        } else if score > self.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    /// Attach a tier to a machine's score
    pub fn assess(&self, machine_id: MachineId, failure_risk: f64) -> MachineRisk {
        MachineRisk {
            machine_id,
            failure_risk,
            tier: self.classify(failure_risk),
        }
    }
}

/// A machine's score and tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineRisk {
    pub machine_id: MachineId,
    /// Probability of failure within the label horizon
    pub failure_risk: f64,
    pub tier: RiskTier,
}
