//! Alerting System
//!
//! Maps failure-risk scores to tiers and builds the fleet-level summary,
//! ranking and simulated risk updates shown on the dashboard.

mod simulation;
mod summary;
mod tiers;

pub use simulation::{RiskSimulator, SimulationConfig};
pub use summary::{rank_by_risk, FleetSummary};
pub use tiers::{MachineRisk, RiskTier, TierThresholds};

use thiserror::Error;

/// Alerting configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlertError {
    #[error("Invalid tier thresholds: need 0 <= medium ({medium}) < high ({high}) <= 1")]
    InvalidThresholds { medium: f64, high: f64 },
    #[error("Invalid simulation spread {0}: must be within [0, 1)")]
    InvalidSpread(f64),
}
