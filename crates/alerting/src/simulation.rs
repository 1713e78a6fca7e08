//! Simulated Risk Updates

use crate::tiers::{MachineRisk, TierThresholds};
use crate::AlertError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Relative jitter; scores are scaled by a factor in `[1 - spread, 1 + spread)`
    pub spread: f64,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            spread: 0.2,
            seed: None,
        }
    }
}

/// Perturbs current scores to preview how the fleet might move
pub struct RiskSimulator {
    spread: f64,
    thresholds: TierThresholds,
    rng: StdRng,
}

impl RiskSimulator {
    /// Create a simulator; a seeded config yields repeatable runs
    pub fn new(config: &SimulationConfig, thresholds: TierThresholds) -> Result<Self, AlertError> {
        if !config.spread.is_finite() || !(0.0..1.0).contains(&config.spread) {
            return Err(AlertError::InvalidSpread(config.spread));
        }
        thresholds.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            spread: config.spread,
            thresholds,
            rng,
        })
    }

    /// Jitter every score, clamp to [0, 1] and re-tier
    pub fn simulate(&mut self, risks: &[MachineRisk]) -> Vec<MachineRisk> {
        debug!("Simulating {} machines with spread {}", risks.len(), self.spread);
        risks
            .iter()
            .map(|risk| {
                let (lo, hi) = (1.0 - self.spread, 1.0 + self.spread);
                // Spreads below f64 resolution leave an empty range
                let factor = if lo < hi { self.rng.gen_range(lo..hi) } else { 1.0 };
                let score = (risk.failure_risk * factor).clamp(0.0, 1.0);
                self.thresholds.assess(risk.machine_id.clone(), score)
            })
            .collect()
    }
}
