//! Fleet Summary and Ranking

use crate::tiers::{MachineRisk, RiskTier};
use serde::Serialize;
use tracing::{info, warn};

/// Tier counts and mean risk across the scored fleet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FleetSummary {
    pub machines: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// `None` when no machine was scored
    pub average_risk: Option<f64>,
}

impl FleetSummary {
    /// Summarise tiered scores
    pub fn from_risks(risks: &[MachineRisk]) -> Self {
        let mut summary = Self {
            machines: risks.len(),
            ..Default::default()
        };
        for risk in risks {
            match risk.tier {
                RiskTier::High => summary.high += 1,
                RiskTier::Medium => summary.medium += 1,
                RiskTier::Low => summary.low += 1,
            }
        }
        if !risks.is_empty() {
            let total: f64 = risks.iter().map(|r| r.failure_risk).sum();
            summary.average_risk = Some(total / risks.len() as f64);
        }
        summary
    }

    /// Alert text when any machine sits in the High tier
    pub fn alert(&self) -> Option<String> {
        (self.high > 0).then(|| format!("ALERT: {} machines at HIGH RISK", self.high))
    }

    /// Emit the summary to the log, as a warning when an alert is raised
    pub fn log(&self) {
        match self.alert() {
            Some(message) => warn!("{}", message),
            None => info!("All machines operating within safe limits"),
        }
        info!(
            "Fleet risk: {} machines, high={}, medium={}, low={}, average={:.4}",
            self.machines,
            self.high,
            self.medium,
            self.low,
            self.average_risk.unwrap_or_default()
        );
    }
}

/// Machines ordered from highest to lowest risk; ties by machine id
pub fn rank_by_risk(risks: &[MachineRisk]) -> Vec<&MachineRisk> {
    let mut ranked: Vec<&MachineRisk> = risks.iter().collect();
    ranked.sort_by(|a, b| {
        b.failure_risk
            .total_cmp(&a.failure_risk)
            .then_with(|| a.machine_id.cmp(&b.machine_id))
    });
    ranked
}
