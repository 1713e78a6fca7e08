//! Per-Machine Explanations

use sensor_ingest::MachineId;
use serde::Serialize;
use std::collections::HashMap;

/// One feature's share of a machine's score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub value: f64,
    pub contribution: f64,
}

/// Additive explanation of a single machine's score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub machine_id: MachineId,
    pub base_value: f64,
    pub contributions: Vec<FeatureContribution>,
}

impl Explanation {
    /// Reconstructed model output in explanation space
    pub fn output_value(&self) -> f64 {
        self.base_value + self.contributions.iter().map(|c| c.contribution).sum::<f64>()
    }

    /// The `n` features with the largest absolute contribution
    pub fn top_drivers(&self, n: usize) -> Vec<&FeatureContribution> {
        let mut sorted: Vec<&FeatureContribution> = self.contributions.iter().collect();
        sorted.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        sorted.truncate(n);
        sorted
    }
}

/// Mean absolute contribution per feature across machines, largest first
pub fn global_importance(explanations: &[Explanation]) -> Vec<(String, f64)> {
    if explanations.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for explanation in explanations {
        for c in &explanation.contributions {
            let total = totals.entry(c.feature.as_str()).or_insert_with(|| {
                order.push(c.feature.as_str());
                0.0
            });
            *total += c.contribution.abs();
        }
    }

    let n = explanations.len() as f64;
    let mut importance: Vec<(String, f64)> = order
        .into_iter()
        .map(|f| (f.to_string(), totals.get(f).copied().unwrap_or_default() / n))
        .collect();
    importance.sort_by(|a, b| b.1.total_cmp(&a.1));
    importance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explanation(machine: &str, contributions: &[(&str, f64)]) -> Explanation {
        Explanation {
            machine_id: MachineId::from(machine),
            base_value: -2.0,
            contributions: contributions
                .iter()
                .map(|(f, c)| FeatureContribution {
                    feature: (*f).to_string(),
                    value: 0.0,
                    contribution: *c,
                })
                .collect(),
        }
    }

    #[test]
    fn test_top_drivers_by_magnitude() {
        let e = explanation("1", &[("a", 0.1), ("b", -3.0), ("c", 1.5)]);
        let top: Vec<&str> = e.top_drivers(2).iter().map(|c| c.feature.as_str()).collect();
        assert_eq!(top, vec!["b", "c"]);
        assert!((e.output_value() - (-3.4)).abs() < 1e-12);
    }

    #[test]
    fn test_global_importance() {
        let explanations = vec![
            explanation("1", &[("a", 1.0), ("b", -4.0)]),
            explanation("2", &[("a", -3.0), ("b", 0.0)]),
        ];
        let importance = global_importance(&explanations);
        assert_eq!(importance, vec![("a".to_string(), 2.0), ("b".to_string(), 2.0)]);
        assert!(global_importance(&[]).is_empty());
    }
}
