//! Scoring Context

use crate::explain::{Explanation, FeatureContribution};
use crate::model::RiskModel;
use crate::InferenceError;
use chrono::NaiveDateTime;
use feature_engine::{Snapshot, SnapshotRow};
use ndarray::{Array2, ArrayView2};
use sensor_ingest::MachineId;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Failure risk of one machine at its latest reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPrediction {
    pub machine_id: MachineId,
    pub timestamp: NaiveDateTime,
    /// Model inputs, aligned with the snapshot columns
    pub features: Vec<f64>,
    /// Probability of failure within the label horizon
    pub failure_risk: f64,
}

/// Result of rescoring a machine with some features overridden
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfOutcome {
    pub machine_id: MachineId,
    pub baseline_risk: f64,
    pub simulated_risk: f64,
}

impl WhatIfOutcome {
    /// Change in risk caused by the overrides
    pub fn delta(&self) -> f64 {
        self.simulated_risk - self.baseline_risk
    }
}

/// Immutable scoring context built once around a loaded model and shared
/// by reference between pipeline runs.
#[derive(Clone)]
pub struct ScoringContext {
    model: Arc<dyn RiskModel>,
}

impl ScoringContext {
    /// Wrap a loaded model
    pub fn new(model: Arc<dyn RiskModel>) -> Self {
        info!(
            "Creating scoring context for model with {} features",
            model.feature_names().len()
        );
        Self { model }
    }

    /// Columns the model was trained on, in order
    pub fn feature_names(&self) -> &[String] {
        self.model.feature_names()
    }

    /// Reject any difference between the given columns and the training columns.
    pub fn check_columns(&self, columns: &[String]) -> Result<(), InferenceError> {
        let expected = self.model.feature_names();
        if expected == columns {
            return Ok(());
        }

        let missing: Vec<String> = expected
            .iter()
            .filter(|c| !columns.contains(c))
            .cloned()
            .collect();
        let unexpected: Vec<String> = columns
            .iter()
            .filter(|c| !expected.contains(c))
            .cloned()
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            Err(InferenceError::ColumnOrder {
                expected: expected.to_vec(),
                actual: columns.to_vec(),
            })
        } else {
            Err(InferenceError::SchemaMismatch { missing, unexpected })
        }
    }

    /// Failure probability for every machine in the snapshot
    pub fn score(&self, snapshot: &Snapshot) -> Result<Vec<RiskPrediction>, InferenceError> {
        self.check_columns(snapshot.columns())?;
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = to_matrix(snapshot.rows(), snapshot.columns().len())?;
        let scores = self.predict_checked(matrix.view())?;

        let predictions: Vec<RiskPrediction> = snapshot
            .rows()
            .iter()
            .zip(scores)
            .map(|(row, failure_risk)| RiskPrediction {
                machine_id: row.machine_id.clone(),
                timestamp: row.timestamp,
                features: row.values.clone(),
                failure_risk,
            })
            .collect();

        debug!("Scored {} machines", predictions.len());
        Ok(predictions)
    }

    /// Per-feature contributions for every machine in the snapshot
    pub fn explain(&self, snapshot: &Snapshot) -> Result<Vec<Explanation>, InferenceError> {
        self.check_columns(snapshot.columns())?;
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = to_matrix(snapshot.rows(), snapshot.columns().len())?;
        let attribution = self.model.explain(matrix.view())?;
        if attribution.contributions.dim() != matrix.dim()
            || attribution.base_values.len() != matrix.nrows()
        {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{:?}", matrix.dim()),
                actual: format!("{:?}", attribution.contributions.dim()),
            });
        }

        Ok(snapshot
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| Explanation {
                machine_id: row.machine_id.clone(),
                base_value: attribution.base_values[i],
                contributions: snapshot
                    .columns()
                    .iter()
                    .zip(&row.values)
                    .zip(attribution.contributions.row(i))
                    .map(|((feature, &value), &contribution)| FeatureContribution {
                        feature: feature.clone(),
                        value,
                        contribution,
                    })
                    .collect(),
            })
            .collect())
    }

    /// Rescore one machine with selected feature values replaced.
    pub fn what_if(
        &self,
        snapshot: &Snapshot,
        machine_id: &MachineId,
        overrides: &[(String, f64)],
    ) -> Result<WhatIfOutcome, InferenceError> {
        self.check_columns(snapshot.columns())?;
        let row = snapshot
            .rows()
            .iter()
            .find(|r| &r.machine_id == machine_id)
            .ok_or_else(|| InferenceError::UnknownMachine(machine_id.clone()))?;

        let mut simulated = row.clone();
        for (feature, value) in overrides {
            let idx = snapshot
                .columns()
                .iter()
                .position(|c| c == feature)
                .ok_or_else(|| InferenceError::UnknownFeature(feature.clone()))?;
            simulated.values[idx] = *value;
        }

        let width = snapshot.columns().len();
        let matrix = to_matrix(&[row.clone(), simulated], width)?;
        let scores = self.predict_checked(matrix.view())?;

        Ok(WhatIfOutcome {
            machine_id: machine_id.clone(),
            baseline_risk: scores[0],
            simulated_risk: scores[1],
        })
    }

    fn predict_checked(&self, rows: ArrayView2<'_, f64>) -> Result<Vec<f64>, InferenceError> {
        let scores = self.model.predict_probability(rows)?;
        if scores.len() != rows.nrows() {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{} scores", rows.nrows()),
                actual: format!("{} scores", scores.len()),
            });
        }
        for (row, &score) in scores.iter().enumerate() {
            if !score.is_finite() || !(0.0..=1.0).contains(&score) {
                return Err(InferenceError::InvalidScore { row, score });
            }
        }
        Ok(scores.to_vec())
    }
}

fn to_matrix(rows: &[SnapshotRow], width: usize) -> Result<Array2<f64>, InferenceError> {
    let data: Vec<f64> = rows.iter().flat_map(|r| r.values.iter().copied()).collect();
    Array2::from_shape_vec((rows.len(), width), data).map_err(|e| InferenceError::InvalidInputShape {
        expected: format!("[{}, {}]", rows.len(), width),
        actual: e.to_string(),
    })
}
