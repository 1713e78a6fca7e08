//! Training Matrix Export

use crate::features::FeatureTable;
use crate::FeatureError;
use chrono::NaiveDateTime;
use sensor_ingest::MachineId;

/// Dense, labeled rows for an external trainer.
///
/// The raw failure flag is not part of the feature columns: only the
/// forward-looking label travels with each row.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub columns: Vec<String>,
    pub identities: Vec<(MachineId, NaiveDateTime)>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl TrainingSet {
    /// Collect a completed, labeled table.
    pub fn from_table(table: &FeatureTable) -> Result<Self, FeatureError> {
        let columns = table.schema().model_columns();
        let mut identities = Vec::with_capacity(table.len());
        let mut features = Vec::with_capacity(table.len());
        let mut labels = Vec::with_capacity(table.len());

        for row in table.rows() {
            let machine_id = &row.reading.machine_id;
            let label = row.label.ok_or_else(|| FeatureError::Unlabeled {
                machine_id: machine_id.clone(),
            })?;
            let values = row
                .model_values()
                .zip(&columns)
                .map(|(v, column)| {
                    v.ok_or_else(|| FeatureError::Incomplete {
                        machine_id: machine_id.clone(),
                        column: column.clone(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;

            identities.push((machine_id.clone(), row.reading.timestamp));
            features.push(values);
            labels.push(label);
        }

        Ok(Self {
            columns,
            identities,
            features,
            labels,
        })
    }

    /// Number of training rows
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Share of positive labels, `None` for an empty set
    pub fn positive_rate(&self) -> Option<f64> {
        if self.labels.is_empty() {
            return None;
        }
        let positives = self.labels.iter().filter(|&&l| l == 1).count();
        Some(positives as f64 / self.labels.len() as f64)
    }
}
