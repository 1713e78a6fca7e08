//! Latest-Snapshot Selection

use crate::features::FeatureTable;
use crate::FeatureError;
use chrono::NaiveDateTime;
use sensor_ingest::MachineId;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Current state of one machine, dense model columns only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub machine_id: MachineId,
    pub timestamp: NaiveDateTime,
    /// Values aligned with [`Snapshot::columns`]
    pub values: Vec<f64>,
}

/// One row per machine, ready for scoring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    columns: Vec<String>,
    rows: Vec<SnapshotRow>,
}

impl Snapshot {
    /// Create a snapshot; every row's values must align with `columns`
    pub fn new(columns: Vec<String>, rows: Vec<SnapshotRow>) -> Self {
        Self { columns, rows }
    }

    /// Model column names; `machine_id`, `timestamp` and `failure` are stripped
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// One row per machine, in selection order
    pub fn rows(&self) -> &[SnapshotRow] {
        &self.rows
    }

    /// Number of machines in the snapshot
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reduce a completed table to the latest row of each machine.
///
/// Rows are stably sorted by timestamp and the last row seen for each
/// machine wins, so on equal maximum timestamps the row later in table order
/// is kept. The result follows that same timestamp order.
pub fn select_latest(table: &FeatureTable) -> Result<Snapshot, FeatureError> {
    let rows = table.rows();
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by_key(|&idx| rows[idx].reading.timestamp);

    let mut latest: HashMap<&MachineId, usize> = HashMap::new();
    for (pos, &idx) in order.iter().enumerate() {
        latest.insert(&rows[idx].reading.machine_id, pos);
    }

    let mut positions: Vec<usize> = latest.into_values().collect();
    positions.sort_unstable();

    let columns = table.schema().model_columns();
    let selected = positions
        .into_iter()
        .map(|pos| {
            let row = &rows[order[pos]];
            let values = row
                .model_values()
                .zip(&columns)
                .map(|(value, column)| {
                    value.ok_or_else(|| FeatureError::Incomplete {
                        machine_id: row.reading.machine_id.clone(),
                        column: column.clone(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            Ok(SnapshotRow {
                machine_id: row.reading.machine_id.clone(),
                timestamp: row.reading.timestamp,
                values,
            })
        })
        .collect::<Result<Vec<_>, FeatureError>>()?;

    debug!("Selected {} snapshot rows from {} history rows", selected.len(), rows.len());
    Ok(Snapshot::new(columns, selected))
}
