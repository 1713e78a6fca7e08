//! Gap-Fill and Completion Policy

use crate::features::{FeatureRow, FeatureTable};
use crate::partition::partition_by_machine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Extent over which gaps are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillScope {
    /// Whole table in its natural row order; values may flow across a
    /// machine boundary into a neighbour's warm-up rows
    #[default]
    Table,
    /// Each machine partition on its own
    Partition,
}

/// Outcome of a completion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CompletionReport {
    pub input_rows: usize,
    pub filled_cells: usize,
    pub dropped_rows: usize,
}

/// Resolves no-value cells so consumers receive a dense table.
///
/// Order is fixed: backward-fill, then forward-fill, then drop any row that
/// still has a gap. Backward-fill runs first so a warm-up gap takes the
/// earliest real value that follows it.
#[derive(Debug, Clone, Default)]
pub struct GapFill {
    scope: FillScope,
}

impl GapFill {
    /// Create a completion pass over the given scope
    pub fn new(scope: FillScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> FillScope {
        self.scope
    }

    /// Fill and drop in place. Running it on a dense table is a no-op.
    pub fn complete(&self, table: &mut FeatureTable) -> CompletionReport {
        let width = table.schema().len();
        let rows = table.rows_mut();
        let input_rows = rows.len();

        let segments: Vec<Vec<usize>> = match self.scope {
            FillScope::Table => vec![(0..rows.len()).collect()],
            FillScope::Partition => partition_by_machine(rows.as_slice(), |r: &FeatureRow| {
                (&r.reading.machine_id, r.reading.timestamp)
            })
            .into_iter()
            .map(|p| p.rows)
            .collect(),
        };

        let mut filled_cells = 0;
        for segment in &segments {
            for col in 0..width {
                filled_cells += backward_fill(rows, segment, col);
                filled_cells += forward_fill(rows, segment, col);
            }
        }

        rows.retain(FeatureRow::is_complete);
        let dropped_rows = input_rows - rows.len();

        if dropped_rows > 0 {
            debug!("Dropped {} rows with unfillable gaps", dropped_rows);
        }
        info!(
            "Completion ({:?} scope): filled {} cells, kept {}/{} rows",
            self.scope,
            filled_cells,
            rows.len(),
            input_rows
        );

        CompletionReport {
            input_rows,
            filled_cells,
            dropped_rows,
        }
    }
}

fn backward_fill(rows: &mut [FeatureRow], segment: &[usize], col: usize) -> usize {
    let mut filled = 0;
    let mut next: Option<f64> = None;
    for &idx in segment.iter().rev() {
        match rows[idx].derived[col] {
            Some(v) => next = Some(v),
            None if next.is_some() => {
                rows[idx].derived[col] = next;
                filled += 1;
            }
            None => {}
        }
    }
    filled
}

fn forward_fill(rows: &mut [FeatureRow], segment: &[usize], col: usize) -> usize {
    let mut last: Option<f64> = None;
    let mut filled = 0;
    for &idx in segment {
        match rows[idx].derived[col] {
            Some(v) => last = Some(v),
            None if last.is_some() => {
                rows[idx].derived[col] = last;
                filled += 1;
            }
            None => {}
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::features::{FeatureBuilder, FeatureSchema};
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;
    use sensor_ingest::{MachineId, Reading};

    fn reading(machine: &str, hour: i64, temperature: f64) -> Reading {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        Reading {
            machine_id: MachineId::from(machine),
            timestamp: start + Duration::hours(hour),
            temperature,
            vibration: 0.5,
            pressure: 30.0,
            failure: 0,
        }
    }

    fn window_two() -> FeatureConfig {
        FeatureConfig {
            windows: vec![2],
            mean_channels: vec![sensor_ingest::Channel::Temperature],
            std_channels: vec![],
            ema_channels: vec![],
            lag_channels: vec![],
            ..Default::default()
        }
    }

    fn table_from(derived: Vec<Vec<Option<f64>>>) -> FeatureTable {
        let schema = FeatureSchema::from_config(&window_two()).unwrap();
        let rows = derived
            .into_iter()
            .enumerate()
            .map(|(i, derived)| FeatureRow {
                reading: reading("m", i as i64, 60.0),
                derived,
                label: None,
            })
            .collect();
        FeatureTable::new(schema, rows)
    }

    #[test]
    fn test_backward_fill_precedes_forward_fill() {
        let mut table = table_from(vec![vec![None], vec![Some(1.0)], vec![None], vec![Some(3.0)], vec![None]]);
        let report = GapFill::default().complete(&mut table);
        assert_eq!(
            table.column("temp_roll_mean_2").unwrap(),
            vec![Some(1.0), Some(1.0), Some(3.0), Some(3.0), Some(3.0)]
        );
        assert_eq!(report.filled_cells, 3);
        assert_eq!(report.dropped_rows, 0);
    }

    #[test]
    fn test_all_missing_column_drops_rows() {
        let mut table = table_from(vec![vec![None], vec![None]]);
        let report = GapFill::default().complete(&mut table);
        assert!(table.is_empty());
        assert_eq!(report.dropped_rows, 2);
    }

    #[test]
    fn test_table_scope_crosses_machines() {
        let readings = vec![
            reading("A", 0, 10.0),
            reading("A", 1, 20.0),
            reading("B", 0, 100.0),
        ];
        let mut table = FeatureBuilder::new(&window_two()).unwrap().build(&readings).unwrap();
        GapFill::new(FillScope::Table).complete(&mut table);
        // B's only row takes A's last mean through the forward pass
        assert_eq!(
            table.column("temp_roll_mean_2").unwrap(),
            vec![Some(15.0), Some(15.0), Some(15.0)]
        );
    }

    #[test]
    fn test_partition_scope_drops_short_machines() {
        let readings = vec![
            reading("A", 0, 10.0),
            reading("A", 1, 20.0),
            reading("B", 0, 100.0),
        ];
        let mut table = FeatureBuilder::new(&window_two()).unwrap().build(&readings).unwrap();
        let report = GapFill::new(FillScope::Partition).complete(&mut table);
        assert_eq!(report.dropped_rows, 1);
        assert!(table.rows().iter().all(|r| r.reading.machine_id.as_str() == "A"));
    }

    proptest! {
        #[test]
        fn prop_fill_is_idempotent(
            temps in proptest::collection::vec(0.0f64..100.0, 0..30),
            machines in 1usize..4,
            partition_scope in any::<bool>(),
        ) {
            let readings: Vec<Reading> = temps
                .iter()
                .enumerate()
                .map(|(i, &t)| reading(&format!("m{}", i % machines), i as i64, t))
                .collect();
            let mut table = FeatureBuilder::new(&FeatureConfig::default())
                .unwrap()
                .build(&readings)
                .unwrap();
            let scope = if partition_scope { FillScope::Partition } else { FillScope::Table };
            let fill = GapFill::new(scope);
            fill.complete(&mut table);
            prop_assert_eq!(table.missing_cells(), 0);

            let once = table.clone();
            let report = fill.complete(&mut table);
            prop_assert_eq!(report.filled_cells, 0);
            prop_assert_eq!(report.dropped_rows, 0);
            prop_assert_eq!(table, once);
        }
    }
}
