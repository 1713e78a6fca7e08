//! Forward-Looking Failure Labels

use crate::config::LabelConfig;
use crate::features::{FeatureRow, FeatureTable};
use crate::partition::partition_by_machine;
use crate::FeatureError;
use tracing::{info, warn};

/// Class balance of a labeled batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelSummary {
    pub positives: usize,
    pub negatives: usize,
}

impl LabelSummary {
    /// True when the batch holds only one class
    pub fn is_degenerate(&self) -> bool {
        self.positives == 0 || self.negatives == 0
    }
}

/// Turns point failure events into "failure within the next N rows" labels.
///
/// The window is counted in rows, not wall-clock time: it assumes each
/// machine reports at a regular hourly cadence. Gaps in the timestamps are
/// not resampled and will stretch the effective horizon.
#[derive(Debug, Clone)]
pub struct TargetLabeler {
    horizon: usize,
}

impl TargetLabeler {
    /// Create a labeler from a validated horizon
    pub fn new(config: &LabelConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        Ok(Self {
            horizon: config.horizon,
        })
    }

    /// Window length in rows, current row included
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Label every row of the table in place.
    ///
    /// Row `t` is positive when a failure occurs in rows `t ..= t + horizon - 1`
    /// of the same machine. Near the end of a partition only the rows that
    /// exist are considered; a missing future never yields a no-value.
    pub fn label(&self, table: &mut FeatureTable) -> LabelSummary {
        let rows = table.rows_mut();
        let partitions = partition_by_machine(rows.as_slice(), |r: &FeatureRow| {
            (&r.reading.machine_id, r.reading.timestamp)
        });

        let mut summary = LabelSummary::default();
        for partition in &partitions {
            // Nearest failure at or after each position, scanning backwards
            let mut next_failure: Option<usize> = None;
            for (pos, &idx) in partition.rows.iter().enumerate().rev() {
                if rows[idx].reading.is_failure() {
                    next_failure = Some(pos);
                }
                let positive = next_failure.is_some_and(|f| f - pos < self.horizon);
                rows[idx].label = Some(u8::from(positive));
                if positive {
                    summary.positives += 1;
                } else {
                    summary.negatives += 1;
                }
            }
        }

        info!(
            "Labeled {} rows with {}-row horizon: {} positive, {} negative",
            rows.len(),
            self.horizon,
            summary.positives,
            summary.negatives
        );
        if summary.is_degenerate() && !rows.is_empty() {
            warn!("Training batch contains a single label class; downstream evaluation will be degenerate");
        }
        summary
    }
}
