//! Feature Table Assembly

use crate::config::FeatureConfig;
use crate::partition::partition_by_machine;
use crate::statistics::{ExponentialMovingAverage, LagBuffer, RollingWindow};
use crate::FeatureError;
use sensor_ingest::{Channel, Reading};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How a derived column is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    RollingMean { channel: Channel, window: usize },
    RollingStd { channel: Channel, window: usize },
    Ema { channel: Channel, span: usize },
    Lag { channel: Channel, lag: usize },
}

impl FeatureKind {
    /// Source channel of the feature
    pub fn channel(&self) -> Channel {
        match *self {
            FeatureKind::RollingMean { channel, .. }
            | FeatureKind::RollingStd { channel, .. }
            | FeatureKind::Ema { channel, .. }
            | FeatureKind::Lag { channel, .. } => channel,
        }
    }

    /// Column name, e.g. `temp_roll_mean_6` or `temp_lag_1`
    pub fn column_name(&self) -> String {
        match *self {
            FeatureKind::RollingMean { channel, window } => {
                format!("{}_roll_mean_{}", channel.prefix(), window)
            }
            FeatureKind::RollingStd { channel, window } => {
                format!("{}_roll_std_{}", channel.prefix(), window)
            }
            FeatureKind::Ema { channel, span } => format!("{}_ema_{}", channel.prefix(), span),
            FeatureKind::Lag { channel, lag } => format!("{}_lag_{}", channel.prefix(), lag),
        }
    }
}

/// A named derived column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

/// Ordered list of derived columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    /// Lay out columns: per window the means then the stds, then EMAs, then lags
    pub fn from_config(config: &FeatureConfig) -> Result<Self, FeatureError> {
        config.validate()?;

        let mut kinds = Vec::new();
        for &window in &config.windows {
            for &channel in &config.mean_channels {
                kinds.push(FeatureKind::RollingMean { channel, window });
            }
            for &channel in &config.std_channels {
                kinds.push(FeatureKind::RollingStd { channel, window });
            }
        }
        for &channel in &config.ema_channels {
            kinds.push(FeatureKind::Ema {
                channel,
                span: config.ema_span,
            });
        }
        for &channel in &config.lag_channels {
            for &lag in &config.lags {
                kinds.push(FeatureKind::Lag { channel, lag });
            }
        }

        let columns = kinds
            .into_iter()
            .map(|kind| FeatureColumn {
                name: kind.column_name(),
                kind,
            })
            .collect();
        Ok(Self { columns })
    }

    /// Derived columns in output order
    pub fn derived(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Number of derived columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of a derived column by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Columns a classifier sees: raw channels then derived features.
    /// Identity columns and the failure flag are never included.
    pub fn model_columns(&self) -> Vec<String> {
        Channel::ALL
            .iter()
            .map(|c| c.column().to_string())
            .chain(self.columns.iter().map(|c| c.name.clone()))
            .collect()
    }
}

/// A reading extended with its derived columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub reading: Reading,
    /// Derived values aligned with the schema; `None` is the no-value marker
    pub derived: Vec<Option<f64>>,
    /// Forward-looking failure label, set on the training path only
    pub label: Option<u8>,
}

impl FeatureRow {
    /// Values in model column order
    pub fn model_values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        Channel::ALL
            .iter()
            .map(|&c| Some(self.reading.channel(c)))
            .chain(self.derived.iter().copied())
    }

    /// True when no derived value is missing
    pub fn is_complete(&self) -> bool {
        self.derived.iter().all(Option::is_some)
    }
}

/// Feature rows sharing one schema, in machine then timestamp order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    schema: FeatureSchema,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Create a table from rows already laid out per `schema`
    pub fn new(schema: FeatureSchema, rows: Vec<FeatureRow>) -> Self {
        Self { schema, rows }
    }

    /// Column layout shared by every row
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Rows in machine then timestamp order
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Mutable rows, for labeling and completion passes
    pub fn rows_mut(&mut self) -> &mut Vec<FeatureRow> {
        &mut self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of derived cells holding the no-value marker
    pub fn missing_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.derived.iter().filter(|v| v.is_none()).count())
            .sum()
    }

    /// Derived column values by name, in row order
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.schema.position(name)?;
        Some(self.rows.iter().map(|r| r.derived[idx]).collect())
    }
}

/// Per-column scan state for one machine partition
enum Scanner {
    Mean(RollingWindow),
    Std(RollingWindow),
    Ema(ExponentialMovingAverage),
    Lag(LagBuffer),
}

impl Scanner {
    fn for_kind(kind: FeatureKind) -> Result<Self, FeatureError> {
        Ok(match kind {
            FeatureKind::RollingMean { window, .. } => Scanner::Mean(RollingWindow::new(window)?),
            FeatureKind::RollingStd { window, .. } => Scanner::Std(RollingWindow::new(window)?),
            FeatureKind::Ema { span, .. } => {
                Scanner::Ema(ExponentialMovingAverage::with_span(span))
            }
            FeatureKind::Lag { lag, .. } => Scanner::Lag(LagBuffer::new(lag)?),
        })
    }

    fn step(&mut self, value: f64) -> Option<f64> {
        match self {
            Scanner::Mean(window) => {
                window.push(value);
                window.mean()
            }
            Scanner::Std(window) => {
                window.push(value);
                window.sample_std_dev()
            }
            Scanner::Ema(ema) => Some(ema.update(value)),
            Scanner::Lag(lag) => {
                lag.push(value);
                lag.value()
            }
        }
    }
}

/// Derives rolling, smoothing and lag features per machine
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    schema: FeatureSchema,
}

impl FeatureBuilder {
    /// Validate the configuration and fix the column layout
    pub fn new(config: &FeatureConfig) -> Result<Self, FeatureError> {
        Ok(Self {
            schema: FeatureSchema::from_config(config)?,
        })
    }

    /// Column layout of every table this builder produces
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Build one feature row per reading.
    ///
    /// Rows are emitted partition by partition (machine-id order) and in
    /// timestamp order inside each partition. Scanners are reset at every
    /// partition boundary, so no statistic ever mixes two machines.
    pub fn build(&self, readings: &[Reading]) -> Result<FeatureTable, FeatureError> {
        let partitions = partition_by_machine(readings, |r: &Reading| (&r.machine_id, r.timestamp));
        debug!(
            "Building features for {} readings across {} machines",
            readings.len(),
            partitions.len()
        );

        let mut rows = Vec::with_capacity(readings.len());
        for partition in &partitions {
            let mut scanners = self
                .schema
                .derived()
                .iter()
                .map(|c| Scanner::for_kind(c.kind))
                .collect::<Result<Vec<_>, _>>()?;

            for &idx in &partition.rows {
                let reading = &readings[idx];
                let derived = self
                    .schema
                    .derived()
                    .iter()
                    .zip(scanners.iter_mut())
                    .map(|(column, scanner)| scanner.step(reading.channel(column.kind.channel())))
                    .collect();
                rows.push(FeatureRow {
                    reading: reading.clone(),
                    derived,
                    label: None,
                });
            }
        }

        let table = FeatureTable::new(self.schema.clone(), rows);
        info!(
            "Derived {} feature columns for {} rows ({} warm-up cells)",
            self.schema.len(),
            table.len(),
            table.missing_cells()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;
    use sensor_ingest::MachineId;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn reading(machine: &str, hour: i64, temperature: f64) -> Reading {
        Reading {
            machine_id: MachineId::from(machine),
            timestamp: start() + Duration::hours(hour),
            temperature,
            vibration: temperature / 100.0,
            pressure: 30.0 + temperature / 10.0,
            failure: 0,
        }
    }

    fn single_window(window: usize) -> FeatureConfig {
        FeatureConfig {
            windows: vec![window],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_column_layout() {
        let schema = FeatureSchema::from_config(&FeatureConfig::default()).unwrap();
        let names: Vec<&str> = schema.derived().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "temp_roll_mean_6",
                "vib_roll_mean_6",
                "press_roll_mean_6",
                "temp_roll_std_6",
                "temp_roll_mean_12",
                "vib_roll_mean_12",
                "press_roll_mean_12",
                "temp_roll_std_12",
                "temp_ema_6",
                "temp_lag_1",
                "temp_lag_2",
            ]
        );
        let model = schema.model_columns();
        assert_eq!(&model[..3], &["temperature", "vibration", "pressure"]);
        assert_eq!(model.len(), 14);
    }

    #[test]
    fn test_rolling_mean_window_two() {
        let builder = FeatureBuilder::new(&single_window(2)).unwrap();
        let readings = vec![
            reading("M1", 0, 60.0),
            reading("M1", 1, 61.0),
            reading("M1", 2, 62.0),
        ];
        let table = builder.build(&readings).unwrap();
        let mean = table.column("temp_roll_mean_2").unwrap();
        assert_eq!(mean, vec![None, Some(60.5), Some(61.5)]);
    }

    #[test]
    fn test_empty_input() {
        let builder = FeatureBuilder::new(&FeatureConfig::default()).unwrap();
        let table = builder.build(&[]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_single_observation_machine() {
        let builder = FeatureBuilder::new(&FeatureConfig::default()).unwrap();
        let table = builder.build(&[reading("solo", 0, 70.0)]).unwrap();
        let row = &table.rows()[0];
        let ema = table.schema().position("temp_ema_6").unwrap();
        for (idx, value) in row.derived.iter().enumerate() {
            if idx == ema {
                assert_eq!(*value, Some(70.0));
            } else {
                assert_eq!(*value, None);
            }
        }
    }

    #[test]
    fn test_lags_never_cross_machines() {
        let builder = FeatureBuilder::new(&single_window(2)).unwrap();
        let readings = vec![
            reading("A", 0, 10.0),
            reading("A", 1, 11.0),
            reading("A", 2, 12.0),
            reading("B", 0, 50.0),
            reading("B", 1, 51.0),
        ];
        let table = builder.build(&readings).unwrap();
        let lag1 = table.column("temp_lag_1").unwrap();
        let lag2 = table.column("temp_lag_2").unwrap();
        assert_eq!(lag1, vec![None, Some(10.0), Some(11.0), None, Some(50.0)]);
        assert_eq!(lag2, vec![None, None, Some(10.0), None, None]);
        let mean = table.column("temp_roll_mean_2").unwrap();
        assert_eq!(mean[3], None);
    }

    #[test]
    fn test_unordered_input_is_sorted_per_machine() {
        let builder = FeatureBuilder::new(&single_window(2)).unwrap();
        let readings = vec![
            reading("2", 1, 21.0),
            reading("10", 0, 100.0),
            reading("2", 0, 20.0),
        ];
        let table = builder.build(&readings).unwrap();
        let ids: Vec<(&str, f64)> = table
            .rows()
            .iter()
            .map(|r| (r.reading.machine_id.as_str(), r.reading.temperature))
            .collect();
        assert_eq!(ids, vec![("2", 20.0), ("2", 21.0), ("10", 100.0)]);
    }

    #[test]
    fn test_std_only_on_configured_channels() {
        let builder = FeatureBuilder::new(&FeatureConfig::default()).unwrap();
        assert!(builder.schema().position("temp_roll_std_6").is_some());
        assert!(builder.schema().position("vib_roll_std_6").is_none());
        assert!(builder.schema().position("press_roll_std_12").is_none());
    }

    proptest! {
        #[test]
        fn prop_row_count_and_identity_preserved(
            temps in proptest::collection::vec(0.0f64..200.0, 0..40),
            machines in 1usize..4,
        ) {
            let readings: Vec<Reading> = temps
                .iter()
                .enumerate()
                .map(|(i, &t)| reading(&format!("m{}", i % machines), i as i64, t))
                .collect();
            let builder = FeatureBuilder::new(&FeatureConfig::default()).unwrap();
            let table = builder.build(&readings).unwrap();
            prop_assert_eq!(table.len(), readings.len());
            for row in table.rows() {
                prop_assert!(readings.contains(&row.reading));
            }
        }

        #[test]
        fn prop_rolling_stats_match_direct_computation(
            temps in proptest::collection::vec(0.0f64..200.0, 1..40),
            window in 2usize..8,
        ) {
            let readings: Vec<Reading> = temps
                .iter()
                .enumerate()
                .map(|(i, &t)| reading("m", i as i64, t))
                .collect();
            let builder = FeatureBuilder::new(&single_window(window)).unwrap();
            let table = builder.build(&readings).unwrap();
            let mean = table.column(&format!("temp_roll_mean_{window}")).unwrap();
            let std = table.column(&format!("temp_roll_std_{window}")).unwrap();

            for i in 0..temps.len() {
                if i + 1 < window {
                    prop_assert!(mean[i].is_none());
                    prop_assert!(std[i].is_none());
                } else {
                    let slice = &temps[i + 1 - window..=i];
                    let m = slice.iter().sum::<f64>() / window as f64;
                    let var = slice.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (window - 1) as f64;
                    prop_assert!((mean[i].unwrap() - m).abs() < 1e-9);
                    prop_assert!((std[i].unwrap() - var.sqrt()).abs() < 1e-9);
                }
            }
        }

        #[test]
        fn prop_lag_and_ema(temps in proptest::collection::vec(0.0f64..200.0, 1..40)) {
            let readings: Vec<Reading> = temps
                .iter()
                .enumerate()
                .map(|(i, &t)| reading("m", i as i64, t))
                .collect();
            let builder = FeatureBuilder::new(&FeatureConfig::default()).unwrap();
            let table = builder.build(&readings).unwrap();
            let ema = table.column("temp_ema_6").unwrap();
            prop_assert_eq!(ema[0], Some(temps[0]));
            prop_assert!(ema.iter().all(Option::is_some));

            for k in [1usize, 2] {
                let lag = table.column(&format!("temp_lag_{k}")).unwrap();
                for i in 0..temps.len() {
                    if i < k {
                        prop_assert_eq!(lag[i], None);
                    } else {
                        prop_assert_eq!(lag[i], Some(temps[i - k]));
                    }
                }
            }
        }
    }
}
