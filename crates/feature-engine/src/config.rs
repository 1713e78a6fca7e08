//! Feature and Label Configuration

use crate::FeatureError;
use sensor_ingest::Channel;
use serde::{Deserialize, Serialize};

/// Which derived columns to compute and with what parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Rolling window sizes, in output column order (default: 6, 12)
    pub windows: Vec<usize>,
    /// Channels that get a rolling mean per window
    pub mean_channels: Vec<Channel>,
    /// Channels that get a rolling sample std per window (default: temperature only)
    pub std_channels: Vec<Channel>,
    /// Channels that get an exponential moving average
    pub ema_channels: Vec<Channel>,
    /// EMA span; smoothing factor is `2 / (span + 1)`
    pub ema_span: usize,
    /// Channels that get lag features
    pub lag_channels: Vec<Channel>,
    /// Lag depths (default: 1, 2)
    pub lags: Vec<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            windows: vec![6, 12],
            mean_channels: Channel::ALL.to_vec(),
            std_channels: vec![Channel::Temperature],
            ema_channels: vec![Channel::Temperature],
            ema_span: 6,
            lag_channels: vec![Channel::Temperature],
            lags: vec![1, 2],
        }
    }
}

impl FeatureConfig {
    /// Check parameters and reject settings that would produce duplicate
    /// columns or a column that can never hold a value
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.windows.contains(&0) {
            return Err(FeatureError::InvalidConfig("window sizes must be >= 1".into()));
        }
        // A sample std needs two observations
        if !self.std_channels.is_empty() {
            if let Some(&window) = self.windows.iter().find(|&&w| w < 2) {
                return Err(FeatureError::InvalidConfig(format!(
                    "window {window} is too short for a rolling std; use >= 2 or clear std_channels"
                )));
            }
        }
        if self.lags.contains(&0) {
            return Err(FeatureError::InvalidConfig("lag depths must be >= 1".into()));
        }
        if self.ema_span == 0 && !self.ema_channels.is_empty() {
            return Err(FeatureError::InvalidConfig("EMA span must be >= 1".into()));
        }
        check_unique("windows", &self.windows)?;
        check_unique("lags", &self.lags)?;
        check_unique("mean_channels", &self.mean_channels)?;
        check_unique("std_channels", &self.std_channels)?;
        check_unique("ema_channels", &self.ema_channels)?;
        check_unique("lag_channels", &self.lag_channels)?;
        Ok(())
    }
}

fn check_unique<T: PartialEq + std::fmt::Debug>(field: &str, items: &[T]) -> Result<(), FeatureError> {
    for (i, item) in items.iter().enumerate() {
        if items[..i].contains(item) {
            return Err(FeatureError::InvalidConfig(format!(
                "{field} lists {item:?} more than once"
            )));
        }
    }
    Ok(())
}

/// Training label parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Forward-looking horizon in rows, current row included (default: 24)
    pub horizon: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self { horizon: 24 }
    }
}

impl LabelConfig {
    /// Reject an empty horizon
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.horizon == 0 {
            return Err(FeatureError::InvalidConfig("label horizon must be >= 1".into()));
        }
        Ok(())
    }

    /// Name of the label column, e.g. `failure_next_24h`
    pub fn column_name(&self) -> String {
        format!("failure_next_{}h", self.horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = FeatureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(LabelConfig::default().column_name(), "failure_next_24h");
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let zero_window = FeatureConfig {
            windows: vec![0],
            ..Default::default()
        };
        assert!(zero_window.validate().is_err());

        let dup_lag = FeatureConfig {
            lags: vec![1, 1],
            ..Default::default()
        };
        assert!(dup_lag.validate().is_err());

        assert!(LabelConfig { horizon: 0 }.validate().is_err());
    }

    #[test]
    fn test_single_row_window_needs_no_std() {
        let with_std = FeatureConfig {
            windows: vec![1],
            ..Default::default()
        };
        assert!(matches!(
            with_std.validate(),
            Err(FeatureError::InvalidConfig(msg)) if msg.contains("rolling std")
        ));

        let mean_only = FeatureConfig {
            windows: vec![1],
            std_channels: vec![],
            ..Default::default()
        };
        assert!(mean_only.validate().is_ok());
    }
}
