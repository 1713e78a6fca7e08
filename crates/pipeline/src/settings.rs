//! Pipeline Settings

use crate::PipelineError;
use alerting::{SimulationConfig, TierThresholds};
use config::{Config, Environment, File};
use feature_engine::{FeatureConfig, FillScope, LabelConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Prefix of environment overrides, e.g. `FACTORYGUARD__TIERS__HIGH=0.8`
pub const ENV_PREFIX: &str = "FACTORYGUARD";

/// Settings read from the environment as comma-separated lists,
/// e.g. `FACTORYGUARD__FEATURES__WINDOWS=3,6`
const LIST_KEYS: [&str; 6] = [
    "features.windows",
    "features.lags",
    "features.mean_channels",
    "features.std_channels",
    "features.ema_channels",
    "features.lag_channels",
];

/// Completion settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub scope: FillScope,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// All tunable pipeline parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub features: FeatureConfig,
    pub labels: LabelConfig,
    pub completion: CompletionSettings,
    pub tiers: TierThresholds,
    pub simulation: SimulationConfig,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Layer built-in defaults, an optional TOML file and environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let mut environment = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .try_parsing(true);
        for key in LIST_KEYS {
            environment = environment.with_list_parse_key(key);
        }
        builder = builder.add_source(environment);

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.features.validate()?;
        self.labels.validate()?;
        self.tiers.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_ingest::Channel;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_constants() {
        let settings = Settings::default();
        assert_eq!(settings.features.windows, vec![6, 12]);
        assert_eq!(settings.features.ema_span, 6);
        assert_eq!(settings.features.lags, vec![1, 2]);
        assert_eq!(settings.labels.horizon, 24);
        assert_eq!(settings.tiers.medium, 0.40);
        assert_eq!(settings.tiers.high, 0.70);
        assert_eq!(settings.completion.scope, FillScope::Table);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[features]
ema_span = 4
std_channels = ["temperature", "vibration"]

[labels]
horizon = 12

[completion]
scope = "partition"

[tiers]
high = 0.8
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.features.ema_span, 4);
        assert_eq!(settings.features.std_channels.len(), 2);
        assert_eq!(settings.features.lags, vec![1, 2]);
        assert_eq!(settings.labels.horizon, 12);
        assert_eq!(settings.completion.scope, FillScope::Partition);
        assert_eq!(settings.tiers.high, 0.8);
        assert_eq!(settings.tiers.medium, 0.40);
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[tiers]\nmedium = 0.9\nhigh = 0.5").unwrap();
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(PipelineError::Alert(_))
        ));
    }

    #[test]
    fn test_list_overrides_from_environment() {
        std::env::set_var("FACTORYGUARD__FEATURES__WINDOWS", "3,6");
        std::env::set_var("FACTORYGUARD__FEATURES__LAG_CHANNELS", "temperature,pressure");
        let loaded = Settings::load(None);
        std::env::remove_var("FACTORYGUARD__FEATURES__WINDOWS");
        std::env::remove_var("FACTORYGUARD__FEATURES__LAG_CHANNELS");

        let settings = loaded.unwrap();
        assert_eq!(settings.features.windows, vec![3, 6]);
        assert_eq!(
            settings.features.lag_channels,
            vec![Channel::Temperature, Channel::Pressure]
        );
        assert_eq!(settings.features.lags, vec![1, 2]);
    }
}
