//src/config.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;
use tracing::warn;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_CONFIG_DIR: &str = "liftlog";
const CONFIG_ENV_VAR: &str = "LIFTLOG_CONFIG_DIR"; // Environment variable name

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine configuration directory.")]
    CannotDetermineConfigDir,
    #[error("I/O error accessing config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file (TOML): {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config data (TOML): {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid units name: {0}")]
    InvalidUnits(String),
    #[error("Invalid weight increment: {0}. Must be a positive number.")]
    InvalidWeightIncrement(f64),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric, // e.g., kg
    Imperial, // e.g., lbs
}

impl Units {
    /// Label used for weight and volume columns in exports.
    pub fn weight_label(self) -> &'static str {
        match self {
            Units::Metric => "kg",
            Units::Imperial => "lbs",
        }
    }
}

// Helper to parse a string into our Units enum
pub fn parse_units(units_str: &str) -> Result<Units, ConfigError> {
    for units in Units::iter() {
        if format!("{units:?}").eq_ignore_ascii_case(units_str) {
            return Ok(units);
        }
    }
    Err(ConfigError::InvalidUnits(units_str.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Config {
    pub units: Units,
    /// Step applied when a staged weight value is nudged up or down.
    pub weight_increment: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            units: Units::default(),
            weight_increment: 2.5,
        }
    }
}

/// Determines the path to the configuration file.
/// Exposed at crate root as get_config_path_util
///
/// # Errors
///
/// Returns `ConfigError` if no config directory can be determined or the
/// directory cannot be created.
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir_override = std::env::var(CONFIG_ENV_VAR).ok();

    let config_dir_path = match config_dir_override {
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if !path.is_dir() {
                warn!(
                    "Environment variable {} points to '{}', which is not a directory. Trying to create it.",
                    CONFIG_ENV_VAR,
                    path.display()
                );
                fs::create_dir_all(&path)?;
            }
            path
        }
        None => {
            let base_config_dir =
                dirs::config_dir().ok_or(ConfigError::CannotDetermineConfigDir)?;
            base_config_dir.join(APP_CONFIG_DIR)
        }
    };

    if !config_dir_path.exists() {
        fs::create_dir_all(&config_dir_path)?;
    }

    Ok(config_dir_path.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from the TOML file at the given path. A missing
/// file is created with default contents on the spot.
/// Exposed at crate root as load_config_util
///
/// # Errors
///
/// Returns `ConfigError` on I/O or TOML failure.
pub fn load_config(config_path: &Path) -> Result<Config, ConfigError> {
    if config_path.exists() {
        let config_content = fs::read_to_string(config_path)?;
        // serde(default) fills in any missing fields
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    } else {
        let default_config = Config::default();
        save_config(config_path, &default_config)?;
        Ok(default_config)
    }
}

/// Saves the configuration to the TOML file.
/// Exposed at crate root as save_config_util
///
/// # Errors
///
/// Returns `ConfigError` on I/O or TOML failure.
pub fn save_config(config_path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }
    let config_content = toml::to_string_pretty(config)?;
    fs::write(config_path, config_content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("metric").unwrap(), Units::Metric);
        assert_eq!(parse_units("IMPERIAL").unwrap(), Units::Imperial);
        assert!(matches!(
            parse_units("stone"),
            Err(ConfigError::InvalidUnits(_))
        ));
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.units, Units::Metric);
        assert!((config.weight_increment - 2.5).abs() < f64::EPSILON);

        let config: Config = toml::from_str("units = \"imperial\"").unwrap();
        assert_eq!(config.units, Units::Imperial);
        assert!((config.weight_increment - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = Config {
            units: Units::Imperial,
            weight_increment: 5.0,
        };
        let raw = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.units, config.units);
        assert!((parsed.weight_increment - config.weight_increment).abs() < f64::EPSILON);
    }
}
