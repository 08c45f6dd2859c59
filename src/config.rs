//! Run configuration for the training menu.
//!
//! Every field has a default, so an empty JSON object is a valid file.
//!
//! # Example
//!
//! ```json
//! {
//!   "data_dir": "data",
//!   "num_hidden": 30,
//!   "learning_rate": 0.1,
//!   "batch_size": 100,
//!   "num_batches": 600,
//!   "seed": 42
//! }
//! ```
use crate::error::Error;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the MNIST IDX files.
    pub data_dir: PathBuf,
    /// Where `save` and `load` keep the network state.
    pub state_path: PathBuf,
    pub num_hidden: usize,
    pub learning_rate: f64,
    /// Examples per training batch.
    pub batch_size: usize,
    /// Training batches per epoch.
    pub num_batches: usize,
    /// Passes over the training batches per "train" action.
    pub epochs: usize,
    /// Minimum output at the labelled class for a prediction to count as correct.
    pub threshold: f64,
    /// Seed for weight initialisation; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            state_path: PathBuf::from("data/network.state"),
            num_hidden: 20,
            learning_rate: 0.2,
            batch_size: 120,
            num_batches: 500,
            epochs: 1,
            threshold: 0.7,
            seed: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> crate::Result<()> {
        if self.num_hidden < 1 {
            return Err(Error::Config("num_hidden must be positive".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.batch_size < 1 || self.num_batches < 1 || self.epochs < 1 {
            return Err(Error::Config(
                "batch_size, num_batches and epochs must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::Config(format!(
                "threshold must lie in [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Reads and validates a JSON configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: Config = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.num_hidden, 20);
        assert_eq!(cfg.batch_size * cfg.num_batches, 60000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"num_hidden": 64, "seed": 3}"#).unwrap();
        assert_eq!(cfg.num_hidden, 64);
        assert_eq!(cfg.seed, Some(3));
        assert_eq!(cfg.learning_rate, 0.2);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"hidden": 64}"#).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cfg = Config {
            learning_rate: -0.1,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));

        let cfg = Config {
            threshold: 1.5,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            batch_size: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
