//! Chatbot configuration types.
//!
//! Configuration is read from an optional JSON file; every field has a
//! default, so an empty object `{}` is a valid configuration.
//!
//! ```
//! use guidebot::config::ChatbotConfig;
//!
//! let config: ChatbotConfig = serde_json::from_str(r#"{"training": {"c": 2.0}}"#).unwrap();
//! assert_eq!(config.training.c, 2.0);
//! assert_eq!(config.training.max_iterations, 1000);
//! assert_eq!(config.model_dir.to_str(), Some("model"));
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GuidebotError, Result};

/// Hyperparameters for the logistic regression trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Inverse regularization strength.
    pub c: f64,
    /// Newton iteration cap per label.
    pub max_iterations: usize,
    /// Relative gradient-norm stopping tolerance.
    pub tolerance: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            c: 1.0,
            max_iterations: 1000,
            tolerance: 1e-4,
        }
    }
}

impl TrainingConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(GuidebotError::invalid_config(format!(
                "c must be a positive number, got {}",
                self.c
            )));
        }
        if self.max_iterations == 0 {
            return Err(GuidebotError::invalid_config(
                "max_iterations must be greater than 0",
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(GuidebotError::invalid_config(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Top-level chatbot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatbotConfig {
    /// Directory holding the persisted model artifacts.
    pub model_dir: PathBuf,
    /// Intent catalog file; the built-in catalog is used when absent.
    pub catalog_path: Option<PathBuf>,
    /// Trainer hyperparameters.
    pub training: TrainingConfig,
    /// Seed for response selection. Unseeded selection uses the thread RNG.
    pub seed: Option<u64>,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        ChatbotConfig {
            model_dir: PathBuf::from("model"),
            catalog_path: None,
            training: TrainingConfig::default(),
            seed: None,
        }
    }
}

impl ChatbotConfig {
    /// Load and validate a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            GuidebotError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: ChatbotConfig = serde_json::from_str(&json)
            .map_err(|e| GuidebotError::invalid_config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.model_dir.as_os_str().is_empty() {
            return Err(GuidebotError::invalid_config("model_dir must not be empty"));
        }
        self.training.validate()
    }

    pub fn with_model_dir<P: Into<PathBuf>>(mut self, model_dir: P) -> Self {
        self.model_dir = model_dir.into();
        self
    }

    pub fn with_catalog_path<P: Into<PathBuf>>(mut self, catalog_path: P) -> Self {
        self.catalog_path = Some(catalog_path.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
