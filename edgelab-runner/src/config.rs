//! TOML configuration for every runner component.
//!
//! ```toml
//! [backtest]
//! initial_capital = 100000.0
//! lookback = 20
//! position_size = 1.0
//!
//! [environment]
//! drawdown_critical = 12.0
//!
//! [environment.reward]
//! open_cost = 0.05
//!
//! [walk_forward]
//! train_days = 252
//! test_days = 63
//!
//! [training]
//! symbol = "XAUUSD"
//! total_timesteps = 50000
//! ```
//!
//! Every section and field is optional; missing values take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use edgelab_core::env::EnvConfig;

use crate::runner::BacktestSettings;
use crate::training::TrainingConfig;
use crate::walk_forward::WalkForwardConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Immutable configuration for a whole session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeLabConfig {
    pub backtest: BacktestSettings,
    pub environment: EnvConfig,
    pub walk_forward: WalkForwardConfig,
    pub training: TrainingConfig,
}

impl EdgeLabConfig {
    /// Load, parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let bt = &self.backtest;
        if !(bt.initial_capital > 0.0) {
            return invalid(format!(
                "backtest.initial_capital must be positive, got {}",
                bt.initial_capital
            ));
        }
        if bt.lookback == 0 {
            return invalid("backtest.lookback must be at least 1".into());
        }
        if !(bt.position_size > 0.0) {
            return invalid(format!(
                "backtest.position_size must be positive, got {}",
                bt.position_size
            ));
        }

        let env = &self.environment;
        if !(env.initial_capital > 0.0) {
            return invalid(format!(
                "environment.initial_capital must be positive, got {}",
                env.initial_capital
            ));
        }
        if env.lookback == 0 {
            return invalid("environment.lookback must be at least 1".into());
        }
        if !(env.drawdown_critical > 0.0) {
            return invalid(format!(
                "environment.drawdown_critical must be positive, got {}",
                env.drawdown_critical
            ));
        }

        if let Err(e) = self.walk_forward.validate() {
            return invalid(format!("walk_forward: {e}"));
        }

        self.training
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("training: {e}")))
    }
}
