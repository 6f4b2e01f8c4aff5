//! Data-driven configuration loading from JSON.
//!
//! Every field of every config section carries a documented default, so a
//! missing file, a missing section, or a missing key never crashes startup;
//! the gap is filled with the default and the anomaly is logged.

use crate::economy::EconomyConfig;
use crate::tap::TapConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Errors that can occur during config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Top-level game configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub economy: EconomyConfig,
    pub tap: TapConfig,
}

impl GameConfig {
    /// Parse a config from a JSON string. Missing sections and keys fall
    /// back to defaults; unknown keys are ignored.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a config, substituting the full defaults (with a warning) when
    /// the source is absent or malformed.
    pub fn load_or_default(json: Option<&str>) -> Self {
        match json {
            None => {
                warn!("no game config provided, using defaults");
                Self::default()
            }
            Some(text) => Self::from_json_str(text).unwrap_or_else(|err| {
                warn!(%err, "malformed game config, using defaults");
                Self::default()
            }),
        }
    }
}
