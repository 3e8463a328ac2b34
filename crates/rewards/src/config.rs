//! Configuration loading for the reward engine.
//!
//! All settings are loaded from a TOML configuration file. Every field has a
//! default so a partial (or absent) file still yields a working engine.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete reward engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Currency earning settings
    #[serde(default)]
    pub earning: EarningConfig,
    /// Game REST API endpoint
    #[serde(default)]
    pub api: ApiConfig,
    /// Purchase settings
    #[serde(default)]
    pub purchases: PurchaseConfig,
}

impl RewardsConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config.clamped())
    }

    /// Returns the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Returns a copy with all values forced into their valid ranges.
    pub fn clamped(mut self) -> Self {
        self.earning = self.earning.clamped();
        self
    }
}

/// Currency earning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningConfig {
    /// Silver awarded per eligible chat message
    pub silver_per_chat_message: i64,
    /// Silver awarded per poll vote
    pub silver_per_poll_vote: i64,
    /// Minimum seconds between chat awards for one user
    pub chat_cooldown_seconds: f64,
}

impl Default for EarningConfig {
    fn default() -> Self {
        Self {
            silver_per_chat_message: 5,
            silver_per_poll_vote: 50,
            chat_cooldown_seconds: 3.0,
        }
    }
}

impl EarningConfig {
    /// Returns a copy with negative amounts and cooldowns clamped to zero.
    pub fn clamped(mut self) -> Self {
        self.silver_per_chat_message = self.silver_per_chat_message.max(0);
        self.silver_per_poll_vote = self.silver_per_poll_vote.max(0);
        if !self.chat_cooldown_seconds.is_finite() || self.chat_cooldown_seconds < 0.0 {
            self.chat_cooldown_seconds = 0.0;
        }
        self
    }
}

/// Game REST API endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Host of the game's REST API
    pub host: String,
    /// Port of the game's REST API
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8765,
        }
    }
}

/// Purchase configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseConfig {
    /// Whether chat purchases are accepted at all
    pub enabled: bool,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(toml::ser::Error),
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Reward Engine Configuration

[earning]
silver_per_chat_message = 5
silver_per_poll_vote = 50
chat_cooldown_seconds = 3.0

[api]
host = "localhost"
port = 8765

[purchases]
enabled = true
"#
    .to_string()
}
