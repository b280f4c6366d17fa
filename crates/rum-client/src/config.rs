//! Client configuration.
//!
//! Configs are plain RON files:
//!
//! ```ron
//! (
//!     project_id: 41000015,
//!     secret_key: "affc562c-8796-4714-b8ae-4b061ca48a6b",
//!     endpoint: "collector.example.com:13609",
//!     quest_timeout_ms: 3000,
//! )
//! ```
//!
//! Omitted fields take the defaults from [`crate::constants`].

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_QUEST_TIMEOUT, DEFAULT_SOURCE_TAG};

/// Error type for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a [`RumClient`](crate::RumClient) needs besides its transport.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Collector project id.
    pub project_id: i32,
    /// Shared secret used to sign each batch. Never logged.
    pub secret_key: String,
    /// Collector address, informational for the client; the transport dials it.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_quest_timeout_ms")]
    pub quest_timeout_ms: u64,
    /// `source` tag stamped onto every event.
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}

fn default_quest_timeout_ms() -> u64 {
    DEFAULT_QUEST_TIMEOUT.as_millis() as u64
}

fn default_source_tag() -> String {
    DEFAULT_SOURCE_TAG.to_string()
}

impl ClientConfig {
    pub fn new(project_id: i32, secret_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            project_id,
            secret_key: secret_key.into(),
            endpoint: endpoint.into(),
            connect_timeout_ms: default_connect_timeout_ms(),
            quest_timeout_ms: default_quest_timeout_ms(),
            source_tag: default_source_tag(),
        }
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id <= 0 {
            return Err(ConfigError::Invalid(format!(
                "project_id must be positive, got {}",
                self.project_id
            )));
        }
        if self.secret_key.is_empty() {
            return Err(ConfigError::Invalid("secret_key is required".into()));
        }
        if self.connect_timeout_ms == 0 || self.quest_timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        if self.source_tag.is_empty() {
            return Err(ConfigError::Invalid("source_tag must not be empty".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn quest_timeout(&self) -> Duration {
        Duration::from_millis(self.quest_timeout_ms)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("project_id", &self.project_id)
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("quest_timeout_ms", &self.quest_timeout_ms)
            .field("source_tag", &self.source_tag)
            .finish()
    }
}
