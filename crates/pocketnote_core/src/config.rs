//! Store and autosave configuration.
//!
//! # Responsibility
//! - Describe tunables for the storage slot and autosave behavior.
//! - Parse and validate JSON configuration documents.
//!
//! # Invariants
//! - A validated config has a non-empty storage key and a non-zero quota.

use crate::autosave::debounce::DEFAULT_QUIET_PERIOD;
use crate::service::note_store::DEFAULT_STORAGE_KEY;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Typical browser local-storage budget, used as the default slot quota.
pub const DEFAULT_MAX_BLOB_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Autosave tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutosaveConfig {
    pub enabled: bool,
    /// Quiet window before a pending edit is committed.
    pub quiet_period_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quiet_period_ms: u64::try_from(DEFAULT_QUIET_PERIOD.as_millis()).unwrap_or(800),
        }
    }
}

impl AutosaveConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

/// Top-level store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Slot name holding the serialized collection.
    pub storage_key: String,
    /// Per-slot byte quota; `None` disables the limit.
    pub max_blob_bytes: Option<usize>,
    pub autosave: AutosaveConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_blob_bytes: Some(DEFAULT_MAX_BLOB_BYTES),
            autosave: AutosaveConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_key cannot be empty".to_string()));
        }
        if self.max_blob_bytes == Some(0) {
            return Err(ConfigError::Invalid(
                "max_blob_bytes must be positive or null".to_string(),
            ));
        }
        Ok(())
    }
}
