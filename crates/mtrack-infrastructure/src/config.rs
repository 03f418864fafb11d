//! Upgrade settings, read from `config.toml`.

use crate::paths::MtrackPaths;
use mtrack_core::ProfileError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Idle gap after which a load counts as a new session.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

fn default_session_idle_secs() -> u64 {
    DEFAULT_SESSION_IDLE_SECS
}

/// Settings for [`crate::ProfileUpgrader`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Seconds since the last save after which a load starts a new session.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

impl UpgradeConfig {
    /// Loads settings from `path`.
    ///
    /// A missing or blank file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = toml::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads settings from the platform config directory.
    pub fn load_default() -> Result<Self, ProfileError> {
        Self::load(&MtrackPaths::config_file()?)
    }
}
