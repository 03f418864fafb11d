//! Platform paths for mtrack configuration.
//!
//! ```text
//! ~/.config/mtrack/       # Config directory (platform equivalent elsewhere)
//! └── config.toml         # Upgrade settings
//! ```

use mtrack_core::ProfileError;
use std::path::PathBuf;

const APP_DIR: &str = "mtrack";

pub struct MtrackPaths;

impl MtrackPaths {
    /// Returns the mtrack configuration directory.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when the platform has no config directory.
    pub fn config_dir() -> Result<PathBuf, ProfileError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| ProfileError::config("Cannot find config directory"))
    }

    /// Returns the path of `config.toml`.
    pub fn config_file() -> Result<PathBuf, ProfileError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}
