//! Error types for profile handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shared error type for profile migration and grid handling.
///
/// Unknown schema versions and rejected resolutions are deliberately absent:
/// both are handled as data (oldest version, silent pruning), never as failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProfileError {
    /// A field guaranteed by an earlier migration step is absent.
    #[error("Missing field: {path}")]
    MissingField { path: String },

    /// A field exists but holds the wrong kind of node.
    #[error("Type mismatch at {path}: expected {expected}")]
    TypeMismatch { path: String, expected: String },

    /// A grid placeholder points past the end of the grid list.
    #[error("Grid index {index} out of range ({available} grids available)")]
    GridIndex { index: usize, available: usize },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProfileError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a MissingField error from a field path.
    pub fn missing(path: &[&str]) -> Self {
        Self::MissingField {
            path: path.join("."),
        }
    }

    /// Creates a TypeMismatch error from a field path.
    pub fn mismatch(path: &[&str], expected: &'static str) -> Self {
        Self::TypeMismatch {
            path: path.join("."),
            expected: expected.to_string(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a MissingField error
    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }

    /// Check if this is a TypeMismatch error
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Returns true when the error means the record is structurally corrupt.
    ///
    /// Corruption aborts the load of that one profile; the caller decides
    /// whether to fall back to a fresh record or a backup.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. } | Self::TypeMismatch { .. } | Self::GridIndex { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ProfileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ProfileError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ProfileError>`.
pub type Result<T> = std::result::Result<T, ProfileError>;
