//! Schema version registry.
//!
//! Profiles carry a textual version tag. The tags form an append-only
//! history; position in that history is the only ordering that matters.
//! Never reorder or remove entries, stored data depends on their indices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every schema version ever written, oldest first.
///
/// `-1` is the sentinel for records that predate versioning.
pub const VERSION_HISTORY: &[&str] = &[
    "-1", "2.0", "2.0.1", "2.0.1b", "2.0.2", "2.0.3", "2.0.4", "2.0.5", "2.0.5b", "2.0.6",
    "2.0.6b", "2.0.6c", "2.0.7", "2.0.8", "2.0.9", "2.0.9b", "2.0.9c", "2.0.9d", "2.0.9e",
    "2.0.10", "2.0.10b", "2.0.10c", "2.0.10d", "2.0.11", "2.0.12", "2.0.13",
];

/// The version every upgraded profile ends at.
pub const CURRENT_VERSION: &str = "2.0.13";

/// Returns the position of `id` in the history, or 0 when it is unknown.
///
/// Corrupted or foreign tags still get the fullest migration instead of
/// refusing to load.
pub fn index_of(id: &str) -> usize {
    VERSION_HISTORY.iter().position(|v| *v == id).unwrap_or(0)
}

/// A resolved position in [`VERSION_HISTORY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct SchemaVersion(usize);

impl SchemaVersion {
    /// The sentinel that predates every real schema.
    pub const OLDEST: SchemaVersion = SchemaVersion(0);

    /// Resolves a stored tag. Unknown tags resolve to [`SchemaVersion::OLDEST`].
    pub fn resolve(id: &str) -> Self {
        Self(index_of(id))
    }

    /// The latest schema version.
    pub fn current() -> Self {
        Self(VERSION_HISTORY.len() - 1)
    }

    /// Looks up a version by position; `None` past the end of the history.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < VERSION_HISTORY.len()).then_some(Self(index))
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn as_str(self) -> &'static str {
        VERSION_HISTORY[self.0]
    }

    pub fn is_current(self) -> bool {
        self == Self::current()
    }

    /// The version directly before this one, if any.
    pub fn previous(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    /// Iterates over every known version, oldest first.
    pub fn all() -> impl Iterator<Item = SchemaVersion> {
        (0..VERSION_HISTORY.len()).map(SchemaVersion)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.as_str().to_string()
    }
}

impl From<String> for SchemaVersion {
    fn from(id: String) -> Self {
        Self::resolve(&id)
    }
}
