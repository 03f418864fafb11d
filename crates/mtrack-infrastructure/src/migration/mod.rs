//! Schema migration framework for profiles.
//!
//! Profiles written by any past release are brought up to the current
//! schema by a linear chain of migrations, one per release:
//!
//! ```text
//!   stored version ──► MigrationRegistry ──► current version
//!                        │
//!                        ├─ 2.0      base_layout
//!                        ├─ 2.0.1    add_acceleration
//!                        ├─ ...
//!                        └─ 2.0.13   history_animation
//! ```
//!
//! Only the steps newer than the stored version run, oldest first.
//!
//! # Adding a New Schema Version
//!
//! 1. Append the tag to `VERSION_HISTORY` in `mtrack_core::version` and
//!    update `CURRENT_VERSION`.
//! 2. Write the step function in `steps.rs` and append it to `STEPS`.
//!
//! Registration panics if the chain does not line up with the history.

mod registry;
pub mod steps;
mod traits;

// Public API
pub use registry::MigrationRegistry;
pub use steps::Step;
pub use traits::{Migration, MigrationChain, MigrationContext, ProfileMigration};

use mtrack_core::SchemaVersion;

/// Builds the registry holding every profile migration.
///
/// # Panics
///
/// Panics if the step table does not form a continuous chain up to the
/// current version.
pub fn build_profile_registry() -> MigrationRegistry {
    let mut registry = MigrationRegistry::new(SchemaVersion::current());
    registry.register_all(steps::all());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtrack_core::{ProfileRecord, VERSION_HISTORY};

    #[test]
    fn test_build_profile_registry() {
        let registry = build_profile_registry();
        assert_eq!(registry.len(), VERSION_HISTORY.len() - 1);
        assert_eq!(registry.start_version(), Some(SchemaVersion::OLDEST));
        assert_eq!(registry.latest_version(), SchemaVersion::current());
    }

    #[test]
    fn test_fresh_profile_reaches_current() {
        let registry = build_profile_registry();
        let record = registry
            .migrate_to_latest(ProfileRecord::new(), &MigrationContext::at(1.0))
            .unwrap();
        assert!(record.version().is_current());
        assert!(record.contains(&["Resolution"]));
        assert!(record.contains(&["HistoryAnimation", "Keyboard"]));
        assert!(!record.contains(&["Maps"]));
    }

    #[test]
    fn test_path_from_oldest_visits_every_version() {
        let registry = build_profile_registry();
        let path = registry.available_path(SchemaVersion::OLDEST);
        assert_eq!(path, SchemaVersion::all().collect::<Vec<_>>());
    }
}
