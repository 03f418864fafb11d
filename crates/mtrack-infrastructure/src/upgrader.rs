//! Load-time entry point: migrate a profile, then settle its session.

use crate::clock::{Clock, SystemClock};
use crate::config::UpgradeConfig;
use crate::migration::{MigrationContext, MigrationRegistry, build_profile_registry};
use crate::session::{SessionLifecycle, SessionTrigger};
use anyhow::{Context, Result};
use mtrack_core::{ProfileRecord, SchemaVersion};
use std::sync::Arc;

/// How the loaded profile will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// The profile is about to receive new tracking data.
    #[default]
    Live,
    /// The profile is only being read; session state is left alone.
    Scan,
}

/// What an upgrade did to a record.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeReport {
    /// Version the record carried before the upgrade.
    pub from: SchemaVersion,
    /// Names of the migration steps that ran, oldest first.
    pub applied: Vec<&'static str>,
    /// Why a new session started, if one did.
    pub new_session: Option<SessionTrigger>,
}

impl UpgradeReport {
    pub fn migrated(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Brings stored profiles up to the current schema.
pub struct ProfileUpgrader {
    registry: MigrationRegistry,
    lifecycle: SessionLifecycle,
    clock: Arc<dyn Clock>,
}

impl ProfileUpgrader {
    pub fn new(config: &UpgradeConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &UpgradeConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: build_profile_registry(),
            lifecycle: SessionLifecycle::from_config(config),
            clock,
        }
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Upgrades `record` in place.
    ///
    /// Work happens on a copy; if any step fails the error is returned and
    /// `record` is left exactly as it was.
    pub fn upgrade(&self, record: &mut ProfileRecord, mode: LoadMode) -> Result<UpgradeReport> {
        let now = self.clock.now();
        let from = record.version();
        if record
            .version_tag()
            .is_some_and(|tag| SchemaVersion::resolve(tag).as_str() != tag)
        {
            tracing::warn!(
                "Unknown profile version {:?}, reinitializing from {}",
                record.version_tag(),
                SchemaVersion::OLDEST
            );
        }

        let applied: Vec<&'static str> = self
            .registry
            .pending(from, self.registry.latest_version())
            .map(|m| m.name())
            .collect();

        let mut working = self.registry.migrate_to(
            record.clone(),
            self.registry.latest_version(),
            &MigrationContext::at(now),
        )?;

        let new_session = match mode {
            LoadMode::Live => self
                .lifecycle
                .apply(&mut working, from, now)
                .context("Failed to settle session state")?,
            LoadMode::Scan => None,
        };

        *record = working;
        Ok(UpgradeReport {
            from,
            applied,
            new_session,
        })
    }
}

impl std::fmt::Debug for ProfileUpgrader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileUpgrader")
            .field("registry", &self.registry)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use mtrack_core::{Node, ProfileError};

    const NOW: f64 = 1_700_000_000.0;

    fn upgrader() -> ProfileUpgrader {
        ProfileUpgrader::with_clock(&UpgradeConfig::default(), Arc::new(FixedClock(NOW)))
    }

    #[test]
    fn test_new_profile_live() {
        let mut record = ProfileRecord::new();
        let report = upgrader().upgrade(&mut record, LoadMode::Live).unwrap();

        assert_eq!(report.from, SchemaVersion::OLDEST);
        assert_eq!(report.applied.len(), 25);
        assert_eq!(report.applied.first(), Some(&"base_layout"));
        assert_eq!(report.applied.last(), Some(&"history_animation"));
        assert_eq!(report.new_session, Some(SessionTrigger::Upgraded));
        assert!(record.version().is_current());
        assert_eq!(record.float(&["Time", "Created"]).unwrap(), NOW);
        assert_eq!(record.int(&["TimesLoaded"]).unwrap(), 1);
    }

    #[test]
    fn test_scan_skips_session() {
        let mut record = ProfileRecord::new();
        let report = upgrader().upgrade(&mut record, LoadMode::Scan).unwrap();

        assert!(report.migrated());
        assert_eq!(report.new_session, None);
        assert!(record.version().is_current());
        assert_eq!(record.int(&["TimesLoaded"]).unwrap(), 0);
        assert!(!record.contains(&["Gamepad", "Session"]));
    }

    #[test]
    fn test_current_profile_runs_no_steps() {
        let upgrader = upgrader();
        let mut record = ProfileRecord::new();
        upgrader.upgrade(&mut record, LoadMode::Live).unwrap();

        let report = upgrader.upgrade(&mut record, LoadMode::Live).unwrap();
        assert!(!report.migrated());
        assert_eq!(report.new_session, None);
        assert_eq!(record.int(&["TimesLoaded"]).unwrap(), 1);
    }

    #[test]
    fn test_failure_leaves_record_untouched() {
        let mut record = ProfileRecord::new();
        record.set_version(SchemaVersion::resolve("2.0.5"));
        let before = record.clone();

        let err = upgrader().upgrade(&mut record, LoadMode::Live).unwrap_err();
        assert!(err.downcast_ref::<ProfileError>().unwrap().is_missing_field());
        assert_eq!(record, before);
    }

    #[test]
    fn test_unknown_version_reinitializes() {
        let mut record = ProfileRecord::new();
        record
            .insert(&["Version"], Node::Text("9.9.9".to_string()))
            .unwrap();
        let report = upgrader().upgrade(&mut record, LoadMode::Scan).unwrap();
        assert_eq!(report.from, SchemaVersion::OLDEST);
        assert!(record.version().is_current());
    }
}
