//! Migration registry for managing the linear profile migration chain.
//!
//! Every record migrates through all intermediate versions; there are no
//! shortcuts between distant versions.

use super::traits::{MigrationChain, MigrationContext, ProfileMigration};
use anyhow::{Context, Result};
use mtrack_core::{ProfileRecord, SchemaVersion};
use std::sync::Arc;

/// Registry for managing a linear chain of migrations.
///
/// Migrations are stored in order and must form a continuous chain:
/// `-1 → 2.0 → 2.0.1 → ...`
///
/// When adding migrations via `register()`, the registry validates that each
/// new migration's `from_version()` matches the previous migration's `to_version()`.
#[derive(Debug)]
pub struct MigrationRegistry {
    /// Migrations in order, forming a linear chain.
    migrations: Vec<Arc<dyn ProfileMigration>>,
    /// The latest version this registry can migrate to.
    latest_version: SchemaVersion,
}

impl MigrationRegistry {
    /// Creates a new migration registry with the specified latest version.
    pub fn new(latest_version: SchemaVersion) -> Self {
        Self {
            migrations: Vec::new(),
            latest_version,
        }
    }

    /// Registers a single migration, validating chain continuity.
    ///
    /// # Panics
    ///
    /// Panics if the migration doesn't connect to the existing chain, or if
    /// it targets a version past the registry's latest version.
    pub fn register(&mut self, migration: Arc<dyn ProfileMigration>) {
        if let Some(last) = self.migrations.last() {
            assert_eq!(
                last.to_version(),
                migration.from_version(),
                "Migration chain broken: expected migration from {} (previous to_version), but got migration from {}. \
                 Description: '{}' (previous) -> '{}' (current)",
                last.to_version(),
                migration.from_version(),
                last.description(),
                migration.description()
            );
        }

        if migration.to_version() > self.latest_version {
            panic!(
                "Migration target version {} exceeds registry's latest version {}",
                migration.to_version(),
                self.latest_version
            );
        }

        self.migrations.push(migration);
    }

    /// Registers multiple migrations at once, in order.
    ///
    /// # Panics
    ///
    /// Panics if any migration breaks the chain continuity.
    pub fn register_all(&mut self, migrations: Vec<Arc<dyn ProfileMigration>>) {
        for migration in migrations {
            self.register(migration);
        }
    }

    pub fn latest_version(&self) -> SchemaVersion {
        self.latest_version
    }

    /// Returns the starting version of the first migration, if any.
    pub fn start_version(&self) -> Option<SchemaVersion> {
        self.migrations.first().map(|m| m.from_version())
    }

    /// Returns true if no migrations are registered.
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Returns the number of registered migrations.
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Migrations a record at `from` still needs to reach `to`, in order.
    pub fn pending(
        &self,
        from: SchemaVersion,
        to: SchemaVersion,
    ) -> impl Iterator<Item = &Arc<dyn ProfileMigration>> {
        self.migrations
            .iter()
            .filter(move |m| m.can_migrate(from) && m.to_version() <= to)
    }

    /// Migrates a record from its stored version up to `target`.
    ///
    /// After each step the record's version is stamped with the step's
    /// target, so a record stopped part-way is still self-describing.
    pub fn migrate_to(
        &self,
        mut record: ProfileRecord,
        target: SchemaVersion,
        ctx: &MigrationContext,
    ) -> Result<ProfileRecord> {
        let current_version = record.version();

        if current_version >= target {
            tracing::debug!(
                "Profile is already at version {} (target {}), no migration needed",
                current_version,
                target
            );
            return Ok(record);
        }

        let steps: Vec<_> = self.pending(current_version, target).collect();
        tracing::info!(
            "Starting migration from {} to {} ({} steps)",
            current_version,
            target,
            steps.len()
        );

        for (i, migration) in steps.iter().enumerate() {
            tracing::debug!(
                "Migration step {}/{}: {} -> {} ({})",
                i + 1,
                steps.len(),
                migration.from_version(),
                migration.to_version(),
                migration.description()
            );

            migration.migrate(&mut record, ctx).with_context(|| {
                format!(
                    "Migration failed at step {} ({}): {} -> {}",
                    i + 1,
                    migration.name(),
                    migration.from_version(),
                    migration.to_version()
                )
            })?;
            record.set_version(migration.to_version());
        }

        tracing::info!(
            "Migration completed successfully: {} -> {}",
            current_version,
            target
        );

        Ok(record)
    }
}

impl MigrationChain for MigrationRegistry {
    fn migrate_to_latest(
        &self,
        record: ProfileRecord,
        ctx: &MigrationContext,
    ) -> Result<ProfileRecord> {
        self.migrate_to(record, self.latest_version, ctx)
    }

    fn available_path(&self, from: SchemaVersion) -> Vec<SchemaVersion> {
        std::iter::once(from)
            .chain(
                self.pending(from, self.latest_version)
                    .map(|m| m.to_version()),
            )
            .collect()
    }
}
