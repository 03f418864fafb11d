//! Core traits for the migration framework.
//!
//! A profile migration is a structural edit that lifts a record from one
//! schema version to the next. Migrations edit the record in place and may
//! rely on every postcondition left by the migrations before them.

use mtrack_core::error::Result;
use mtrack_core::{ProfileRecord, SchemaVersion};

/// Inputs a migration may read besides the record itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MigrationContext {
    /// Wall-clock time in Unix seconds.
    ///
    /// Only creation and session timestamps may be stamped from it.
    pub now: f64,
}

impl MigrationContext {
    pub fn at(now: f64) -> Self {
        Self { now }
    }
}

/// Base trait for all migrations.
///
/// Provides version information and metadata about a migration step.
pub trait Migration: Send + Sync {
    /// Returns the source version this migration starts from.
    fn from_version(&self) -> SchemaVersion;

    /// Returns the target version this migration produces.
    fn to_version(&self) -> SchemaVersion;

    /// Checks if this migration still has to run for a record at `version`.
    fn can_migrate(&self, version: SchemaVersion) -> bool {
        version < self.to_version()
    }

    /// Short identifier used in reports.
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of this migration.
    ///
    /// Used for logging and debugging purposes.
    fn description(&self) -> &str;
}

/// A migration that edits a profile record.
pub trait ProfileMigration: Migration + std::fmt::Debug {
    /// Applies the structural edit.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` or `TypeMismatch` when the record lacks a
    /// postcondition of an earlier step. The record is then in an
    /// unspecified state and must be discarded.
    fn migrate(&self, record: &mut ProfileRecord, ctx: &MigrationContext) -> Result<()>;
}

/// A chain of migrations that can automatically upgrade data to the latest version.
///
/// Implementations must run every pending step in order, never skipping one.
pub trait MigrationChain {
    /// Migrates a record from its stored version to the latest version.
    ///
    /// The record is consumed; on error it is dropped, so callers that need
    /// the original must keep their own copy.
    fn migrate_to_latest(
        &self,
        record: ProfileRecord,
        ctx: &MigrationContext,
    ) -> anyhow::Result<ProfileRecord>;

    /// Returns the versions a record at `from` passes through, `from` first.
    fn available_path(&self, from: SchemaVersion) -> Vec<SchemaVersion>;
}
