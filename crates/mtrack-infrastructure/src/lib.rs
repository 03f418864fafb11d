//! Migration, session and storage machinery for mtrack profiles.
//!
//! [`ProfileUpgrader`] is the load-time entry point: it runs the pending
//! schema migrations and then settles session state for live use.

pub mod clock;
pub mod config;
pub mod migration;
pub mod paths;
pub mod session;
pub mod storage;
pub mod upgrader;

pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::config::UpgradeConfig;
pub use crate::migration::{MigrationRegistry, build_profile_registry};
pub use crate::session::{SessionLifecycle, SessionTrigger};
pub use crate::upgrader::{LoadMode, ProfileUpgrader, UpgradeReport};
