//! Domain model for per-program usage profiles.
//!
//! - [`version`]: the append-only schema version history
//! - [`profile`]: the tagged profile tree and its path accessors
//! - [`grid`]: dense count grids and legacy sparse maps
//! - [`maps`]: split, join and legacy conversion over grid leaves
//! - [`resolution`]: display resolutions and the aspect-ratio allow-list
//!
//! Nothing in this crate performs I/O.

pub mod error;
pub mod grid;
pub mod input;
pub mod maps;
pub mod profile;
pub mod resolution;
pub mod version;

// Re-export common error type
pub use error::ProfileError;
pub use grid::{Count, Grid, SparseGrid};
pub use profile::{Group, Key, Node, ProfileRecord};
pub use resolution::{Point, Resolution};
pub use version::{CURRENT_VERSION, SchemaVersion, VERSION_HISTORY};
