//! Walks the grid leaves of a profile tree.
//!
//! Grids are large and numeric, the rest of a profile is small metadata, so
//! storage keeps them apart: [`separate`] swaps each grid for its position in
//! an ordered list, [`join`] puts them back, and [`convert_legacy`] turns the
//! sparse coordinate maps of old releases into dense grids.
//!
//! All three visit groups in key order. `join` only lines up with the list a
//! `separate` produced if the tree has not been restructured in between.

use crate::error::{ProfileError, Result};
use crate::grid::Grid;
use crate::profile::{Group, Key, Node, ProfileRecord};
use serde::{Deserialize, Serialize};

/// Replaces every grid leaf with a [`Node::GridRef`] and returns the grids
/// in traversal order.
pub fn separate(group: &mut Group) -> Vec<Grid> {
    let mut grids = Vec::new();
    separate_into(group, &mut grids);
    grids
}

fn separate_into(group: &mut Group, grids: &mut Vec<Grid>) {
    for node in group.values_mut() {
        match node {
            Node::Group(child) => separate_into(child, grids),
            Node::Grid(_) => {
                let index = grids.len();
                if let Node::Grid(grid) = std::mem::replace(node, Node::GridRef(index)) {
                    grids.push(grid);
                }
            }
            _ => {}
        }
    }
}

/// Replaces every [`Node::GridRef`] with the grid at that index.
///
/// # Errors
///
/// Returns `GridIndex` if a placeholder points past the end of `grids`. The
/// tree may be partially joined when that happens.
pub fn join(group: &mut Group, grids: &[Grid]) -> Result<()> {
    for node in group.values_mut() {
        match node {
            Node::Group(child) => join(child, grids)?,
            Node::GridRef(index) => {
                let grid = grids.get(*index).ok_or(ProfileError::GridIndex {
                    index: *index,
                    available: grids.len(),
                })?;
                *node = Node::Grid(grid.clone());
            }
            _ => {}
        }
    }
    Ok(())
}

/// Outcome of a legacy conversion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Sparse maps turned into dense grids.
    pub converted: usize,
    /// Coordinates discarded for lying outside their resolution.
    pub dropped: usize,
}

/// Converts every sparse map keyed by a resolution into a dense grid.
///
/// Out-of-bounds coordinates are discarded, never indexed. Sparse maps under
/// a plain field name have no size to allocate and are left in place.
pub fn convert_legacy(group: &mut Group) -> ConvertSummary {
    let mut summary = ConvertSummary::default();
    convert_into(group, &mut summary);
    summary
}

fn convert_into(group: &mut Group, summary: &mut ConvertSummary) {
    for (key, node) in group.iter_mut() {
        match node {
            Node::Group(child) => convert_into(child, summary),
            Node::Sparse(sparse) => match key {
                Key::Resolution(res) => {
                    let (grid, dropped) = sparse.to_dense(*res);
                    if dropped > 0 {
                        tracing::warn!(
                            "Dropped {} out-of-bounds legacy coordinates for {}",
                            dropped,
                            res
                        );
                    }
                    summary.converted += 1;
                    summary.dropped += dropped;
                    *node = Node::Grid(grid);
                }
                Key::Name(name) => {
                    tracing::warn!("Sparse map under '{}' has no resolution, leaving as-is", name);
                }
            },
            _ => {}
        }
    }
}

/// A profile split into its metadata tree and its grid list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridBundle {
    pub metadata: ProfileRecord,
    pub grids: Vec<Grid>,
}

impl GridBundle {
    pub fn split(mut record: ProfileRecord) -> Self {
        let grids = separate(record.root_mut());
        Self {
            metadata: record,
            grids,
        }
    }

    pub fn join(self) -> Result<ProfileRecord> {
        let mut record = self.metadata;
        join(record.root_mut(), &self.grids)?;
        Ok(record)
    }
}
