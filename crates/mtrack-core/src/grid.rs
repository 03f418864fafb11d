//! Dense count grids and the legacy sparse coordinate maps they replaced.

use crate::resolution::{Point, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dense 2-D array of non-negative counts, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<u64>,
}

impl Grid {
    /// Creates a zero-filled grid sized to `resolution`.
    pub fn zeros(resolution: Resolution) -> Self {
        Self {
            width: resolution.width,
            height: resolution.height,
            cells: vec![0; resolution.area()],
        }
    }

    /// Builds a grid from rows; `None` if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self {
            width: u32::try_from(width).ok()?,
            height: u32::try_from(height).ok()?,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u64> {
        self.offset(x, y).and_then(|i| self.cells.get(i).copied())
    }

    /// Writes a cell. Returns false, leaving the grid unchanged, when out of bounds.
    pub fn set(&mut self, x: u32, y: u32, value: u64) -> bool {
        match self.cell_mut(x, y) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, value: u64) {
        self.cells.fill(value);
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().sum()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u64]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    // Decoded grids may carry fewer cells than their shape claims.
    fn cell_mut(&mut self, x: u32, y: u32) -> Option<&mut u64> {
        let i = self.offset(x, y)?;
        self.cells.get_mut(i)
    }
}

/// A count in a legacy sparse map. Early releases stored floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Count {
    Int(u64),
    Float(f64),
}

impl Count {
    /// Integer value, truncating floats toward zero and clamping negatives.
    pub fn as_u64(self) -> u64 {
        match self {
            Count::Int(n) => n,
            Count::Float(f) if f > 0.0 => f as u64,
            Count::Float(_) => 0,
        }
    }

    pub fn truncate(self) -> Self {
        Count::Int(self.as_u64())
    }
}

/// Legacy `{(x, y): count}` map recorded before grids were dense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SparseGrid {
    pub entries: BTreeMap<Point, Count>,
}

impl SparseGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, point: Point, count: Count) {
        self.entries.insert(point, count);
    }

    /// Drops every coordinate outside `resolution`, returning how many went.
    pub fn retain_within(&mut self, resolution: Resolution) -> usize {
        let before = self.entries.len();
        self.entries.retain(|point, _| resolution.contains(*point));
        before - self.entries.len()
    }

    /// Scatters the entries into a zeroed dense grid.
    ///
    /// Returns the grid and the number of out-of-bounds entries discarded.
    pub fn to_dense(&self, resolution: Resolution) -> (Grid, usize) {
        let mut grid = Grid::zeros(resolution);
        let mut dropped = 0;
        for (point, count) in &self.entries {
            let written = match (u32::try_from(point.x), u32::try_from(point.y)) {
                (Ok(x), Ok(y)) => grid.set(x, y, count.as_u64()),
                _ => false,
            };
            if !written {
                dropped += 1;
            }
        }
        (grid, dropped)
    }
}

impl FromIterator<(Point, Count)> for SparseGrid {
    fn from_iter<I: IntoIterator<Item = (Point, Count)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_has_declared_shape() {
        let grid = Grid::zeros(Resolution::new(3, 2));
        assert_eq!(grid.rows().count(), 2);
        assert!(grid.rows().all(|row| row.len() == 3));
        assert_eq!(grid.total(), 0);
    }

    #[test]
    fn test_set_is_bounds_checked() {
        let mut grid = Grid::zeros(Resolution::new(2, 2));
        assert!(grid.set(1, 1, 7));
        assert!(!grid.set(2, 0, 7));
        assert!(!grid.set(0, 2, 7));
        assert_eq!(grid.total(), 7);
    }

    #[test]
    fn test_sparse_to_dense() {
        let sparse: SparseGrid = [
            (Point::new(0, 0), Count::Int(5)),
            (Point::new(1, 1), Count::Int(3)),
        ]
        .into_iter()
        .collect();
        let (grid, dropped) = sparse.to_dense(Resolution::new(2, 2));
        assert_eq!(dropped, 0);
        assert_eq!(grid, Grid::from_rows(vec![vec![5, 0], vec![0, 3]]).unwrap());
    }

    #[test]
    fn test_sparse_to_dense_drops_out_of_bounds() {
        let sparse: SparseGrid = [
            (Point::new(0, 1), Count::Int(2)),
            (Point::new(9, 9), Count::Int(4)),
        ]
        .into_iter()
        .collect();
        let (grid, dropped) = sparse.to_dense(Resolution::new(2, 2));
        assert_eq!(dropped, 1);
        assert_eq!(grid.get(0, 1), Some(2));
        assert_eq!(grid.total(), 2);
    }

    #[test]
    fn test_sparse_negative_points_are_dropped() {
        let mut sparse: SparseGrid = [
            (Point::new(1, 1), Count::Int(7)),
            (Point::new(-5, 2), Count::Int(3)),
            (Point::new(0, -1), Count::Int(2)),
        ]
        .into_iter()
        .collect();
        let (grid, dropped) = sparse.to_dense(Resolution::new(4, 3));
        assert_eq!(dropped, 2);
        assert_eq!(grid.get(1, 1), Some(7));
        assert_eq!(grid.total(), 7);

        assert_eq!(sparse.retain_within(Resolution::new(4, 3)), 2);
        assert_eq!(sparse.entries.len(), 1);
    }

    #[test]
    fn test_float_counts_truncate() {
        assert_eq!(Count::Float(3.9).as_u64(), 3);
        assert_eq!(Count::Float(-1.0).as_u64(), 0);
        assert_eq!(Count::Float(2.5).truncate(), Count::Int(2));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Grid::from_rows(vec![vec![1, 2], vec![3]]).is_none());
    }
}
