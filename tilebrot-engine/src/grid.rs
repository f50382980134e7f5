use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::EngineError;

/// Row-major buffer of escape values shared between the compute workers,
/// the reprojection pass, and readers.
///
/// Cells hold `f64` bit patterns in `AtomicU64`s. Tiles of one generation
/// write disjoint ranges, so relaxed loads and stores are all the
/// synchronisation a cell needs; ordering between generations comes from
/// the coordinator. A fresh grid reads as `0.0` (inside) everywhere.
pub struct Grid {
    width: u32,
    height: u32,
    cells: Box<[AtomicU64]>,
}

impl Grid {
    /// Allocate a zeroed grid. Fails instead of aborting when the
    /// allocation cannot be satisfied.
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(EngineError::Allocation { cells: usize::MAX })?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| EngineError::Allocation { cells: len })?;
        // 0u64 is the bit pattern of +0.0.
        cells.extend((0..len).map(|_| AtomicU64::new(0)));
        Ok(Self {
            width,
            height,
            cells: cells.into_boxed_slice(),
        })
    }

    /// Build a grid holding `values` (row-major, `width * height` long).
    pub fn from_values(width: u32, height: u32, values: &[f64]) -> crate::Result<Self> {
        let grid = Self::new(width, height)?;
        for (cell, &v) in grid.cells.iter().zip(values) {
            cell.store(v.to_bits(), Ordering::Relaxed);
        }
        Ok(grid)
    }

    /// A second grid with the same contents.
    pub fn duplicate(&self) -> crate::Result<Self> {
        let copy = Self::new(self.width, self.height)?;
        for (dst, src) in copy.cells.iter().zip(self.cells.iter()) {
            dst.store(src.load(Ordering::Relaxed), Ordering::Relaxed);
        }
        Ok(copy)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        f64::from_bits(self.cells[index].load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, index: usize, value: f64) {
        self.cells[index].store(value.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn at(&self, x: u32, y: u32) -> f64 {
        self.get(y as usize * self.width as usize + x as usize)
    }

    /// Copy the current contents out.
    pub fn to_vec(&self) -> Vec<f64> {
        self.cells
            .iter()
            .map(|c| f64::from_bits(c.load(Ordering::Relaxed)))
            .collect()
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_grid_is_all_inside() {
        let grid = Grid::new(16, 9).unwrap();
        assert_eq!(grid.len(), 144);
        assert!(grid.to_vec().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn set_and_get() {
        let grid = Grid::new(4, 3).unwrap();
        grid.set(5, 12.25);
        assert_eq!(grid.get(5), 12.25);
        assert_eq!(grid.at(1, 1), 12.25);
        assert_eq!(grid.at(0, 0), 0.0);
    }

    #[test]
    fn duplicate_is_independent() {
        let values: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let grid = Grid::from_values(4, 3, &values).unwrap();
        let copy = grid.duplicate().unwrap();
        grid.set(0, 99.0);
        assert_eq!(copy.get(0), 0.0);
        assert_eq!(copy.to_vec()[1..], values[1..]);
    }

    #[test]
    fn oversized_grid_reports_allocation_failure() {
        assert!(matches!(
            Grid::new(u32::MAX, u32::MAX),
            Err(EngineError::Allocation { .. })
        ));
    }
}
