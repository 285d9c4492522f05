//! # Column Grid
//!
//! Sparse storage of fixed-height vertical columns, keyed by their (x, z)
//! coordinate. Shared by the block field, the columnar distance field and the
//! shadow map.

use super::arena::SpatialArena;
use super::key::ColumnKey;
use super::{COLUMN_HEIGHT, COLUMN_MIN_Y};

/// Maps a world y coordinate to a cell index inside a column.
///
/// # Returns
/// `None` when `y` lies outside the column's vertical range.
#[inline]
pub fn column_index(y: i32) -> Option<usize> {
    let index = y.checked_sub(COLUMN_MIN_Y)?;
    if (0..COLUMN_HEIGHT as i32).contains(&index) {
        Some(index as usize)
    } else {
        None
    }
}

/// A single vertical column of cells.
#[derive(Debug, Clone)]
pub struct Column<T> {
    /// World x coordinate of the column.
    pub x: i32,
    /// World z coordinate of the column.
    pub z: i32,
    /// Cells from [`COLUMN_MIN_Y`] upward.
    pub cells: Box<[T]>,
}

/// Sparse set of columns sharing one fill value.
#[derive(Debug, Clone)]
pub struct ColumnGrid<T> {
    columns: SpatialArena<ColumnKey, Column<T>>,
    fill: T,
}

impl<T: Copy> ColumnGrid<T> {
    /// Creates an empty grid whose new columns start filled with `fill`.
    pub fn new(fill: T) -> Self {
        ColumnGrid {
            columns: SpatialArena::new(),
            fill,
        }
    }

    /// Reads a cell.
    ///
    /// # Returns
    /// `None` when the column was never written or `y` is out of range.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<T> {
        let column = self.columns.get(ColumnKey::new(x, z))?;
        column_index(y).map(|index| column.cells[index])
    }

    /// Writes a cell, creating its column on first use.
    ///
    /// # Returns
    /// `false` when `y` is outside the column range and nothing was written.
    pub fn set(&mut self, x: i32, y: i32, z: i32, value: T) -> bool {
        let Some(index) = column_index(y) else {
            return false;
        };
        self.column_or_insert(x, z).cells[index] = value;
        true
    }

    /// Returns the column at `(x, z)`, creating a filled one if needed.
    pub fn column_or_insert(&mut self, x: i32, z: i32) -> &mut Column<T> {
        let fill = self.fill;
        self.columns
            .get_or_insert_with(ColumnKey::new(x, z), || Column {
                x,
                z,
                cells: vec![fill; COLUMN_HEIGHT].into_boxed_slice(),
            })
    }

    /// Returns the column at `(x, z)`.
    #[inline]
    pub fn column(&self, x: i32, z: i32) -> Option<&Column<T>> {
        self.columns.get(ColumnKey::new(x, z))
    }

    /// Returns the column at `(x, z)` mutably.
    pub fn column_mut(&mut self, x: i32, z: i32) -> Option<&mut Column<T>> {
        self.columns.get_mut(ColumnKey::new(x, z))
    }

    /// Number of stored columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` when no column was ever written.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &Column<T>> {
        self.columns.iter().map(|(_, column)| column)
    }

    /// Iterates columns mutably in insertion order.
    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column<T>> {
        self.columns.items_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_range_limits() {
        assert_eq!(column_index(COLUMN_MIN_Y), Some(0));
        assert_eq!(column_index(COLUMN_MIN_Y - 1), None);
        assert_eq!(column_index(COLUMN_MIN_Y + COLUMN_HEIGHT as i32 - 1), Some(COLUMN_HEIGHT - 1));
        assert_eq!(column_index(COLUMN_MIN_Y + COLUMN_HEIGHT as i32), None);
        assert_eq!(column_index(i32::MIN), None);
    }

    #[test]
    fn test_set_and_get_negative_columns() {
        let mut grid = ColumnGrid::new(7u32);
        assert!(grid.set(-3, -10, -9, 42));
        assert_eq!(grid.get(-3, -10, -9), Some(42));
        assert_eq!(grid.get(-3, -11, -9), Some(7), "untouched cells keep the fill");
        assert_eq!(grid.get(3, -10, 9), None);
        assert!(!grid.set(0, 10_000, 0, 1));
    }
}
