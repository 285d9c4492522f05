//! # Shadow Map
//!
//! Sparse columnar volume of sun visibility. Sample `(x, y, z)` describes the
//! voxel corner at those integer coordinates: `1` sees the sun, `0` does not.
//!
//! ## Sentinels
//!
//! - A cell that was never baked reads as fully lit.
//! - A column that does not exist reads as fully shadowed. Interpolation near the
//!   edge of a scanned zone therefore fades toward shadow instead of failing.

use cgmath::Point3;

use crate::fields::columns::{column_index, ColumnGrid};
use crate::math::lerp;

/// Fill value of cells that were never baked.
const UNSET: f32 = -1.0;

/// Baked, interpolable sun visibility.
#[derive(Debug, Clone)]
pub struct ShadowMap {
    columns: ColumnGrid<f32>,
}

impl Default for ShadowMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        ShadowMap {
            columns: ColumnGrid::new(UNSET),
        }
    }

    /// Stores the visibility of one corner sample, clamped to `[0, 1]`.
    pub fn set(&mut self, corner: Point3<i32>, visibility: f32) {
        self.columns
            .set(corner.x, corner.y, corner.z, visibility.clamp(0.0, 1.0));
    }

    /// Number of allocated columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    fn sample(&self, x: i32, y: i32, z: i32) -> f32 {
        let Some(column) = self.columns.column(x, z) else {
            return 0.0;
        };
        match column_index(y).map(|index| column.cells[index]) {
            Some(value) if value != UNSET => value,
            _ => 1.0,
        }
    }

    /// Point sample at an integer corner, without interpolation.
    pub fn get_nearest(&self, corner: Point3<i32>) -> f32 {
        self.sample(corner.x, corner.y, corner.z)
    }

    /// Visibility at an arbitrary point.
    ///
    /// Bilinear across the four surrounding columns, then linear between the
    /// two bracketing heights. At integer coordinates this returns the stored
    /// sample unchanged.
    pub fn get(&self, point: Point3<f32>) -> f32 {
        let base = point.map(f32::floor);
        let (x, y, z) = (base.x as i32, base.y as i32, base.z as i32);
        let (tx, ty, tz) = (point.x - base.x, point.y - base.y, point.z - base.z);

        let plane = |y: i32| {
            let near = lerp(self.sample(x, y, z), self.sample(x + 1, y, z), tx);
            let far = lerp(self.sample(x, y, z + 1), self.sample(x + 1, y, z + 1), tx);
            lerp(near, far, tz)
        };

        lerp(plane(y), plane(y + 1), ty).clamp(0.0, 1.0)
    }

    /// Copies every baked sample of `other` into this map.
    ///
    /// # Returns
    /// The number of samples copied.
    pub fn merge(&mut self, other: &ShadowMap) -> usize {
        let mut copied = 0;
        for column in other.columns.columns() {
            let target = self.columns.column_or_insert(column.x, column.z);
            for (cell, value) in target.cells.iter_mut().zip(column.cells.iter()) {
                if *value != UNSET {
                    *cell = *value;
                    copied += 1;
                }
            }
        }
        copied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(value: f32) -> ShadowMap {
        let mut map = ShadowMap::new();
        for x in -2..=2 {
            for y in -2..=2 {
                for z in -2..=2 {
                    map.set(Point3::new(x, y, z), value);
                }
            }
        }
        map
    }

    #[test]
    fn test_exact_coordinates_return_stored_sample() {
        let mut map = filled(1.0);
        map.set(Point3::new(1, 0, -1), 0.25);
        map.set(Point3::new(-2, 1, 0), 0.0);
        assert_eq!(map.get(Point3::new(1.0, 0.0, -1.0)), 0.25);
        assert_eq!(map.get(Point3::new(-2.0, 1.0, 0.0)), 0.0);
        assert_eq!(map.get(Point3::new(0.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn test_interpolates_between_samples() {
        let mut map = filled(1.0);
        map.set(Point3::new(0, 0, 0), 0.0);
        let value = map.get(Point3::new(0.5, 0.0, 0.0));
        assert!((value - 0.5).abs() < 1e-6, "got {value}");
        let value = map.get(Point3::new(0.5, 0.5, 0.5));
        assert!((value - 0.875).abs() < 1e-6, "got {value}");
    }

    #[test]
    fn test_missing_columns_read_as_shadow() {
        let map = filled(1.0);
        assert_eq!(map.get(Point3::new(10.0, 0.0, 10.0)), 0.0);
        // Column x = 3 does not exist, so halfway toward it is half shadowed.
        let value = map.get(Point3::new(2.5, 0.0, 0.0));
        assert!((value - 0.5).abs() < 1e-6, "got {value}");
        assert_eq!(map.get_nearest(Point3::new(9, 0, 9)), 0.0);
    }

    #[test]
    fn test_unset_cells_read_as_lit() {
        let mut map = ShadowMap::new();
        map.set(Point3::new(0, 5, 0), 0.0);
        assert_eq!(map.get_nearest(Point3::new(0, 6, 0)), 1.0);
        assert_eq!(map.get_nearest(Point3::new(0, 5, 0)), 0.0);
    }

    #[test]
    fn test_merge_copies_only_baked_samples() {
        let mut target = filled(1.0);
        let mut update = ShadowMap::new();
        update.set(Point3::new(0, 0, 0), 0.0);
        update.set(Point3::new(7, 7, 7), 0.5);

        assert_eq!(target.merge(&update), 2);
        assert_eq!(target.get_nearest(Point3::new(0, 0, 0)), 0.0);
        assert_eq!(target.get_nearest(Point3::new(0, 1, 0)), 1.0);
        assert_eq!(target.get_nearest(Point3::new(7, 7, 7)), 0.5);
    }
}
