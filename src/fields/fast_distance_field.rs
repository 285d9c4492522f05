//! # Columnar Distance Field
//!
//! Drop-in alternative to [`DistanceField`](super::DistanceField) that stores
//! full-height `f32` columns instead of cubic chunks. Lookups cost a single 2D
//! key, which makes it faster to query for worlds that are wide but shallow.
//!
//! Baking grows shells like the chunked field. A shell that steps into a
//! missing column allocates the whole column.

use cgmath::Point3;
use log::debug;
use web_time::Instant;

use super::columns::{column_index, ColumnGrid};
use super::{grow_shells, Occupancy, COLUMN_HEIGHT, COLUMN_MIN_Y, FAR_DISTANCE};
use crate::raymarch::DistanceSource;

const FAR: f32 = FAR_DISTANCE as f32;

/// Sparse columnar distance field covering `COLUMN_MIN_Y..COLUMN_MIN_Y + 512`.
#[derive(Debug, Clone)]
pub struct FastDistanceField {
    columns: ColumnGrid<f32>,
}

impl Default for FastDistanceField {
    fn default() -> Self {
        Self::new()
    }
}

impl FastDistanceField {
    /// Creates an empty field.
    pub fn new() -> Self {
        FastDistanceField {
            columns: ColumnGrid::new(FAR),
        }
    }

    /// Number of allocated columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Marks a voxel solid, or clears it back to the far sentinel.
    ///
    /// Voxels outside the column range are ignored.
    pub fn set(&mut self, voxel: Point3<i32>, occupancy: Occupancy) {
        match occupancy {
            Occupancy::Solid => {
                self.columns.set(voxel.x, voxel.y, voxel.z, 0.0);
            }
            Occupancy::Empty => {
                if let (Some(column), Some(index)) = (
                    self.columns.column_mut(voxel.x, voxel.z),
                    column_index(voxel.y),
                ) {
                    column.cells[index] = FAR;
                }
            }
        }
    }

    /// Stored distance at a voxel, the far sentinel when nothing is stored.
    pub fn get(&self, voxel: Point3<i32>) -> f32 {
        self.lookup(voxel).unwrap_or(FAR)
    }

    /// Recomputes every free cell as its Chebyshev distance to the nearest
    /// occupied voxel, up to [`BAKE_REACH`](super::BAKE_REACH).
    pub fn bake(&mut self) {
        let started = Instant::now();

        let mut seeds = Vec::new();
        for column in self.columns.columns_mut() {
            for (index, cell) in column.cells.iter_mut().enumerate() {
                if *cell == 0.0 {
                    seeds.push(Point3::new(column.x, COLUMN_MIN_Y + index as i32, column.z));
                } else {
                    *cell = FAR;
                }
            }
        }

        let columns = &mut self.columns;
        let claimed = grow_shells(seeds, |voxel, distance| {
            let Some(index) = column_index(voxel.y) else {
                return false;
            };
            let cell = &mut columns.column_or_insert(voxel.x, voxel.z).cells[index];
            if *cell < FAR {
                return false;
            }
            *cell = f32::from(distance);
            true
        });

        debug!(
            "Baked {} cells over {} distance columns in {:?}",
            claimed,
            self.column_count(),
            started.elapsed()
        );
    }
}

impl DistanceSource for FastDistanceField {
    #[inline]
    fn lookup(&self, voxel: Point3<i32>) -> Option<f32> {
        self.columns.get(voxel.x, voxel.y, voxel.z)
    }

    /// A missing column is free at every height, and a stored column is free
    /// above and below its range.
    fn unpopulated_bounds(&self, voxel: Point3<i32>) -> (Point3<f32>, Point3<f32>) {
        let (x, z) = (voxel.x as f32, voxel.z as f32);
        let bottom = COLUMN_MIN_Y as f32;
        let top = bottom + COLUMN_HEIGHT as f32;

        let (min_y, max_y) = if self.columns.column(voxel.x, voxel.z).is_none() {
            (f32::NEG_INFINITY, f32::INFINITY)
        } else if voxel.y < COLUMN_MIN_Y {
            (f32::NEG_INFINITY, bottom)
        } else {
            (top, f32::INFINITY)
        };
        (Point3::new(x, min_y, z), Point3::new(x + 1.0, max_y, z + 1.0))
    }
}
