//! # Block Field
//!
//! Columnar map from voxel to block identifier. `0` is empty, which is also
//! what an unwritten column reads as.

use cgmath::Point3;

use super::columns::ColumnGrid;
use crate::raymarch::VoxelId;

/// Sparse voxel → block identifier map.
#[derive(Debug, Clone)]
pub struct BlockField {
    columns: ColumnGrid<VoxelId>,
}

impl Default for BlockField {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockField {
    /// Creates an empty field.
    pub fn new() -> Self {
        BlockField {
            columns: ColumnGrid::new(0),
        }
    }

    /// Stores the identifier of a voxel. Writing `0` into a missing column is
    /// skipped.
    pub fn set(&mut self, voxel: Point3<i32>, id: VoxelId) {
        if id == 0 && self.columns.column(voxel.x, voxel.z).is_none() {
            return;
        }
        self.columns.set(voxel.x, voxel.y, voxel.z, id);
    }

    /// Identifier at a voxel, `0` when nothing is stored.
    #[inline]
    pub fn get(&self, voxel: Point3<i32>) -> VoxelId {
        self.columns.get(voxel.x, voxel.y, voxel.z).unwrap_or(0)
    }
}
