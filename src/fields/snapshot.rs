//! # Field Snapshots
//!
//! The immutable state a render worker traces against. The orchestrator owns
//! the only mutable copy; workers receive `Arc` handles, and a scan that needs
//! to write goes through `Arc::make_mut`, which clones the fields if any worker
//! still holds the previous snapshot. Workers therefore never observe a field
//! mid-mutation, and a scan only pays for the copy while an old snapshot is
//! still alive.

use std::sync::Arc;

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use super::{BlockField, DistanceField, FastDistanceField, Occupancy};
use crate::lighting::ShadowMap;
use crate::raymarch::{DistanceSource, VoxelId};

/// Which distance field implementation backs a scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldLayout {
    /// 16³ chunks with `u16` cells.
    #[default]
    Chunked,
    /// Full-height columns with `f32` cells.
    Columnar,
}

/// Either distance field, chosen at construction.
#[derive(Debug, Clone)]
pub enum DistanceVolume {
    /// Chunked 3D storage.
    Chunked(DistanceField),
    /// Columnar storage.
    Columnar(FastDistanceField),
}

impl DistanceVolume {
    /// Creates an empty volume of the requested layout.
    pub fn new(layout: FieldLayout) -> Self {
        match layout {
            FieldLayout::Chunked => DistanceVolume::Chunked(DistanceField::new()),
            FieldLayout::Columnar => DistanceVolume::Columnar(FastDistanceField::new()),
        }
    }

    /// Marks or clears a voxel.
    pub fn set(&mut self, voxel: Point3<i32>, occupancy: Occupancy) {
        match self {
            DistanceVolume::Chunked(field) => field.set(voxel, occupancy),
            DistanceVolume::Columnar(field) => field.set(voxel, occupancy),
        }
    }

    /// Stored distance at a voxel.
    pub fn get(&self, voxel: Point3<i32>) -> f32 {
        match self {
            DistanceVolume::Chunked(field) => field.get(voxel),
            DistanceVolume::Columnar(field) => field.get(voxel),
        }
    }

    /// Bakes the underlying field.
    pub fn bake(&mut self) {
        match self {
            DistanceVolume::Chunked(field) => field.bake(),
            DistanceVolume::Columnar(field) => field.bake(),
        }
    }
}

impl DistanceSource for DistanceVolume {
    #[inline]
    fn lookup(&self, voxel: Point3<i32>) -> Option<f32> {
        match self {
            DistanceVolume::Chunked(field) => field.lookup(voxel),
            DistanceVolume::Columnar(field) => field.lookup(voxel),
        }
    }

    fn unpopulated_bounds(&self, voxel: Point3<i32>) -> (Point3<f32>, Point3<f32>) {
        match self {
            DistanceVolume::Chunked(field) => field.unpopulated_bounds(voxel),
            DistanceVolume::Columnar(field) => field.unpopulated_bounds(voxel),
        }
    }
}

/// Block identifiers plus the distance volume derived from them.
#[derive(Debug, Clone)]
pub struct OccupancyFields {
    /// Identifier of every scanned voxel.
    pub blocks: BlockField,
    /// Distance bounds used for empty-space skipping.
    pub distances: DistanceVolume,
}

impl OccupancyFields {
    /// Creates empty fields of the given layout.
    pub fn new(layout: FieldLayout) -> Self {
        OccupancyFields {
            blocks: BlockField::new(),
            distances: DistanceVolume::new(layout),
        }
    }

    /// Records one scanned voxel in both fields.
    pub fn record(&mut self, voxel: Point3<i32>, id: VoxelId) {
        self.blocks.set(voxel, id);
        let occupancy = if id == 0 {
            Occupancy::Empty
        } else {
            Occupancy::Solid
        };
        self.distances.set(voxel, occupancy);
    }
}

/// What `load-fields` carries to every worker.
#[derive(Debug, Clone)]
pub struct FieldSnapshot {
    /// Blocks and distances.
    pub occupancy: Arc<OccupancyFields>,
    /// Baked sun visibility, absent until the first lighting pass returns.
    pub shadows: Option<Arc<ShadowMap>>,
}

impl FieldSnapshot {
    /// A snapshot with no voxels and no shadows.
    pub fn empty(layout: FieldLayout) -> Self {
        FieldSnapshot {
            occupancy: Arc::new(OccupancyFields::new(layout)),
            shadows: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_fields_in_step() {
        for layout in [FieldLayout::Chunked, FieldLayout::Columnar] {
            let mut fields = OccupancyFields::new(layout);
            fields.record(Point3::new(3, 4, 5), 9);
            assert_eq!(fields.blocks.get(Point3::new(3, 4, 5)), 9);
            assert_eq!(fields.distances.get(Point3::new(3, 4, 5)), 0.0);

            fields.record(Point3::new(3, 4, 5), 0);
            assert_eq!(fields.blocks.get(Point3::new(3, 4, 5)), 0);
            assert!(fields.distances.get(Point3::new(3, 4, 5)) > 0.0, "{layout:?}");
        }
    }

    #[test]
    fn test_make_mut_leaves_shared_snapshot_untouched() {
        let mut owned = Arc::new(OccupancyFields::new(FieldLayout::Chunked));
        let shared = Arc::clone(&owned);
        Arc::make_mut(&mut owned).record(Point3::new(0, 0, 0), 1);
        assert_eq!(owned.blocks.get(Point3::new(0, 0, 0)), 1);
        assert_eq!(shared.blocks.get(Point3::new(0, 0, 0)), 0);
    }
}
