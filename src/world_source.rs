//! # World Sources
//!
//! The boundary to whatever owns the voxel world. A scan asks a [`WorldSource`]
//! for the block identifier of every voxel in a [`ScanZone`].

use std::collections::HashMap;

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::raymarch::VoxelId;

/// Supplies block identifiers for a scan.
pub trait WorldSource {
    /// Identifier at `voxel`, `0` for empty, `None` if the voxel is not loaded.
    fn block_at(&self, voxel: Point3<i32>) -> Option<VoxelId>;
}

impl<F> WorldSource for F
where
    F: Fn(Point3<i32>) -> Option<VoxelId>,
{
    fn block_at(&self, voxel: Point3<i32>) -> Option<VoxelId> {
        self(voxel)
    }
}

/// A hand-built world where every unset voxel is loaded and empty.
#[derive(Debug, Clone, Default)]
pub struct SparseWorld {
    blocks: HashMap<(i32, i32, i32), VoxelId>,
}

impl SparseWorld {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a block.
    pub fn set(&mut self, voxel: Point3<i32>, id: VoxelId) -> &mut Self {
        self.blocks.insert((voxel.x, voxel.y, voxel.z), id);
        self
    }
}

impl WorldSource for SparseWorld {
    fn block_at(&self, voxel: Point3<i32>) -> Option<VoxelId> {
        Some(
            self.blocks
                .get(&(voxel.x, voxel.y, voxel.z))
                .copied()
                .unwrap_or(0),
        )
    }
}

/// Axis-aligned box of voxels, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanZone {
    /// First voxel of the zone.
    pub min: Point3<i32>,
    /// One past the last voxel on every axis.
    pub max: Point3<i32>,
}

impl ScanZone {
    /// Creates a zone from its corners.
    pub fn new(min: Point3<i32>, max: Point3<i32>) -> Self {
        ScanZone { min, max }
    }

    /// A zone of `size` voxels centred on `center`.
    pub fn centered(center: Point3<f32>, size: Vector3<i32>) -> Self {
        let min = Point3::new(
            (center.x - size.x as f32 / 2.0).floor() as i32,
            (center.y - size.y as f32 / 2.0).floor() as i32,
            (center.z - size.z as f32 / 2.0).floor() as i32,
        );
        ScanZone {
            min,
            max: min + size,
        }
    }

    /// Number of voxels in the zone.
    pub fn volume(&self) -> usize {
        let extent = self.max - self.min;
        if extent.x <= 0 || extent.y <= 0 || extent.z <= 0 {
            return 0;
        }
        extent.x as usize * extent.y as usize * extent.z as usize
    }

    /// Every voxel of the zone, x outermost and z innermost.
    pub fn voxels(&self) -> impl Iterator<Item = Point3<i32>> {
        let ScanZone { min, max } = *self;
        (min.x..max.x).flat_map(move |x| {
            (min.y..max.y).flat_map(move |y| (min.z..max.z).map(move |z| Point3::new(x, y, z)))
        })
    }
}
