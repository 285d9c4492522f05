//! # Shadow Baking
//!
//! Casts one ray per voxel corner toward the sun through the scanned fields and
//! records whether it escaped.

use cgmath::{Point3, Vector2, Vector3};
use log::info;
use web_time::Instant;

use super::ShadowMap;
use crate::fields::snapshot::OccupancyFields;
use crate::fields::BlockField;
use crate::raymarch::{safe_normalize, RayMarcher, VoxelClassifier, VoxelId};
use crate::world_source::ScanZone;

/// Stops at any voxel with a non-empty block identifier.
pub struct OccupiedClassifier<'a> {
    blocks: &'a BlockField,
}

impl<'a> OccupiedClassifier<'a> {
    /// Creates a classifier over `blocks`.
    pub fn new(blocks: &'a BlockField) -> Self {
        OccupiedClassifier { blocks }
    }
}

impl VoxelClassifier for OccupiedClassifier<'_> {
    fn classify(
        &mut self,
        voxel: Point3<i32>,
        _normal: &mut Vector3<f32>,
        _uv: &mut Vector2<f32>,
        _point: &mut Point3<f32>,
    ) -> VoxelId {
        self.blocks.get(voxel)
    }
}

/// Bakes sun visibility for every voxel corner in `zone`.
///
/// A corner is lit when a ray of length `range` toward `sun` hits nothing.
pub fn bake_shadows(
    fields: &OccupancyFields,
    zone: &ScanZone,
    sun: Vector3<f32>,
    range: f32,
) -> ShadowMap {
    let started = Instant::now();
    let sun = safe_normalize(sun);
    let marcher = RayMarcher::new(&fields.distances, range);
    let mut classifier = OccupiedClassifier::new(&fields.blocks);
    let mut shadows = ShadowMap::new();
    let mut lit = 0usize;

    for corner in zone.voxels() {
        let origin = corner.map(|c| c as f32);
        let visible = marcher.trace(&mut classifier, origin, sun).is_none();
        if visible {
            lit += 1;
        }
        shadows.set(corner, if visible { 1.0 } else { 0.0 });
    }

    info!(
        "Baked {} shadow samples ({} lit) in {:?}",
        zone.volume(),
        lit,
        started.elapsed()
    );
    shadows
}
