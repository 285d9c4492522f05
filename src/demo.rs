//! # Demo Scene
//!
//! Procedural terrain and a small material library for the binary: scan a box
//! around the camera, render one frame and write it as a PNG.

use cgmath::Point3;
use log::info;
use noise::{NoiseFn, Perlin};

use crate::config::SessionConfig;
use crate::error::{RenderError, Result};
use crate::orchestrator::RenderOrchestrator;
use crate::raymarch::VoxelId;
use crate::shading::{Material, MaterialLibrary, ModelTable, Surface};
use crate::world_source::{ScanZone, WorldSource};

/// Cave noise above this value carves the terrain.
pub const PERLIN_POSITIVE_THRESHOLD: f64 = 0.2;
/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;

const SURFACE_HEIGHT: f64 = 12.0;
const SURFACE_AMPLITUDE: f64 = 10.0;
const LAMP_SPACING: i32 = 61;

/// Identifiers of the demo blocks, in registration order.
pub const DEMO_BLOCKS: [&str; 6] = ["air", "grass_block", "dirt", "stone", "glowstone", "cave_air"];

const GRASS: VoxelId = 1;
const DIRT: VoxelId = 2;
const STONE: VoxelId = 3;
const GLOWSTONE: VoxelId = 4;
const CAVE_AIR: VoxelId = 5;

/// Rolling Perlin terrain with caves and scattered lamps.
pub struct PerlinWorld {
    perlin: Perlin,
}

impl PerlinWorld {
    /// Creates terrain from `seed`.
    pub fn new(seed: u32) -> Self {
        PerlinWorld {
            perlin: Perlin::new(seed),
        }
    }

    fn surface_height(&self, x: i32, z: i32) -> f64 {
        let sample = self.perlin.get([
            x as f64 * PERLIN_SCALE_FACTOR,
            0.5,
            z as f64 * PERLIN_SCALE_FACTOR,
        ]);
        SURFACE_HEIGHT + SURFACE_AMPLITUDE * sample
    }
}

impl WorldSource for PerlinWorld {
    fn block_at(&self, voxel: Point3<i32>) -> Option<VoxelId> {
        let height = self.surface_height(voxel.x, voxel.z);
        let depth = height - voxel.y as f64;
        if depth < 0.0 {
            return Some(0);
        }

        let cave = self.perlin.get([
            voxel.x as f64 * PERLIN_SCALE_FACTOR * 3.0,
            voxel.y as f64 * PERLIN_SCALE_FACTOR * 3.0,
            voxel.z as f64 * PERLIN_SCALE_FACTOR * 3.0,
        ]);
        if cave > PERLIN_POSITIVE_THRESHOLD && depth > 2.0 {
            return Some(CAVE_AIR);
        }

        let id = if depth < 1.0 {
            let lamp = voxel
                .x
                .wrapping_mul(73_856_093)
                ^ voxel.z.wrapping_mul(19_349_663);
            if lamp.rem_euclid(LAMP_SPACING) == 0 {
                GLOWSTONE
            } else {
                GRASS
            }
        } else if depth < 4.0 {
            DIRT
        } else {
            STONE
        };
        Some(id)
    }
}

/// Flat colors for the terrain and an emissive lamp.
pub fn demo_library() -> MaterialLibrary {
    let mut library = MaterialLibrary::default();
    for name in DEMO_BLOCKS {
        library.register(name);
    }
    library.colors.insert("grass_block".into(), [0.20, 0.45, 0.12]);
    library.colors.insert("dirt".into(), [0.35, 0.22, 0.12]);
    library.colors.insert("stone".into(), [0.40, 0.40, 0.42]);
    library.materials.insert(
        "glowstone".into(),
        Material::uniform(Surface::emissive([0.9, 0.8, 0.5], [1.0, 0.85, 0.55], 4.0)),
    );
    library
}

/// Runs one session: scan, render, save.
pub fn run_session(session: SessionConfig) -> Result<()> {
    let world = PerlinWorld::new(session.settings.seed as u32);
    let library = demo_library();
    let models = ModelTable::default();

    let mut orchestrator = match session.workers {
        Some(count) => RenderOrchestrator::new(count, session.settings.clone(), library, models)?,
        None => RenderOrchestrator::with_available_parallelism(session.settings.clone(), library, models)?,
    };

    let zone = ScanZone::centered(session.pose.origin, session.scan_extent);
    let request = session.request();

    pollster::block_on(async {
        orchestrator.scan(&world, zone).await?;
        let image = if session.fast {
            orchestrator.fast_render(request).await?
        } else {
            orchestrator.render(request).await?
        };
        image.save(&session.output)?;
        info!("Wrote {}", session.output.display());
        Ok::<(), RenderError>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_has_air_above_and_stone_below() {
        let world = PerlinWorld::new(3);
        let top = SURFACE_HEIGHT + SURFACE_AMPLITUDE + 1.0;
        assert_eq!(world.block_at(Point3::new(5, top as i32 + 1, -7)), Some(0));

        let deep = world.block_at(Point3::new(5, -40, -7));
        assert!(matches!(deep, Some(STONE) | Some(CAVE_AIR)));
    }

    #[test]
    fn test_library_registers_every_demo_block() {
        let library = demo_library();
        for (id, name) in DEMO_BLOCKS.iter().enumerate() {
            assert_eq!(library.name_of(id as u32), Some(*name));
        }
        assert!(library.materials.contains_key("glowstone"));
    }
}
