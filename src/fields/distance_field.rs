//! # Chunked Distance Field
//!
//! Sparse 3D distance volume made of 16³ chunks with `u16` cells.
//!
//! ## Storage
//!
//! Chunks live in a [`SpatialArena`] keyed by [`ChunkKey`]. Inside a chunk the
//! cell of local position `(x, y, z)` sits at `((x * 16) + y) * 16 + z`.
//! Chebyshev distances are whole voxels, so `u16` cells hold them exactly.
//!
//! ## Baking
//!
//! Shell growth as described in the [module docs](super). Shells that leave
//! the written chunks allocate the chunks they enter, so after a bake every
//! voxel within [`BAKE_REACH`](super::BAKE_REACH) of an occupied one has
//! storage.

use cgmath::{Point3, Vector3};
use log::debug;
use web_time::Instant;

use super::arena::SpatialArena;
use super::key::ChunkKey;
use super::{grow_shells, Occupancy, CHUNK_DIMENSION, CHUNK_VOLUME, FAR_DISTANCE};
use crate::raymarch::DistanceSource;

/// One 16³ block of distance cells.
#[derive(Debug, Clone)]
pub struct DistanceChunk {
    /// World coordinate of the chunk's minimum corner.
    pub origin: Point3<i32>,
    cells: Box<[u16]>,
}

impl DistanceChunk {
    fn new(origin: Point3<i32>) -> Self {
        DistanceChunk {
            origin,
            cells: vec![FAR_DISTANCE; CHUNK_VOLUME].into_boxed_slice(),
        }
    }
}

/// Index of a voxel inside its chunk.
#[inline]
pub fn local_index(voxel: Point3<i32>) -> usize {
    let x = voxel.x.rem_euclid(CHUNK_DIMENSION) as usize;
    let y = voxel.y.rem_euclid(CHUNK_DIMENSION) as usize;
    let z = voxel.z.rem_euclid(CHUNK_DIMENSION) as usize;
    (((x << 4) + y) << 4) + z
}

/// Inverse of [`local_index`].
#[inline]
fn local_position(index: usize) -> Vector3<i32> {
    Vector3::new((index >> 8) as i32, ((index >> 4) & 15) as i32, (index & 15) as i32)
}

#[inline]
fn chunk_origin(voxel: Point3<i32>) -> Point3<i32> {
    Point3::new(
        voxel.x.div_euclid(CHUNK_DIMENSION) * CHUNK_DIMENSION,
        voxel.y.div_euclid(CHUNK_DIMENSION) * CHUNK_DIMENSION,
        voxel.z.div_euclid(CHUNK_DIMENSION) * CHUNK_DIMENSION,
    )
}

/// Sparse chunked distance field.
#[derive(Debug, Clone, Default)]
pub struct DistanceField {
    chunks: SpatialArena<ChunkKey, DistanceChunk>,
}

impl DistanceField {
    /// Creates an empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Marks a voxel solid, or clears it back to [`FAR_DISTANCE`].
    ///
    /// Clearing a voxel in a chunk that does not exist allocates nothing, since
    /// an absent chunk already reads as far.
    pub fn set(&mut self, voxel: Point3<i32>, occupancy: Occupancy) {
        let key = ChunkKey::containing(voxel);
        let cell = local_index(voxel);
        match occupancy {
            Occupancy::Solid => {
                let chunk = self
                    .chunks
                    .get_or_insert_with(key, || DistanceChunk::new(chunk_origin(voxel)));
                chunk.cells[cell] = 0;
            }
            Occupancy::Empty => {
                if let Some(chunk) = self.chunks.get_mut(key) {
                    chunk.cells[cell] = FAR_DISTANCE;
                }
            }
        }
    }

    /// Stored distance at a voxel, [`FAR_DISTANCE`] for unallocated chunks.
    #[inline]
    pub fn get(&self, voxel: Point3<i32>) -> f32 {
        self.lookup(voxel).unwrap_or(FAR_DISTANCE as f32)
    }

    /// Recomputes every free cell as its Chebyshev distance to the nearest
    /// occupied voxel, up to [`BAKE_REACH`](super::BAKE_REACH).
    ///
    /// Free cells are reset to [`FAR_DISTANCE`] first, so baking an unchanged
    /// field twice yields the same cells.
    pub fn bake(&mut self) {
        let started = Instant::now();

        let mut seeds = Vec::new();
        for chunk in self.chunks.items_mut() {
            for (index, cell) in chunk.cells.iter_mut().enumerate() {
                if *cell == 0 {
                    seeds.push(chunk.origin + local_position(index));
                } else {
                    *cell = FAR_DISTANCE;
                }
            }
        }

        let chunks = &mut self.chunks;
        let claimed = grow_shells(seeds, |voxel, distance| {
            let chunk = chunks.get_or_insert_with(ChunkKey::containing(voxel), || {
                DistanceChunk::new(chunk_origin(voxel))
            });
            let cell = &mut chunk.cells[local_index(voxel)];
            if *cell != FAR_DISTANCE {
                return false;
            }
            *cell = distance;
            true
        });

        debug!(
            "Baked {} cells over {} distance chunks in {:?}",
            claimed,
            self.chunk_count(),
            started.elapsed()
        );
    }
}

impl DistanceSource for DistanceField {
    #[inline]
    fn lookup(&self, voxel: Point3<i32>) -> Option<f32> {
        self.chunks
            .get(ChunkKey::containing(voxel))
            .map(|chunk| f32::from(chunk.cells[local_index(voxel)]))
    }

    fn unpopulated_bounds(&self, voxel: Point3<i32>) -> (Point3<f32>, Point3<f32>) {
        let min = chunk_origin(voxel).map(|c| c as f32);
        let size = CHUNK_DIMENSION as f32;
        (min, Point3::new(min.x + size, min.y + size, min.z + size))
    }
}
