//! # Sparse Fields
//!
//! Sparse voxel volumes used by the tracer:
//!
//! - [`DistanceField`]: 16³ chunks of `u16` distance bounds.
//! - [`FastDistanceField`]: 512-cell columns of `f32` distance bounds.
//! - [`BlockField`]: 512-cell columns of block identifiers.
//! - [`snapshot`]: the immutable bundle that is shared with render workers.
//!
//! ## Distance Semantics
//!
//! A stored `0` means the voxel is occupied. Any other value is a lower bound
//! on the distance, in voxels, to the nearest occupied voxel, capped at
//! [`FAR_DISTANCE`]. A chunk or column that was never written reads as
//! [`FAR_DISTANCE`] everywhere.
//!
//! ## Baking
//!
//! Both distance fields bake the same way: free cells are reset to
//! [`FAR_DISTANCE`], then shells are grown outward from every occupied voxel
//! through the 26-neighbourhood, one voxel per shell, up to [`BAKE_REACH`].
//! Shell `n` holds exactly the free voxels whose Chebyshev distance to the
//! nearest occupied voxel is `n`. Chebyshev distance never exceeds the
//! Euclidean one, so every stored value is a lower bound, and a free cell that
//! kept [`FAR_DISTANCE`] has no occupied voxel within [`BAKE_REACH`] of it.
//! Storage is allocated as shells cross into chunks or columns that were never
//! written, so neighbours across a boundary are resolved like any other.

use cgmath::{Point3, Vector3};

pub mod arena;
pub mod block_field;
pub mod columns;
pub mod distance_field;
pub mod fast_distance_field;
pub mod key;
pub mod snapshot;

pub use block_field::BlockField;
pub use distance_field::DistanceField;
pub use fast_distance_field::FastDistanceField;

/// Edge length of a cubic distance chunk.
pub const CHUNK_DIMENSION: i32 = 16;
/// Number of cells in a 3D distance chunk.
pub const CHUNK_VOLUME: usize = (CHUNK_DIMENSION * CHUNK_DIMENSION * CHUNK_DIMENSION) as usize;
/// Sentinel stored for cells with no known occupied voxel nearby.
pub const FAR_DISTANCE: u16 = 256;
/// Number of cells in a column.
pub const COLUMN_HEIGHT: usize = 512;
/// World y coordinate of a column's first cell.
pub const COLUMN_MIN_Y: i32 = -64;
/// Largest distance a bake resolves. Cells further from every occupied voxel
/// keep [`FAR_DISTANCE`].
pub const BAKE_REACH: u16 = 15;

/// What a scan found at a voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    /// The voxel blocks rays.
    Solid,
    /// The voxel is free space.
    Empty,
}

/// The 26 neighbour directions of a voxel, ordered x-major.
pub fn neighbour_offsets() -> [Vector3<i32>; 26] {
    let mut offsets = [Vector3::new(0, 0, 0); 26];
    let mut next = 0;
    for dx in -1..=1 {
        for dy in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dy == 0 && dz == 0 {
                    continue;
                }
                offsets[next] = Vector3::new(dx, dy, dz);
                next += 1;
            }
        }
    }
    offsets
}

/// Grows Chebyshev shells around `seeds` up to [`BAKE_REACH`].
///
/// `claim(voxel, distance)` is offered every neighbour of the previous shell
/// and returns `true` when it stored `distance` there, which it must do only
/// for free cells that still hold [`FAR_DISTANCE`].
///
/// # Returns
/// The number of claimed cells.
pub(crate) fn grow_shells<F>(seeds: Vec<Point3<i32>>, mut claim: F) -> usize
where
    F: FnMut(Point3<i32>, u16) -> bool,
{
    let offsets = neighbour_offsets();
    let mut shell = seeds;
    let mut claimed = 0;

    for distance in 1..=BAKE_REACH {
        let mut next = Vec::new();
        for voxel in &shell {
            for offset in &offsets {
                let neighbour = *voxel + *offset;
                if claim(neighbour, distance) {
                    next.push(neighbour);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        claimed += next.len();
        shell = next;
    }
    claimed
}
