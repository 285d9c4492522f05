//! # Spatial Keys
//!
//! Integer keys for the sparse volumes. Chunks are addressed by a 3D Morton code
//! of their chunk coordinate and columns by a 2D Morton code of their (x, z)
//! coordinate.
//!
//! ## Sign Handling
//!
//! Every coordinate is moved into the unsigned range by flipping its sign bit
//! before interleaving, so `-1` and `1` land in different octants of the code
//! instead of colliding the way an absolute-value hash would.

use cgmath::Point3;

use super::CHUNK_DIMENSION;

/// Golden-ratio multiplier used for Fibonacci hashing of keys.
const FIBONACCI_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// A key that can be placed in a [`SpatialArena`](super::arena::SpatialArena).
pub trait SpatialKey: Copy + Eq {
    /// Mixes the key into a 64-bit hash whose high bits are well distributed.
    fn hash64(self) -> u64;
}

/// Maps a signed coordinate onto `u32` while preserving order.
#[inline]
fn fold_sign(value: i32) -> u32 {
    (value as u32) ^ 0x8000_0000
}

/// Spreads the low 16 bits of `value` so that two zero bits separate each one.
#[inline]
fn spread_3(value: u32) -> u64 {
    let mut x = u64::from(value & 0xFFFF);
    x = (x | (x << 32)) & 0x001F_0000_0000_FFFF;
    x = (x | (x << 16)) & 0x001F_0000_FF00_00FF;
    x = (x | (x << 8)) & 0x100F_00F0_0F00_F00F;
    x = (x | (x << 4)) & 0x10C3_0C30_C30C_30C3;
    x = (x | (x << 2)) & 0x1249_2492_4924_9249;
    x
}

/// Spreads a full `u32` so that one zero bit separates each one.
#[inline]
fn spread_2(value: u32) -> u64 {
    let mut x = u64::from(value);
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Interleaves a full `u32` into every third bit of a `u128`.
#[inline]
fn spread_3_wide(value: u32) -> u128 {
    u128::from(spread_3(value)) | (u128::from(spread_3(value >> 16)) << 48)
}

/// Morton key of the 16³ chunk containing a voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(u128);

impl ChunkKey {
    /// Returns the key of the chunk that holds `voxel`.
    ///
    /// Negative coordinates round toward negative infinity, so voxel `-1`
    /// belongs to chunk `-1` rather than sharing chunk `0` with voxel `1`.
    pub fn containing(voxel: Point3<i32>) -> Self {
        Self::from_chunk_coords(
            voxel.x.div_euclid(CHUNK_DIMENSION),
            voxel.y.div_euclid(CHUNK_DIMENSION),
            voxel.z.div_euclid(CHUNK_DIMENSION),
        )
    }

    /// Builds a key from chunk coordinates (voxel coordinates divided by 16).
    pub fn from_chunk_coords(x: i32, y: i32, z: i32) -> Self {
        let code = spread_3_wide(fold_sign(x))
            | (spread_3_wide(fold_sign(y)) << 1)
            | (spread_3_wide(fold_sign(z)) << 2);
        ChunkKey(code)
    }

    /// The raw interleaved code.
    pub fn code(self) -> u128 {
        self.0
    }
}

impl SpatialKey for ChunkKey {
    #[inline]
    fn hash64(self) -> u64 {
        let folded = (self.0 as u64) ^ ((self.0 >> 64) as u64).rotate_left(29);
        folded.wrapping_mul(FIBONACCI_MULTIPLIER)
    }
}

/// Morton key of a vertical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey(u64);

impl ColumnKey {
    /// Returns the key of the column at world `(x, z)`.
    pub fn new(x: i32, z: i32) -> Self {
        ColumnKey(spread_2(fold_sign(x)) | (spread_2(fold_sign(z)) << 1))
    }

    /// Returns the key of the column that holds `voxel`.
    pub fn containing(voxel: Point3<i32>) -> Self {
        Self::new(voxel.x, voxel.z)
    }

    /// The raw interleaved code.
    pub fn code(self) -> u64 {
        self.0
    }
}

impl SpatialKey for ColumnKey {
    #[inline]
    fn hash64(self) -> u64 {
        self.0.wrapping_mul(FIBONACCI_MULTIPLIER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_key_separates_octants() {
        let positive = ChunkKey::containing(Point3::new(1, 1, 1));
        let negative = ChunkKey::containing(Point3::new(-1, 1, 1));
        assert_ne!(positive, negative, "sign must take part in the chunk key");
        assert_eq!(
            ChunkKey::containing(Point3::new(-1, -1, -1)),
            ChunkKey::containing(Point3::new(-16, -16, -16)),
            "voxels -16..=-1 share a chunk"
        );
        assert_ne!(
            ChunkKey::containing(Point3::new(-17, 0, 0)),
            ChunkKey::containing(Point3::new(-16, 0, 0))
        );
    }

    #[test]
    fn test_chunk_key_axes_do_not_alias() {
        let x = ChunkKey::from_chunk_coords(1, 0, 0);
        let y = ChunkKey::from_chunk_coords(0, 1, 0);
        let z = ChunkKey::from_chunk_coords(0, 0, 1);
        assert_ne!(x, y);
        assert_ne!(y, z);
        assert_ne!(x, z);
        assert_ne!(
            ChunkKey::from_chunk_coords(i32::MAX / 16, 0, 0),
            ChunkKey::from_chunk_coords(i32::MIN / 16, 0, 0)
        );
    }

    #[test]
    fn test_column_key_is_unique_for_neighbours() {
        let mut keys = Vec::new();
        for x in -3..=3 {
            for z in -3..=3 {
                keys.push(ColumnKey::new(x, z).code());
            }
        }
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total, "column keys collided");
    }
}
