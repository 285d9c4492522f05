//! # Block Palette
//!
//! Resolves block identifiers to what a worker needs to shade them: a
//! material, a flat color, a model, or nothing at all. Built per render by
//! borrowing the worker's current tables, so a reload never leaves a stale
//! entry behind.

use cgmath::{Vector2, Vector3};

use super::material::{Material, MaterialLibrary, SurfaceSample};
use super::model::{BlockModel, ModelTable};
use crate::raymarch::VoxelId;

/// Block names that never stop a ray, whatever identifier they were given.
pub const EMPTY_BLOCK_NAMES: [&str; 4] = ["air", "cave_air", "caveair", "void_air"];

/// Returns `true` if `name` is one of the empty block names.
pub fn is_empty_block(name: &str) -> bool {
    EMPTY_BLOCK_NAMES.contains(&name)
}

/// How one identifier is shaded.
#[derive(Debug, Clone, Copy)]
pub enum PaletteEntry<'a> {
    /// Identifier `0` or an empty block name.
    Empty,
    /// A visible block. Every field may be missing; a block with neither a
    /// material nor a color renders as the placeholder.
    Block {
        /// Surface descriptor, if the library has one for the name.
        material: Option<&'a Material>,
        /// Flat albedo used when there is no material.
        color: Option<[f32; 3]>,
        /// Non-cubic shape.
        model: Option<&'a BlockModel>,
    },
}

/// Identifier-indexed view over a material library and model table.
#[derive(Debug, Clone)]
pub struct BlockPalette<'a> {
    entries: Vec<PaletteEntry<'a>>,
}

/// Magenta and black checker marking blocks with no material.
pub fn placeholder(uv: Vector2<f32>) -> SurfaceSample {
    let lit = (uv.x > 0.5) != (uv.y > 0.5);
    let level = if lit { 1.0 } else { 0.0 };
    SurfaceSample {
        albedo: Vector3::new(level, 0.0, level),
        alpha: 1.0,
        emission: Vector3::new(0.0, 0.0, 0.0),
    }
}

impl<'a> BlockPalette<'a> {
    /// Resolves every registered identifier once.
    pub fn new(library: &'a MaterialLibrary, models: &'a ModelTable) -> Self {
        let entries = library
            .block_names
            .iter()
            .enumerate()
            .map(|(id, name)| {
                if id == 0 || is_empty_block(name) {
                    return PaletteEntry::Empty;
                }
                PaletteEntry::Block {
                    material: library.materials.get(name),
                    color: library.colors.get(name).copied(),
                    model: models.get(name),
                }
            })
            .collect();
        BlockPalette { entries }
    }

    /// Entry for `id`. Unregistered non-zero identifiers are unnamed blocks.
    pub fn entry(&self, id: VoxelId) -> PaletteEntry<'a> {
        if id == 0 {
            return PaletteEntry::Empty;
        }
        self.entries
            .get(id as usize)
            .copied()
            .unwrap_or(PaletteEntry::Block {
                material: None,
                color: None,
                model: None,
            })
    }

    /// Surface of `id` at `uv` on the face with `normal`.
    ///
    /// Empty identifiers come back fully transparent.
    pub fn shade(&self, id: VoxelId, normal: Vector3<f32>, uv: Vector2<f32>) -> SurfaceSample {
        match self.entry(id) {
            PaletteEntry::Empty => SurfaceSample {
                albedo: Vector3::new(0.0, 0.0, 0.0),
                alpha: 0.0,
                emission: Vector3::new(0.0, 0.0, 0.0),
            },
            PaletteEntry::Block {
                material: Some(material),
                ..
            } => material.surface_for(normal).sample(uv),
            PaletteEntry::Block {
                color: Some(color), ..
            } => SurfaceSample {
                albedo: Vector3::from(color),
                alpha: 1.0,
                emission: Vector3::new(0.0, 0.0, 0.0),
            },
            PaletteEntry::Block { .. } => placeholder(uv),
        }
    }

    /// Number of resolved identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no identifiers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
