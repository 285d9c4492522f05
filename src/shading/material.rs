//! # Materials
//!
//! Per-block surface descriptors and the library that carries them to workers.
//!
//! A [`Material`] has a base [`Surface`] and may override it per face. Face
//! overrides are chosen from the hit normal:
//!
//! | normal | face  |
//! |--------|-------|
//! | +X     | north |
//! | -X     | south |
//! | +Y     | up    |
//! | -Y     | down  |
//! | +Z     | east  |
//! | -Z     | west  |

use std::collections::HashMap;
use std::path::Path;

use cgmath::{Vector2, Vector3};
use serde::Deserialize;

use super::texture::Texture;
use crate::error::Result;

/// Textures and scalars describing how one face reflects and emits light.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Surface {
    /// Reflected color; alpha drives pass-through.
    pub albedo: Texture,
    /// Color of emitted light.
    pub emission_color: Texture,
    /// Emission mask, red channel read as strength before a square root.
    pub emission_strength: Texture,
    /// Scale applied to the emission strength.
    pub emission_multiplier: f32,
}

impl Default for Surface {
    fn default() -> Self {
        Surface {
            albedo: Texture::solid([1.0, 1.0, 1.0, 1.0]),
            emission_color: Texture::solid([1.0, 1.0, 1.0, 1.0]),
            emission_strength: Texture::solid([0.0, 0.0, 0.0, 1.0]),
            emission_multiplier: 1.0,
        }
    }
}

/// What a surface looks like at one texel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    /// Linear reflectance.
    pub albedo: Vector3<f32>,
    /// Albedo alpha.
    pub alpha: f32,
    /// Emitted radiance, color already scaled by strength.
    pub emission: Vector3<f32>,
}

impl Surface {
    /// A surface with flat albedo that emits nothing.
    pub fn flat(albedo: [f32; 3]) -> Self {
        Surface {
            albedo: Texture::solid([albedo[0], albedo[1], albedo[2], 1.0]),
            ..Surface::default()
        }
    }

    /// A surface emitting `color` at `strength`.
    pub fn emissive(albedo: [f32; 3], color: [f32; 3], strength: f32) -> Self {
        Surface {
            albedo: Texture::solid([albedo[0], albedo[1], albedo[2], 1.0]),
            emission_color: Texture::solid([color[0], color[1], color[2], 1.0]),
            emission_strength: Texture::solid([1.0, 1.0, 1.0, 1.0]),
            emission_multiplier: strength,
        }
    }

    /// Samples every texture at `uv`.
    #[inline]
    pub fn sample(&self, uv: Vector2<f32>) -> SurfaceSample {
        let albedo = self.albedo.sample(uv);
        let color = self.emission_color.sample(uv);
        let strength = self.emission_strength.sample(uv)[0].max(0.0).sqrt() * self.emission_multiplier;
        SurfaceSample {
            albedo: Vector3::new(albedo[0], albedo[1], albedo[2]),
            alpha: albedo[3],
            emission: Vector3::new(color[0], color[1], color[2]) * strength,
        }
    }
}

/// One surface per block face.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaceSet {
    /// +X face.
    pub north: Surface,
    /// -X face.
    pub south: Surface,
    /// +Z face.
    pub east: Surface,
    /// -Z face.
    pub west: Surface,
    /// +Y face.
    pub up: Surface,
    /// -Y face.
    pub down: Surface,
}

/// Surface description of one block name.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Used when there are no face overrides.
    pub surface: Surface,
    /// Optional per-face surfaces.
    pub faces: Option<Box<FaceSet>>,
}

impl Material {
    /// A material with the same surface on every face.
    pub fn uniform(surface: Surface) -> Self {
        Material {
            surface,
            faces: None,
        }
    }

    /// The surface seen through a face with `normal`.
    pub fn surface_for(&self, normal: Vector3<f32>) -> &Surface {
        let Some(faces) = &self.faces else {
            return &self.surface;
        };
        if normal.x > 0.5 {
            &faces.north
        } else if normal.x < -0.5 {
            &faces.south
        } else if normal.y > 0.5 {
            &faces.up
        } else if normal.y < -0.5 {
            &faces.down
        } else if normal.z > 0.5 {
            &faces.east
        } else {
            &faces.west
        }
    }
}

/// Everything a worker needs to shade block identifiers.
///
/// Sent once per worker as `load-materials`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MaterialLibrary {
    /// Materials by block name.
    pub materials: HashMap<String, Material>,
    /// Flat linear colors by block name, used when a block has no material.
    pub colors: HashMap<String, [f32; 3]>,
    /// Block name of each identifier; the index is the identifier.
    pub block_names: Vec<String>,
}

impl MaterialLibrary {
    /// Reads a library from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Name registered for `id`.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.block_names.get(id as usize).map(String::as_str)
    }

    /// Registers `name` and returns its new identifier.
    pub fn register(&mut self, name: &str) -> u32 {
        if let Some(id) = self.block_names.iter().position(|n| n == name) {
            return id as u32;
        }
        self.block_names.push(name.to_string());
        (self.block_names.len() - 1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_overrides_follow_normal() {
        let face = |r: f32| Surface::flat([r, 0.0, 0.0]);
        let material = Material {
            surface: face(0.0),
            faces: Some(Box::new(FaceSet {
                north: face(0.1),
                south: face(0.2),
                east: face(0.3),
                west: face(0.4),
                up: face(0.5),
                down: face(0.6),
            })),
        };
        let red = |n: Vector3<f32>| material.surface_for(n).sample(Vector2::new(0.5, 0.5)).albedo.x;
        assert_eq!(red(Vector3::new(1.0, 0.0, 0.0)), 0.1);
        assert_eq!(red(Vector3::new(-1.0, 0.0, 0.0)), 0.2);
        assert_eq!(red(Vector3::new(0.0, 0.0, 1.0)), 0.3);
        assert_eq!(red(Vector3::new(0.0, 0.0, -1.0)), 0.4);
        assert_eq!(red(Vector3::new(0.0, 1.0, 0.0)), 0.5);
        assert_eq!(red(Vector3::new(0.0, -1.0, 0.0)), 0.6);
    }

    #[test]
    fn test_emission_uses_square_root_of_mask() {
        let surface = Surface {
            emission_strength: Texture::solid([0.25, 0.0, 0.0, 1.0]),
            emission_color: Texture::solid([1.0, 0.5, 0.0, 1.0]),
            emission_multiplier: 4.0,
            ..Surface::default()
        };
        let sample = surface.sample(Vector2::new(0.0, 0.0));
        assert_eq!(sample.emission, Vector3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_register_reuses_names() {
        let mut library = MaterialLibrary::default();
        assert_eq!(library.register("air"), 0);
        assert_eq!(library.register("stone"), 1);
        assert_eq!(library.register("air"), 0);
        assert_eq!(library.name_of(1), Some("stone"));
        assert_eq!(library.name_of(9), None);
    }

    #[test]
    fn test_library_parses_from_json() {
        let json = r#"{
            "materials": {
                "glowstone": {
                    "surface": {
                        "albedo": [1.0, 0.9, 0.6, 1.0],
                        "emission_strength": [1.0, 1.0, 1.0, 1.0],
                        "emission_multiplier": 3.0
                    }
                }
            },
            "colors": { "stone": [0.4, 0.4, 0.4] },
            "block_names": ["air", "stone", "glowstone"]
        }"#;
        let library: MaterialLibrary = serde_json::from_str(json).expect("valid library");
        let glow = &library.materials["glowstone"];
        assert_eq!(glow.surface.emission_multiplier, 3.0);
        assert!(glow.faces.is_none());
        assert_eq!(library.colors["stone"], [0.4, 0.4, 0.4]);
        assert_eq!(library.name_of(2), Some("glowstone"));
    }
}
