//! # Textures
//!
//! 16x16 RGBA textures in linear color, sampled with nearest filtering.
//! Decoding image files is left to the caller; textures are built from solid
//! colors, linear texel lists, or raw sRGB bytes.

use cgmath::Vector2;
use serde::Deserialize;

use crate::error::{RenderError, Result};

/// Edge length of a block texture in texels.
pub const TEXTURE_SIZE: usize = 16;
/// Number of texels in a block texture.
pub const TEXEL_COUNT: usize = TEXTURE_SIZE * TEXTURE_SIZE;

/// Gamma used to linearize sRGB bytes.
const DISPLAY_GAMMA: f32 = 2.2;

/// Shapes a texture may take in a material file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextureSource {
    Solid([f32; 4]),
    Texels(Vec<[f32; 4]>),
}

/// A 16x16 grid of linear RGBA texels, row-major from the top-left.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "TextureSource")]
pub struct Texture {
    texels: Vec<[f32; 4]>,
}

impl TryFrom<TextureSource> for Texture {
    type Error = RenderError;

    fn try_from(source: TextureSource) -> Result<Self> {
        match source {
            TextureSource::Solid(rgba) => Ok(Texture::solid(rgba)),
            TextureSource::Texels(texels) => Texture::from_texels(texels),
        }
    }
}

impl Texture {
    /// A texture with every texel set to `rgba`.
    pub fn solid(rgba: [f32; 4]) -> Self {
        Texture {
            texels: vec![rgba; TEXEL_COUNT],
        }
    }

    /// Wraps exactly 256 linear texels.
    pub fn from_texels(texels: Vec<[f32; 4]>) -> Result<Self> {
        if texels.len() != TEXEL_COUNT {
            return Err(RenderError::TextureSize {
                expected: TEXEL_COUNT,
                actual: texels.len(),
            });
        }
        Ok(Texture { texels })
    }

    /// Builds a texture from 8-bit sRGB RGBA bytes.
    ///
    /// Color channels are linearized with a 2.2 gamma; alpha is kept linear.
    pub fn from_rgba8(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TEXEL_COUNT * 4 {
            return Err(RenderError::TextureSize {
                expected: TEXEL_COUNT,
                actual: bytes.len() / 4,
            });
        }
        let linear = |byte: u8| (f32::from(byte) / 255.0).powf(DISPLAY_GAMMA);
        let texels = bytes
            .chunks_exact(4)
            .map(|px| [linear(px[0]), linear(px[1]), linear(px[2]), f32::from(px[3]) / 255.0])
            .collect();
        Ok(Texture { texels })
    }

    /// Texel under `uv`, with `(0, 0)` at the top-left corner.
    #[inline]
    pub fn sample(&self, uv: Vector2<f32>) -> [f32; 4] {
        let max = (TEXTURE_SIZE - 1) as f32;
        let px = (uv.x * TEXTURE_SIZE as f32).floor().clamp(0.0, max) as usize;
        let py = (uv.y * TEXTURE_SIZE as f32).floor().clamp(0.0, max) as usize;
        self.texels[py * TEXTURE_SIZE + px]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_picks_texel_and_clamps() {
        let mut texels = vec![[0.0; 4]; TEXEL_COUNT];
        texels[0] = [1.0, 0.0, 0.0, 1.0];
        texels[TEXEL_COUNT - 1] = [0.0, 0.0, 1.0, 1.0];
        texels[TEXTURE_SIZE + 2] = [0.0, 1.0, 0.0, 1.0];
        let texture = Texture::from_texels(texels).expect("256 texels");

        assert_eq!(texture.sample(Vector2::new(0.0, 0.0)), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(texture.sample(Vector2::new(1.0, 1.0)), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(texture.sample(Vector2::new(-3.0, -3.0)), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(texture.sample(Vector2::new(2.5 / 16.0, 1.5 / 16.0)), [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_wrong_size_is_rejected() {
        let error = Texture::from_texels(vec![[0.0; 4]; 10]).unwrap_err();
        assert!(matches!(error, RenderError::TextureSize { actual: 10, .. }));
    }

    #[test]
    fn test_deserializes_solid_and_texel_forms() {
        let solid: Texture = serde_json::from_str("[0.5, 0.25, 1.0, 1.0]").expect("solid form");
        assert_eq!(solid.sample(Vector2::new(0.7, 0.2)), [0.5, 0.25, 1.0, 1.0]);

        let short = serde_json::from_str::<Texture>("[[0.0, 0.0, 0.0, 1.0]]");
        assert!(short.is_err());
    }

    #[test]
    fn test_rgba8_is_linearized() {
        let mut bytes = vec![255u8; TEXEL_COUNT * 4];
        bytes[0] = 0;
        bytes[1] = 128;
        let texture = Texture::from_rgba8(&bytes).expect("full texture");
        let texel = texture.sample(Vector2::new(0.0, 0.0));
        assert_eq!(texel[0], 0.0);
        assert!((texel[1] - (128.0f32 / 255.0).powf(2.2)).abs() < 1e-6);
        assert_eq!(texel[3], 1.0);
    }
}
