//! # Path Tracer
//!
//! Per-pixel shading on top of the [`RayMarcher`].
//!
//! The full renderer averages `samples_per_pixel` Monte Carlo paths of up to
//! `max_bounces` segments each. Surfaces are diffuse: every bounce picks a
//! uniformly random direction in the hemisphere around the normal and weights
//! it with a wrapped cosine `(n·d + 1) / 2`. Paths that escape pick up the
//! environment light and end.
//!
//! The fast renderer traces one primary ray and shades the hit from the baked
//! shadow map instead.
//!
//! Both finish a pixel the same way: scale by exposure, tone map `x / (x + 1)`
//! and quantize, with alpha always opaque.

use cgmath::{ElementWise, InnerSpace, Point3, Vector2, Vector3};

use super::camera::BandCamera;
use super::environment::Environment;
use super::palette::{BlockPalette, PaletteEntry};
use crate::config::SamplingParams;
use crate::fields::snapshot::OccupancyFields;
use crate::fields::BlockField;
use crate::lighting::ShadowMap;
use crate::math::{quantize, tone_map};
use crate::raymarch::{RayMarcher, VoxelClassifier, VoxelId};

/// New bounce rays start this far off the surface.
const BOUNCE_OFFSET: f32 = 0.01;
/// Shadow lookups happen this far off the surface.
const SHADOW_OFFSET: f32 = 0.001;
/// Model segments start this far before the voxel face.
const MODEL_LEAD_IN: f32 = 0.01;
/// Model segments end this far past the voxel face.
const MODEL_REACH: f32 = 2.0;
/// Texels at or below this alpha let rays through.
const ALPHA_CUTOFF: f32 = 0.5;

/// Classifies voxels through the block palette with alpha testing and
/// model intersection.
pub struct MaterialClassifier<'a> {
    palette: &'a BlockPalette<'a>,
    blocks: &'a BlockField,
    direction: Vector3<f32>,
}

impl<'a> MaterialClassifier<'a> {
    /// Creates a classifier for a ray travelling along `direction`.
    pub fn new(palette: &'a BlockPalette<'a>, blocks: &'a BlockField, direction: Vector3<f32>) -> Self {
        MaterialClassifier {
            palette,
            blocks,
            direction,
        }
    }
}

impl VoxelClassifier for MaterialClassifier<'_> {
    fn classify(
        &mut self,
        voxel: Point3<i32>,
        normal: &mut Vector3<f32>,
        uv: &mut Vector2<f32>,
        point: &mut Point3<f32>,
    ) -> VoxelId {
        let id = self.blocks.get(voxel);
        match self.palette.entry(id) {
            PaletteEntry::Empty => 0,
            PaletteEntry::Block {
                model: Some(model), ..
            } => {
                let start = *point - self.direction * MODEL_LEAD_IN;
                let end = *point + self.direction * MODEL_REACH;
                for hit in model.hits_in_order(voxel, start, end) {
                    if self.palette.shade(id, hit.normal, hit.uv).alpha > ALPHA_CUTOFF {
                        *normal = hit.normal;
                        *uv = hit.uv;
                        *point = hit.point;
                        return id;
                    }
                }
                0
            }
            PaletteEntry::Block { .. } => {
                if self.palette.shade(id, *normal, *uv).alpha > ALPHA_CUTOFF {
                    id
                } else {
                    0
                }
            }
        }
    }
}

/// Uniform random direction in the hemisphere around `normal`.
///
/// Rejection-samples the unit ball, then mirrors samples that point into the
/// surface.
pub fn sample_hemisphere(rng: &mut fastrand::Rng, normal: Vector3<f32>) -> Vector3<f32> {
    loop {
        let v = Vector3::new(
            rng.f32() * 2.0 - 1.0,
            rng.f32() * 2.0 - 1.0,
            rng.f32() * 2.0 - 1.0,
        );
        let length2 = v.magnitude2();
        if length2 > 1e-6 && length2 <= 1.0 {
            let v = v / length2.sqrt();
            return if v.dot(normal) < 0.0 { -v } else { v };
        }
    }
}

/// Converts accumulated linear light to an RGBA pixel.
#[inline]
pub fn finish_pixel(light: Vector3<f32>, exposure: f32) -> [u8; 4] {
    let exposed = light * exposure;
    [
        quantize(tone_map(exposed.x)),
        quantize(tone_map(exposed.y)),
        quantize(tone_map(exposed.z)),
        255,
    ]
}

/// Everything a worker shades a band with.
pub struct PathTracer<'a> {
    fields: &'a OccupancyFields,
    shadows: Option<&'a ShadowMap>,
    palette: &'a BlockPalette<'a>,
    environment: &'a Environment,
}

impl<'a> PathTracer<'a> {
    /// Bundles the worker's current state.
    pub fn new(
        fields: &'a OccupancyFields,
        shadows: Option<&'a ShadowMap>,
        palette: &'a BlockPalette<'a>,
        environment: &'a Environment,
    ) -> Self {
        PathTracer {
            fields,
            shadows,
            palette,
            environment,
        }
    }

    /// Radiance carried back along one random path.
    pub fn trace_path(
        &self,
        rng: &mut fastrand::Rng,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        sampling: &SamplingParams,
    ) -> Vector3<f32> {
        let mut incoming = Vector3::new(0.0, 0.0, 0.0);
        let mut throughput = Vector3::new(1.0, 1.0, 1.0);
        let mut origin = origin;
        let mut direction = direction;
        let mut range = sampling.render_distance;

        for _ in 0..sampling.max_bounces {
            let marcher = RayMarcher::new(&self.fields.distances, range);
            let mut classifier = MaterialClassifier::new(self.palette, &self.fields.blocks, direction);
            let Some(hit) = marcher.trace(&mut classifier, origin, direction) else {
                incoming += throughput.mul_element_wise(self.environment.light(direction));
                break;
            };

            let surface = self.palette.shade(hit.id, hit.normal, hit.uv);
            incoming += throughput.mul_element_wise(surface.emission);

            origin = hit.position + hit.normal * BOUNCE_OFFSET;
            direction = sample_hemisphere(rng, hit.normal);
            let cosine = (hit.normal.dot(direction) + 1.0) / 2.0;
            throughput = throughput.mul_element_wise(surface.albedo * cosine);
            range *= sampling.bounce_distance_falloff;
        }
        incoming
    }

    /// Radiance of one primary ray lit by the shadow map.
    pub fn trace_fast(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        sampling: &SamplingParams,
    ) -> Vector3<f32> {
        let marcher = RayMarcher::new(&self.fields.distances, sampling.render_distance);
        let mut classifier = MaterialClassifier::new(self.palette, &self.fields.blocks, direction);
        let Some(hit) = marcher.trace(&mut classifier, origin, direction) else {
            return self.environment.light(direction);
        };

        let surface = self.palette.shade(hit.id, hit.normal, hit.uv);
        let shadow = self
            .shadows
            .map_or(1.0, |shadows| shadows.get(hit.position + hit.normal * SHADOW_OFFSET));
        let glow = surface.emission + Vector3::new(1.0, 1.0, 1.0);
        glow.mul_element_wise(surface.albedo * (shadow * 0.8 + 0.2))
            .mul_element_wise(self.environment.sky_color)
    }

    /// Path-traced RGBA pixels of `camera`'s band, row-major.
    pub fn render_band(
        &self,
        rng: &mut fastrand::Rng,
        camera: &BandCamera,
        sampling: &SamplingParams,
    ) -> Vec<u8> {
        let samples = sampling.samples_per_pixel.max(1);
        self.render_pixels(camera, sampling, |origin, direction| {
            let mut light = Vector3::new(0.0, 0.0, 0.0);
            for _ in 0..samples {
                light += self.trace_path(rng, origin, direction, sampling);
            }
            light / samples as f32
        })
    }

    /// Single-bounce RGBA pixels of `camera`'s band, row-major.
    pub fn render_band_fast(&self, camera: &BandCamera, sampling: &SamplingParams) -> Vec<u8> {
        self.render_pixels(camera, sampling, |origin, direction| {
            self.trace_fast(origin, direction, sampling)
        })
    }

    fn render_pixels<F>(&self, camera: &BandCamera, sampling: &SamplingParams, mut shade: F) -> Vec<u8>
    where
        F: FnMut(Point3<f32>, Vector3<f32>) -> Vector3<f32>,
    {
        let layout = camera.layout();
        let mut pixels = Vec::with_capacity(layout.byte_len());
        for row in 0..layout.rows {
            for x in 0..layout.width {
                let light = shade(camera.origin(), camera.direction(x, row));
                pixels.extend_from_slice(&finish_pixel(light, sampling.exposure));
            }
        }
        pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::snapshot::FieldLayout;
    use crate::shading::material::{Material, MaterialLibrary, Surface};
    use crate::shading::model::ModelTable;
    use crate::shading::texture::{Texture, TEXEL_COUNT};

    fn single_block(layout: FieldLayout, id: VoxelId) -> OccupancyFields {
        let mut fields = OccupancyFields::new(layout);
        fields.record(Point3::new(1, 1, 1), id);
        fields.distances.bake();
        fields
    }

    #[test]
    fn test_hemisphere_samples_face_the_normal() {
        let mut rng = fastrand::Rng::with_seed(7);
        let normal = Vector3::new(0.0, 0.0, -1.0);
        for _ in 0..500 {
            let d = sample_hemisphere(&mut rng, normal);
            assert!(d.dot(normal) >= 0.0);
            assert!((d.magnitude() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_fast_hit_without_shadows_is_fully_lit() {
        let mut library = MaterialLibrary::default();
        library.register("air");
        library.register("stone");
        library.colors.insert("stone".into(), [0.5, 0.5, 0.5]);
        let models = ModelTable::default();
        let palette = BlockPalette::new(&library, &models);
        let fields = single_block(FieldLayout::Chunked, 1);
        let environment = Environment::default();
        let tracer = PathTracer::new(&fields, None, &palette, &environment);

        let light = tracer.trace_fast(
            Point3::new(1.5, 1.5, -5.0),
            Vector3::new(0.0, 0.0, 1.0),
            &SamplingParams::default(),
        );
        let expected = environment.sky_color * 0.5;
        assert!((light - expected).magnitude() < 1e-6);

        let miss = tracer.trace_fast(
            Point3::new(1.5, 1.5, -5.0),
            Vector3::new(0.0, 0.0, -1.0),
            &SamplingParams::default(),
        );
        assert_eq!(miss, environment.light(Vector3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_single_bounce_returns_emission() {
        let mut library = MaterialLibrary::default();
        library.register("air");
        library.register("lamp");
        library.materials.insert(
            "lamp".into(),
            Material::uniform(Surface::emissive([0.2, 0.2, 0.2], [1.0, 0.5, 0.25], 1.0)),
        );
        let models = ModelTable::default();
        let palette = BlockPalette::new(&library, &models);
        let fields = single_block(FieldLayout::Columnar, 1);
        let environment = Environment::default();
        let tracer = PathTracer::new(&fields, None, &palette, &environment);
        let sampling = SamplingParams {
            samples_per_pixel: 1,
            max_bounces: 1,
            ..SamplingParams::default()
        };

        let mut rng = fastrand::Rng::with_seed(1);
        let light = tracer.trace_path(
            &mut rng,
            Point3::new(1.5, 1.5, -5.0),
            Vector3::new(0.0, 0.0, 1.0),
            &sampling,
        );
        assert_eq!(light, Vector3::new(1.0, 0.5, 0.25));
    }

    #[test]
    fn test_transparent_texels_let_rays_through() {
        let mut texels = vec![[1.0, 1.0, 1.0, 0.0]; TEXEL_COUNT];
        texels[0] = [1.0, 1.0, 1.0, 1.0];
        let glass = Surface {
            albedo: Texture::from_texels(texels).expect("full texture"),
            ..Surface::default()
        };
        let mut library = MaterialLibrary::default();
        library.register("air");
        library.register("glass");
        library.materials.insert("glass".into(), Material::uniform(glass));
        let models = ModelTable::default();
        let palette = BlockPalette::new(&library, &models);
        let fields = single_block(FieldLayout::Chunked, 1);

        let direction = Vector3::new(0.0, 0.0, 1.0);
        let marcher = RayMarcher::new(&fields.distances, 64.0);
        let mut classifier = MaterialClassifier::new(&palette, &fields.blocks, direction);
        let through = marcher.trace(&mut classifier, Point3::new(1.5, 1.5, -5.0), direction);
        assert!(through.is_none());

        let corner = marcher.trace(&mut classifier, Point3::new(1.01, 1.99, -5.0), direction);
        assert_eq!(corner.map(|hit| hit.voxel), Some(Point3::new(1, 1, 1)));
    }

    #[test]
    fn test_finish_pixel_tone_maps() {
        assert_eq!(finish_pixel(Vector3::new(0.0, 1.0, 1.0), 1.0), [0, 127, 127, 255]);
        assert_eq!(finish_pixel(Vector3::new(0.5, 0.0, 0.0), 2.0), [127, 0, 0, 255]);
    }
}
