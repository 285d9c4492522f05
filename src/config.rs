//! # Configuration
//!
//! Render settings, per-request camera and sampling parameters, and the
//! session file read by the demo binary. Every field has a default so partial
//! JSON files are accepted.

use std::path::{Path, PathBuf};

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::fields::snapshot::FieldLayout;
use crate::shading::Environment;

/// How much work each pixel gets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Independent paths averaged per pixel.
    pub samples_per_pixel: u32,
    /// Segments traced per path.
    pub max_bounces: u32,
    /// Range of the primary ray in voxels.
    pub render_distance: f32,
    /// Scale applied before tone mapping.
    pub exposure: f32,
    /// Factor applied to the remaining range after every bounce.
    pub bounce_distance_falloff: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        SamplingParams {
            samples_per_pixel: 8,
            max_bounces: 3,
            render_distance: 128.0,
            exposure: 16.0,
            bounce_distance_falloff: 0.5,
        }
    }
}

/// Where the camera is and where it looks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPose {
    /// Eye position in world space.
    pub origin: Point3<f32>,
    /// Radians, positive looks up.
    pub pitch: f32,
    /// Radians, `0` looks down `-Z`.
    pub yaw: f32,
    /// Horizontal field of view in degrees.
    pub fov: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        CameraPose {
            origin: Point3::new(0.0, 0.0, 0.0),
            pitch: 0.0,
            yaw: 0.0,
            fov: 70.0,
        }
    }
}

/// One `render` or `fast-render` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    /// Camera for this frame.
    pub pose: CameraPose,
    /// Sampling for this frame.
    pub sampling: SamplingParams,
}

impl RenderRequest {
    /// Rejects requests that cannot produce an image.
    pub fn validate(&self) -> Result<()> {
        let fov = self.pose.fov;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(RenderError::InvalidRequest("field of view must be in (0, 180) degrees"));
        }
        if self.sampling.samples_per_pixel == 0 {
            return Err(RenderError::InvalidRequest("samples per pixel must be positive"));
        }
        if !self.pose.origin.x.is_finite()
            || !self.pose.origin.y.is_finite()
            || !self.pose.origin.z.is_finite()
        {
            return Err(RenderError::InvalidRequest("camera origin must be finite"));
        }
        Ok(())
    }
}

/// Settings fixed for the lifetime of an orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Sampling used when a request does not override it.
    pub sampling: SamplingParams,
    /// Sky and sun.
    pub environment: Environment,
    /// Distance field implementation.
    pub field_layout: FieldLayout,
    /// Length of shadow rays.
    pub shadow_range: f32,
    /// Seed for the per-worker random streams.
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            width: 320,
            height: 180,
            sampling: SamplingParams::default(),
            environment: Environment::default(),
            field_layout: FieldLayout::default(),
            shadow_range: 32.0,
            seed: 0x5eed,
        }
    }
}

impl RenderSettings {
    /// Rejects output sizes that cannot hold a pixel.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidRequest("image size must be non-zero"));
        }
        Ok(())
    }
}

/// Everything the demo binary needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Orchestrator settings.
    pub settings: RenderSettings,
    /// Camera for the frame.
    pub pose: CameraPose,
    /// Voxels scanned around the camera.
    pub scan_extent: Vector3<i32>,
    /// Where the PNG is written.
    pub output: PathBuf,
    /// Single-bounce renderer instead of the path tracer.
    pub fast: bool,
    /// Worker count, host parallelism when absent.
    pub workers: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            settings: RenderSettings::default(),
            pose: CameraPose {
                origin: Point3::new(0.5, 24.0, 0.5),
                pitch: -0.35,
                yaw: 0.0,
                fov: 70.0,
            },
            scan_extent: Vector3::new(96, 64, 96),
            output: PathBuf::from("render.png"),
            fast: false,
            workers: None,
        }
    }
}

impl SessionConfig {
    /// Reads a session from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The request this session renders.
    pub fn request(&self) -> RenderRequest {
        RenderRequest {
            pose: self.pose,
            sampling: self.settings.sampling,
        }
    }
}
