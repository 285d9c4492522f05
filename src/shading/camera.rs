//! # Band Camera
//!
//! Primary ray directions for one horizontal band of the frame. Pitch is
//! interpolated from the band's global row, so adjacent bands meet without a
//! seam and a frame split across any number of workers matches the frame
//! rendered by one.

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::CameraPose;
use crate::math::{lerp, pitch_yaw_to_direction};

/// Rows of the frame a worker renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandLayout {
    /// Frame width, shared by every band.
    pub width: u32,
    /// First frame row of this band.
    pub first_row: u32,
    /// Rows in this band.
    pub rows: u32,
    /// Height of the whole frame.
    pub frame_height: u32,
}

impl BandLayout {
    /// A band covering the full frame.
    pub fn full(width: u32, height: u32) -> Self {
        BandLayout {
            width,
            first_row: 0,
            rows: height,
            frame_height: height,
        }
    }

    /// Bytes of RGBA output for this band.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.rows as usize * 4
    }
}

/// Camera for one band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandCamera {
    origin: Point3<f32>,
    layout: BandLayout,
    yaw_start: f32,
    yaw_end: f32,
    pitch_start: f32,
    pitch_end: f32,
}

impl BandCamera {
    /// Derives the angular ranges of the full frame from `pose`.
    pub fn new(pose: &CameraPose, layout: BandLayout) -> Self {
        let fov = pose.fov.to_radians();
        let vfov = fov * layout.frame_height as f32 / layout.width.max(1) as f32;
        BandCamera {
            origin: pose.origin,
            layout,
            yaw_start: pose.yaw - fov / 2.0,
            yaw_end: pose.yaw + fov / 2.0,
            pitch_start: pose.pitch - vfov / 2.0,
            pitch_end: pose.pitch + vfov / 2.0,
        }
    }

    /// Eye position.
    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    /// Band this camera renders.
    pub fn layout(&self) -> BandLayout {
        self.layout
    }

    /// Unit direction through column `x` of the band's `row`.
    pub fn direction(&self, x: u32, row: u32) -> Vector3<f32> {
        let layout = &self.layout;
        let column = x as f32 / layout.width.max(1) as f32;
        let global_row = (layout.first_row + row) as f32 / layout.frame_height.max(1) as f32;
        let yaw = lerp(self.yaw_start, self.yaw_end, 1.0 - column);
        let pitch = lerp(self.pitch_start, self.pitch_end, 1.0 - global_row);
        pitch_yaw_to_direction(pitch, yaw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn test_center_pixel_follows_pose() {
        let pose = CameraPose {
            origin: Point3::new(0.0, 0.0, 0.0),
            pitch: 0.0,
            yaw: std::f32::consts::PI,
            fov: 90.0,
        };
        let camera = BandCamera::new(&pose, BandLayout::full(8, 8));
        let center = camera.direction(4, 4);
        assert!((center - Vector3::new(0.0, 0.0, 1.0)).magnitude() < 1e-5);

        let top = camera.direction(4, 0);
        assert!(top.y > 0.0);
        let left = camera.direction(0, 4);
        assert!(left.x > 0.0, "left edge looks toward +X when facing +Z");
    }

    #[test]
    fn test_bands_share_frame_rows() {
        let pose = CameraPose::default();
        let frame = BandCamera::new(&pose, BandLayout::full(10, 9));
        let band = BandCamera::new(
            &pose,
            BandLayout {
                width: 10,
                first_row: 6,
                rows: 3,
                frame_height: 9,
            },
        );
        for x in 0..10 {
            assert_eq!(band.direction(x, 1), frame.direction(x, 7));
        }
    }
}
