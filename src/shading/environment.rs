//! # Environment Light
//!
//! Radiance of rays that leave the scene: a vertical sky gradient plus a hard
//! sun disk.

use cgmath::{InnerSpace, Vector3};
use serde::{Deserialize, Serialize};

use crate::math::lerp;

/// Sky and sun parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    /// Direction toward the sun. Normalized on use.
    pub sun_direction: Vector3<f32>,
    /// Cosine above which a ray is inside the sun disk.
    pub sun_threshold: f32,
    /// Radiance added by the sun disk.
    pub sun_intensity: f32,
    /// Exponent shaping the horizon-to-zenith gradient.
    pub gradient_exponent: f32,
    /// Tint applied by the single-bounce renderer.
    pub sky_color: Vector3<f32>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            sun_direction: Vector3::new(0.5, 1.0, 0.5),
            sun_threshold: 0.95,
            sun_intensity: 20.0,
            gradient_exponent: 4.0,
            sky_color: Vector3::new(126.0 / 255.0, 171.0 / 255.0, 1.0),
        }
    }
}

impl Environment {
    /// Unit vector toward the sun.
    pub fn sun(&self) -> Vector3<f32> {
        crate::raymarch::safe_normalize(self.sun_direction)
    }

    /// Radiance arriving along a ray that travels in `direction`.
    pub fn light(&self, direction: Vector3<f32>) -> Vector3<f32> {
        let transition = ((direction.y + 1.0) / 2.0).clamp(0.0, 1.0).sqrt();
        let sun = if direction.dot(self.sun()) > self.sun_threshold {
            self.sun_intensity
        } else {
            0.0
        };
        let exponent = self.gradient_exponent;
        Vector3::new(
            lerp(1.0, 0.3, transition).powf(exponent) + sun,
            lerp(1.0, 0.4, transition).powf(exponent) + sun * 0.75,
            1.0 + sun * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_disk_is_hard_edged() {
        let environment = Environment::default();
        let toward_sun = environment.sun();
        let away = Vector3::new(-toward_sun.x, toward_sun.y, -toward_sun.z).normalize();

        let lit = environment.light(toward_sun);
        let sky = environment.light(away);
        assert!(lit.x > 20.0);
        assert!(sky.x < 1.0);
        assert_eq!(sky.z, 1.0);
    }

    #[test]
    fn test_horizon_is_brighter_than_zenith() {
        let environment = Environment {
            sun_intensity: 0.0,
            ..Environment::default()
        };
        let horizon = environment.light(Vector3::new(1.0, 0.0, 0.0));
        let zenith = environment.light(Vector3::new(0.0, 1.0, 0.0));
        assert!(horizon.x > zenith.x);
        assert!((zenith.x - 0.3f32.powf(4.0)).abs() < 1e-6);
    }
}
