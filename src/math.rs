//! Small numeric helpers shared by shading and lighting.

use cgmath::Vector3;

/// Linear interpolation from `a` (t = 0) to `b` (t = 1).
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Reinhard-style curve `x / (x + 1)` applied to one channel.
#[inline]
pub fn tone_map(x: f32) -> f32 {
    x / (x + 1.0)
}

/// Converts a `[0, 1]` channel to a byte, truncating like a clamped array store.
#[inline]
pub fn quantize(x: f32) -> u8 {
    (x * 255.0).clamp(0.0, 255.0) as u8
}

/// Unit view direction for a camera pitch and yaw, in radians.
///
/// Yaw `0` looks down `-Z`; positive pitch looks up.
#[inline]
pub fn pitch_yaw_to_direction(pitch: f32, yaw: f32) -> Vector3<f32> {
    Vector3::new(
        -pitch.cos() * yaw.sin(),
        pitch.sin(),
        -pitch.cos() * yaw.cos(),
    )
}
