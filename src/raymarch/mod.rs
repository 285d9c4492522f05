//! # Ray Marcher
//!
//! Two-phase voxel ray traversal shared by the path tracer and the shadow bake.
//!
//! ## Phase A: Empty-Space Skipping
//!
//! While the distance field reports free space around the current sample, the
//! sample jumps forward by the distance it can safely cover:
//!
//! - Unpopulated chunk or column: straight to the far side of that region, since
//!   nothing solid is stored there.
//! - Any stored bound `d`: `d - √3`. Stored bounds measure cell to cell, while
//!   the sample may sit anywhere inside its cell.
//! - Far sentinel inside a populated region: as for `d = BAKE_REACH + 1`, since
//!   a baked field has no occupied voxel within `BAKE_REACH` of such a cell.
//!
//! Once the bound reaches zero, or the safe jump becomes too short to be worth
//! taking, traversal falls through to phase B.
//!
//! ## Phase B: Exact Traversal
//!
//! An incremental grid walk (Amanatides & Woo) from the last free sample.
//! Every occupied cell the ray enters is handed to a [`VoxelClassifier`] along
//! with the entry face normal, the face UV and the exact entry point. The
//! classifier either lets the ray pass (`0`, used for alpha-tested materials)
//! or stops it with a non-zero identifier.
//!
//! Both phases give up once the travelled distance exceeds the marcher's range.

use cgmath::{InnerSpace, Point3, Vector2, Vector3};

use crate::fields::{BAKE_REACH, FAR_DISTANCE};

/// Opaque block identifier, `0` meaning empty.
pub type VoxelId = u32;

/// Longest distance between two points of a unit cell.
const CELL_DIAGONAL: f32 = 1.732_050_8;
/// Phase A hands over to phase B when it cannot advance at least this far.
const MIN_SKIP: f32 = 0.5;
/// Safe jump from a cell that kept the far sentinel.
const FAR_SKIP: f32 = BAKE_REACH as f32 + 1.0 - CELL_DIAGONAL;
/// Nudge past a region boundary so the next sample lands in the next region.
const REGION_EXIT_EPSILON: f32 = 1e-3;

/// Read access to a baked distance volume.
pub trait DistanceSource {
    /// Distance bound stored at `voxel`, `None` when its chunk or column was
    /// never populated.
    fn lookup(&self, voxel: Point3<i32>) -> Option<f32>;

    /// Axis-aligned bounds `(min, max)` of the unpopulated region around
    /// `voxel`. Only meaningful when [`lookup`](Self::lookup) returned `None`.
    fn unpopulated_bounds(&self, voxel: Point3<i32>) -> (Point3<f32>, Point3<f32>);
}

/// Decides what an occupied voxel does to a ray.
///
/// `normal`, `uv` and `point` arrive describing the face the ray entered
/// through. A classifier that resolves finer geometry (block models) may
/// overwrite them with the surface it actually hit.
pub trait VoxelClassifier {
    /// Returns `0` to let the ray continue, otherwise the identifier it hit.
    fn classify(
        &mut self,
        voxel: Point3<i32>,
        normal: &mut Vector3<f32>,
        uv: &mut Vector2<f32>,
        point: &mut Point3<f32>,
    ) -> VoxelId;
}

/// Where and what a ray hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The voxel that stopped the ray.
    pub voxel: Point3<i32>,
    /// Identifier returned by the classifier.
    pub id: VoxelId,
    /// World-space hit point.
    pub position: Point3<f32>,
    /// Surface normal at the hit.
    pub normal: Vector3<f32>,
    /// Texture coordinate on the hit face.
    pub uv: Vector2<f32>,
    /// Distance from the ray origin to the voxel entry point.
    pub distance: f32,
}

/// Texture coordinate of `point` on an axis-aligned face with `normal`.
///
/// Uses the fractional parts of the two in-plane coordinates, with `v`
/// flipped so that `v = 0` is the top of a texture.
pub fn face_uv(point: Point3<f32>, normal: Vector3<f32>) -> Vector2<f32> {
    let fract = |v: f32| v - v.floor();
    if normal.x != 0.0 {
        Vector2::new(fract(point.z), 1.0 - fract(point.y))
    } else if normal.y != 0.0 {
        Vector2::new(fract(point.x), 1.0 - fract(point.z))
    } else {
        Vector2::new(fract(point.x), 1.0 - fract(point.y))
    }
}

/// Cell containing a world-space point.
#[inline]
pub fn voxel_of(point: Point3<f32>) -> Point3<i32> {
    point.map(|c| c.floor() as i32)
}

/// Distance along the ray until it leaves the box `min..max`.
fn exit_distance(
    point: Point3<f32>,
    direction: Vector3<f32>,
    min: Point3<f32>,
    max: Point3<f32>,
) -> f32 {
    let mut exit = f32::INFINITY;
    for axis in 0..3 {
        let d = direction[axis];
        let t = if d > 0.0 {
            (max[axis] - point[axis]) / d
        } else if d < 0.0 {
            (min[axis] - point[axis]) / d
        } else {
            f32::INFINITY
        };
        exit = exit.min(t);
    }
    exit.max(0.0)
}

/// Ray traversal over one distance volume with a fixed range.
pub struct RayMarcher<'a, D: ?Sized> {
    field: &'a D,
    max_distance: f32,
}

impl<'a, D: DistanceSource + ?Sized> RayMarcher<'a, D> {
    /// Creates a marcher that gives up after `max_distance` voxels.
    pub fn new(field: &'a D, max_distance: f32) -> Self {
        RayMarcher {
            field,
            max_distance,
        }
    }

    #[inline]
    fn is_occupied(&self, voxel: Point3<i32>) -> bool {
        matches!(self.field.lookup(voxel), Some(distance) if distance <= 0.0)
    }

    /// Traces a ray from `origin` along the unit vector `direction`.
    ///
    /// # Returns
    /// The first voxel the classifier accepts, or `None` when the ray runs out
    /// of range first.
    pub fn trace<C: VoxelClassifier + ?Sized>(
        &self,
        classifier: &mut C,
        origin: Point3<f32>,
        direction: Vector3<f32>,
    ) -> Option<RayHit> {
        let (start, start_distance) = self.skip_empty_space(origin, direction)?;
        self.traverse(classifier, start, start_distance, direction)
    }

    /// Phase A. Returns the free sample (and its distance) where exact
    /// traversal should begin.
    fn skip_empty_space(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
    ) -> Option<(Point3<f32>, f32)> {
        let far = f32::from(FAR_DISTANCE);
        let mut point = origin;
        let mut traveled = 0.0;
        let mut last_free = None;

        loop {
            let cell = voxel_of(point);
            let step = match self.field.lookup(cell) {
                Some(distance) if distance <= 0.0 => {
                    return Some(last_free.unwrap_or((point, traveled)));
                }
                Some(distance) if distance >= far => FAR_SKIP,
                Some(distance) => {
                    let safe = distance - CELL_DIAGONAL;
                    if safe < MIN_SKIP {
                        return Some((point, traveled));
                    }
                    safe
                }
                None => {
                    let (min, max) = self.field.unpopulated_bounds(cell);
                    exit_distance(point, direction, min, max) + REGION_EXIT_EPSILON
                }
            };

            last_free = Some((point, traveled));
            point += direction * step;
            traveled += step;

            if !(traveled <= self.max_distance) {
                return None;
            }
        }
    }

    /// Phase B.
    fn traverse<C: VoxelClassifier + ?Sized>(
        &self,
        classifier: &mut C,
        start: Point3<f32>,
        start_distance: f32,
        direction: Vector3<f32>,
    ) -> Option<RayHit> {
        let mut cell = voxel_of(start);
        let step = direction.map(|d| if d > 0.0 { 1 } else { -1 });
        let delta = direction.map(|d| if d != 0.0 { d.abs().recip() } else { f32::INFINITY });
        let mut t_max = Vector3::new(0.0f32, 0.0, 0.0);
        for axis in 0..3 {
            let d = direction[axis];
            t_max[axis] = if d > 0.0 {
                (cell[axis] as f32 + 1.0 - start[axis]) * delta[axis]
            } else if d < 0.0 {
                (start[axis] - cell[axis] as f32) * delta[axis]
            } else {
                f32::INFINITY
            };
        }

        if self.is_occupied(cell) {
            let axis = dominant_axis(direction);
            let mut normal = Vector3::new(0.0, 0.0, 0.0);
            normal[axis] = -step[axis] as f32;
            if let Some(hit) = self.classify(classifier, cell, normal, start, start_distance) {
                return Some(hit);
            }
        }

        loop {
            let axis = if t_max.x < t_max.y && t_max.x < t_max.z {
                0
            } else if t_max.y < t_max.z {
                1
            } else {
                2
            };
            let t = t_max[axis];
            if !(start_distance + t <= self.max_distance) {
                return None;
            }

            cell[axis] += step[axis];
            t_max[axis] += delta[axis];

            if self.is_occupied(cell) {
                let mut normal = Vector3::new(0.0, 0.0, 0.0);
                normal[axis] = -step[axis] as f32;
                let point = start + direction * t;
                if let Some(hit) = self.classify(classifier, cell, normal, point, start_distance + t) {
                    return Some(hit);
                }
            }
        }
    }

    fn classify<C: VoxelClassifier + ?Sized>(
        &self,
        classifier: &mut C,
        voxel: Point3<i32>,
        mut normal: Vector3<f32>,
        mut point: Point3<f32>,
        distance: f32,
    ) -> Option<RayHit> {
        let mut uv = face_uv(point, normal);
        let id = classifier.classify(voxel, &mut normal, &mut uv, &mut point);
        (id != 0).then_some(RayHit {
            voxel,
            id,
            position: point,
            normal,
            uv,
            distance,
        })
    }
}

fn dominant_axis(direction: Vector3<f32>) -> usize {
    let abs = direction.map(f32::abs);
    if abs.x >= abs.y && abs.x >= abs.z {
        0
    } else if abs.y >= abs.z {
        1
    } else {
        2
    }
}

/// Normalizes `v`, falling back to `+Y` for degenerate input.
pub fn safe_normalize(v: Vector3<f32>) -> Vector3<f32> {
    let length = v.magnitude();
    if length > f32::EPSILON {
        v / length
    } else {
        Vector3::unit_y()
    }
}
