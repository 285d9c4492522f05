//! # Block Models
//!
//! Non-cubic block shapes made of axis-aligned elements that may be rotated
//! about one principal axis. Sent to workers as `load-models`.
//!
//! Raw models use sixteenths of a block and may inherit their elements from a
//! parent. [`ModelTable::from_raw`] scales, resolves inheritance and validates
//! rotations once, so the hot intersection path never sees a bad axis.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use cgmath::{Deg, ElementWise, Matrix3, Point3, Vector2, Vector3};
use serde::Deserialize;

use crate::error::{RenderError, Result};

/// Units per block in raw model coordinates.
const MODEL_UNITS: f32 = 16.0;

/// Raw rotation as it appears in a model file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRotation {
    /// Pivot, in sixteenths of the element's extent from its minimum corner.
    #[serde(default)]
    pub origin: [f32; 3],
    /// `"x"`, `"y"` or `"z"`.
    pub axis: String,
    /// Degrees.
    #[serde(default)]
    pub angle: f32,
}

/// Raw element as it appears in a model file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawElement {
    /// Minimum corner in sixteenths.
    pub from: [f32; 3],
    /// Maximum corner in sixteenths.
    pub to: [f32; 3],
    /// Optional rotation.
    #[serde(default)]
    pub rotation: Option<RawRotation>,
}

/// Raw model as it appears in a model file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawModel {
    /// Name of the model to inherit elements from.
    #[serde(default)]
    pub parent: Option<String>,
    /// Elements; inherited from the parent when absent.
    #[serde(default)]
    pub elements: Option<Vec<RawElement>>,
}

/// Principal rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAxis {
    /// Rotation in the YZ plane.
    X,
    /// Rotation in the XZ plane.
    Y,
    /// Rotation in the XY plane.
    Z,
}

impl FromStr for RotationAxis {
    type Err = RenderError;

    fn from_str(axis: &str) -> Result<Self> {
        match axis {
            "x" | "X" => Ok(RotationAxis::X),
            "y" | "Y" => Ok(RotationAxis::Y),
            "z" | "Z" => Ok(RotationAxis::Z),
            other => Err(RenderError::UnknownRotationAxis(other.to_string())),
        }
    }
}

impl RotationAxis {
    /// Right-handed rotation matrix about this axis.
    pub fn matrix(self, angle: Deg<f32>) -> Matrix3<f32> {
        match self {
            RotationAxis::X => Matrix3::from_angle_x(angle),
            RotationAxis::Y => Matrix3::from_angle_y(angle),
            RotationAxis::Z => Matrix3::from_angle_z(angle),
        }
    }
}

/// Validated element rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRotation {
    pivot: Vector3<f32>,
    to_local: Matrix3<f32>,
    to_world: Matrix3<f32>,
}

impl ElementRotation {
    /// Validates a raw rotation.
    pub fn from_raw(raw: &RawRotation) -> Result<Self> {
        let axis: RotationAxis = raw.axis.parse()?;
        Ok(ElementRotation {
            pivot: Vector3::from(raw.origin) / MODEL_UNITS,
            to_local: axis.matrix(Deg(-raw.angle)),
            to_world: axis.matrix(Deg(raw.angle)),
        })
    }
}

/// One box of a block model, in block units.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelElement {
    /// Minimum corner inside the block, `0..=1` on each axis.
    pub from: Vector3<f32>,
    /// Maximum corner inside the block.
    pub to: Vector3<f32>,
    /// Optional rotation about a pivot.
    pub rotation: Option<ElementRotation>,
}

/// Result of a segment/element test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementHit {
    /// Fraction of the segment travelled before the hit.
    pub fraction: f32,
    /// World-space hit point.
    pub point: Point3<f32>,
    /// World-space surface normal.
    pub normal: Vector3<f32>,
    /// Face coordinate in the element's own space.
    pub uv: Vector2<f32>,
}

impl ModelElement {
    /// Scales and validates a raw element.
    pub fn from_raw(raw: &RawElement) -> Result<Self> {
        Ok(ModelElement {
            from: Vector3::from(raw.from) / MODEL_UNITS,
            to: Vector3::from(raw.to) / MODEL_UNITS,
            rotation: raw.rotation.as_ref().map(ElementRotation::from_raw).transpose()?,
        })
    }

    /// Intersects the segment `start..end` with this element placed in `voxel`.
    ///
    /// The segment is rotated into the element's unrotated frame, clipped
    /// against the box slabs, and the entry normal is rotated back.
    pub fn intersect(
        &self,
        voxel: Point3<i32>,
        start: Point3<f32>,
        end: Point3<f32>,
    ) -> Option<ElementHit> {
        let base = voxel.map(|c| c as f32);
        let min = base + self.from;
        let max = base + self.to;

        let (s, e) = match &self.rotation {
            Some(rotation) => {
                let pivot = min + (max - min).mul_element_wise(rotation.pivot);
                let local = |p: Point3<f32>| pivot + rotation.to_local * (p - pivot);
                (local(start), local(end))
            }
            None => (start, end),
        };
        let dir = e - s;

        let mut near = 0.0f32;
        let mut far = 1.0f32;
        let mut local_normal = Vector3::new(0.0, 0.0, 0.0);

        for axis in 0..3 {
            if dir[axis] == 0.0 {
                if s[axis] < min[axis] || s[axis] > max[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (min[axis] - s[axis]) / dir[axis];
            let t2 = (max[axis] - s[axis]) / dir[axis];
            let (t_near, t_far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
            if t_near > near {
                near = t_near;
                local_normal = Vector3::new(0.0, 0.0, 0.0);
                local_normal[axis] = if t1 < t2 { -1.0 } else { 1.0 };
            }
            far = far.min(t_far);
            if near > far {
                return None;
            }
        }
        if !(0.0..=1.0).contains(&near) {
            return None;
        }

        let hit_local = s + dir * near;
        let extent = max - min;
        let uv = if local_normal.x != 0.0 {
            Vector2::new(
                1.0 - (hit_local.z - min.z) / extent.z,
                1.0 - (hit_local.y - min.y) / extent.y,
            )
        } else if local_normal.y != 0.0 {
            Vector2::new(
                (hit_local.x - min.x) / extent.x,
                (hit_local.z - min.z) / extent.z,
            )
        } else {
            Vector2::new(
                1.0 - (hit_local.x - min.x) / extent.x,
                1.0 - (hit_local.y - min.y) / extent.y,
            )
        };

        let normal = match &self.rotation {
            Some(rotation) => rotation.to_world * local_normal,
            None => local_normal,
        };

        Some(ElementHit {
            fraction: near,
            point: start + (end - start) * near,
            normal,
            uv,
        })
    }
}

/// A resolved block model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockModel {
    /// Elements after inheritance.
    pub elements: Vec<ModelElement>,
}

impl BlockModel {
    /// Nearest element hit along `start..end` inside `voxel`.
    pub fn intersect(
        &self,
        voxel: Point3<i32>,
        start: Point3<f32>,
        end: Point3<f32>,
    ) -> Option<ElementHit> {
        self.elements
            .iter()
            .filter_map(|element| element.intersect(voxel, start, end))
            .min_by(|a, b| a.fraction.total_cmp(&b.fraction))
    }

    /// Element hits along `start..end`, nearest first.
    pub fn hits_in_order(
        &self,
        voxel: Point3<i32>,
        start: Point3<f32>,
        end: Point3<f32>,
    ) -> Vec<ElementHit> {
        let mut hits: Vec<ElementHit> = self
            .elements
            .iter()
            .filter_map(|element| element.intersect(voxel, start, end))
            .collect();
        hits.sort_by(|a, b| a.fraction.total_cmp(&b.fraction));
        hits
    }
}

/// Strips the namespace and folder prefixes model files use for parents.
pub fn normalize_model_name(name: &str) -> &str {
    let name = name.strip_prefix("minecraft:").unwrap_or(name);
    name.strip_prefix("block/").unwrap_or(name)
}

/// Resolved block models by block name.
#[derive(Debug, Clone, Default)]
pub struct ModelTable {
    models: HashMap<String, BlockModel>,
}

impl ModelTable {
    /// Resolves parents and validates every model in `raw`.
    ///
    /// # Errors
    /// Fails on an unknown rotation axis, a missing parent, or a parent chain
    /// that loops back on itself.
    pub fn from_raw(raw: &HashMap<String, RawModel>) -> Result<Self> {
        let mut models = HashMap::with_capacity(raw.len());
        for name in raw.keys() {
            let mut chain = HashSet::new();
            let elements = resolve_elements(raw, name, name, &mut chain)?;
            let elements = elements
                .iter()
                .map(ModelElement::from_raw)
                .collect::<Result<Vec<_>>>()?;
            models.insert(normalize_model_name(name).to_string(), BlockModel { elements });
        }
        Ok(ModelTable { models })
    }

    /// Reads raw models from a JSON object of `name -> model`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let raw: HashMap<String, RawModel> = serde_json::from_str(&text)?;
        Self::from_raw(&raw)
    }

    /// Model registered for a block name.
    pub fn get(&self, name: &str) -> Option<&BlockModel> {
        self.models.get(name)
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns `true` when no models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn resolve_elements<'a>(
    raw: &'a HashMap<String, RawModel>,
    root: &str,
    name: &str,
    chain: &mut HashSet<String>,
) -> Result<&'a [RawElement]> {
    if !chain.insert(name.to_string()) {
        return Err(RenderError::CyclicModel(name.to_string()));
    }
    let model = raw
        .get(name)
        .or_else(|| raw.get(normalize_model_name(name)))
        .ok_or_else(|| RenderError::MissingParentModel {
            model: root.to_string(),
            parent: name.to_string(),
        })?;

    match (&model.elements, &model.parent) {
        (Some(elements), _) => Ok(elements),
        (None, Some(parent)) => resolve_elements(raw, root, normalize_model_name(parent), chain),
        (None, None) => Ok(&[]),
    }
}
