//! Placement of shapes in their parent's frame and conversions between
//! world space and container-local space.
//!
//! Each level maps its own frame into the parent's frame with
//! `translate(position) * rotate(rotation) * scale(scale_x, scale_y)`.
//! A child's frame reaches world space by applying every ancestor's map in
//! turn, nearest first.

use crate::error::{EditorError, EditorResult};
use crate::graphics::Graphics;
use crate::scene::SceneGraph;
use crate::shapes::ShapeId;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Anchor, rotation and non-uniform scale of a shape within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Anchor in the parent's frame.
    pub position: Point,
    /// Rotation in radians around the anchor.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "unit")]
    pub scale_x: f64,
    #[serde(default = "unit")]
    pub scale_y: f64,
}

fn unit() -> f64 {
    1.0
}

impl Default for Placement {
    fn default() -> Self {
        Self::at(Point::ZERO)
    }
}

impl Placement {
    /// Identity rotation and scale at `position`.
    pub fn at(position: Point) -> Self {
        Self {
            position,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Map from the own frame into the parent's frame.
    pub fn affine(&self) -> Affine {
        Affine::translate(self.position.to_vec2())
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Rotation and scale about the anchor, without the translation.
    pub fn linear(&self) -> Affine {
        Affine::rotate(self.rotation) * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Re-express `child` (given in this placement's frame) one level up.
    ///
    /// The anchor is mapped through the full affine; rotations add and
    /// scales multiply. Exact whenever `self` scales uniformly; otherwise
    /// the shear the product would carry is dropped.
    pub fn compose(&self, child: &Placement) -> Placement {
        Placement {
            position: self.affine() * child.position,
            rotation: self.rotation + child.rotation,
            scale_x: self.scale_x * child.scale_x,
            scale_y: self.scale_y * child.scale_y,
        }
    }

    /// Inverse of [`compose`](Self::compose): the placement that, composed
    /// under `self`, yields `outer`.
    pub fn relative(&self, outer: &Placement) -> Placement {
        Placement {
            position: self.affine().inverse() * outer.position,
            rotation: outer.rotation - self.rotation,
            scale_x: outer.scale_x / nonzero(self.scale_x),
            scale_y: outer.scale_y / nonzero(self.scale_y),
        }
    }

    /// Scale about `center` (in the parent's frame): the anchor moves and the
    /// scale factors multiply.
    pub fn scaled_about(&self, center: Point, sx: f64, sy: f64) -> Placement {
        let offset = self.position - center;
        Placement {
            position: center + Vec2::new(offset.x * sx, offset.y * sy),
            scale_x: self.scale_x * sx,
            scale_y: self.scale_y * sy,
            ..*self
        }
    }

    /// Rotate about `center` (in the parent's frame).
    pub fn rotated_about(&self, center: Point, angle: f64) -> Placement {
        Placement {
            position: Affine::rotate_about(angle, center) * self.position,
            rotation: self.rotation + angle,
            ..*self
        }
    }
}

fn nonzero(v: f64) -> f64 {
    if v.abs() < 1e-12 { 1e-12_f64.copysign(v) } else { v }
}

/// Map from the frame of `id`'s parent to world space.
pub fn parent_affine<G: Graphics>(scene: &SceneGraph<G>, id: ShapeId) -> EditorResult<Affine> {
    let mut affine = Affine::IDENTITY;
    for ancestor in scene.ancestors(id)? {
        let shape = scene.get(ancestor).ok_or(EditorError::NotFound(ancestor))?;
        affine = shape.local_affine() * affine;
    }
    Ok(affine)
}

/// Map from the own frame of `id` to world space.
pub fn world_affine<G: Graphics>(scene: &SceneGraph<G>, id: ShapeId) -> EditorResult<Affine> {
    let shape = scene.get(id).ok_or(EditorError::NotFound(id))?;
    Ok(parent_affine(scene, id)? * shape.local_affine())
}

/// Placement of `id` flattened into world space.
pub fn world_placement<G: Graphics>(scene: &SceneGraph<G>, id: ShapeId) -> EditorResult<Placement> {
    let shape = scene.get(id).ok_or(EditorError::NotFound(id))?;
    let mut placement = shape.placement;
    for ancestor in scene.ancestors(id)? {
        let parent = scene.get(ancestor).ok_or(EditorError::NotFound(ancestor))?;
        placement = parent.placement.compose(&placement);
    }
    Ok(placement)
}

/// World position of a shape's anchor.
pub fn to_world<G: Graphics>(scene: &SceneGraph<G>, id: ShapeId) -> EditorResult<Point> {
    let shape = scene.get(id).ok_or(EditorError::NotFound(id))?;
    Ok(parent_affine(scene, id)? * shape.position())
}

/// Express a world point in the local frame of `container` (world for `None`).
pub fn to_local<G: Graphics>(
    scene: &SceneGraph<G>,
    world: Point,
    container: Option<ShapeId>,
) -> EditorResult<Point> {
    match container {
        Some(id) => Ok(world_affine(scene, id)?.inverse() * world),
        None => Ok(world),
    }
}

/// Opacity of `id` multiplied through its ancestors.
pub fn world_opacity<G: Graphics>(scene: &SceneGraph<G>, id: ShapeId) -> EditorResult<f64> {
    let shape = scene.get(id).ok_or(EditorError::NotFound(id))?;
    let mut opacity = shape.opacity;
    for ancestor in scene.ancestors(id)? {
        let parent = scene.get(ancestor).ok_or(EditorError::NotFound(ancestor))?;
        opacity *= parent.opacity;
    }
    Ok(opacity)
}
