//! Selection and transform handle system.

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::geometry::union_bounds;
use crate::graphics::Graphics;
use crate::scene::SceneGraph;
use crate::shapes::{Shape, ShapeId};
use crate::transform::parent_affine;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner handle, scales both axes.
    Corner(Corner),
    /// Edge midpoint handle, scales one axis.
    Edge(Edge),
    /// Rotation handle above the top edge.
    Rotate,
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    /// Handle type.
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a world point hits this handle.
    /// `tolerance` should already be adjusted for camera zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Handles around a selection box: four corners, four edge midpoints and the
/// rotate handle. Offsets given in screen pixels are divided by `zoom`.
pub fn handles_for(bounds: Rect, zoom: f64, config: &EditorConfig) -> Vec<Handle> {
    let center = bounds.center();
    let rotate_offset = config.rotate_handle_offset / zoom;
    vec![
        Handle::new(Point::new(bounds.x0, bounds.y0), HandleKind::Corner(Corner::TopLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y0), HandleKind::Corner(Corner::TopRight)),
        Handle::new(Point::new(bounds.x0, bounds.y1), HandleKind::Corner(Corner::BottomLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y1), HandleKind::Corner(Corner::BottomRight)),
        Handle::new(Point::new(center.x, bounds.y0), HandleKind::Edge(Edge::Top)),
        Handle::new(Point::new(bounds.x1, center.y), HandleKind::Edge(Edge::Right)),
        Handle::new(Point::new(center.x, bounds.y1), HandleKind::Edge(Edge::Bottom)),
        Handle::new(Point::new(bounds.x0, center.y), HandleKind::Edge(Edge::Left)),
        Handle::new(Point::new(center.x, bounds.y0 - rotate_offset), HandleKind::Rotate),
    ]
}

/// Per-axis scale factors for a handle dragged by `delta` from its start.
///
/// Dragging a handle away from the box grows that side; factors are clamped
/// to the configured range.
pub fn scale_factors(handle: HandleKind, delta: Vec2, config: &EditorConfig) -> (f64, f64) {
    let s = config.scale_sensitivity;
    let grow = |d: f64| 1.0 + d * s;
    let shrink = |d: f64| 1.0 - d * s;
    let (sx, sy) = match handle {
        HandleKind::Corner(Corner::TopRight) => (grow(delta.x), shrink(delta.y)),
        HandleKind::Corner(Corner::TopLeft) => (shrink(delta.x), shrink(delta.y)),
        HandleKind::Corner(Corner::BottomRight) => (grow(delta.x), grow(delta.y)),
        HandleKind::Corner(Corner::BottomLeft) => (shrink(delta.x), grow(delta.y)),
        HandleKind::Edge(Edge::Right) => (grow(delta.x), 1.0),
        HandleKind::Edge(Edge::Left) => (shrink(delta.x), 1.0),
        HandleKind::Edge(Edge::Top) => (1.0, shrink(delta.y)),
        HandleKind::Edge(Edge::Bottom) => (1.0, grow(delta.y)),
        HandleKind::Rotate => (1.0, 1.0),
    };
    (config.clamp_scale_factor(sx), config.clamp_scale_factor(sy))
}

/// The set of selected shapes, in selection order.
///
/// Only ids present in the scene are ever added; after structural changes
/// [`remove_invalid`](Self::remove_invalid) drops the ones that disappeared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: Vec<ShapeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ShapeId] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.ids.contains(&id)
    }

    /// Replace the selection with a single shape.
    pub fn select<G: Graphics>(&mut self, scene: &SceneGraph<G>, id: ShapeId) -> EditorResult<()> {
        if !scene.contains(id) {
            return Err(EditorError::NotFound(id));
        }
        self.ids.clear();
        self.ids.push(id);
        Ok(())
    }

    /// Add a shape to the selection, or remove it if already selected.
    pub fn toggle<G: Graphics>(&mut self, scene: &SceneGraph<G>, id: ShapeId) -> EditorResult<()> {
        if let Some(pos) = self.ids.iter().position(|&s| s == id) {
            self.ids.remove(pos);
            return Ok(());
        }
        if !scene.contains(id) {
            return Err(EditorError::NotFound(id));
        }
        self.ids.push(id);
        Ok(())
    }

    /// Replace the selection with every existing id from `ids`.
    pub fn set<G: Graphics>(&mut self, scene: &SceneGraph<G>, ids: impl IntoIterator<Item = ShapeId>) {
        self.ids.clear();
        for id in ids {
            if scene.contains(id) && !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Select every root-level shape.
    pub fn select_all<G: Graphics>(&mut self, scene: &SceneGraph<G>) {
        self.ids = scene.root_items().to_vec();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that are no longer in the scene.
    pub fn remove_invalid<G: Graphics>(&mut self, scene: &SceneGraph<G>) {
        self.ids.retain(|&id| scene.contains(id));
    }

    /// Combined world bounding box of the selection.
    pub fn bounds<G: Graphics>(&self, scene: &SceneGraph<G>) -> Option<Rect> {
        union_bounds(scene, &self.ids).unwrap_or_else(|err| {
            log::warn!("Selection bounds unavailable: {err}");
            None
        })
    }

    /// Handles for the current selection.
    pub fn handles<G: Graphics>(
        &self,
        scene: &SceneGraph<G>,
        zoom: f64,
        config: &EditorConfig,
    ) -> Vec<Handle> {
        self.bounds(scene)
            .map(|b| handles_for(b, zoom, config))
            .unwrap_or_default()
    }

    /// Handle under a world point, with zoom-compensated tolerance.
    pub fn hit_test_handle<G: Graphics>(
        &self,
        scene: &SceneGraph<G>,
        point: Point,
        zoom: f64,
        config: &EditorConfig,
    ) -> Option<HandleKind> {
        let tolerance = config.handle_size.max(config.hit_tolerance) / zoom;
        self.handles(scene, zoom, config)
            .into_iter()
            .find(|h| h.hit_test(point, tolerance))
            .map(|h| h.kind)
    }
}

/// A shape captured at the start of a gesture, with the map from world
/// space into its parent's frame.
#[derive(Debug, Clone)]
struct Captured {
    original: Shape,
    to_parent: Affine,
}

fn capture<G: Graphics>(scene: &SceneGraph<G>, ids: &[ShapeId]) -> Vec<Captured> {
    ids.iter()
        .filter_map(|&id| {
            let shape = scene.get(id)?;
            if shape.locked {
                return None;
            }
            let to_parent = match parent_affine(scene, id) {
                Ok(affine) => affine.inverse(),
                Err(err) => {
                    log::warn!("Skipping shape {id} in gesture: {err}");
                    return None;
                }
            };
            Some(Captured {
                original: shape.clone(),
                to_parent,
            })
        })
        .collect()
}

fn restore<G: Graphics>(scene: &mut SceneGraph<G>, captured: &[Captured]) {
    for c in captured {
        if let Err(err) = scene.replace(c.original.clone()) {
            log::debug!("Restore skipped: {err}");
        }
    }
}

/// State for moving the selected shapes.
///
/// Every move is computed from the drag-start snapshot, never incrementally.
#[derive(Debug, Clone)]
pub struct MoveState {
    /// Starting point of the drag (world).
    pub start_point: Point,
    /// Current point of the drag (world).
    pub current_point: Point,
    captured: Vec<Captured>,
}

impl MoveState {
    /// Capture the shapes about to be dragged. Locked shapes stay behind.
    pub fn begin<G: Graphics>(scene: &SceneGraph<G>, ids: &[ShapeId], start_point: Point) -> Self {
        Self {
            start_point,
            current_point: start_point,
            captured: capture(scene, ids),
        }
    }

    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// Ids being moved.
    pub fn shape_ids(&self) -> Vec<ShapeId> {
        self.captured.iter().map(|c| c.original.id()).collect()
    }

    /// Whether the pointer moved since the drag began.
    pub fn moved(&self) -> bool {
        self.delta().hypot2() > 0.0
    }

    /// Move every captured shape by the world delta from the drag start.
    pub fn update<G: Graphics>(&mut self, scene: &mut SceneGraph<G>, point: Point) {
        self.current_point = point;
        let world_delta = self.delta();
        for c in &self.captured {
            let local_delta = (c.to_parent * (self.start_point + world_delta))
                - (c.to_parent * self.start_point);
            let mut shape = c.original.clone();
            shape.translate(local_delta);
            if let Err(err) = scene.replace(shape) {
                log::debug!("Move skipped: {err}");
            }
        }
    }

    /// Put every shape back where it was at drag start.
    pub fn cancel<G: Graphics>(&self, scene: &mut SceneGraph<G>) {
        restore(scene, &self.captured);
    }
}

/// State of an active transform-handle drag over the whole selection.
#[derive(Debug, Clone)]
pub struct TransformState {
    /// The handle being dragged.
    pub handle: HandleKind,
    /// Starting point of the drag (world).
    pub start_point: Point,
    /// Current point of the drag (world).
    pub current_point: Point,
    /// Center of the selection box at drag start (world).
    pub center: Point,
    captured: Vec<Captured>,
}

impl TransformState {
    /// Capture the selection at drag start. Returns `None` when nothing
    /// transformable is selected.
    pub fn begin<G: Graphics>(
        scene: &SceneGraph<G>,
        selection: &Selection,
        handle: HandleKind,
        start_point: Point,
    ) -> Option<Self> {
        let center = selection.bounds(scene)?.center();
        let captured = capture(scene, selection.ids());
        if captured.is_empty() {
            return None;
        }
        Some(Self {
            handle,
            start_point,
            current_point: start_point,
            center,
            captured,
        })
    }

    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// Ids being transformed.
    pub fn shape_ids(&self) -> Vec<ShapeId> {
        self.captured.iter().map(|c| c.original.id()).collect()
    }

    /// Apply the handle drag from the snapshot, around the shared center.
    pub fn update<G: Graphics>(
        &mut self,
        scene: &mut SceneGraph<G>,
        point: Point,
        config: &EditorConfig,
    ) {
        self.current_point = point;
        let delta = self.delta();
        for c in &self.captured {
            let center = c.to_parent * self.center;
            let placement = match self.handle {
                HandleKind::Rotate => {
                    let angle = (delta.x + delta.y) * config.rotation_sensitivity;
                    c.original.placement.rotated_about(center, angle)
                }
                handle => {
                    let (sx, sy) = scale_factors(handle, delta, config);
                    c.original.placement.scaled_about(center, sx, sy)
                }
            };
            let mut shape = c.original.clone();
            shape.set_position(placement.position);
            shape.placement = placement;
            if let Err(err) = scene.replace(shape) {
                log::debug!("Transform skipped: {err}");
            }
        }
    }

    /// Put every shape back as it was at drag start.
    pub fn cancel<G: Graphics>(&self, scene: &mut SceneGraph<G>) {
        restore(scene, &self.captured);
    }
}
