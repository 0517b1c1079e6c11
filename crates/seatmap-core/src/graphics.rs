//! Renderer-facing graphics collaborator.
//!
//! The scene graph owns one graphic node per shape and keeps it in sync with
//! the shape data. Graphic handles never appear in shape data or history.

use crate::shapes::{Shape, ShapeKind, ShapeType};
use kurbo::{Affine, BezPath, Point};
use peniko::Color;
use std::collections::HashMap;

/// Handle to a renderer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphicId(u64);

impl GraphicId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Per-node transform and visibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub position: Point,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub opacity: f64,
    pub visible: bool,
}

impl NodeTransform {
    /// Transform of a shape's node within its parent node.
    pub fn of(shape: &Shape) -> Self {
        Self {
            position: shape.placement.position,
            rotation: shape.placement.rotation,
            scale_x: shape.placement.scale_x,
            scale_y: shape.placement.scale_y,
            opacity: shape.opacity,
            visible: shape.visible,
        }
    }

    /// Local affine of the node.
    pub fn affine(&self) -> Affine {
        Affine::translate(self.position.to_vec2())
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            visible: true,
        }
    }
}

/// A retained-mode 2D renderer as seen by the engine.
pub trait Graphics {
    /// Create a drawable node for a shape, attached to the root layer.
    fn create_node(&mut self, shape: &Shape) -> GraphicId;

    /// Destroy a node. Unknown handles are ignored.
    fn destroy_node(&mut self, node: GraphicId);

    /// Attach a node under `parent`, or to the root layer for `None`.
    fn set_parent(&mut self, node: GraphicId, parent: Option<GraphicId>);

    /// Update a node's transform, opacity and visibility.
    fn set_transform(&mut self, node: GraphicId, transform: &NodeTransform);

    /// Rebuild the node's drawing from the shape payload.
    fn redraw(&mut self, node: GraphicId, shape: &Shape);

    /// Show or hide the in-progress drawing preview (world space).
    fn set_preview(&mut self, preview: Option<BezPath>);

    /// Set the world-to-screen view transform.
    fn set_view(&mut self, view: Affine);

    /// Number of live nodes.
    fn node_count(&self) -> usize;
}

/// A node kept by [`RetainedGraphics`].
#[derive(Debug, Clone)]
pub struct RetainedNode {
    pub kind: ShapeType,
    pub path: BezPath,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub transform: NodeTransform,
    pub parent: Option<GraphicId>,
}

/// In-memory retained scene, used headless and in tests.
#[derive(Debug)]
pub struct RetainedGraphics {
    nodes: HashMap<GraphicId, RetainedNode>,
    next_id: u64,
    preview: Option<BezPath>,
    view: Affine,
}

impl Default for RetainedGraphics {
    fn default() -> Self {
        Self::new()
    }
}

impl RetainedGraphics {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 0,
            preview: None,
            view: Affine::IDENTITY,
        }
    }

    pub fn node(&self, id: GraphicId) -> Option<&RetainedNode> {
        self.nodes.get(&id)
    }

    pub fn preview(&self) -> Option<&BezPath> {
        self.preview.as_ref()
    }

    pub fn view(&self) -> Affine {
        self.view
    }

    /// Nodes attached directly to the root layer.
    #[cfg(test)]
    fn root_nodes(&self) -> Vec<GraphicId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(&id, _)| id)
            .collect()
    }

    /// Accumulated transform from the node's frame to world space.
    pub fn world_transform(&self, id: GraphicId) -> Option<Affine> {
        let mut node = self.nodes.get(&id)?;
        let mut affine = node.transform.affine();
        let mut steps = 0;
        while let Some(parent) = node.parent {
            steps += 1;
            if steps > self.nodes.len() {
                log::error!("Graphic parent chain loops at node {}", parent.raw());
                return None;
            }
            node = self.nodes.get(&parent)?;
            affine = node.transform.affine() * affine;
        }
        Some(affine)
    }

    /// Accumulated opacity down to the node.
    pub fn world_opacity(&self, id: GraphicId) -> Option<f64> {
        let mut node = self.nodes.get(&id)?;
        let mut opacity = node.transform.opacity;
        let mut steps = 0;
        while let Some(parent) = node.parent {
            steps += 1;
            if steps > self.nodes.len() {
                return None;
            }
            node = self.nodes.get(&parent)?;
            opacity *= node.transform.opacity;
        }
        Some(opacity)
    }
}

impl Graphics for RetainedGraphics {
    fn create_node(&mut self, shape: &Shape) -> GraphicId {
        let id = GraphicId(self.next_id);
        self.next_id += 1;
        let mut node = RetainedNode {
            kind: shape.shape_type(),
            path: BezPath::new(),
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            transform: NodeTransform::of(shape),
            parent: None,
        };
        paint(&mut node, shape);
        self.nodes.insert(id, node);
        id
    }

    fn destroy_node(&mut self, node: GraphicId) {
        if self.nodes.remove(&node).is_none() {
            return;
        }
        for child in self.nodes.values_mut() {
            if child.parent == Some(node) {
                child.parent = None;
            }
        }
    }

    fn set_parent(&mut self, node: GraphicId, parent: Option<GraphicId>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = parent;
        }
    }

    fn set_transform(&mut self, node: GraphicId, transform: &NodeTransform) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.transform = *transform;
        }
    }

    fn redraw(&mut self, node: GraphicId, shape: &Shape) {
        if let Some(n) = self.nodes.get_mut(&node) {
            paint(n, shape);
        }
    }

    fn set_preview(&mut self, preview: Option<BezPath>) {
        self.preview = preview;
    }

    fn set_view(&mut self, view: Affine) {
        self.view = view;
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn paint(node: &mut RetainedNode, shape: &Shape) {
    node.kind = shape.shape_type();
    node.path = shape.local_path();
    match (&shape.kind, shape.style()) {
        (_, Some(style)) => {
            node.fill = style.fill();
            node.stroke = Some(style.stroke());
            node.stroke_width = style.stroke_width;
        }
        (ShapeKind::Text(text), None) => {
            node.fill = Some(text.color.into());
            node.stroke = None;
            node.stroke_width = 0.0;
        }
        _ => {
            node.fill = None;
            node.stroke = None;
            node.stroke_width = 0.0;
        }
    }
}
