//! Scene graph: the single owner of shapes, their hierarchy and their
//! graphic nodes.
//!
//! Shapes live in a flat table keyed by id. The root list and each
//! container's `children` hold ids, back to front. Every node also records
//! its parent so ancestor walks never have to search.

use crate::error::{EditorError, EditorResult};
use crate::graphics::{GraphicId, Graphics, NodeTransform};
use crate::shapes::{Shape, ShapeId};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A shape together with its place in the tree and its graphic node.
#[derive(Debug)]
struct SceneNode {
    shape: Shape,
    parent: Option<ShapeId>,
    graphic: GraphicId,
}

/// Plain-data subtree used for persistence and clipboard payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeTree {
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ShapeTree>,
}

impl ShapeTree {
    /// Number of shapes in the subtree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ShapeTree::count).sum::<usize>()
    }

    /// Give every shape in the subtree a fresh id, keeping child links.
    pub fn regenerate_ids(&mut self) {
        self.shape.regenerate_id();
        let mut ids = Vec::with_capacity(self.children.len());
        for child in &mut self.children {
            child.regenerate_ids();
            ids.push(child.shape.id());
        }
        if let Some(container) = self.shape.as_container_mut() {
            container.children = ids;
        }
    }
}

/// Deep copy of the whole tree as plain data, depth-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    /// Root ids, back to front.
    pub root: Vec<ShapeId>,
    /// Every shape, parents before children.
    pub shapes: Vec<Shape>,
}

impl SceneSnapshot {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Shapes keyed by id.
    pub fn by_id(&self) -> HashMap<ShapeId, &Shape> {
        self.shapes.iter().map(|s| (s.id(), s)).collect()
    }
}

/// Depth-first (pre-order) walk over a subtree.
pub struct DepthFirst<'a, G: Graphics> {
    scene: &'a SceneGraph<G>,
    stack: Vec<ShapeId>,
    visited: HashSet<ShapeId>,
}

impl<G: Graphics> Iterator for DepthFirst<'_, G> {
    type Item = ShapeId;

    fn next(&mut self) -> Option<ShapeId> {
        while let Some(id) = self.stack.pop() {
            if !self.visited.insert(id) {
                log::error!("Shape {id} reached twice during traversal");
                continue;
            }
            let Some(node) = self.scene.nodes.get(&id) else {
                continue;
            };
            self.stack.extend(node.shape.children().iter().rev());
            return Some(id);
        }
        None
    }
}

/// Owner of every shape in the editor.
pub struct SceneGraph<G: Graphics> {
    nodes: HashMap<ShapeId, SceneNode>,
    root: Vec<ShapeId>,
    graphics: G,
}

impl<G: Graphics> SceneGraph<G> {
    /// Create an empty scene drawing into `graphics`.
    pub fn new(graphics: G) -> Self {
        Self {
            nodes: HashMap::new(),
            root: Vec::new(),
            graphics,
        }
    }

    /// Tear down the scene, destroying every graphic node, and hand the
    /// renderer back.
    pub fn dispose(mut self) -> G {
        self.clear();
        self.graphics
    }

    pub fn graphics(&self) -> &G {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut G {
        &mut self.graphics
    }

    /// Number of shapes in the whole tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Find a shape anywhere in the tree.
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.nodes.get(&id).map(|n| &n.shape)
    }

    /// Graphic node of a shape.
    pub fn graphic_of(&self, id: ShapeId) -> Option<GraphicId> {
        self.nodes.get(&id).map(|n| n.graphic)
    }

    /// Root ids, back to front.
    pub fn root_items(&self) -> &[ShapeId] {
        &self.root
    }

    /// Parent container of `id`; `None` at root level or when unknown.
    pub fn parent_of(&self, id: ShapeId) -> Option<ShapeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Direct children of a container (empty for leaves and unknown ids).
    pub fn children_of(&self, id: ShapeId) -> &[ShapeId] {
        self.get(id).map(Shape::children).unwrap_or(&[])
    }

    /// Sibling list a shape lives in: the root list or a container's children.
    pub fn siblings(&self, parent: Option<ShapeId>) -> &[ShapeId] {
        match parent {
            Some(p) => self.children_of(p),
            None => &self.root,
        }
    }

    /// Pre-order walk over the subtree rooted at `id`.
    pub fn depth_first(&self, id: ShapeId) -> DepthFirst<'_, G> {
        DepthFirst {
            scene: self,
            stack: vec![id],
            visited: HashSet::new(),
        }
    }

    /// Pre-order walk over the whole tree.
    pub fn iter_ids(&self) -> DepthFirst<'_, G> {
        DepthFirst {
            scene: self,
            stack: self.root.iter().rev().copied().collect(),
            visited: HashSet::new(),
        }
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: ShapeId) -> EditorResult<Vec<ShapeId>> {
        let mut node = self.nodes.get(&id).ok_or(EditorError::NotFound(id))?;
        let mut visited = HashSet::from([id]);
        let mut ancestors = Vec::new();
        while let Some(parent) = node.parent {
            if !visited.insert(parent) {
                return Err(EditorError::Cycle(parent));
            }
            ancestors.push(parent);
            node = self.nodes.get(&parent).ok_or(EditorError::NotFound(parent))?;
        }
        Ok(ancestors)
    }

    /// Whether `id` is `ancestor` or lies inside it.
    pub fn is_within(&self, id: ShapeId, ancestor: ShapeId) -> bool {
        id == ancestor
            || self
                .ancestors(id)
                .map(|a| a.contains(&ancestor))
                .unwrap_or(false)
    }

    /// Add a shape to the top of the root list.
    pub fn add(&mut self, shape: Shape) -> EditorResult<ShapeId> {
        self.insert(shape, None, None)
    }

    /// Add a shape under `parent` (root for `None`) at `index` (top for `None`).
    ///
    /// Containers must arrive empty; children are inserted one by one.
    pub fn insert(
        &mut self,
        shape: Shape,
        parent: Option<ShapeId>,
        index: Option<usize>,
    ) -> EditorResult<ShapeId> {
        let id = shape.id();
        if self.nodes.contains_key(&id) {
            return Err(EditorError::DuplicateId(id));
        }
        if !shape.children().is_empty() {
            return Err(EditorError::InvalidOperation(
                "containers must be inserted without children".to_string(),
            ));
        }
        let parent_graphic = match parent {
            Some(p) => {
                let node = self.nodes.get(&p).ok_or(EditorError::NotFound(p))?;
                if !node.shape.is_container() {
                    return Err(EditorError::InvalidOperation(format!(
                        "shape {p} is not a container"
                    )));
                }
                Some(node.graphic)
            }
            None => None,
        };

        let graphic = self.graphics.create_node(&shape);
        self.graphics.set_parent(graphic, parent_graphic);
        self.nodes.insert(
            id,
            SceneNode {
                shape,
                parent,
                graphic,
            },
        );
        self.attach(id, parent, index);
        log::trace!("Inserted shape {id}");
        Ok(id)
    }

    /// Remove a shape and its whole subtree, destroying their graphics.
    pub fn remove(&mut self, id: ShapeId) -> EditorResult<Shape> {
        if !self.nodes.contains_key(&id) {
            log::debug!("Remove skipped, shape {id} not found");
            return Err(EditorError::NotFound(id));
        }
        self.detach(id);
        let subtree: Vec<ShapeId> = self.depth_first(id).collect();
        let mut removed = None;
        // Children first, so graphics go leaf to root.
        for sid in subtree.into_iter().rev() {
            if let Some(node) = self.nodes.remove(&sid) {
                self.graphics.set_parent(node.graphic, None);
                self.graphics.destroy_node(node.graphic);
                if sid == id {
                    removed = Some(node.shape);
                }
            }
        }
        removed.ok_or(EditorError::NotFound(id))
    }

    /// Remove every shape.
    pub fn clear(&mut self) {
        for node in self.nodes.values() {
            self.graphics.destroy_node(node.graphic);
        }
        self.nodes.clear();
        self.root.clear();
    }

    /// Mutate a shape in place and re-sync its graphic.
    ///
    /// The id and the child list cannot be changed this way.
    pub fn update<R>(&mut self, id: ShapeId, f: impl FnOnce(&mut Shape) -> R) -> EditorResult<R> {
        let node = self.nodes.get_mut(&id).ok_or(EditorError::NotFound(id))?;
        let children = node.shape.children().to_vec();
        let result = f(&mut node.shape);
        node.shape.id = id;
        if let Some(container) = node.shape.as_container_mut() {
            container.children = children;
        }
        self.graphics.set_transform(node.graphic, &NodeTransform::of(&node.shape));
        self.graphics.redraw(node.graphic, &node.shape);
        Ok(result)
    }

    /// Replace a shape's attributes with `shape` (same id), keeping its graphic
    /// and its children.
    pub fn replace(&mut self, shape: Shape) -> EditorResult<()> {
        self.update(shape.id(), |s| *s = shape)
    }

    /// Move a shape to another parent. Coordinates are left untouched; callers
    /// re-express them for the new frame.
    pub fn reparent(
        &mut self,
        id: ShapeId,
        new_parent: Option<ShapeId>,
        index: Option<usize>,
    ) -> EditorResult<()> {
        if !self.nodes.contains_key(&id) {
            return Err(EditorError::NotFound(id));
        }
        let parent_graphic = match new_parent {
            Some(p) => {
                let node = self.nodes.get(&p).ok_or(EditorError::NotFound(p))?;
                if !node.shape.is_container() {
                    return Err(EditorError::InvalidOperation(format!(
                        "shape {p} is not a container"
                    )));
                }
                if self.is_within(p, id) {
                    return Err(EditorError::Cycle(id));
                }
                Some(node.graphic)
            }
            None => None,
        };

        self.detach(id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = new_parent;
            self.graphics.set_parent(node.graphic, parent_graphic);
        }
        self.attach(id, new_parent, index);
        Ok(())
    }

    /// Index of a shape within its sibling list.
    pub fn index_in_parent(&self, id: ShapeId) -> Option<usize> {
        let node = self.nodes.get(&id)?;
        self.siblings(node.parent).iter().position(|&s| s == id)
    }

    fn siblings_mut(&mut self, parent: Option<ShapeId>) -> Option<&mut Vec<ShapeId>> {
        match parent {
            Some(p) => self
                .nodes
                .get_mut(&p)
                .and_then(|n| n.shape.as_container_mut())
                .map(|c| &mut c.children),
            None => Some(&mut self.root),
        }
    }

    fn attach(&mut self, id: ShapeId, parent: Option<ShapeId>, index: Option<usize>) {
        if let Some(list) = self.siblings_mut(parent) {
            let index = index.unwrap_or(list.len()).min(list.len());
            list.insert(index, id);
        }
    }

    fn detach(&mut self, id: ShapeId) {
        let parent = self.parent_of(id);
        if let Some(list) = self.siblings_mut(parent) {
            list.retain(|&s| s != id);
        }
    }

    /// Move a shape to the top of its sibling list.
    pub fn bring_to_front(&mut self, id: ShapeId) -> EditorResult<()> {
        self.restack(id, |list, _| list.len().saturating_sub(1))
            .map(|_| ())
    }

    /// Move a shape to the bottom of its sibling list.
    pub fn send_to_back(&mut self, id: ShapeId) -> EditorResult<()> {
        self.restack(id, |_, _| 0).map(|_| ())
    }

    /// Move a shape one step towards the front. Returns false if already on top.
    pub fn bring_forward(&mut self, id: ShapeId) -> EditorResult<bool> {
        self.restack(id, |list, pos| (pos + 1).min(list.len().saturating_sub(1)))
    }

    /// Move a shape one step towards the back. Returns false if already at the bottom.
    pub fn send_backward(&mut self, id: ShapeId) -> EditorResult<bool> {
        self.restack(id, |_, pos| pos.saturating_sub(1))
    }

    fn restack(
        &mut self,
        id: ShapeId,
        target: impl FnOnce(&[ShapeId], usize) -> usize,
    ) -> EditorResult<bool> {
        let parent = self
            .nodes
            .get(&id)
            .ok_or(EditorError::NotFound(id))?
            .parent;
        let list = self
            .siblings_mut(parent)
            .ok_or(EditorError::NotFound(id))?;
        let pos = list
            .iter()
            .position(|&s| s == id)
            .ok_or(EditorError::NotFound(id))?;
        let to = target(list, pos);
        if to == pos {
            return Ok(false);
        }
        let moved = list.remove(pos);
        list.insert(to, moved);
        Ok(true)
    }

    /// Topmost visible shape under a world point.
    ///
    /// At root level (`within == None`) a hit on any descendant of a
    /// container returns the container. With `within` set, only that
    /// container's direct children are candidates, tested in its local frame.
    pub fn shape_at(
        &self,
        world: Point,
        tolerance: f64,
        within: Option<ShapeId>,
    ) -> Option<ShapeId> {
        let point = match within {
            Some(container) => {
                crate::transform::to_local(self, world, Some(container)).ok()?
            }
            None => world,
        };
        let tolerance = match within {
            Some(container) => {
                let scale = crate::transform::world_placement(self, container)
                    .map(|p| p.scale_x.abs().min(p.scale_y.abs()).max(1e-6))
                    .unwrap_or(1.0);
                tolerance / scale
            }
            None => tolerance,
        };
        self.siblings(within)
            .iter()
            .rev()
            .copied()
            .find(|&id| self.hits(id, point, tolerance, &mut HashSet::new()))
    }

    /// Whether a point in the parent's frame of `id` hits it or any descendant.
    fn hits(
        &self,
        id: ShapeId,
        point: Point,
        tolerance: f64,
        visited: &mut HashSet<ShapeId>,
    ) -> bool {
        if !visited.insert(id) {
            return false;
        }
        let Some(shape) = self.get(id) else {
            return false;
        };
        if !shape.visible {
            return false;
        }
        match shape.as_container() {
            None => shape.hit_test(point, tolerance),
            Some(container) => {
                let p = &shape.placement;
                let local = shape.local_affine().inverse() * point;
                let tolerance = tolerance / p.scale_x.abs().min(p.scale_y.abs()).max(1e-6);
                container
                    .children
                    .iter()
                    .rev()
                    .any(|&child| self.hits(child, local, tolerance, visited))
            }
        }
    }

    /// Check the structural invariants: unique ids, one parent per shape,
    /// parent links matching child lists, no dangling references.
    pub fn validate(&self) -> EditorResult<()> {
        let mut seen = HashSet::new();
        let mut stack: Vec<(ShapeId, Option<ShapeId>)> =
            self.root.iter().map(|&id| (id, None)).collect();
        while let Some((id, parent)) = stack.pop() {
            if !seen.insert(id) {
                return Err(EditorError::DuplicateId(id));
            }
            let node = self.nodes.get(&id).ok_or(EditorError::NotFound(id))?;
            if node.parent != parent {
                return Err(EditorError::InvalidOperation(format!(
                    "shape {id} has a stale parent link"
                )));
            }
            stack.extend(node.shape.children().iter().map(|&c| (c, Some(id))));
        }
        if seen.len() != self.nodes.len() {
            return Err(EditorError::InvalidOperation(format!(
                "{} shapes are unreachable from the root list",
                self.nodes.len() - seen.len()
            )));
        }
        Ok(())
    }

    /// Deep copy of the tree as plain data.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            root: self.root.clone(),
            shapes: self
                .iter_ids()
                .filter_map(|id| self.get(id).cloned())
                .collect(),
        }
    }

    /// Plain-data subtree rooted at `id`.
    pub fn subtree(&self, id: ShapeId) -> EditorResult<ShapeTree> {
        let mut visited = HashSet::new();
        self.subtree_inner(id, &mut visited)
    }

    fn subtree_inner(
        &self,
        id: ShapeId,
        visited: &mut HashSet<ShapeId>,
    ) -> EditorResult<ShapeTree> {
        if !visited.insert(id) {
            return Err(EditorError::Cycle(id));
        }
        let shape = self.get(id).ok_or(EditorError::NotFound(id))?;
        let children = shape
            .children()
            .iter()
            .map(|&c| self.subtree_inner(c, visited))
            .collect::<EditorResult<Vec<_>>>()?;
        Ok(ShapeTree {
            shape: shape.clone(),
            children,
        })
    }

    /// The whole scene as plain-data trees, back to front.
    pub fn to_tree(&self) -> EditorResult<Vec<ShapeTree>> {
        self.root.iter().map(|&id| self.subtree(id)).collect()
    }

    /// Insert a plain-data subtree under `parent`. Nothing is inserted when
    /// any id in the subtree is already taken or a leaf carries children.
    pub fn insert_tree(
        &mut self,
        tree: ShapeTree,
        parent: Option<ShapeId>,
        index: Option<usize>,
    ) -> EditorResult<ShapeId> {
        let mut ids = HashSet::new();
        check_tree(&tree, &mut ids)?;
        if let Some(&taken) = ids.iter().find(|id| self.nodes.contains_key(*id)) {
            return Err(EditorError::DuplicateId(taken));
        }
        self.insert_tree_unchecked(tree, parent, index)
    }

    fn insert_tree_unchecked(
        &mut self,
        tree: ShapeTree,
        parent: Option<ShapeId>,
        index: Option<usize>,
    ) -> EditorResult<ShapeId> {
        let ShapeTree {
            mut shape,
            children,
        } = tree;
        if let Some(container) = shape.as_container_mut() {
            container.children.clear();
        }
        let id = self.insert(shape, parent, index)?;
        for child in children {
            self.insert_tree_unchecked(child, Some(id), None)?;
        }
        Ok(id)
    }

    /// Build a scene from plain-data trees.
    pub fn from_tree(items: Vec<ShapeTree>, graphics: G) -> EditorResult<Self> {
        let mut scene = Self::new(graphics);
        scene.load_tree(items)?;
        Ok(scene)
    }

    /// Replace the whole scene with plain-data trees. The scene is left
    /// untouched when the trees repeat an id or a leaf carries children.
    pub fn load_tree(&mut self, items: Vec<ShapeTree>) -> EditorResult<()> {
        let mut ids = HashSet::new();
        for item in &items {
            check_tree(item, &mut ids)?;
        }
        self.clear();
        for item in items {
            self.insert_tree_unchecked(item, None, None)?;
        }
        self.validate()
    }

    // Low-level access for history restore.

    /// Drop a single node (not its subtree) without touching parent lists.
    pub(crate) fn forget(&mut self, id: ShapeId) -> Option<Shape> {
        let node = self.nodes.remove(&id)?;
        self.graphics.set_parent(node.graphic, None);
        self.graphics.destroy_node(node.graphic);
        Some(node.shape)
    }

    /// Set the stored shape (including child list) and parent of an existing
    /// node, rebinding its graphic. Used when replaying snapshots.
    pub(crate) fn rebind(&mut self, shape: Shape, parent: Option<ShapeId>) {
        let id = shape.id();
        let parent_graphic = parent.and_then(|p| self.graphic_of(p));
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.shape = shape;
                node.parent = parent;
                self.graphics.set_parent(node.graphic, parent_graphic);
                self.graphics.set_transform(node.graphic, &NodeTransform::of(&node.shape));
                self.graphics.redraw(node.graphic, &node.shape);
            }
            None => {
                let graphic = self.graphics.create_node(&shape);
                self.graphics.set_parent(graphic, parent_graphic);
                self.nodes.insert(
                    id,
                    SceneNode {
                        shape,
                        parent,
                        graphic,
                    },
                );
            }
        }
    }

    pub(crate) fn set_root(&mut self, root: Vec<ShapeId>) {
        self.root = root;
    }

    pub(crate) fn ids(&self) -> HashSet<ShapeId> {
        self.nodes.keys().copied().collect()
    }
}

/// Ids are unique across the trees and only containers have children.
fn check_tree(tree: &ShapeTree, ids: &mut HashSet<ShapeId>) -> EditorResult<()> {
    let id = tree.shape.id();
    if !ids.insert(id) {
        return Err(EditorError::DuplicateId(id));
    }
    if !tree.children.is_empty() && !tree.shape.is_container() {
        return Err(EditorError::InvalidOperation(format!(
            "{} {id} cannot have children",
            tree.shape.shape_type().label()
        )));
    }
    tree.children.iter().try_for_each(|c| check_tree(c, ids))
}
