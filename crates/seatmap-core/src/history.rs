//! Snapshot-based undo/redo.
//!
//! Every mutating editor operation records a deep copy of the scene. Undo
//! and redo move a cursor through the stored snapshots and rebuild the
//! scene by diffing it against the target snapshot, so unchanged shapes
//! keep their graphic nodes.

use crate::error::{EditorError, EditorResult};
use crate::graphics::Graphics;
use crate::scene::{SceneGraph, SceneSnapshot};
use crate::shapes::ShapeId;
use std::collections::HashSet;

/// Default number of snapshots kept.
pub const DEFAULT_CAPACITY: usize = 50;

/// Linear list of scene snapshots with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<SceneSnapshot>,
    index: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            index: 0,
            capacity: capacity.max(1),
        }
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Cursor position.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot at the cursor.
    pub fn current(&self) -> Option<&SceneSnapshot> {
        self.snapshots.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Record a snapshot after the cursor, dropping any redo entries.
    ///
    /// Returns false when the snapshot equals the one at the cursor.
    pub fn save(&mut self, snapshot: SceneSnapshot) -> bool {
        if self.current() == Some(&snapshot) {
            log::trace!("History save skipped, scene unchanged");
            return false;
        }
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.index + 1);
        }
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.capacity {
            let overflow = self.snapshots.len() - self.capacity;
            self.snapshots.drain(..overflow);
        }
        self.index = self.snapshots.len() - 1;
        true
    }

    /// Restore the previous snapshot. Returns false when there is none.
    ///
    /// A snapshot that fails validation leaves both the scene and the cursor
    /// untouched.
    pub fn undo<G: Graphics>(&mut self, scene: &mut SceneGraph<G>) -> EditorResult<bool> {
        if !self.can_undo() {
            return Ok(false);
        }
        restore(scene, &self.snapshots[self.index - 1])?;
        self.index -= 1;
        log::debug!("Undo to snapshot {}/{}", self.index + 1, self.snapshots.len());
        Ok(true)
    }

    /// Restore the next snapshot. Returns false when there is none.
    pub fn redo<G: Graphics>(&mut self, scene: &mut SceneGraph<G>) -> EditorResult<bool> {
        if !self.can_redo() {
            return Ok(false);
        }
        restore(scene, &self.snapshots[self.index + 1])?;
        self.index += 1;
        log::debug!("Redo to snapshot {}/{}", self.index + 1, self.snapshots.len());
        Ok(true)
    }

    /// Drop everything and start over from `initial`.
    pub fn reset(&mut self, initial: SceneSnapshot) {
        self.snapshots.clear();
        self.snapshots.push(initial);
        self.index = 0;
    }
}

/// Walk a snapshot from its root list, returning every shape with its
/// parent, parents first. Fails on dangling, repeated or unreachable ids.
pub fn validate_snapshot(snapshot: &SceneSnapshot) -> EditorResult<Vec<(ShapeId, Option<ShapeId>)>> {
    let by_id = snapshot.by_id();
    if by_id.len() != snapshot.shapes.len() {
        return Err(EditorError::HistoryCorruption(
            "snapshot holds the same id twice".to_string(),
        ));
    }

    let mut order = Vec::with_capacity(snapshot.shapes.len());
    let mut seen = HashSet::new();
    let mut stack: Vec<(ShapeId, Option<ShapeId>)> =
        snapshot.root.iter().rev().map(|&id| (id, None)).collect();
    while let Some((id, parent)) = stack.pop() {
        if !seen.insert(id) {
            return Err(EditorError::HistoryCorruption(format!(
                "shape {id} is referenced more than once"
            )));
        }
        let shape = by_id.get(&id).ok_or_else(|| {
            EditorError::HistoryCorruption(format!("dangling reference to shape {id}"))
        })?;
        order.push((id, parent));
        stack.extend(shape.children().iter().rev().map(|&c| (c, Some(id))));
    }
    if order.len() != snapshot.shapes.len() {
        return Err(EditorError::HistoryCorruption(format!(
            "{} shapes are unreachable",
            snapshot.shapes.len() - order.len()
        )));
    }
    Ok(order)
}

/// Bring `scene` to the state recorded in `snapshot`.
///
/// Shapes missing from the snapshot are destroyed, new ones created, and
/// changed ones rewritten in place.
pub fn restore<G: Graphics>(scene: &mut SceneGraph<G>, snapshot: &SceneSnapshot) -> EditorResult<()> {
    let order = validate_snapshot(snapshot)?;
    let by_id = snapshot.by_id();
    let target: HashSet<ShapeId> = order.iter().map(|(id, _)| *id).collect();

    let mut deleted = 0;
    for id in scene.ids() {
        if !target.contains(&id) {
            scene.forget(id);
            deleted += 1;
        }
    }

    let (mut created, mut modified) = (0, 0);
    for (id, parent) in order {
        let Some(&shape) = by_id.get(&id) else {
            continue;
        };
        match scene.get(id) {
            None => created += 1,
            Some(current) if current == shape && scene.parent_of(id) == parent => continue,
            Some(_) => modified += 1,
        }
        scene.rebind(shape.clone(), parent);
    }
    scene.set_root(snapshot.root.clone());
    log::debug!("Restored snapshot: {created} created, {deleted} deleted, {modified} modified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::RetainedGraphics;
    use crate::shapes::Shape;
    use kurbo::Point;

    fn scene() -> SceneGraph<RetainedGraphics> {
        SceneGraph::new(RetainedGraphics::new())
    }

    fn history_for(scene: &SceneGraph<RetainedGraphics>) -> History {
        let mut history = History::default();
        history.save(scene.snapshot());
        history
    }

    #[test]
    fn test_initial_state() {
        let scene = scene();
        let history = history_for(&scene);
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_duplicate_snapshot_skipped() {
        let mut scene = scene();
        let mut history = history_for(&scene);
        assert!(!history.save(scene.snapshot()));
        scene.add(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        assert!(history.save(scene.snapshot()));
        assert!(!history.save(scene.snapshot()));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut scene = scene();
        let mut history = history_for(&scene);
        let initial = scene.snapshot();

        let a = scene.add(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        history.save(scene.snapshot());
        scene.update(a, |s| s.translate(kurbo::Vec2::new(5.0, 0.0))).unwrap();
        history.save(scene.snapshot());
        let after_move = scene.snapshot();

        assert!(history.undo(&mut scene).unwrap());
        assert_eq!(scene.get(a).unwrap().position(), Point::ZERO);
        assert!(history.undo(&mut scene).unwrap());
        assert_eq!(scene.snapshot(), initial);
        assert!(!history.undo(&mut scene).unwrap());

        assert!(history.redo(&mut scene).unwrap());
        assert!(history.redo(&mut scene).unwrap());
        assert_eq!(scene.snapshot(), after_move);
        assert!(!history.can_redo());
        scene.validate().unwrap();
    }

    #[test]
    fn test_save_after_undo_drops_redo() {
        let mut scene = scene();
        let mut history = history_for(&scene);
        scene.add(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        history.save(scene.snapshot());
        history.undo(&mut scene).unwrap();
        assert!(history.can_redo());

        scene.add(Shape::ellipse(Point::ZERO, 5.0, 5.0)).unwrap();
        history.save(scene.snapshot());
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut scene = scene();
        let mut history = history_for(&scene);
        for i in 0..52 {
            scene.add(Shape::rectangle(Point::new(i as f64, 0.0), 10.0, 10.0)).unwrap();
            history.save(scene.snapshot());
        }
        assert_eq!(history.len(), 50);
        let mut undos = 0;
        while history.undo(&mut scene).unwrap() {
            undos += 1;
        }
        assert_eq!(undos, 49);
        // The oldest surviving snapshot has three shapes.
        assert_eq!(scene.len(), 3);
    }

    #[test]
    fn test_restore_keeps_graphics_of_unchanged_shapes() {
        let mut scene = scene();
        let mut history = history_for(&scene);
        let a = scene.add(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        history.save(scene.snapshot());
        let graphic = scene.graphic_of(a);
        let b = scene.add(Shape::ellipse(Point::ZERO, 5.0, 5.0)).unwrap();
        history.save(scene.snapshot());

        history.undo(&mut scene).unwrap();
        assert!(!scene.contains(b));
        assert_eq!(scene.graphic_of(a), graphic);
        assert_eq!(scene.graphics().node_count(), 1);
    }

    #[test]
    fn test_restore_nested_structure() {
        let mut scene = scene();
        let mut history = history_for(&scene);
        let group = scene.add(Shape::container(Point::new(10.0, 10.0))).unwrap();
        let child = scene
            .insert(Shape::rectangle(Point::ZERO, 4.0, 4.0), Some(group), None)
            .unwrap();
        history.save(scene.snapshot());
        scene.reparent(child, None, None).unwrap();
        scene.remove(group).unwrap();
        history.save(scene.snapshot());

        history.undo(&mut scene).unwrap();
        assert_eq!(scene.parent_of(child), Some(group));
        assert_eq!(scene.children_of(group), &[child]);
        scene.validate().unwrap();
        let graphic = scene.graphic_of(child).unwrap();
        assert_eq!(
            scene.graphics().node(graphic).unwrap().parent,
            scene.graphic_of(group)
        );
    }

    #[test]
    fn test_corrupt_snapshot_leaves_state() {
        let mut scene = scene();
        let mut history = History::default();
        let ghost = uuid::Uuid::new_v4();
        history.save(SceneSnapshot {
            root: vec![ghost],
            shapes: Vec::new(),
        });
        let a = scene.add(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        history.save(scene.snapshot());

        let err = history.undo(&mut scene).unwrap_err();
        assert!(matches!(err, EditorError::HistoryCorruption(_)));
        assert_eq!(history.index(), 1);
        assert!(scene.contains(a));
    }

    #[test]
    fn test_validate_rejects_cycles_and_orphans() {
        let mut outer = Shape::container(Point::ZERO);
        let mut inner = Shape::container(Point::ZERO);
        outer.as_container_mut().unwrap().children.push(inner.id());
        inner.as_container_mut().unwrap().children.push(outer.id());
        let cyclic = SceneSnapshot {
            root: vec![outer.id()],
            shapes: vec![outer, inner],
        };
        assert!(matches!(
            validate_snapshot(&cyclic),
            Err(EditorError::HistoryCorruption(_))
        ));

        let orphan = Shape::rectangle(Point::ZERO, 1.0, 1.0);
        let unreachable = SceneSnapshot {
            root: Vec::new(),
            shapes: vec![orphan],
        };
        assert!(matches!(
            validate_snapshot(&unreachable),
            Err(EditorError::HistoryCorruption(_))
        ));
    }
}
