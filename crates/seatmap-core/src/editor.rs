//! The editor facade: owns the scene, selection, tools, camera and history,
//! and exposes the operations the UI layer calls.
//!
//! Pointer routing lives in [`crate::router`]; this module holds the
//! command API. Every mutating command leaves the scene valid and records
//! one history snapshot.

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::geometry::{PLACEHOLDER_SIZE, union_bounds, world_bounds};
use crate::graphics::{Graphics, RetainedGraphics};
use crate::grouping;
use crate::history::History;
use crate::import::{ImageImporter, SniffingImporter};
use crate::input::InputState;
use crate::router::InteractionState;
use crate::scene::{SceneGraph, ShapeTree};
use crate::selection::{Handle, Selection};
use crate::shapes::{SerializableColor, Shape, ShapeId, ShapeKind};
use crate::storage::MapDocument;
use crate::tools::{ToolKind, ToolManager};
use crate::transform::{world_opacity, world_placement};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Offset applied to pasted copies, in world units.
const PASTE_OFFSET: Vec2 = Vec2::new(10.0, 10.0);

/// What [`Editor::bounds_of`] measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsTarget {
    Shape(ShapeId),
    Selection,
}

/// Partial attribute update sent by property panels. Unset fields are left
/// alone; fields that do not apply to the shape's kind reject the whole
/// patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapePatch {
    pub name: Option<String>,
    /// Anchor in the parent's frame.
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub opacity: Option<f64>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub fill: Option<SerializableColor>,
    pub stroke: Option<SerializableColor>,
    pub stroke_width: Option<f64>,
    /// Rectangle size.
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Ellipse radii.
    pub radius_x: Option<f64>,
    pub radius_y: Option<f64>,
    /// Rectangle or polygon corner radius.
    pub corner_radius: Option<f64>,
    /// Text content.
    pub text: Option<String>,
    pub font_size: Option<f64>,
}

fn finite(field: &str, value: Option<f64>) -> EditorResult<()> {
    match value {
        Some(v) if !v.is_finite() => Err(EditorError::InvalidOperation(format!(
            "{field} must be finite"
        ))),
        _ => Ok(()),
    }
}

fn not_applicable(field: &str, shape: &Shape) -> EditorError {
    EditorError::InvalidOperation(format!(
        "{field} does not apply to {}",
        shape.shape_type().label()
    ))
}

impl ShapePatch {
    /// Apply to a shape. On error the shape may be partially written, so
    /// callers patch a copy.
    pub fn apply(&self, shape: &mut Shape) -> EditorResult<()> {
        for (field, value) in [
            ("x", self.x),
            ("y", self.y),
            ("rotation", self.rotation),
            ("scale_x", self.scale_x),
            ("scale_y", self.scale_y),
            ("opacity", self.opacity),
            ("stroke_width", self.stroke_width),
            ("width", self.width),
            ("height", self.height),
            ("radius_x", self.radius_x),
            ("radius_y", self.radius_y),
            ("corner_radius", self.corner_radius),
            ("font_size", self.font_size),
        ] {
            finite(field, value)?;
        }

        if let Some(name) = &self.name {
            shape.name = name.clone();
        }
        if self.x.is_some() || self.y.is_some() {
            let current = shape.position();
            shape.set_position(Point::new(
                self.x.unwrap_or(current.x),
                self.y.unwrap_or(current.y),
            ));
        }
        if let Some(rotation) = self.rotation {
            shape.placement.rotation = rotation;
        }
        if let Some(sx) = self.scale_x {
            shape.placement.scale_x = sx;
        }
        if let Some(sy) = self.scale_y {
            shape.placement.scale_y = sy;
        }
        if let Some(opacity) = self.opacity {
            shape.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(visible) = self.visible {
            shape.visible = visible;
        }
        if let Some(locked) = self.locked {
            shape.locked = locked;
        }

        if self.fill.is_some() || self.stroke.is_some() || self.stroke_width.is_some() {
            let Some(style) = shape.style_mut() else {
                return Err(not_applicable("style", shape));
            };
            if let Some(fill) = self.fill {
                style.fill_color = Some(fill);
            }
            if let Some(stroke) = self.stroke {
                style.stroke_color = stroke;
            }
            if let Some(width) = self.stroke_width {
                style.stroke_width = width.max(0.0);
            }
        }

        if self.width.is_some() || self.height.is_some() {
            let ShapeKind::Rectangle(rect) = &mut shape.kind else {
                return Err(not_applicable("width/height", shape));
            };
            rect.width = self.width.unwrap_or(rect.width).max(0.0);
            rect.height = self.height.unwrap_or(rect.height).max(0.0);
        }
        if self.radius_x.is_some() || self.radius_y.is_some() {
            let ShapeKind::Ellipse(ellipse) = &mut shape.kind else {
                return Err(not_applicable("radius", shape));
            };
            ellipse.radius_x = self.radius_x.unwrap_or(ellipse.radius_x).max(0.0);
            ellipse.radius_y = self.radius_y.unwrap_or(ellipse.radius_y).max(0.0);
        }
        if let Some(radius) = self.corner_radius {
            match &mut shape.kind {
                ShapeKind::Rectangle(r) => r.corner_radius = radius.max(0.0),
                ShapeKind::Polygon(p) => p.corner_radius = radius.max(0.0),
                _ => return Err(not_applicable("corner_radius", shape)),
            }
        }
        if self.text.is_some() || self.font_size.is_some() {
            let ShapeKind::Text(text) = &mut shape.kind else {
                return Err(not_applicable("text", shape));
            };
            if let Some(content) = &self.text {
                text.set_content(content.clone());
            }
            if let Some(size) = self.font_size {
                text.font_size = size.max(1.0);
                text.measured = None;
            }
        }
        Ok(())
    }
}

/// Result of an image import: the inserted shape, plus the failure message
/// when a placeholder was inserted instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub id: ShapeId,
    pub error: Option<String>,
}

/// The seat-map editor.
pub struct Editor<G: Graphics = RetainedGraphics> {
    pub(crate) scene: SceneGraph<G>,
    pub(crate) selection: Selection,
    pub(crate) tools: ToolManager,
    pub(crate) camera: Camera,
    pub(crate) input: InputState,
    pub(crate) config: EditorConfig,
    pub(crate) history: History,
    pub(crate) state: InteractionState,
    pub(crate) current_container: Option<ShapeId>,
    importer: Box<dyn ImageImporter>,
    clipboard: Vec<ShapeTree>,
}

impl Default for Editor<RetainedGraphics> {
    fn default() -> Self {
        Self::new(RetainedGraphics::new())
    }
}

impl<G: Graphics> Editor<G> {
    /// Empty editor drawing into `graphics`, with default configuration.
    pub fn new(graphics: G) -> Self {
        Self::with_config(graphics, EditorConfig::default())
    }

    pub fn with_config(graphics: G, config: EditorConfig) -> Self {
        let scene = SceneGraph::new(graphics);
        let mut history = History::new(config.history_capacity);
        history.save(scene.snapshot());
        let mut editor = Self {
            scene,
            selection: Selection::new(),
            tools: ToolManager::new(),
            camera: Camera::from_config(&config),
            input: InputState::new(),
            config,
            history,
            state: InteractionState::Idle,
            current_container: None,
            importer: Box::new(SniffingImporter::new()),
            clipboard: Vec::new(),
        };
        editor.sync_view();
        editor
    }

    /// Use another importer for [`import_image`](Self::import_image).
    pub fn with_importer(mut self, importer: impl ImageImporter + 'static) -> Self {
        self.importer = Box::new(importer);
        self
    }

    /// Tear down, destroying every graphic node, and return the renderer.
    pub fn dispose(self) -> G {
        self.scene.dispose()
    }

    // --- Read-only queries ---

    pub fn scene(&self) -> &SceneGraph<G> {
        &self.scene
    }

    /// The whole scene as plain data.
    pub fn shapes(&self) -> EditorResult<Vec<ShapeTree>> {
        self.scene.to_tree()
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.scene.get(id)
    }

    /// Selected ids in selection order.
    pub fn selected(&self) -> &[ShapeId] {
        self.selection.ids()
    }

    /// World bounds of one shape or of the whole selection.
    pub fn bounds_of(&self, target: BoundsTarget) -> Option<Rect> {
        let result = match target {
            BoundsTarget::Shape(id) => world_bounds(&self.scene, id).map(Some),
            BoundsTarget::Selection => union_bounds(&self.scene, self.selection.ids()),
        };
        result.unwrap_or_else(|err| {
            log::debug!("No bounds for {target:?}: {err}");
            None
        })
    }

    /// Transform handles of the current selection, in world space.
    pub fn handles(&self) -> Vec<Handle> {
        self.selection.handles(&self.scene, self.camera.zoom, &self.config)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    /// Tool settings (style, corner radius) for new shapes.
    pub fn tools_mut(&mut self) -> &mut ToolManager {
        &mut self.tools
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Container the user has entered by double-clicking, if any.
    pub fn current_container(&self) -> Option<ShapeId> {
        self.current_container
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Shape commands ---

    /// Add a shape to the top of the root list and record it.
    pub fn add_shape(&mut self, shape: Shape) -> EditorResult<ShapeId> {
        let id = self.scene.add(shape)?;
        log::debug!("Added shape {id}");
        self.commit();
        Ok(id)
    }

    /// Apply a partial update. Returns false when the shape is gone.
    pub fn update_shape(&mut self, id: ShapeId, patch: &ShapePatch) -> EditorResult<bool> {
        let Some(shape) = self.scene.get(id) else {
            log::debug!("Update skipped, shape {id} not found");
            return Ok(false);
        };
        let mut next = shape.clone();
        patch.apply(&mut next)?;
        self.scene.replace(next)?;
        self.commit();
        Ok(true)
    }

    /// Record text metrics reported by the renderer. Not a user edit, so no
    /// history entry is made.
    pub fn set_text_metrics(&mut self, id: ShapeId, size: Size) -> bool {
        let result = self.scene.update(id, |shape| match &mut shape.kind {
            ShapeKind::Text(text) => {
                text.measured = Some(size);
                true
            }
            _ => false,
        });
        result.unwrap_or_else(|err| {
            log::debug!("Text metrics skipped: {err}");
            false
        })
    }

    /// Delete a shape and its subtree. Returns false when it was not found.
    pub fn delete_shape(&mut self, id: ShapeId) -> bool {
        if let Err(err) = self.scene.remove(id) {
            log::debug!("Delete skipped: {err}");
            return false;
        }
        self.commit();
        true
    }

    /// Delete every selected shape. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selection.ids().to_vec();
        // Selected descendants of selected containers go with them.
        let removed = ids
            .into_iter()
            .filter(|&id| self.scene.remove(id).is_ok())
            .count();
        self.selection.clear();
        if removed > 0 {
            log::debug!("Deleted {removed} selected shapes");
            self.commit();
        }
        removed
    }

    /// Remove every shape. Undoable.
    pub fn clear_canvas(&mut self) {
        self.cancel_gesture();
        self.scene.clear();
        self.selection.clear();
        self.current_container = None;
        self.commit();
    }

    // --- Selection ---

    /// Select a shape, replacing the selection or toggling membership.
    pub fn select_shape(&mut self, id: ShapeId, multi_select: bool) -> bool {
        let result = if multi_select {
            self.selection.toggle(&self.scene, id)
        } else {
            self.selection.select(&self.scene, id)
        };
        if let Err(err) = result {
            log::debug!("Select skipped: {err}");
            return false;
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select the root items, or the current container's children.
    pub fn select_all(&mut self) {
        match self.current_container {
            Some(container) => {
                let children = self.scene.children_of(container).to_vec();
                self.selection.set(&self.scene, children);
            }
            None => self.selection.select_all(&self.scene),
        }
    }

    /// Leave the container context entered by double-click.
    pub fn exit_container(&mut self) {
        if let Some(container) = self.current_container.take() {
            log::debug!("Left container {container}");
            if self.scene.parent_of(container).is_none() {
                if let Err(err) = self.selection.select(&self.scene, container) {
                    log::debug!("Could not reselect {container}: {err}");
                }
            } else {
                self.selection.clear();
            }
        }
    }

    // --- Grouping ---

    /// Group the selection into a new container, which becomes the
    /// selection.
    pub fn group_selected(&mut self) -> EditorResult<ShapeId> {
        let ids = self.selection.ids().to_vec();
        let container = grouping::group_items(&mut self.scene, &ids).inspect_err(|err| {
            log::debug!("Group rejected: {err}");
        })?;
        self.selection.select(&self.scene, container)?;
        self.commit();
        Ok(container)
    }

    /// Dissolve a container; its former children become the selection.
    pub fn ungroup(&mut self, container: ShapeId) -> EditorResult<Vec<ShapeId>> {
        let children = grouping::ungroup(&mut self.scene, container).inspect_err(|err| {
            log::debug!("Ungroup rejected: {err}");
        })?;
        if self.current_container == Some(container) {
            self.current_container = None;
        }
        self.selection.set(&self.scene, children.iter().copied());
        self.commit();
        Ok(children)
    }

    /// Move one shape out of its container to the root list.
    pub fn remove_from_group(&mut self, id: ShapeId) -> EditorResult<()> {
        grouping::remove_from_group(&mut self.scene, id)?;
        self.commit();
        Ok(())
    }

    // --- Z-order ---

    pub fn bring_to_front(&mut self, id: ShapeId) -> bool {
        self.reorder(id, |scene, id| scene.bring_to_front(id).map(|()| true))
    }

    pub fn send_to_back(&mut self, id: ShapeId) -> bool {
        self.reorder(id, |scene, id| scene.send_to_back(id).map(|()| true))
    }

    pub fn bring_forward(&mut self, id: ShapeId) -> bool {
        self.reorder(id, SceneGraph::bring_forward)
    }

    pub fn send_backward(&mut self, id: ShapeId) -> bool {
        self.reorder(id, SceneGraph::send_backward)
    }

    fn reorder(
        &mut self,
        id: ShapeId,
        op: impl FnOnce(&mut SceneGraph<G>, ShapeId) -> EditorResult<bool>,
    ) -> bool {
        match op(&mut self.scene, id) {
            Ok(changed) => {
                if changed {
                    self.commit();
                }
                changed
            }
            Err(err) => {
                log::debug!("Reorder skipped: {err}");
                false
            }
        }
    }

    // --- History ---

    /// Step back one snapshot. The selection is cleared afterwards.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.cancel_gesture();
        let applied = self.history.undo(&mut self.scene).inspect_err(|err| {
            log::error!("Undo failed: {err}");
        })?;
        self.after_restore();
        Ok(applied)
    }

    /// Step forward one snapshot. The selection is cleared afterwards.
    pub fn redo(&mut self) -> EditorResult<bool> {
        self.cancel_gesture();
        let applied = self.history.redo(&mut self.scene).inspect_err(|err| {
            log::error!("Redo failed: {err}");
        })?;
        self.after_restore();
        Ok(applied)
    }

    fn after_restore(&mut self) {
        self.selection.clear();
        if self
            .current_container
            .is_some_and(|c| !self.scene.contains(c))
        {
            self.current_container = None;
        }
    }

    /// Record the current scene as a history snapshot.
    pub(crate) fn commit(&mut self) {
        self.selection.remove_invalid(&self.scene);
        if self
            .current_container
            .is_some_and(|c| !self.scene.get(c).is_some_and(Shape::is_container))
        {
            self.current_container = None;
        }
        self.history.save(self.scene.snapshot());
    }

    // --- Tools and viewport ---

    /// Switch tools, abandoning any gesture in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.cancel_gesture();
        self.tools.set_tool(tool);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.camera.set_zoom(zoom);
        self.sync_view();
    }

    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.camera.set_pan(x, y);
        self.sync_view();
    }

    /// Fit the whole scene into a viewport of the given size.
    pub fn zoom_to_fit(&mut self, viewport: Size, padding: f64) {
        let ids = self.scene.root_items().to_vec();
        match union_bounds(&self.scene, &ids) {
            Ok(Some(bounds)) => self.camera.fit_to_bounds(bounds, viewport, padding),
            Ok(None) => self.camera.reset(),
            Err(err) => log::warn!("Zoom to fit skipped: {err}"),
        }
        self.sync_view();
    }

    pub(crate) fn sync_view(&mut self) {
        let view = self.camera.transform();
        self.scene.graphics_mut().set_view(view);
    }

    // --- Clipboard ---

    /// Copy the selection as plain data, flattened to world placement.
    /// Returns how many items were copied.
    pub fn copy_selection(&mut self) -> usize {
        let mut copied = Vec::new();
        for &id in self.selection.ids() {
            let tree = self.scene.subtree(id).and_then(|mut tree| {
                let placement = world_placement(&self.scene, id)?;
                tree.shape.opacity = world_opacity(&self.scene, id)?;
                tree.shape.set_position(placement.position);
                tree.shape.placement = placement;
                Ok(tree)
            });
            match tree {
                Ok(tree) => copied.push(tree),
                Err(err) => log::debug!("Copy skipped: {err}"),
            }
        }
        if !copied.is_empty() {
            self.clipboard = copied;
        }
        self.clipboard.len()
    }

    /// Paste the clipboard at the top of the root list, slightly offset.
    /// The pasted shapes become the selection.
    pub fn paste(&mut self) -> Vec<ShapeId> {
        let mut pasted = Vec::new();
        for tree in &mut self.clipboard {
            tree.shape.translate(PASTE_OFFSET);
            let mut copy = tree.clone();
            copy.regenerate_ids();
            match self.scene.insert_tree(copy, None, None) {
                Ok(id) => pasted.push(id),
                Err(err) => log::warn!("Paste skipped: {err}"),
            }
        }
        if !pasted.is_empty() {
            self.selection.set(&self.scene, pasted.iter().copied());
            self.commit();
        }
        pasted
    }

    // --- Import ---

    /// Insert an image centered at `position` (world). Unreadable data
    /// inserts a placeholder named "Import failed" instead.
    pub fn import_image(&mut self, data: &[u8], position: Point) -> EditorResult<ImportOutcome> {
        let (shape, error) = match self.importer.import(data) {
            Ok(image) => (Shape::new(position, ShapeKind::Image(image)), None),
            Err(err) => {
                log::warn!("Image import failed, inserting placeholder: {err}");
                let mut placeholder = Shape::rectangle(position, PLACEHOLDER_SIZE, PLACEHOLDER_SIZE);
                placeholder.name = "Import failed".to_string();
                if let Some(style) = placeholder.style_mut() {
                    style.fill_color = None;
                    style.stroke_color = SerializableColor::new(0xDC, 0x26, 0x26, 255);
                }
                (placeholder, Some(err.to_string()))
            }
        };
        let id = self.scene.add(shape)?;
        self.selection.select(&self.scene, id)?;
        self.commit();
        Ok(ImportOutcome { id, error })
    }

    // --- Persistence ---

    /// Capture the scene as a named document.
    pub fn to_document(&self, name: impl Into<String>) -> EditorResult<MapDocument> {
        MapDocument::from_scene(&self.scene, name)
    }

    /// Replace the scene with a loaded document. History starts over.
    pub fn load_document(&mut self, document: MapDocument) -> EditorResult<()> {
        self.cancel_gesture();
        self.scene.load_tree(document.items)?;
        self.selection.clear();
        self.current_container = None;
        self.history.reset(self.scene.snapshot());
        log::info!("Loaded map {} ({} shapes)", document.name, self.scene.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::DEFAULT_CAPACITY;

    fn editor() -> Editor {
        Editor::default()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_new_editor_is_empty() {
        let editor = editor();
        assert!(editor.scene().is_empty());
        assert!(!editor.can_undo());
        assert!(!editor.can_redo());
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_add_update_delete() {
        let mut editor = editor();
        let id = editor
            .add_shape(Shape::rectangle(Point::ZERO, 100.0, 50.0))
            .unwrap();
        let patch = ShapePatch {
            width: Some(80.0),
            x: Some(5.0),
            opacity: Some(2.0),
            ..ShapePatch::default()
        };
        assert!(editor.update_shape(id, &patch).unwrap());
        let shape = editor.shape(id).unwrap();
        assert_eq!(shape.display_size(), Some(Size::new(80.0, 50.0)));
        assert_eq!(shape.position(), Point::new(5.0, 0.0));
        assert!(close(shape.opacity, 1.0));

        assert!(editor.delete_shape(id));
        assert!(!editor.delete_shape(id));
        assert!(!editor.update_shape(id, &patch).unwrap());
        assert_eq!(editor.history().len(), 4);
    }

    #[test]
    fn test_patch_mismatch_leaves_shape() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::ellipse(Point::ZERO, 5.0, 5.0)).unwrap();
        let before = editor.shape(id).cloned();
        let patch = ShapePatch {
            name: Some("Stage".to_string()),
            width: Some(10.0),
            ..ShapePatch::default()
        };
        assert!(matches!(
            editor.update_shape(id, &patch),
            Err(EditorError::InvalidOperation(_))
        ));
        assert_eq!(editor.shape(id).cloned(), before);

        let nan = ShapePatch {
            rotation: Some(f64::NAN),
            ..ShapePatch::default()
        };
        assert!(editor.update_shape(id, &nan).is_err());
    }

    #[test]
    fn test_patch_from_json() {
        let patch: ShapePatch = serde_json::from_str(r#"{"text": "Row A", "font_size": 24}"#).unwrap();
        let mut shape = Shape::text(Point::ZERO, "Text");
        patch.apply(&mut shape).unwrap();
        let ShapeKind::Text(text) = &shape.kind else {
            panic!("Expected Text kind");
        };
        assert_eq!(text.content, "Row A");
        assert!(close(text.font_size, 24.0));
    }

    #[test]
    fn test_clear_selection_twice() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        assert!(editor.select_shape(id, false));
        editor.clear_selection();
        assert!(editor.selected().is_empty());
        editor.clear_selection();
        assert!(editor.selected().is_empty());
    }

    #[test]
    fn test_select_missing_is_noop() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        editor.select_shape(a, false);
        assert!(!editor.select_shape(uuid::Uuid::new_v4(), false));
        assert_eq!(editor.selected(), &[a]);
    }

    #[test]
    fn test_multi_select_toggles() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        let b = editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        editor.select_shape(a, false);
        editor.select_shape(b, true);
        assert_eq!(editor.selected(), &[a, b]);
        editor.select_shape(a, true);
        assert_eq!(editor.selected(), &[b]);
    }

    #[test]
    fn test_group_selected_and_ungroup() {
        let mut editor = editor();
        let a = editor
            .add_shape(Shape::rectangle(Point::new(10.0, 10.0), 10.0, 10.0))
            .unwrap();
        let b = editor
            .add_shape(Shape::rectangle(Point::new(50.0, 10.0), 10.0, 10.0))
            .unwrap();
        editor.select_shape(a, false);
        editor.select_shape(b, true);

        let group = editor.group_selected().unwrap();
        assert_eq!(editor.selected(), &[group]);
        assert_eq!(editor.shape(group).unwrap().position(), Point::new(30.0, 10.0));

        let children = editor.ungroup(group).unwrap();
        assert_eq!(children, vec![a, b]);
        assert_eq!(editor.selected(), &[a, b]);
        assert_eq!(editor.shape(a).unwrap().position(), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_group_rejection_records_nothing() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        editor.select_shape(a, false);
        let entries = editor.history().len();
        assert!(editor.group_selected().is_err());
        assert_eq!(editor.history().len(), entries);
        assert_eq!(editor.selected(), &[a]);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        editor
            .update_shape(
                id,
                &ShapePatch {
                    rotation: Some(0.5),
                    ..ShapePatch::default()
                },
            )
            .unwrap();
        let after = editor.scene().snapshot();
        editor.select_shape(id, false);

        assert!(editor.undo().unwrap());
        assert!(editor.selected().is_empty());
        assert!(close(editor.shape(id).unwrap().rotation(), 0.0));
        assert!(editor.redo().unwrap());
        assert_eq!(editor.scene().snapshot(), after);
        assert!(!editor.redo().unwrap());
    }

    #[test]
    fn test_history_caps_after_many_mutations() {
        let mut editor = editor();
        for i in 0..52 {
            editor
                .add_shape(Shape::rectangle(Point::new(f64::from(i), 0.0), 10.0, 10.0))
                .unwrap();
        }
        assert_eq!(editor.history().len(), DEFAULT_CAPACITY);
        assert_eq!(editor.history().index(), DEFAULT_CAPACITY - 1);
        assert!(editor.can_undo());
        assert!(!editor.can_redo());
        editor.undo().unwrap();
        assert!(editor.can_redo());
        assert_eq!(editor.history().index(), DEFAULT_CAPACITY - 2);
    }

    #[test]
    fn test_clear_canvas_is_undoable() {
        let mut editor = editor();
        editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        editor.add_shape(Shape::ellipse(Point::ZERO, 3.0, 3.0)).unwrap();
        editor.clear_canvas();
        assert!(editor.scene().is_empty());
        editor.undo().unwrap();
        assert_eq!(editor.scene().len(), 2);
    }

    #[test]
    fn test_delete_selected_with_nested_selection() {
        let mut editor = editor();
        let group = editor.add_shape(Shape::container(Point::ZERO)).unwrap();
        let child = editor
            .scene
            .insert(Shape::rectangle(Point::ZERO, 4.0, 4.0), Some(group), None)
            .unwrap();
        editor.select_shape(group, false);
        editor.select_shape(child, true);
        assert_eq!(editor.delete_selected(), 1);
        assert!(editor.scene().is_empty());
        assert!(editor.selected().is_empty());
    }

    #[test]
    fn test_bounds_of() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        let b = editor
            .add_shape(Shape::rectangle(Point::new(20.0, 0.0), 10.0, 10.0))
            .unwrap();
        assert_eq!(
            editor.bounds_of(BoundsTarget::Shape(a)),
            Some(Rect::new(-5.0, -5.0, 5.0, 5.0))
        );
        assert_eq!(editor.bounds_of(BoundsTarget::Selection), None);
        editor.select_shape(a, false);
        editor.select_shape(b, true);
        assert_eq!(
            editor.bounds_of(BoundsTarget::Selection),
            Some(Rect::new(-5.0, -5.0, 25.0, 5.0))
        );
        assert_eq!(editor.bounds_of(BoundsTarget::Shape(uuid::Uuid::new_v4())), None);
    }

    #[test]
    fn test_z_order_commands() {
        let mut editor = editor();
        let a = editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        let b = editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        assert!(editor.bring_to_front(a));
        assert_eq!(editor.scene().root_items(), &[b, a]);
        assert!(!editor.bring_forward(a));
        assert!(editor.send_backward(a));
        assert_eq!(editor.scene().root_items(), &[a, b]);
    }

    #[test]
    fn test_copy_paste_flattens_nested() {
        let mut editor = editor();
        let group = editor.add_shape(Shape::container(Point::new(100.0, 0.0))).unwrap();
        let child = editor
            .scene
            .insert(Shape::rectangle(Point::new(10.0, 0.0), 4.0, 4.0), Some(group), None)
            .unwrap();
        editor.select_shape(child, false);
        assert_eq!(editor.copy_selection(), 1);

        let pasted = editor.paste();
        assert_eq!(pasted.len(), 1);
        assert_ne!(pasted[0], child);
        assert_eq!(editor.scene().parent_of(pasted[0]), None);
        assert_eq!(editor.shape(pasted[0]).unwrap().position(), Point::new(120.0, 10.0));
        assert_eq!(editor.selected(), pasted.as_slice());

        let again = editor.paste();
        assert_eq!(editor.shape(again[0]).unwrap().position(), Point::new(130.0, 20.0));
        editor.scene().validate().unwrap();
    }

    #[test]
    fn test_import_failure_inserts_placeholder() {
        let mut editor = editor();
        let outcome = editor.import_image(b"garbage", Point::new(5.0, 5.0)).unwrap();
        assert!(outcome.error.is_some());
        let shape = editor.shape(outcome.id).unwrap();
        assert_eq!(shape.name, "Import failed");
        assert_eq!(shape.position(), Point::new(5.0, 5.0));
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_import_svg() {
        let mut editor = editor();
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"></svg>"#;
        let outcome = editor.import_image(svg, Point::ZERO).unwrap();
        assert!(outcome.error.is_none());
        assert_eq!(
            editor.bounds_of(BoundsTarget::Shape(outcome.id)),
            Some(Rect::new(-20.0, -10.0, 20.0, 10.0))
        );
    }

    #[test]
    fn test_text_metrics_change_bounds() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::text(Point::ZERO, "Row A")).unwrap();
        assert_eq!(
            editor.bounds_of(BoundsTarget::Shape(id)),
            Some(Rect::new(-50.0, -50.0, 50.0, 50.0))
        );
        assert!(editor.set_text_metrics(id, Size::new(40.0, 20.0)));
        assert_eq!(
            editor.bounds_of(BoundsTarget::Shape(id)),
            Some(Rect::new(-20.0, -10.0, 20.0, 10.0))
        );
    }

    #[test]
    fn test_document_round_trip() {
        let mut editor = editor();
        editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        editor.add_shape(Shape::text(Point::new(0.0, 30.0), "Exit")).unwrap();
        let document = editor.to_document("Hall").unwrap();

        let mut other = Editor::default();
        other.load_document(document).unwrap();
        assert_eq!(other.scene().snapshot(), editor.scene().snapshot());
        assert!(!other.can_undo());
    }

    #[test]
    fn test_load_malformed_document_keeps_scene() {
        let mut editor = editor();
        let id = editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        assert!(editor.select_shape(id, false));
        let before = editor.scene().snapshot();
        let history_len = editor.history().len();

        let mut document = MapDocument::new("Broken");
        document.items.push(ShapeTree {
            shape: Shape::rectangle(Point::ZERO, 5.0, 5.0),
            children: vec![ShapeTree {
                shape: Shape::ellipse(Point::ZERO, 2.0, 2.0),
                children: vec![],
            }],
        });
        assert!(matches!(
            editor.load_document(document),
            Err(EditorError::InvalidOperation(_))
        ));
        assert_eq!(editor.scene().snapshot(), before);
        assert_eq!(editor.history().len(), history_len);
        assert!(editor.can_undo());
        assert_eq!(editor.selected(), &[id]);
    }

    #[test]
    fn test_load_document_with_duplicate_ids_keeps_scene() {
        let mut editor = editor();
        editor.add_shape(Shape::text(Point::ZERO, "Stage")).unwrap();
        let before = editor.scene().snapshot();

        let shape = Shape::rectangle(Point::ZERO, 5.0, 5.0);
        let mut document = MapDocument::new("Twice");
        for _ in 0..2 {
            document.items.push(ShapeTree {
                shape: shape.clone(),
                children: vec![],
            });
        }
        assert_eq!(
            editor.load_document(document),
            Err(EditorError::DuplicateId(shape.id()))
        );
        assert_eq!(editor.scene().snapshot(), before);
        assert!(editor.can_undo());
    }

    #[test]
    fn test_dispose_destroys_graphics() {
        let mut editor = editor();
        editor.add_shape(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        let graphics = editor.dispose();
        assert_eq!(graphics.node_count(), 0);
    }
}
