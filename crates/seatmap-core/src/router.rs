//! Pointer and keyboard routing.
//!
//! The editor is always in one [`InteractionState`]. Each pointer event first
//! goes through [`route`], which picks the handler by a fixed priority:
//! an active handle drag, then an active shape drag, then the current tool.

use crate::editor::Editor;
use crate::graphics::Graphics;
use crate::grouping;
use crate::input::{Key, Modifiers, MouseButton};
use crate::selection::{MoveState, TransformState};
use crate::shapes::{Shape, ShapeId, ShapeKind};
use crate::tools::{ToolKind, VertexDraft, exceeds_draw_threshold};
use kurbo::Point;

/// What the pointer is doing right now.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Moving the selection.
    Dragging(MoveState),
    /// Dragging a scale or rotate handle.
    Transforming(TransformState),
    /// Dragging out a rectangle or ellipse (world space).
    Drawing {
        kind: ToolKind,
        start: Point,
        current: Point,
    },
    /// Placing polygon or free-shape vertices.
    PlacingVertices(VertexDraft),
    /// Panning the view; `anchor` is the world point under the pointer.
    Panning { anchor: Point },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Dragging(_) => "dragging",
            InteractionState::Transforming(_) => "transforming",
            InteractionState::Drawing { .. } => "drawing",
            InteractionState::PlacingVertices(_) => "placing vertices",
            InteractionState::Panning { .. } => "panning",
        }
    }
}

/// Which handler receives a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    TransformHandle,
    ShapeDrag,
    Tool(ToolKind),
}

/// Pick the handler for the next pointer event.
pub fn route(state: &InteractionState, tool: ToolKind) -> Handler {
    match state {
        InteractionState::Transforming(_) => Handler::TransformHandle,
        InteractionState::Dragging(_) if tool == ToolKind::Select => Handler::ShapeDrag,
        _ => Handler::Tool(tool),
    }
}

impl<G: Graphics> Editor<G> {
    /// Pointer pressed at a screen position.
    pub fn pointer_down(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers) {
        let double_click = self.input.pointer_down(screen, button, modifiers);
        let world = self.camera.screen_to_world(screen);
        match button {
            MouseButton::Left => {}
            MouseButton::Right => {
                self.secondary_click();
                return;
            }
            MouseButton::Middle => {
                if self.state.is_idle() {
                    self.state = InteractionState::Panning { anchor: world };
                }
                return;
            }
        }

        match route(&self.state, self.tools.current_tool) {
            Handler::TransformHandle | Handler::ShapeDrag => {
                log::trace!("Press ignored while {}", self.state.name());
            }
            Handler::Tool(_) if !self.accepts_tool_press() => {
                log::trace!("Press ignored while {}", self.state.name());
            }
            Handler::Tool(tool) => self.tool_down(tool, world, modifiers, double_click),
        }
    }

    /// Only an idle editor or an open vertex draft takes a new tool press.
    fn accepts_tool_press(&self) -> bool {
        matches!(
            self.state,
            InteractionState::Idle | InteractionState::PlacingVertices(_)
        )
    }

    /// Pointer moved to a screen position.
    pub fn pointer_move(&mut self, screen: Point) {
        self.input.pointer_move(screen);
        let world = self.camera.screen_to_world(screen);
        match route(&self.state, self.tools.current_tool) {
            Handler::TransformHandle => {
                if let InteractionState::Transforming(transform) = &mut self.state {
                    transform.update(&mut self.scene, world, &self.config);
                }
            }
            Handler::ShapeDrag => {
                if let InteractionState::Dragging(drag) = &mut self.state {
                    drag.update(&mut self.scene, world);
                }
            }
            Handler::Tool(_) => match &mut self.state {
                InteractionState::Panning { anchor } => {
                    self.camera.pan((world - *anchor) * self.camera.zoom);
                    self.sync_view();
                }
                InteractionState::Drawing {
                    kind,
                    start,
                    current,
                } => {
                    *current = world;
                    let preview = self.tools.drag_preview(*kind, *start, world);
                    self.scene.graphics_mut().set_preview(preview);
                }
                InteractionState::PlacingVertices(draft) => {
                    draft.hover = Some(world);
                    let preview = draft.preview();
                    self.scene.graphics_mut().set_preview(Some(preview));
                }
                _ => {}
            },
        }
    }

    /// Pointer released at a screen position.
    pub fn pointer_up(&mut self, screen: Point, button: MouseButton) {
        self.input.pointer_up(screen, button);
        let world = self.camera.screen_to_world(screen);
        match button {
            MouseButton::Left => {
                let middle_pan = matches!(self.state, InteractionState::Panning { .. })
                    && self.input.is_button_pressed(MouseButton::Middle);
                if middle_pan {
                    return;
                }
            }
            MouseButton::Middle => {
                if matches!(self.state, InteractionState::Panning { .. }) {
                    self.state = InteractionState::Idle;
                }
                return;
            }
            MouseButton::Right => return,
        }

        let handler = route(&self.state, self.tools.current_tool);
        match (handler, std::mem::take(&mut self.state)) {
            (Handler::TransformHandle, InteractionState::Transforming(mut transform)) => {
                transform.update(&mut self.scene, world, &self.config);
                log::debug!("Transformed {} shapes", transform.shape_ids().len());
                self.commit();
            }
            (Handler::ShapeDrag, InteractionState::Dragging(mut drag)) => {
                drag.update(&mut self.scene, world);
                if drag.moved() {
                    log::debug!("Moved {} shapes by {:?}", drag.shape_ids().len(), drag.delta());
                    self.commit();
                }
            }
            (Handler::Tool(_), InteractionState::Drawing { kind, start, .. }) => {
                self.finish_drag_draw(kind, start, world);
            }
            (_, InteractionState::PlacingVertices(draft)) => {
                self.state = InteractionState::PlacingVertices(draft);
            }
            (_, InteractionState::Idle | InteractionState::Panning { .. }) => {}
            (_, stale) => {
                log::warn!("Dropping {} gesture on release", stale.name());
                self.abandon(stale);
            }
        }
    }

    /// Pointer released outside the canvas. Handled exactly like a release
    /// inside it.
    pub fn pointer_up_outside(&mut self, screen: Point, button: MouseButton) {
        self.pointer_up(screen, button);
    }

    /// Wheel scrolled at a screen position; negative `delta_y` zooms in.
    pub fn wheel(&mut self, screen: Point, delta_y: f64) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let step = self.config.wheel_zoom_step;
        let factor = if delta_y < 0.0 { step } else { 1.0 / step };
        self.camera.zoom_at(screen, factor);
        self.sync_view();
    }

    /// Key pressed, named the way winit or the DOM report it.
    pub fn key_down_named(&mut self, name: &str, modifiers: Modifiers) -> bool {
        self.key_down(&Key::from_name(name), modifiers)
    }

    /// Key pressed. Returns whether the editor used it.
    pub fn key_down(&mut self, key: &Key, modifiers: Modifiers) -> bool {
        let command = modifiers.ctrl || modifiers.meta;
        match key {
            Key::Escape => {
                if !self.cancel_gesture() {
                    if self.current_container.is_some() {
                        self.exit_container();
                    } else {
                        self.selection.clear();
                    }
                }
                true
            }
            Key::Delete | Key::Backspace => {
                if self.state.is_idle() {
                    self.delete_selected();
                }
                true
            }
            Key::Enter => {
                let ready = matches!(&self.state, InteractionState::PlacingVertices(d) if d.can_commit());
                if ready {
                    self.finish_draft();
                }
                ready
            }
            Key::Char('z') if command && modifiers.shift => self.redo_logged(),
            Key::Char('z') if command => self.undo_logged(),
            Key::Char('y') if command => self.redo_logged(),
            Key::Char('a') if command => {
                self.select_all();
                true
            }
            Key::Char('g') if command && modifiers.shift => {
                self.ungroup_selected();
                true
            }
            Key::Char('g') if command => match self.group_selected() {
                Ok(_) => true,
                Err(err) => {
                    log::debug!("Group shortcut skipped: {err}");
                    false
                }
            },
            Key::Char('c') if command => self.copy_selection() > 0,
            Key::Char('v') if command => !self.paste().is_empty(),
            Key::Char('c') if self.tools.current_tool == ToolKind::FreeShape => {
                let on = self.tools.toggle_curve_mode();
                log::debug!("Curve mode {}", if on { "on" } else { "off" });
                true
            }
            _ => false,
        }
    }

    /// Abandon any gesture in progress, restoring drag-start state. Nothing
    /// is recorded. Returns whether there was a gesture.
    pub fn cancel_gesture(&mut self) -> bool {
        let state = std::mem::take(&mut self.state);
        let active = !state.is_idle();
        if active {
            log::debug!("Cancelled {}", state.name());
        }
        self.abandon(state);
        active
    }

    fn abandon(&mut self, state: InteractionState) {
        match state {
            InteractionState::Dragging(drag) => drag.cancel(&mut self.scene),
            InteractionState::Transforming(transform) => transform.cancel(&mut self.scene),
            InteractionState::Drawing { .. } | InteractionState::PlacingVertices(_) => {
                self.scene.graphics_mut().set_preview(None);
            }
            InteractionState::Idle | InteractionState::Panning { .. } => {}
        }
    }

    fn undo_logged(&mut self) -> bool {
        self.undo().unwrap_or_else(|err| {
            log::error!("Undo skipped: {err}");
            false
        })
    }

    fn redo_logged(&mut self) -> bool {
        self.redo().unwrap_or_else(|err| {
            log::error!("Redo skipped: {err}");
            false
        })
    }

    fn ungroup_selected(&mut self) {
        let containers: Vec<ShapeId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|&id| self.scene.get(id).is_some_and(Shape::is_container))
            .collect();
        let mut released = Vec::new();
        for container in containers {
            match grouping::ungroup(&mut self.scene, container) {
                Ok(children) => {
                    if self.current_container == Some(container) {
                        self.current_container = None;
                    }
                    released.extend(children);
                }
                Err(err) => log::debug!("Ungroup of {container} skipped: {err}"),
            }
        }
        if !released.is_empty() {
            self.selection.set(&self.scene, released);
            self.commit();
        }
    }

    fn tool_down(&mut self, tool: ToolKind, world: Point, modifiers: Modifiers, double_click: bool) {
        match tool {
            ToolKind::Select => self.select_down(world, modifiers, double_click),
            ToolKind::Pan => {
                if self.state.is_idle() {
                    self.state = InteractionState::Panning { anchor: world };
                }
            }
            ToolKind::Rectangle | ToolKind::Ellipse => {
                if self.state.is_idle() {
                    self.state = InteractionState::Drawing {
                        kind: tool,
                        start: world,
                        current: world,
                    };
                }
            }
            ToolKind::Text => {
                if self.state.is_idle() {
                    self.create_text(world);
                }
            }
            ToolKind::Polygon | ToolKind::FreeShape => self.vertex_down(tool, world),
        }
    }

    fn select_down(&mut self, world: Point, modifiers: Modifiers, double_click: bool) {
        let zoom = self.camera.zoom;
        if !modifiers.multi_select() {
            let handle = self
                .selection
                .hit_test_handle(&self.scene, world, zoom, &self.config);
            if let Some(handle) = handle {
                if let Some(transform) =
                    TransformState::begin(&self.scene, &self.selection, handle, world)
                {
                    self.state = InteractionState::Transforming(transform);
                    return;
                }
            }
        }

        let tolerance = self.camera.screen_to_world_distance(self.config.hit_tolerance);
        if double_click && self.enter_container_at(world, tolerance) {
            return;
        }

        let mut hit = self.scene.shape_at(world, tolerance, self.current_container);
        if hit.is_none() && self.current_container.is_some() {
            // Clicking outside the entered container leaves it.
            self.current_container = None;
            hit = self.scene.shape_at(world, tolerance, None);
        }
        let Some(id) = hit else {
            self.selection.clear();
            return;
        };

        if modifiers.multi_select() {
            if let Err(err) = self.selection.toggle(&self.scene, id) {
                log::debug!("Toggle skipped: {err}");
            }
            return;
        }
        if !self.selection.is_selected(id) {
            if let Err(err) = self.selection.select(&self.scene, id) {
                log::debug!("Select skipped: {err}");
                return;
            }
        }
        self.state =
            InteractionState::Dragging(MoveState::begin(&self.scene, self.selection.ids(), world));
    }

    /// Enter the container under `world` and select its topmost child there.
    fn enter_container_at(&mut self, world: Point, tolerance: f64) -> bool {
        let Some(container) = self.scene.shape_at(world, tolerance, self.current_container) else {
            return false;
        };
        if !self.scene.get(container).is_some_and(Shape::is_container) {
            return false;
        }
        self.current_container = Some(container);
        match self.scene.shape_at(world, tolerance, Some(container)) {
            Some(child) => {
                if let Err(err) = self.selection.select(&self.scene, child) {
                    log::debug!("Could not select {child}: {err}");
                }
            }
            None => self.selection.clear(),
        }
        log::debug!("Entered container {container}");
        true
    }

    fn create_text(&mut self, world: Point) {
        let mut shape = Shape::text(world, self.config.default_text.clone());
        if let ShapeKind::Text(text) = &mut shape.kind {
            text.color = self.tools.current_style.stroke_color;
        }
        self.insert_drawn(shape);
    }

    fn finish_drag_draw(&mut self, kind: ToolKind, start: Point, end: Point) {
        self.scene.graphics_mut().set_preview(None);
        let size = (end - start) * self.camera.zoom;
        if !exceeds_draw_threshold(size.x, size.y, self.config.min_draw_size) {
            log::debug!("Discarded {:.1}x{:.1} px draw", size.x.abs(), size.y.abs());
            return;
        }
        if let Some(shape) = self.tools.shape_from_drag(kind, start, end) {
            self.insert_drawn(shape);
        }
    }

    fn vertex_down(&mut self, tool: ToolKind, world: Point) {
        if self.state.is_idle() {
            self.state = InteractionState::PlacingVertices(VertexDraft::new(tool, world));
            self.show_draft_preview();
            return;
        }
        let radius = self.camera.screen_to_world_distance(self.config.close_radius);
        let InteractionState::PlacingVertices(draft) = &mut self.state else {
            return;
        };
        if draft.kind != tool {
            return;
        }
        if draft.closes_at(world, radius) {
            self.finish_draft();
            return;
        }
        draft.push(world, self.tools.curve_mode, self.config.curve_offset_ratio);
        self.show_draft_preview();
    }

    /// Right click: commit a draft with enough vertices, else drop it.
    fn secondary_click(&mut self) {
        let InteractionState::PlacingVertices(draft) = &self.state else {
            return;
        };
        if draft.can_commit() {
            self.finish_draft();
        } else {
            self.cancel_gesture();
        }
    }

    fn show_draft_preview(&mut self) {
        if let InteractionState::PlacingVertices(draft) = &self.state {
            let preview = draft.preview();
            self.scene.graphics_mut().set_preview(Some(preview));
        }
    }

    fn finish_draft(&mut self) -> Option<ShapeId> {
        let state = std::mem::take(&mut self.state);
        let InteractionState::PlacingVertices(draft) = state else {
            self.state = state;
            return None;
        };
        self.scene.graphics_mut().set_preview(None);
        match draft.into_shape(&self.tools) {
            Some(shape) => self.insert_drawn(shape),
            None => {
                log::debug!("Draft dropped, fewer than three vertices");
                None
            }
        }
    }

    /// Add a freshly drawn shape, select it and record it.
    fn insert_drawn(&mut self, shape: Shape) -> Option<ShapeId> {
        let kind = shape.shape_type();
        match self.scene.add(shape) {
            Ok(id) => {
                if let Err(err) = self.selection.select(&self.scene, id) {
                    log::debug!("Could not select {id}: {err}");
                }
                log::debug!("Created {} {id}", kind.label());
                self.commit();
                Some(id)
            }
            Err(err) => {
                log::warn!("Drawn shape dropped: {err}");
                None
            }
        }
    }
}
