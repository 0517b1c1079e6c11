//! Seatmap Core Library
//!
//! Platform-agnostic scene graph and interaction engine for the seat-map
//! designer. Rendering is delegated to a [`Graphics`] implementation.

pub mod camera;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod graphics;
pub mod grouping;
pub mod history;
pub mod import;
pub mod input;
pub mod router;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod storage;
pub mod tools;
pub mod transform;

pub use camera::Camera;
pub use config::EditorConfig;
pub use editor::{BoundsTarget, Editor, ImportOutcome, ShapePatch};
pub use error::{EditorError, EditorResult};
pub use graphics::{GraphicId, Graphics, NodeTransform, RetainedGraphics};
pub use history::History;
pub use import::{ImageImporter, SniffingImporter};
pub use input::{InputState, Key, Modifiers, MouseButton};
pub use router::{Handler, InteractionState, route};
pub use scene::{SceneGraph, SceneSnapshot, ShapeTree};
pub use selection::{Handle, HandleKind, MoveState, Selection, TransformState};
pub use shapes::{Shape, ShapeId, ShapeKind, ShapeType};
pub use tools::{ToolKind, ToolManager, VertexDraft};
pub use transform::Placement;
