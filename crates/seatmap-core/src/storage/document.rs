//! Serialized form of a seat map.

use super::{StorageError, StorageResult};
use crate::error::EditorResult;
use crate::graphics::Graphics;
use crate::scene::{SceneGraph, ShapeTree};
use serde::{Deserialize, Serialize};

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// A saved map: metadata plus the shape tree, back to front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    pub id: String,
    pub name: String,
    pub version: u32,
    #[serde(default)]
    pub items: Vec<ShapeTree>,
}

impl MapDocument {
    /// Empty document with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            version: FORMAT_VERSION,
            items: Vec::new(),
        }
    }

    /// Capture the current scene.
    pub fn from_scene<G: Graphics>(scene: &SceneGraph<G>, name: impl Into<String>) -> EditorResult<Self> {
        Ok(Self {
            items: scene.to_tree()?,
            ..Self::new(name)
        })
    }

    /// Rebuild a scene with fresh graphics. Duplicate ids are rejected.
    pub fn into_scene<G: Graphics>(self, graphics: G) -> EditorResult<SceneGraph<G>> {
        SceneGraph::from_tree(self.items, graphics)
    }

    /// Number of shapes at every depth.
    pub fn shape_count(&self) -> usize {
        self.items.iter().map(ShapeTree::count).sum()
    }

    pub fn to_json(&self) -> StorageResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Parse a document, refusing versions newer than this build understands.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        let document: Self =
            serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))?;
        if document.version > FORMAT_VERSION {
            return Err(StorageError::Serialization(format!(
                "document version {} is newer than supported version {FORMAT_VERSION}",
                document.version
            )));
        }
        Ok(document)
    }
}
