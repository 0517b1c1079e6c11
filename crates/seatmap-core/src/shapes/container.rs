//! Container shape for grouping shapes.

use super::ShapeId;
use serde::{Deserialize, Serialize};

/// A group of shapes that defines their local coordinate space.
///
/// Children are referenced by id; the scene graph owns the child shapes.
/// Containers can hold other containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Child ids, back to front.
    #[serde(default)]
    pub children: Vec<ShapeId>,
    /// Whether the layer panel shows the children.
    #[serde(default = "default_expanded")]
    pub expanded: bool,
}

fn default_expanded() -> bool {
    true
}

impl Container {
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            expanded: true,
        }
    }

    /// Create a container holding the given children.
    pub fn with_children(children: Vec<ShapeId>) -> Self {
        Self {
            children,
            expanded: true,
        }
    }

    /// Check whether `id` is a direct child.
    pub fn contains(&self, id: ShapeId) -> bool {
        self.children.contains(&id)
    }

    /// Remove a direct child; returns its former index.
    pub fn remove_child(&mut self, id: ShapeId) -> Option<usize> {
        let index = self.children.iter().position(|&c| c == id)?;
        self.children.remove(index);
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_container_creation() {
        let container = Container::new();
        assert!(container.children.is_empty());
        assert!(container.expanded);
    }

    #[test]
    fn test_remove_child() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut container = Container::with_children(vec![a, b]);

        assert_eq!(container.remove_child(b), Some(1));
        assert!(!container.contains(b));
        assert_eq!(container.remove_child(b), None);
        assert!(container.contains(a));
    }

    #[test]
    fn test_expanded_defaults_on_deserialize() {
        let container: Container = serde_json::from_str(r#"{ "children": [] }"#).unwrap();
        assert!(container.expanded);
    }
}
