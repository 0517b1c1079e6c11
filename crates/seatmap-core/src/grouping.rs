//! Grouping shapes into containers and taking containers apart.
//!
//! All operations keep every shape's world placement. Point data of
//! polygons and free shapes moves rigidly with the anchor.

use crate::error::{EditorError, EditorResult};
use crate::geometry::union_bounds;
use crate::graphics::Graphics;
use crate::scene::SceneGraph;
use crate::shapes::{Shape, ShapeId};
use crate::transform::{world_opacity, world_placement};
use std::collections::HashSet;

/// Check whether `ids` can be grouped: at least two distinct shapes, all
/// present and all at root level.
pub fn can_group<G: Graphics>(scene: &SceneGraph<G>, ids: &[ShapeId]) -> EditorResult<()> {
    let distinct: HashSet<ShapeId> = ids.iter().copied().collect();
    if distinct.len() < 2 {
        return Err(EditorError::InvalidOperation(
            "grouping needs at least two shapes".to_string(),
        ));
    }
    for &id in &distinct {
        if !scene.contains(id) {
            return Err(EditorError::NotFound(id));
        }
        if scene.parent_of(id).is_some() {
            return Err(EditorError::InvalidOperation(format!(
                "shape {id} is already inside a container"
            )));
        }
    }
    Ok(())
}

/// Wrap root-level shapes in a new container anchored at the center of their
/// combined bounds. The container takes the z position of the frontmost
/// member; members keep their relative stacking.
pub fn group_items<G: Graphics>(scene: &mut SceneGraph<G>, ids: &[ShapeId]) -> EditorResult<ShapeId> {
    can_group(scene, ids)?;
    let bounds = union_bounds(scene, ids)?
        .ok_or_else(|| EditorError::InvalidOperation("nothing to group".to_string()))?;
    let center = bounds.center();

    // Members back to front, as they appear in the root list.
    let members: Vec<ShapeId> = scene
        .root_items()
        .iter()
        .copied()
        .filter(|id| ids.contains(id))
        .collect();
    let frontmost = members
        .iter()
        .filter_map(|&id| scene.index_in_parent(id))
        .max()
        .unwrap_or(0);

    let container = scene.insert(Shape::container(center), None, Some(frontmost + 1))?;
    for &id in &members {
        scene.update(id, |s| s.translate(-center.to_vec2()))?;
        scene.reparent(id, Some(container), None)?;
    }
    log::debug!("Grouped {} shapes into {container}", members.len());
    Ok(container)
}

/// Dissolve a container: its children move to the container's own parent,
/// in the container's stacking slot, with the container's rotation, scale,
/// position and opacity composed onto each of them. Returns the children.
pub fn ungroup<G: Graphics>(scene: &mut SceneGraph<G>, container: ShapeId) -> EditorResult<Vec<ShapeId>> {
    let shape = scene.get(container).ok_or(EditorError::NotFound(container))?;
    if !shape.is_container() {
        return Err(EditorError::InvalidOperation(format!(
            "shape {container} is not a container"
        )));
    }
    let placement = shape.placement;
    let opacity = shape.opacity;
    let children = shape.children().to_vec();
    let parent = scene.parent_of(container);
    let slot = scene.index_in_parent(container).unwrap_or(0);

    for (i, &child) in children.iter().enumerate() {
        scene.update(child, |s| {
            let composed = placement.compose(&s.placement);
            s.set_position(composed.position);
            s.placement = composed;
            s.opacity *= opacity;
        })?;
        scene.reparent(child, parent, Some(slot + i))?;
    }
    scene.remove(container)?;
    log::debug!("Ungrouped {container} into {} shapes", children.len());
    Ok(children)
}

/// Move one shape out of its container to the top of the root list, keeping
/// its world placement.
pub fn remove_from_group<G: Graphics>(scene: &mut SceneGraph<G>, child: ShapeId) -> EditorResult<()> {
    if scene.parent_of(child).is_none() {
        return Err(EditorError::InvalidOperation(format!(
            "shape {child} is not inside a container"
        )));
    }
    let world = world_placement(scene, child)?;
    let opacity = world_opacity(scene, child)?;
    scene.update(child, |s| {
        s.set_position(world.position);
        s.placement = world;
        s.opacity = opacity;
    })?;
    scene.reparent(child, None, None)
}
