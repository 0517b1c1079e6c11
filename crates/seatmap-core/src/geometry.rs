//! Axis-aligned bounds of shapes under rotation, scale and nesting.
//!
//! Leaf bounds are pure functions of the shape data and are expressed in the
//! shape's parent frame. Container bounds need the scene graph to reach the
//! children.

use crate::error::{EditorError, EditorResult};
use crate::graphics::Graphics;
use crate::scene::SceneGraph;
use crate::shapes::{Shape, ShapeId, ShapeKind};
use crate::transform::parent_affine;
use kurbo::{Affine, Point, Rect};
use std::collections::HashSet;

/// Side length of the box used when a shape has no measurable extent.
pub const PLACEHOLDER_SIZE: f64 = 100.0;

/// Placeholder box centered at `center`.
pub fn placeholder_bounds(center: Point) -> Rect {
    Rect::from_center_size(center, (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE))
}

/// Bounds of the four transformed corners of `rect`.
pub fn transform_rect(affine: Affine, rect: Rect) -> Rect {
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    let first = affine * corners[0];
    corners[1..]
        .iter()
        .fold(Rect::from_points(first, first), |r, &c| r.union_pt(affine * c))
}

/// Even-odd ray casting test.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Bounds of a leaf shape in its parent's frame.
///
/// Containers and shapes without extent get the placeholder box at their
/// anchor; use [`shape_bounds`] for containers.
pub fn leaf_bounds(shape: &Shape) -> Rect {
    let p = &shape.placement;
    match &shape.kind {
        ShapeKind::Rectangle(r) => transform_rect(p.affine(), r.as_rect()),
        ShapeKind::Ellipse(e) => {
            let a = e.radius_x * p.scale_x.abs();
            let b = e.radius_y * p.scale_y.abs();
            let (sin, cos) = p.rotation.sin_cos();
            let half_w = a * cos.abs() + b * sin.abs();
            let half_h = a * sin.abs() + b * cos.abs();
            Rect::from_center_size(p.position, (half_w * 2.0, half_h * 2.0))
        }
        ShapeKind::Polygon(poly) => match poly.points_bounds() {
            Some(bounds) => transform_rect(about_anchor(shape), bounds),
            None => placeholder_bounds(p.position),
        },
        ShapeKind::FreeShape(free) => match free.points_bounds() {
            Some(bounds) => transform_rect(about_anchor(shape), bounds),
            None => placeholder_bounds(p.position),
        },
        ShapeKind::Text(text) => match text.measured {
            Some(_) => transform_rect(p.affine(), text.local_box()),
            None => placeholder_bounds(p.position),
        },
        ShapeKind::Image(image) => {
            let size = image.intrinsic_size();
            if size.is_zero_area() {
                placeholder_bounds(p.position)
            } else {
                transform_rect(p.affine(), Rect::from_center_size(Point::ZERO, size))
            }
        }
        ShapeKind::Container(_) => placeholder_bounds(p.position),
    }
}

/// Rotation and scale around the anchor, for point data already stored in
/// the parent's frame.
fn about_anchor(shape: &Shape) -> Affine {
    let anchor = shape.placement.position.to_vec2();
    Affine::translate(anchor) * shape.placement.linear() * Affine::translate(-anchor)
}

/// Bounds of any shape in its parent's frame.
pub fn shape_bounds<G: Graphics>(scene: &SceneGraph<G>, id: ShapeId) -> EditorResult<Rect> {
    let mut visited = HashSet::new();
    bounds_in_parent(scene, id, &mut visited)
}

fn bounds_in_parent<G: Graphics>(
    scene: &SceneGraph<G>,
    id: ShapeId,
    visited: &mut HashSet<ShapeId>,
) -> EditorResult<Rect> {
    if !visited.insert(id) {
        return Err(EditorError::Cycle(id));
    }
    let shape = scene.get(id).ok_or(EditorError::NotFound(id))?;
    let Some(container) = shape.as_container() else {
        return Ok(leaf_bounds(shape));
    };

    let mut union: Option<Rect> = None;
    for &child in &container.children {
        let child_bounds = bounds_in_parent(scene, child, visited)?;
        union = Some(union.map_or(child_bounds, |u| u.union(child_bounds)));
    }
    Ok(match union {
        Some(local) => transform_rect(shape.local_affine(), local),
        None => placeholder_bounds(shape.position()),
    })
}

/// Bounds of a shape in world space.
pub fn world_bounds<G: Graphics>(scene: &SceneGraph<G>, id: ShapeId) -> EditorResult<Rect> {
    let local = shape_bounds(scene, id)?;
    Ok(transform_rect(parent_affine(scene, id)?, local))
}

/// Union of the world bounds of several shapes, `None` for an empty set.
pub fn union_bounds<G: Graphics>(
    scene: &SceneGraph<G>,
    ids: &[ShapeId],
) -> EditorResult<Option<Rect>> {
    let mut union: Option<Rect> = None;
    for &id in ids {
        let bounds = world_bounds(scene, id)?;
        union = Some(union.map_or(bounds, |u| u.union(bounds)));
    }
    Ok(union)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::RetainedGraphics;
    use kurbo::Size;
    use std::f64::consts::FRAC_PI_2;

    fn assert_rect(actual: Rect, expected: Rect) {
        assert!(
            (actual.x0 - expected.x0).abs() < 1e-9
                && (actual.y0 - expected.y0).abs() < 1e-9
                && (actual.x1 - expected.x1).abs() < 1e-9
                && (actual.y1 - expected.y1).abs() < 1e-9,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn test_rectangle_rotated_quarter_turn() {
        let mut shape = Shape::rectangle(Point::new(10.0, 20.0), 100.0, 50.0);
        shape.placement.rotation = FRAC_PI_2;
        assert_rect(leaf_bounds(&shape), Rect::new(-15.0, -30.0, 35.0, 70.0));
    }

    #[test]
    fn test_rectangle_scale_applies_per_axis() {
        let mut shape = Shape::rectangle(Point::ZERO, 100.0, 50.0);
        shape.placement.scale_x = 1.2;
        shape.placement.scale_y = 0.8;
        assert_rect(leaf_bounds(&shape), Rect::new(-60.0, -20.0, 60.0, 20.0));
    }

    #[test]
    fn test_ellipse_rotated_bounds() {
        let mut shape = Shape::ellipse(Point::ZERO, 40.0, 10.0);
        shape.placement.rotation = FRAC_PI_2;
        assert_rect(leaf_bounds(&shape), Rect::new(-10.0, -40.0, 10.0, 40.0));

        shape.placement.rotation = std::f64::consts::FRAC_PI_4;
        let half = (40.0 + 10.0) * std::f64::consts::FRAC_1_SQRT_2;
        assert_rect(leaf_bounds(&shape), Rect::new(-half, -half, half, half));
    }

    #[test]
    fn test_polygon_bounds_scale_around_anchor() {
        let mut shape = Shape::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 10.0),
        ]);
        assert_rect(leaf_bounds(&shape), Rect::new(0.0, 0.0, 20.0, 10.0));
        shape.placement.scale_x = 2.0;
        assert_rect(leaf_bounds(&shape), Rect::new(-10.0, 0.0, 30.0, 10.0));
    }

    #[test]
    fn test_text_without_metrics_uses_placeholder() {
        let mut shape = Shape::text(Point::new(5.0, 5.0), "A");
        shape.placement.rotation = 0.7;
        assert_rect(leaf_bounds(&shape), placeholder_bounds(Point::new(5.0, 5.0)));

        if let ShapeKind::Text(text) = &mut shape.kind {
            text.measured = Some(Size::new(20.0, 10.0));
        }
        shape.placement.rotation = 0.0;
        assert_rect(leaf_bounds(&shape), Rect::new(-5.0, 0.0, 15.0, 10.0));
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(point_in_polygon(Point::new(5.0, 5.0), &square));
        assert!(!point_in_polygon(Point::new(15.0, 5.0), &square));
        assert!(!point_in_polygon(Point::new(5.0, 5.0), &square[..2]));
    }

    #[test]
    fn test_container_bounds_apply_container_transform() {
        let mut scene = SceneGraph::new(RetainedGraphics::new());
        let group = scene.add(Shape::container(Point::new(100.0, 0.0))).unwrap();
        scene
            .insert(Shape::rectangle(Point::new(-20.0, 0.0), 10.0, 10.0), Some(group), None)
            .unwrap();
        let b = scene
            .insert(Shape::rectangle(Point::new(20.0, 0.0), 10.0, 10.0), Some(group), None)
            .unwrap();

        assert_rect(shape_bounds(&scene, group).unwrap(), Rect::new(75.0, -5.0, 125.0, 5.0));
        assert_rect(world_bounds(&scene, b).unwrap(), Rect::new(115.0, -5.0, 125.0, 5.0));

        scene.update(group, |s| s.placement.scale_x = 2.0).unwrap();
        assert_rect(shape_bounds(&scene, group).unwrap(), Rect::new(50.0, -5.0, 150.0, 5.0));
    }

    #[test]
    fn test_empty_container_uses_placeholder() {
        let mut scene = SceneGraph::new(RetainedGraphics::new());
        let group = scene.add(Shape::container(Point::new(1.0, 2.0))).unwrap();
        assert_rect(
            shape_bounds(&scene, group).unwrap(),
            placeholder_bounds(Point::new(1.0, 2.0)),
        );
    }

    #[test]
    fn test_union_bounds_mixes_depths() {
        let mut scene = SceneGraph::new(RetainedGraphics::new());
        let a = scene.add(Shape::rectangle(Point::ZERO, 10.0, 10.0)).unwrap();
        let group = scene.add(Shape::container(Point::new(50.0, 50.0))).unwrap();
        let nested = scene
            .insert(Shape::ellipse(Point::new(10.0, 0.0), 5.0, 5.0), Some(group), None)
            .unwrap();

        let union = union_bounds(&scene, &[a, nested]).unwrap().unwrap();
        assert_rect(union, Rect::new(-5.0, -5.0, 65.0, 55.0));
        assert!(union_bounds(&scene, &[]).unwrap().is_none());
    }
}
