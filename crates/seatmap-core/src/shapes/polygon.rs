//! Polygon shape.

use super::{ShapeGeometry, ShapeStyle, point_to_ring_dist};
use crate::geometry::point_in_polygon;
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A polygon vertex with an optional per-vertex corner radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonPoint {
    pub x: f64,
    pub y: f64,
    /// Overrides the polygon's corner radius at this vertex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
}

impl PolygonPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            corner_radius: None,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<Point> for PolygonPoint {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

/// A closed polygon.
///
/// Vertices are stored in the same frame as the shape's anchor: world space
/// at root level, parent-local space inside a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Ordered vertices.
    pub points: Vec<PolygonPoint>,
    /// Default corner radius (0 = sharp corners).
    #[serde(default)]
    pub corner_radius: f64,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Polygon {
    /// Create a polygon from vertices.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points: points.into_iter().map(PolygonPoint::from).collect(),
            corner_radius: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Vertices as plain points.
    pub fn vertices(&self) -> Vec<Point> {
        self.points.iter().map(PolygonPoint::point).collect()
    }

    /// Axis-aligned bounds of the vertices, `None` when empty.
    pub fn points_bounds(&self) -> Option<Rect> {
        bounds_of(self.points.iter().map(PolygonPoint::point))
    }

    /// Center of the vertices' bounds.
    pub fn center(&self) -> Point {
        self.points_bounds().map(|r| r.center()).unwrap_or(Point::ZERO)
    }

    /// Translate every vertex.
    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            p.x += delta.x;
            p.y += delta.y;
        }
    }

    fn radius_at(&self, index: usize) -> f64 {
        self.points[index].corner_radius.unwrap_or(self.corner_radius).max(0.0)
    }
}

/// Bounds of a point set, `None` when empty.
pub(crate) fn bounds_of(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    Some(iter.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}

impl ShapeGeometry for Polygon {
    fn local_path(&self, anchor: Point) -> BezPath {
        let pts: Vec<Point> = self
            .points
            .iter()
            .map(|p| (p.point() - anchor).to_point())
            .collect();
        let mut path = BezPath::new();
        let n = pts.len();
        if n < 2 {
            return path;
        }

        for i in 0..n {
            let prev = pts[(i + n - 1) % n];
            let cur = pts[i];
            let next = pts[(i + 1) % n];
            let radius = self.radius_at(i);

            if radius <= 0.0 || n < 3 {
                if i == 0 {
                    path.move_to(cur);
                } else {
                    path.line_to(cur);
                }
                continue;
            }

            // Cut the corner and bend through the vertex.
            let to_prev = prev - cur;
            let to_next = next - cur;
            let r_in = radius.min(to_prev.hypot() / 2.0);
            let r_out = radius.min(to_next.hypot() / 2.0);
            let entry = cur + to_prev.normalize() * r_in;
            let exit = cur + to_next.normalize() * r_out;
            if i == 0 {
                path.move_to(entry);
            } else {
                path.line_to(entry);
            }
            path.quad_to(cur, exit);
        }
        path.close_path();
        path
    }

    fn hit_test_local(&self, point: Point, anchor: Point, tolerance: f64) -> bool {
        let pts: Vec<Point> = self
            .points
            .iter()
            .map(|p| (p.point() - anchor).to_point())
            .collect();
        if pts.len() < 3 {
            return false;
        }
        let band = tolerance + self.style.stroke_width / 2.0;
        if self.style.fill_color.is_some() && point_in_polygon(point, &pts) {
            return true;
        }
        point_to_ring_dist(point, &pts) <= band
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ])
    }

    #[test]
    fn test_center_and_bounds() {
        let polygon = square();
        let bounds = polygon.points_bounds().unwrap();
        assert!((bounds.width() - 100.0).abs() < f64::EPSILON);
        assert_eq!(polygon.center(), Point::new(50.0, 50.0));
    }

    #[test]
    fn test_hit_test_relative_to_anchor() {
        let polygon = square();
        let anchor = polygon.center();
        assert!(polygon.hit_test_local(Point::new(0.0, 0.0), anchor, 0.0));
        assert!(!polygon.hit_test_local(Point::new(80.0, 0.0), anchor, 0.0));
    }

    #[test]
    fn test_degenerate_polygon_never_hits() {
        let polygon = Polygon::from_points(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert!(!polygon.hit_test_local(Point::new(5.0, 0.0), Point::ZERO, 5.0));
    }

    #[test]
    fn test_rounded_path_stays_inside_vertices() {
        let mut polygon = square();
        polygon.corner_radius = 10.0;
        polygon.points[0].corner_radius = Some(0.0);
        let path = polygon.local_path(Point::new(50.0, 50.0));
        let bounds = kurbo::Shape::bounding_box(&path);
        assert!(bounds.x0 >= -50.0 - 1e-9);
        assert!(bounds.x1 <= 50.0 + 1e-9);
    }
}
