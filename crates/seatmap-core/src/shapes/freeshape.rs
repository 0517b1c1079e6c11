//! Free-form shape built from straight and curved segments.

use super::polygon::bounds_of;
use super::{ShapeGeometry, ShapeStyle, point_to_segment_dist};
use kurbo::{BezPath, PathEl, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// Cubic Bézier control points for the segment leading into a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveControls {
    pub control1: Point,
    pub control2: Point,
}

/// A free-shape vertex, optionally reached by a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreePoint {
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<CurveControls>,
}

impl FreePoint {
    /// A vertex reached by a straight segment.
    pub fn straight(position: Point) -> Self {
        Self {
            position,
            curve: None,
        }
    }

    /// A vertex reached by a cubic segment.
    pub fn curved(position: Point, control1: Point, control2: Point) -> Self {
        Self {
            position,
            curve: Some(CurveControls { control1, control2 }),
        }
    }

    /// Build a vertex reached from `prev` with auto-generated control points.
    ///
    /// The controls sit at one and two thirds of the segment, pushed sideways
    /// by `offset_ratio` times the segment length.
    pub fn auto_curved(prev: Point, position: Point, offset_ratio: f64) -> Self {
        let seg = position - prev;
        let normal = Vec2::new(-seg.y, seg.x) * offset_ratio;
        let control1 = prev + seg / 3.0 + normal;
        let control2 = prev + seg * (2.0 / 3.0) + normal;
        Self::curved(position, control1, control2)
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
        if let Some(curve) = &mut self.curve {
            curve.control1 += delta;
            curve.control2 += delta;
        }
    }
}

/// A free-form shape; closed when it has three or more vertices.
///
/// Vertices and control points share the frame of the shape's anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeShape {
    /// Ordered vertices.
    pub points: Vec<FreePoint>,
    /// Style properties.
    pub style: ShapeStyle,
}

impl FreeShape {
    /// Create a free shape from vertices.
    pub fn new(points: Vec<FreePoint>) -> Self {
        Self {
            points,
            style: ShapeStyle::default(),
        }
    }

    /// Whether the outline is closed.
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 3
    }

    /// Bounds of vertices and control points, `None` when empty.
    pub fn points_bounds(&self) -> Option<Rect> {
        bounds_of(self.points.iter().flat_map(|p| {
            let controls = p
                .curve
                .map(|c| [c.control1, c.control2])
                .into_iter()
                .flatten();
            std::iter::once(p.position).chain(controls)
        }))
    }

    /// Center of the vertices' bounds.
    pub fn center(&self) -> Point {
        bounds_of(self.points.iter().map(|p| p.position))
            .map(|r| r.center())
            .unwrap_or(Point::ZERO)
    }

    /// Translate every vertex and control point.
    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            p.translate(delta);
        }
    }

    /// Flattened outline in the own frame.
    fn flattened(&self, anchor: Point) -> Vec<Point> {
        let mut pts = Vec::new();
        kurbo::flatten(&self.local_path(anchor), 0.5, |el| match el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => pts.push(p),
            _ => {}
        });
        pts
    }
}

impl ShapeGeometry for FreeShape {
    fn local_path(&self, anchor: Point) -> BezPath {
        let offset = anchor.to_vec2();
        let mut path = BezPath::new();
        let Some(first) = self.points.first() else {
            return path;
        };
        path.move_to(first.position - offset);

        let segment_to = |path: &mut BezPath, p: &FreePoint| match p.curve {
            Some(c) => path.curve_to(c.control1 - offset, c.control2 - offset, p.position - offset),
            None => path.line_to(p.position - offset),
        };

        for p in &self.points[1..] {
            segment_to(&mut path, p);
        }
        if self.is_closed() {
            if first.curve.is_some() {
                segment_to(&mut path, first);
            }
            path.close_path();
        }
        path
    }

    fn hit_test_local(&self, point: Point, anchor: Point, tolerance: f64) -> bool {
        if self.points.is_empty() {
            return false;
        }
        let band = tolerance + self.style.stroke_width / 2.0;
        if self.is_closed()
            && self.style.fill_color.is_some()
            && self.local_path(anchor).contains(point)
        {
            return true;
        }
        let mut pts = self.flattened(anchor);
        if self.is_closed() {
            if let Some(&first) = pts.first() {
                pts.push(first);
            }
        }
        if pts.len() == 1 {
            return (point - pts[0]).hypot() <= band;
        }
        pts.windows(2)
            .any(|w| point_to_segment_dist(point, w[0], w[1]) <= band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> FreeShape {
        FreeShape::new(vec![
            FreePoint::straight(Point::new(0.0, 0.0)),
            FreePoint::straight(Point::new(100.0, 0.0)),
            FreePoint::straight(Point::new(50.0, 100.0)),
        ])
    }

    #[test]
    fn test_closed_with_three_points() {
        let mut shape = triangle();
        assert!(shape.is_closed());
        shape.points.pop();
        assert!(!shape.is_closed());
    }

    #[test]
    fn test_auto_curved_controls_between_endpoints() {
        let p = FreePoint::auto_curved(Point::new(0.0, 0.0), Point::new(90.0, 0.0), 0.25);
        let curve = p.curve.unwrap();
        assert!((curve.control1.x - 30.0).abs() < 1e-9);
        assert!((curve.control2.x - 60.0).abs() < 1e-9);
        assert!((curve.control1.y - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_translate_moves_controls() {
        let mut shape = FreeShape::new(vec![
            FreePoint::straight(Point::new(0.0, 0.0)),
            FreePoint::curved(Point::new(10.0, 0.0), Point::new(3.0, 3.0), Point::new(7.0, 3.0)),
        ]);
        shape.translate(Vec2::new(1.0, 2.0));
        let curve = shape.points[1].curve.unwrap();
        assert_eq!(curve.control1, Point::new(4.0, 5.0));
        assert_eq!(shape.points[0].position, Point::new(1.0, 2.0));
    }

    #[test]
    fn test_hit_test_inside_closed_shape() {
        let shape = triangle();
        let anchor = shape.center();
        let inside = Point::new(50.0, 30.0) - anchor.to_vec2();
        assert!(shape.hit_test_local(inside, anchor, 0.0));
        let outside = Point::new(0.0, 100.0) - anchor.to_vec2();
        assert!(!shape.hit_test_local(outside, anchor, 0.0));
    }

    #[test]
    fn test_points_bounds_include_controls() {
        let shape = FreeShape::new(vec![
            FreePoint::straight(Point::new(0.0, 0.0)),
            FreePoint::curved(Point::new(10.0, 0.0), Point::new(3.0, 20.0), Point::new(7.0, 20.0)),
        ]);
        let bounds = shape.points_bounds().unwrap();
        assert!((bounds.y1 - 20.0).abs() < f64::EPSILON);
    }
}
