//! Drawing tools and in-progress drafts.

use crate::shapes::{FreePoint, Polygon, Shape, ShapeKind, ShapeStyle};
use kurbo::{BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rectangle,
    Ellipse,
    Polygon,
    FreeShape,
    Text,
}

/// Current tool plus the style applied to new shapes.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current style to apply to new shapes.
    pub current_style: ShapeStyle,
    /// Corner radius for new rectangles and polygons (0 = sharp corners).
    pub corner_radius: f64,
    /// Whether new free-shape vertices are reached by a curve.
    pub curve_mode: bool,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self {
            current_tool: ToolKind::default(),
            current_style: ShapeStyle::default(),
            corner_radius: 0.0,
            curve_mode: false,
        }
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current tool. Curve mode does not carry over.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
        self.curve_mode = false;
    }

    /// Flip free-shape curve mode; returns the new value.
    pub fn toggle_curve_mode(&mut self) -> bool {
        self.curve_mode = !self.curve_mode;
        self.curve_mode
    }

    /// Shape for a finished press-drag-release, in world space.
    pub fn shape_from_drag(&self, tool: ToolKind, start: Point, end: Point) -> Option<Shape> {
        let rect = Rect::from_points(start, end);
        let mut shape = match tool {
            ToolKind::Rectangle => {
                let mut shape = Shape::rectangle(rect.center(), rect.width(), rect.height());
                if let ShapeKind::Rectangle(r) = &mut shape.kind {
                    r.corner_radius = self.corner_radius;
                }
                shape
            }
            ToolKind::Ellipse => {
                Shape::ellipse(rect.center(), rect.width() / 2.0, rect.height() / 2.0)
            }
            _ => return None,
        };
        if let Some(style) = shape.style_mut() {
            *style = self.current_style.clone();
        }
        Some(shape)
    }

    /// Outline shown while dragging out a rectangle or ellipse.
    pub fn drag_preview(&self, tool: ToolKind, start: Point, end: Point) -> Option<BezPath> {
        let rect = Rect::from_points(start, end);
        match tool {
            ToolKind::Rectangle => Some(rect.to_path(0.1)),
            ToolKind::Ellipse => Some(KurboEllipse::from_rect(rect).to_path(0.1)),
            _ => None,
        }
    }
}

/// Whether a drag is larger than `min_size` in both axes. All values are in
/// the same units (screen pixels).
pub fn exceeds_draw_threshold(width: f64, height: f64, min_size: f64) -> bool {
    width.abs() > min_size && height.abs() > min_size
}

/// Vertices of a polygon or free shape being placed click by click.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexDraft {
    /// Polygon or free shape.
    pub kind: ToolKind,
    /// Placed vertices (world space).
    pub points: Vec<FreePoint>,
    /// Pointer position for the rubber-band segment.
    pub hover: Option<Point>,
}

impl VertexDraft {
    pub fn new(kind: ToolKind, first: Point) -> Self {
        Self {
            kind,
            points: vec![FreePoint::straight(first)],
            hover: None,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether enough vertices exist to make a closed shape.
    pub fn can_commit(&self) -> bool {
        self.points.len() >= 3
    }

    /// Whether a click at `point` closes the outline: at least three vertices
    /// and within `radius` of the first one.
    pub fn closes_at(&self, point: Point, radius: f64) -> bool {
        self.can_commit()
            && self
                .points
                .first()
                .is_some_and(|first| (point - first.position).hypot() <= radius)
    }

    /// Append a vertex. Curved vertices only apply to free shapes.
    pub fn push(&mut self, point: Point, curved: bool, offset_ratio: f64) {
        let vertex = match self.points.last() {
            Some(prev) if curved && self.kind == ToolKind::FreeShape => {
                FreePoint::auto_curved(prev.position, point, offset_ratio)
            }
            _ => FreePoint::straight(point),
        };
        self.points.push(vertex);
    }

    /// Build the final shape; `None` with fewer than three vertices.
    pub fn into_shape(self, tools: &ToolManager) -> Option<Shape> {
        if !self.can_commit() {
            return None;
        }
        let mut shape = match self.kind {
            ToolKind::Polygon => {
                let mut shape =
                    Shape::polygon(self.points.iter().map(|p| p.position).collect());
                if let ShapeKind::Polygon(Polygon { corner_radius, .. }) = &mut shape.kind {
                    *corner_radius = tools.corner_radius;
                }
                shape
            }
            ToolKind::FreeShape => Shape::free_shape(self.points),
            _ => return None,
        };
        if let Some(style) = shape.style_mut() {
            *style = tools.current_style.clone();
        }
        Some(shape)
    }

    /// Open polyline through the placed vertices and the hover point.
    pub fn preview(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut iter = self.points.iter();
        if let Some(first) = iter.next() {
            path.move_to(first.position);
            for p in iter {
                match p.curve {
                    Some(c) => path.curve_to(c.control1, c.control2, p.position),
                    None => path.line_to(p.position),
                }
            }
            if let Some(hover) = self.hover {
                path.line_to(hover);
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeType;

    #[test]
    fn test_rectangle_from_drag_is_centered() {
        let tools = ToolManager::new();
        let shape = tools
            .shape_from_drag(ToolKind::Rectangle, Point::new(10.0, 10.0), Point::new(-10.0, 30.0))
            .unwrap();
        assert_eq!(shape.position(), Point::new(0.0, 20.0));
        let size = shape.display_size().unwrap();
        assert!((size.width - 20.0).abs() < f64::EPSILON);
        assert!((size.height - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ellipse_from_drag_uses_half_extents() {
        let tools = ToolManager::new();
        let shape = tools
            .shape_from_drag(ToolKind::Ellipse, Point::ZERO, Point::new(40.0, 20.0))
            .unwrap();
        let ShapeKind::Ellipse(e) = &shape.kind else {
            panic!("Expected Ellipse kind");
        };
        assert!((e.radius_x - 20.0).abs() < f64::EPSILON);
        assert!((e.radius_y - 10.0).abs() < f64::EPSILON);
        assert!(tools.shape_from_drag(ToolKind::Select, Point::ZERO, Point::ZERO).is_none());
    }

    #[test]
    fn test_draw_threshold() {
        assert!(!exceeds_draw_threshold(9.0, 9.0, 10.0));
        assert!(!exceeds_draw_threshold(11.0, 9.0, 10.0));
        assert!(exceeds_draw_threshold(-11.0, 11.0, 10.0));
    }

    #[test]
    fn test_close_needs_three_vertices() {
        let mut draft = VertexDraft::new(ToolKind::Polygon, Point::ZERO);
        draft.push(Point::new(100.0, 0.0), false, 0.25);
        assert!(!draft.closes_at(Point::new(5.0, 5.0), 15.0));

        draft.push(Point::new(100.0, 100.0), false, 0.25);
        assert!(draft.closes_at(Point::new(5.0, 5.0), 15.0));
        assert!(!draft.closes_at(Point::new(20.0, 0.0), 15.0));
    }

    #[test]
    fn test_curve_mode_only_affects_free_shapes() {
        let mut polygon = VertexDraft::new(ToolKind::Polygon, Point::ZERO);
        polygon.push(Point::new(10.0, 0.0), true, 0.25);
        assert!(polygon.points[1].curve.is_none());

        let mut free = VertexDraft::new(ToolKind::FreeShape, Point::ZERO);
        free.push(Point::new(10.0, 0.0), true, 0.25);
        assert!(free.points[1].curve.is_some());
    }

    #[test]
    fn test_into_shape() {
        let tools = ToolManager::new();
        let mut draft = VertexDraft::new(ToolKind::FreeShape, Point::ZERO);
        draft.push(Point::new(10.0, 0.0), false, 0.25);
        assert!(draft.clone().into_shape(&tools).is_none());

        draft.push(Point::new(10.0, 10.0), false, 0.25);
        let shape = draft.into_shape(&tools).unwrap();
        assert_eq!(shape.shape_type(), ShapeType::FreeShape);
        assert_eq!(shape.position(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_toggle_curve_mode_resets_on_tool_change() {
        let mut tools = ToolManager::new();
        assert!(tools.toggle_curve_mode());
        tools.set_tool(ToolKind::Polygon);
        assert!(!tools.curve_mode);
    }
}
