//! Shape definitions for the seat-map scene.

mod container;
mod ellipse;
mod freeshape;
mod image;
mod polygon;
mod rectangle;
mod text;

pub use container::Container;
pub use ellipse::Ellipse;
pub use freeshape::{CurveControls, FreePoint, FreeShape};
pub use self::image::{Image, ImageFormat, ImageSource};
pub use polygon::{Polygon, PolygonPoint};
pub use rectangle::Rectangle;
pub use text::{FontWeight, Text, TextAlign};

use crate::transform::Placement;
use kurbo::{Affine, BezPath, Point, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Anything else is `None`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => Some(Self::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
                255,
            )),
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Fill and stroke properties for path-like shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Stroke width.
    pub stroke_width: f64,
}

impl ShapeStyle {
    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Get the fill color as a peniko Color.
    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(|c| c.into())
    }

    /// Set the stroke color from a peniko Color.
    pub fn set_stroke(&mut self, color: Color) {
        self.stroke_color = color.into();
    }

    /// Set the fill color from a peniko Color.
    pub fn set_fill(&mut self, color: Option<Color>) {
        self.fill_color = color.map(|c| c.into());
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill_color: Some(SerializableColor::new(0xE0, 0xE7, 0xF1, 255)),
            stroke_color: SerializableColor::new(0x33, 0x41, 0x55, 255),
            stroke_width: 2.0,
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((point.x - proj.x).powi(2) + (point.y - proj.y).powi(2)).sqrt()
}

/// Minimum distance from a point to a closed ring of points.
pub fn point_to_ring_dist(point: Point, points: &[Point]) -> f64 {
    if points.is_empty() {
        return f64::INFINITY;
    }
    let n = points.len();
    (0..n)
        .map(|i| point_to_segment_dist(point, points[i], points[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Per-variant geometry in the shape's own frame.
///
/// The own frame has the shape's anchor at the origin, before rotation and
/// scale. Point-based variants receive the anchor so they can re-express
/// their parent-space vertices.
pub trait ShapeGeometry {
    /// Path used by the renderer to draw the shape.
    fn local_path(&self, anchor: Point) -> BezPath;

    /// Check if a point in the own frame hits the shape.
    fn hit_test_local(&self, point: Point, anchor: Point, tolerance: f64) -> bool;
}

/// Type tag of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeType {
    Rectangle,
    Ellipse,
    Polygon,
    FreeShape,
    Text,
    Image,
    Container,
}

impl ShapeType {
    /// Default display name for new shapes of this type.
    pub fn label(self) -> &'static str {
        match self {
            ShapeType::Rectangle => "Rectangle",
            ShapeType::Ellipse => "Ellipse",
            ShapeType::Polygon => "Polygon",
            ShapeType::FreeShape => "Shape",
            ShapeType::Text => "Text",
            ShapeType::Image => "Image",
            ShapeType::Container => "Group",
        }
    }
}

/// Per-variant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShapeKind {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Polygon(Polygon),
    FreeShape(FreeShape),
    Text(Text),
    Image(Image),
    Container(Container),
}

/// A drawable entity in the scene: common attributes plus a variant payload.
///
/// Shapes are plain data. The graphic object drawn for a shape is owned by
/// the scene graph node that holds it, never by the shape itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    /// Display name.
    pub name: String,
    /// Anchor, rotation and scale in the parent's frame.
    pub placement: Placement,
    /// Opacity in [0, 1].
    pub opacity: f64,
    /// Hidden shapes are neither drawn nor hit.
    pub visible: bool,
    /// Locked shapes can be selected but not moved or transformed.
    pub locked: bool,
    /// Variant payload.
    pub kind: ShapeKind,
}

impl Shape {
    /// Create a shape of the given kind anchored at `position`.
    pub fn new(position: Point, kind: ShapeKind) -> Self {
        let name = Self::type_of(&kind).label().to_string();
        Self {
            id: Uuid::new_v4(),
            name,
            placement: Placement::at(position),
            opacity: 1.0,
            visible: true,
            locked: false,
            kind,
        }
    }

    /// Create a rectangle centered at `center`.
    pub fn rectangle(center: Point, width: f64, height: f64) -> Self {
        Self::new(center, ShapeKind::Rectangle(Rectangle::new(width, height)))
    }

    /// Create an ellipse centered at `center`.
    pub fn ellipse(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self::new(center, ShapeKind::Ellipse(Ellipse::new(radius_x, radius_y)))
    }

    /// Create a polygon; the anchor is the center of the vertices' bounds.
    pub fn polygon(points: Vec<Point>) -> Self {
        let polygon = Polygon::from_points(points);
        let anchor = polygon.center();
        Self::new(anchor, ShapeKind::Polygon(polygon))
    }

    /// Create a free shape; the anchor is the center of the vertices' bounds.
    pub fn free_shape(points: Vec<FreePoint>) -> Self {
        let shape = FreeShape::new(points);
        let anchor = shape.center();
        Self::new(anchor, ShapeKind::FreeShape(shape))
    }

    /// Create a text shape centered at `position`.
    pub fn text(position: Point, content: impl Into<String>) -> Self {
        Self::new(position, ShapeKind::Text(Text::new(content)))
    }

    /// Create an empty container anchored at `position`.
    pub fn container(position: Point) -> Self {
        Self::new(position, ShapeKind::Container(Container::new()))
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    fn type_of(kind: &ShapeKind) -> ShapeType {
        match kind {
            ShapeKind::Rectangle(_) => ShapeType::Rectangle,
            ShapeKind::Ellipse(_) => ShapeType::Ellipse,
            ShapeKind::Polygon(_) => ShapeType::Polygon,
            ShapeKind::FreeShape(_) => ShapeType::FreeShape,
            ShapeKind::Text(_) => ShapeType::Text,
            ShapeKind::Image(_) => ShapeType::Image,
            ShapeKind::Container(_) => ShapeType::Container,
        }
    }

    /// Type tag of this shape.
    pub fn shape_type(&self) -> ShapeType {
        Self::type_of(&self.kind)
    }

    pub fn position(&self) -> Point {
        self.placement.position
    }

    pub fn rotation(&self) -> f64 {
        self.placement.rotation
    }

    /// Local transform mapping the own frame into the parent's frame.
    pub fn local_affine(&self) -> Affine {
        self.placement.affine()
    }

    /// Move the anchor to `position`, carrying point arrays along.
    pub fn set_position(&mut self, position: Point) {
        let delta = position - self.placement.position;
        self.translate(delta);
    }

    /// Translate the shape within its parent's frame.
    ///
    /// Polygon and free-shape vertices live in the same frame as the anchor,
    /// so they are translated too.
    pub fn translate(&mut self, delta: Vec2) {
        self.placement.position += delta;
        match &mut self.kind {
            ShapeKind::Polygon(p) => p.translate(delta),
            ShapeKind::FreeShape(f) => f.translate(delta),
            _ => {}
        }
    }

    /// Check if this shape is a container.
    pub fn is_container(&self) -> bool {
        matches!(self.kind, ShapeKind::Container(_))
    }

    /// Get the container payload if this shape is a container.
    pub fn as_container(&self) -> Option<&Container> {
        match &self.kind {
            ShapeKind::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Get the mutable container payload if this shape is a container.
    pub fn as_container_mut(&mut self) -> Option<&mut Container> {
        match &mut self.kind {
            ShapeKind::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Child ids if this shape is a container, otherwise empty.
    pub fn children(&self) -> &[ShapeId] {
        self.as_container().map(|c| c.children.as_slice()).unwrap_or(&[])
    }

    /// Fill/stroke style, for variants that have one.
    pub fn style(&self) -> Option<&ShapeStyle> {
        match &self.kind {
            ShapeKind::Rectangle(s) => Some(&s.style),
            ShapeKind::Ellipse(s) => Some(&s.style),
            ShapeKind::Polygon(s) => Some(&s.style),
            ShapeKind::FreeShape(s) => Some(&s.style),
            ShapeKind::Text(_) | ShapeKind::Image(_) | ShapeKind::Container(_) => None,
        }
    }

    /// Mutable fill/stroke style, for variants that have one.
    pub fn style_mut(&mut self) -> Option<&mut ShapeStyle> {
        match &mut self.kind {
            ShapeKind::Rectangle(s) => Some(&mut s.style),
            ShapeKind::Ellipse(s) => Some(&mut s.style),
            ShapeKind::Polygon(s) => Some(&mut s.style),
            ShapeKind::FreeShape(s) => Some(&mut s.style),
            ShapeKind::Text(_) | ShapeKind::Image(_) | ShapeKind::Container(_) => None,
        }
    }

    /// Path in the own frame, empty for containers.
    pub fn local_path(&self) -> BezPath {
        let anchor = self.placement.position;
        match &self.kind {
            ShapeKind::Rectangle(s) => s.local_path(anchor),
            ShapeKind::Ellipse(s) => s.local_path(anchor),
            ShapeKind::Polygon(s) => s.local_path(anchor),
            ShapeKind::FreeShape(s) => s.local_path(anchor),
            ShapeKind::Text(s) => s.local_path(anchor),
            ShapeKind::Image(s) => s.local_path(anchor),
            ShapeKind::Container(_) => BezPath::new(),
        }
    }

    /// Check if a point in the parent's frame hits this (leaf) shape.
    ///
    /// Containers never hit on their own; the scene graph tests their
    /// children instead.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if !self.visible {
            return false;
        }
        let local = self.local_affine().inverse() * point;
        // Tolerance is given in parent units; bring it into the own frame.
        let scale = self.placement.scale_x.abs().min(self.placement.scale_y.abs()).max(1e-6);
        let tolerance = tolerance / scale;
        let anchor = self.placement.position;
        match &self.kind {
            ShapeKind::Rectangle(s) => s.hit_test_local(local, anchor, tolerance),
            ShapeKind::Ellipse(s) => s.hit_test_local(local, anchor, tolerance),
            ShapeKind::Polygon(s) => s.hit_test_local(local, anchor, tolerance),
            ShapeKind::FreeShape(s) => s.hit_test_local(local, anchor, tolerance),
            ShapeKind::Text(s) => s.hit_test_local(local, anchor, tolerance),
            ShapeKind::Image(s) => s.hit_test_local(local, anchor, tolerance),
            ShapeKind::Container(_) => false,
        }
    }

    /// Displayed size for sized variants (intrinsic size times scale).
    pub fn display_size(&self) -> Option<Size> {
        let sx = self.placement.scale_x.abs();
        let sy = self.placement.scale_y.abs();
        match &self.kind {
            ShapeKind::Rectangle(r) => Some(Size::new(r.width * sx, r.height * sy)),
            ShapeKind::Ellipse(e) => Some(Size::new(e.radius_x * 2.0 * sx, e.radius_y * 2.0 * sy)),
            ShapeKind::Image(i) => Some(Size::new(
                f64::from(i.source_width) * sx,
                f64::from(i.source_height) * sy,
            )),
            ShapeKind::Text(t) => t.measured.map(|m| Size::new(m.width * sx, m.height * sy)),
            _ => None,
        }
    }

    /// Give this shape a fresh id (used when pasting copies).
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_shape_defaults() {
        let shape = Shape::rectangle(Point::new(10.0, 20.0), 100.0, 50.0);
        assert_eq!(shape.shape_type(), ShapeType::Rectangle);
        assert_eq!(shape.name, "Rectangle");
        assert!(shape.visible);
        assert!(!shape.locked);
        assert!((shape.opacity - 1.0).abs() < f64::EPSILON);
        assert!((shape.placement.scale_x - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_translate_moves_polygon_points() {
        let mut shape = Shape::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]);
        assert!((shape.position().x - 5.0).abs() < f64::EPSILON);

        shape.translate(Vec2::new(5.0, 5.0));

        let ShapeKind::Polygon(polygon) = &shape.kind else {
            panic!("Expected Polygon kind");
        };
        assert!((polygon.points[0].x - 5.0).abs() < f64::EPSILON);
        assert!((polygon.points[2].y - 15.0).abs() < f64::EPSILON);
        assert!((shape.position().x - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_respects_rotation() {
        let mut shape = Shape::rectangle(Point::new(0.0, 0.0), 100.0, 10.0);
        assert!(shape.hit_test(Point::new(40.0, 0.0), 0.0));
        assert!(!shape.hit_test(Point::new(0.0, 40.0), 0.0));

        shape.placement.rotation = std::f64::consts::FRAC_PI_2;
        assert!(!shape.hit_test(Point::new(40.0, 0.0), 0.0));
        assert!(shape.hit_test(Point::new(0.0, 40.0), 0.0));
    }

    #[test]
    fn test_hidden_shape_not_hit() {
        let mut shape = Shape::rectangle(Point::new(0.0, 0.0), 100.0, 100.0);
        shape.visible = false;
        assert!(!shape.hit_test(Point::new(0.0, 0.0), 0.0));
    }

    #[test]
    fn test_display_size_applies_scale() {
        let mut shape = Shape::rectangle(Point::ZERO, 100.0, 50.0);
        shape.placement.scale_x = 1.2;
        shape.placement.scale_y = 0.8;
        let size = shape.display_size().unwrap();
        assert!((size.width - 120.0).abs() < 1e-9);
        assert!((size.height - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(SerializableColor::from_hex("#fff"), Some(SerializableColor::white()));
        assert_eq!(
            SerializableColor::from_hex("#10203040"),
            Some(SerializableColor::new(0x10, 0x20, 0x30, 0x40))
        );
        assert_eq!(SerializableColor::from_hex("red"), None);
    }

    #[test]
    fn test_color_from_hex_rejects_non_ascii_and_odd_lengths() {
        // "é1" is three bytes but only two chars.
        assert_eq!(SerializableColor::from_hex("#é1"), None);
        assert_eq!(SerializableColor::from_hex("#ffé"), None);
        assert_eq!(SerializableColor::from_hex("#aabbccé"), None);
        assert_eq!(SerializableColor::from_hex("#abcd"), None);
        assert_eq!(SerializableColor::from_hex("#12345"), None);
        assert_eq!(SerializableColor::from_hex("#"), None);
        assert_eq!(SerializableColor::from_hex("#ggg"), None);
    }

    #[test]
    fn test_shape_json_carries_type_tag() {
        let shape = Shape::ellipse(Point::ZERO, 5.0, 3.0);
        let json = serde_json::to_string(&shape).unwrap();
        assert!(json.contains("\"type\":\"Ellipse\""));
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shape);
    }
}
