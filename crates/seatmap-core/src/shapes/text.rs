//! Text shape.

use super::{SerializableColor, ShapeGeometry};
use crate::geometry::PLACEHOLDER_SIZE;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontWeight {
    /// Light weight.
    Light,
    /// Regular weight (default).
    #[default]
    Regular,
    /// Bold weight.
    Bold,
}

impl FontWeight {
    /// CSS-style numeric weight.
    pub fn numeric(&self) -> u16 {
        match self {
            FontWeight::Light => 300,
            FontWeight::Regular => 400,
            FontWeight::Bold => 700,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// A text label centered on its anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// The text content.
    pub content: String,
    /// Font family name as understood by the renderer.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Font weight.
    #[serde(default)]
    pub font_weight: FontWeight,
    /// Horizontal alignment.
    #[serde(default)]
    pub align: TextAlign,
    /// Text color.
    pub color: SerializableColor,
    /// Layout size reported by the renderer. Placeholder bounds are used
    /// until it is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<Size>,
}

impl Text {
    /// Default font size.
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;

    /// Create a new text payload.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_family: "Inter".to_string(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_weight: FontWeight::default(),
            align: TextAlign::default(),
            color: SerializableColor::black(),
            measured: None,
        }
    }

    /// Box in the own frame: measured size, or the placeholder box.
    pub fn local_box(&self) -> Rect {
        let size = self
            .measured
            .unwrap_or(Size::new(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE));
        Rect::from_center_size(Point::ZERO, size)
    }

    /// Replace the content; the measured size no longer applies.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.measured = None;
    }
}

impl ShapeGeometry for Text {
    fn local_path(&self, _anchor: Point) -> BezPath {
        self.local_box().to_path(0.1)
    }

    fn hit_test_local(&self, point: Point, _anchor: Point, tolerance: f64) -> bool {
        self.local_box().inflate(tolerance, tolerance).contains(point)
    }
}
