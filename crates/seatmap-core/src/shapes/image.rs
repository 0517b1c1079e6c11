//! Image shape for embedded raster images and SVG content.

use super::ShapeGeometry;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};

/// Raster format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }
}

/// Where the image content comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImageSource {
    /// Encoded raster bytes, base64 so the payload stays plain JSON.
    Raster {
        format: ImageFormat,
        data_base64: String,
    },
    /// SVG markup.
    Svg { content: String },
}

/// An image centered on its anchor. Display size is the intrinsic size
/// times the shape's scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Content.
    pub source: ImageSource,
    /// Intrinsic width in pixels.
    pub source_width: u32,
    /// Intrinsic height in pixels.
    pub source_height: u32,
}

impl Image {
    /// Create a raster image from encoded bytes.
    pub fn raster(data: &[u8], format: ImageFormat, source_width: u32, source_height: u32) -> Self {
        use base64::{Engine, engine::general_purpose::STANDARD};

        Self {
            source: ImageSource::Raster {
                format,
                data_base64: STANDARD.encode(data),
            },
            source_width,
            source_height,
        }
    }

    /// Create an SVG image from markup.
    pub fn svg(content: impl Into<String>, source_width: u32, source_height: u32) -> Self {
        Self {
            source: ImageSource::Svg {
                content: content.into(),
            },
            source_width,
            source_height,
        }
    }

    /// Get the raw bytes (decoded from base64 for rasters, UTF-8 for SVG).
    pub fn data(&self) -> Option<Vec<u8>> {
        use base64::{Engine, engine::general_purpose::STANDARD};

        match &self.source {
            ImageSource::Raster { data_base64, .. } => STANDARD.decode(data_base64).ok(),
            ImageSource::Svg { content } => Some(content.as_bytes().to_vec()),
        }
    }

    /// Whether the content is SVG markup.
    pub fn is_svg(&self) -> bool {
        matches!(self.source, ImageSource::Svg { .. })
    }

    /// Intrinsic size.
    pub fn intrinsic_size(&self) -> Size {
        Size::new(f64::from(self.source_width), f64::from(self.source_height))
    }

    fn local_box(&self) -> Rect {
        Rect::from_center_size(Point::ZERO, self.intrinsic_size())
    }
}

impl ShapeGeometry for Image {
    fn local_path(&self, _anchor: Point) -> BezPath {
        self.local_box().to_path(0.1)
    }

    fn hit_test_local(&self, point: Point, _anchor: Point, tolerance: f64) -> bool {
        self.local_box().inflate(tolerance, tolerance).contains(point)
    }
}
