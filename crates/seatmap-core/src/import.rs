//! Image and SVG import.

use crate::error::{EditorError, EditorResult};
use crate::shapes::{Image, ImageFormat};
use std::io::Cursor;

/// Turns raw file bytes into an image payload with its intrinsic size.
pub trait ImageImporter {
    fn import(&self, data: &[u8]) -> EditorResult<Image>;
}

/// Importer that sniffs the format from the bytes: PNG, JPEG and WebP via
/// the `image` crate (header only, no full decode) and SVG via `usvg`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SniffingImporter;

impl SniffingImporter {
    pub fn new() -> Self {
        Self
    }

    fn import_raster(&self, data: &[u8], format: ImageFormat) -> EditorResult<Image> {
        let reader = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| EditorError::ImportFailure(e.to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| EditorError::ImportFailure(e.to_string()))?;
        if width == 0 || height == 0 {
            return Err(EditorError::ImportFailure("image has no pixels".to_string()));
        }
        Ok(Image::raster(data, format, width, height))
    }

    fn import_svg(&self, data: &[u8]) -> EditorResult<Image> {
        let content = std::str::from_utf8(data)
            .map_err(|e| EditorError::ImportFailure(format!("SVG is not UTF-8: {e}")))?;
        let tree = usvg::Tree::from_str(content, &usvg::Options::default())
            .map_err(|e| EditorError::ImportFailure(format!("SVG parsing failed: {e}")))?;
        let size = tree.size();
        let width = size.width().round() as u32;
        let height = size.height().round() as u32;
        Ok(Image::svg(content, width.max(1), height.max(1)))
    }
}

impl ImageImporter for SniffingImporter {
    fn import(&self, data: &[u8]) -> EditorResult<Image> {
        if let Some(format) = ImageFormat::from_magic_bytes(data) {
            return self.import_raster(data, format);
        }
        if looks_like_svg(data) {
            return self.import_svg(data);
        }
        Err(EditorError::ImportFailure(
            "unrecognized image format".to_string(),
        ))
    }
}

/// Whether the bytes start (after whitespace, BOM or XML prolog) like SVG
/// markup.
fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    let Ok(text) = std::str::from_utf8(head) else {
        return false;
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 3x2 RGBA PNG, encoded with the `image` crate.
    fn tiny_png() -> Vec<u8> {
        let buffer = image::RgbaImage::new(3, 2);
        let mut out = Cursor::new(Vec::new());
        buffer.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_dimensions() {
        let image = SniffingImporter.import(&tiny_png()).unwrap();
        assert_eq!((image.source_width, image.source_height), (3, 2));
        assert!(!image.is_svg());
        assert_eq!(image.data().unwrap(), tiny_png());
    }

    #[test]
    fn test_svg_width_height() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="40"><rect width="10" height="10"/></svg>"#;
        let image = SniffingImporter.import(svg).unwrap();
        assert!(image.is_svg());
        assert_eq!((image.source_width, image.source_height), (120, 40));
    }

    #[test]
    fn test_svg_view_box() {
        let svg = br#"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 32"><circle cx="5" cy="5" r="4"/></svg>"#;
        let image = SniffingImporter.import(svg).unwrap();
        assert_eq!((image.source_width, image.source_height), (64, 32));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            SniffingImporter.import(b"not an image"),
            Err(EditorError::ImportFailure(_))
        ));
        assert!(matches!(
            SniffingImporter.import(b"<svg><unclosed"),
            Err(EditorError::ImportFailure(_))
        ));
        // PNG signature with a truncated header.
        assert!(matches!(
            SniffingImporter.import(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            Err(EditorError::ImportFailure(_))
        ));
    }
}
