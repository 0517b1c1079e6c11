//! Ellipse shape.

use super::{ShapeGeometry, ShapeStyle};
use kurbo::{BezPath, Ellipse as KurboEllipse, Point, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// An ellipse centered on its anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Horizontal radius.
    pub radius_x: f64,
    /// Vertical radius.
    pub radius_y: f64,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Ellipse {
    /// Create a new ellipse.
    pub fn new(radius_x: f64, radius_y: f64) -> Self {
        Self {
            radius_x,
            radius_y,
            style: ShapeStyle::default(),
        }
    }

    /// Create a circle.
    pub fn circle(radius: f64) -> Self {
        Self::new(radius, radius)
    }

    /// Get as a kurbo Ellipse in the own frame.
    pub fn as_kurbo(&self) -> KurboEllipse {
        KurboEllipse::new(Point::ZERO, (self.radius_x, self.radius_y), 0.0)
    }
}

impl ShapeGeometry for Ellipse {
    fn local_path(&self, _anchor: Point) -> BezPath {
        self.as_kurbo().to_path(0.1)
    }

    fn hit_test_local(&self, point: Point, _anchor: Point, tolerance: f64) -> bool {
        let half_sw = self.style.stroke_width / 2.0;
        let dx_outer = point.x / (self.radius_x + tolerance + half_sw);
        let dy_outer = point.y / (self.radius_y + tolerance + half_sw);
        if dx_outer * dx_outer + dy_outer * dy_outer > 1.0 {
            return false;
        }
        if self.style.fill_color.is_some() {
            return true;
        }
        // Outline only: reject if inside inner ellipse
        let inner_rx = (self.radius_x - tolerance - half_sw).max(0.0);
        let inner_ry = (self.radius_y - tolerance - half_sw).max(0.0);
        if inner_rx < f64::EPSILON || inner_ry < f64::EPSILON {
            return true;
        }
        let dx_inner = point.x / inner_rx;
        let dy_inner = point.y / inner_ry;
        dx_inner * dx_inner + dy_inner * dy_inner > 1.0
    }
}
