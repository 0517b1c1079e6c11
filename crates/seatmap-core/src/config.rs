//! Tunable editor parameters.

use serde::{Deserialize, Serialize};

/// Editor configuration.
///
/// Distances marked "screen pixels" are divided by the camera zoom before
/// they are compared against world-space distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of history snapshots kept.
    pub history_capacity: usize,
    /// Minimum width and height (screen pixels) for a drawn rectangle/ellipse.
    pub min_draw_size: f64,
    /// Radius (screen pixels) around the first vertex that closes a polygon.
    pub close_radius: f64,
    /// Scale factor change per pixel of handle drag.
    pub scale_sensitivity: f64,
    /// Rotation (radians) per pixel of rotate-handle drag.
    pub rotation_sensitivity: f64,
    /// Lower clamp for a handle-drag scale factor.
    pub min_scale_factor: f64,
    /// Upper clamp for a handle-drag scale factor.
    pub max_scale_factor: f64,
    /// Transform handle size (screen pixels).
    pub handle_size: f64,
    /// Distance of the rotate handle above the selection box (screen pixels).
    pub rotate_handle_offset: f64,
    /// Shape hit tolerance (screen pixels).
    pub hit_tolerance: f64,
    /// Minimum camera zoom.
    pub min_zoom: f64,
    /// Maximum camera zoom.
    pub max_zoom: f64,
    /// Zoom multiplier per wheel notch.
    pub wheel_zoom_step: f64,
    /// Control-point offset for curved free-shape vertices, relative to segment length.
    pub curve_offset_ratio: f64,
    /// Label given to text created by the text tool.
    pub default_text: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            min_draw_size: 10.0,
            close_radius: 15.0,
            scale_sensitivity: 0.01,
            rotation_sensitivity: 0.01,
            min_scale_factor: 0.1,
            max_scale_factor: 3.0,
            handle_size: 10.0,
            rotate_handle_offset: 30.0,
            hit_tolerance: 4.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
            wheel_zoom_step: 1.1,
            curve_offset_ratio: 0.25,
            default_text: "Text".to_string(),
        }
    }
}

impl EditorConfig {
    /// Load a configuration from JSON; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Clamp a handle-drag scale factor to the configured range.
    pub fn clamp_scale_factor(&self, factor: f64) -> f64 {
        factor.clamp(self.min_scale_factor, self.max_scale_factor)
    }
}
