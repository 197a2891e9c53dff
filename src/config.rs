use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::PlotError;

/// Canvas, font and legend settings shared by every chart emitter.
///
/// Trace widths and alphas are part of the chart model; `line_scale`
/// multiplies them when they are turned into pixel strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Width of a single figure [px]
    pub width: u32,
    /// Height of a single figure [px]
    pub height: u32,
    pub font_family: String,
    pub title_font_size: u32,
    pub axis_label_font_size: u32,
    pub tick_font_size: u32,
    pub legend_font_size: u32,
    pub margin: u32,
    pub x_label_area: u32,
    pub y_label_area: u32,
    /// Multiplier applied to trace widths before rasterising
    pub line_scale: f64,
    /// Opacity of the legend background
    pub legend_background_alpha: f64,
    /// Fraction of the data extent added on each side of an axis
    pub axis_padding: f64,
    /// Number of dashes per segment for dashed traces
    pub dash_pieces: usize,
    /// 3D view yaw [rad]
    pub yaw: f64,
    /// 3D view pitch [rad]
    pub pitch: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            font_family: "sans-serif".to_string(),
            title_font_size: 19,
            axis_label_font_size: 19,
            tick_font_size: 16,
            legend_font_size: 13,
            margin: 15,
            x_label_area: 50,
            y_label_area: 70,
            line_scale: 1.0,
            legend_background_alpha: 0.1,
            axis_padding: 0.05,
            dash_pieces: 24,
            yaw: 0.6,
            pitch: 0.25,
        }
    }
}

impl RenderConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, PlotError> {
        let raw = fs::read_to_string(path)?;
        let cfg: RenderConfig = toml::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PlotError> {
        if self.width == 0 || self.height == 0 {
            return Err(PlotError::InvalidConfig(
                "width and height must be greater than zero".to_string(),
            ));
        }

        if self.font_family.trim().is_empty() {
            return Err(PlotError::InvalidConfig(
                "font_family must not be empty".to_string(),
            ));
        }

        if !self.line_scale.is_finite() || self.line_scale <= 0.0 {
            return Err(PlotError::InvalidConfig(
                "line_scale must be finite and > 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.legend_background_alpha) {
            return Err(PlotError::InvalidConfig(
                "legend_background_alpha must be in [0, 1]".to_string(),
            ));
        }

        if !self.axis_padding.is_finite() || self.axis_padding < 0.0 {
            return Err(PlotError::InvalidConfig(
                "axis_padding must be finite and >= 0".to_string(),
            ));
        }

        if self.dash_pieces < 2 {
            return Err(PlotError::InvalidConfig(
                "dash_pieces must be at least 2".to_string(),
            ));
        }

        if !self.yaw.is_finite() || !self.pitch.is_finite() {
            return Err(PlotError::InvalidConfig(
                "yaw and pitch must be finite".to_string(),
            ));
        }

        Ok(())
    }

    /// Pixel stroke for a trace width expressed in model units.
    pub fn stroke_px(&self, width: f64) -> u32 {
        (width * self.line_scale).round().max(1.0) as u32
    }
}
