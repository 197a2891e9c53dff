//! Backend-independent chart model
//!
//! Result types build [`Figure`], [`Grid`] and [`Figure3d`] values; the
//! `render` module turns them into SVG or PNG files.

use std::ops::Range;

use plotters::style::RGBColor;

pub const MEAN_WIDTH: f64 = 3.0;
pub const MEAN_ALPHA: f64 = 1.0;
pub const BAND_WIDTH: f64 = 2.5;
pub const BAND_ALPHA: f64 = 0.6;
pub const GUIDE_WIDTH: f64 = 1.5;
pub const GUIDE_ALPHA: f64 = 0.8;

/// Stroke shared by 2D and 3D traces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: RGBColor,
    pub alpha: f64,
    pub width: f64,
    pub dashed: bool,
}

impl Stroke {
    pub fn mean(color: RGBColor) -> Self {
        Self {
            color,
            alpha: MEAN_ALPHA,
            width: MEAN_WIDTH,
            dashed: false,
        }
    }

    pub fn band(color: RGBColor) -> Self {
        Self {
            color,
            alpha: BAND_ALPHA,
            width: BAND_WIDTH,
            dashed: false,
        }
    }

    pub fn guide(color: RGBColor) -> Self {
        Self {
            color,
            alpha: GUIDE_ALPHA,
            width: GUIDE_WIDTH,
            dashed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub label: Option<String>,
    pub stroke: Stroke,
    pub points: Vec<(f64, f64)>,
}

impl Trace {
    pub fn new(label: Option<String>, stroke: Stroke, xs: &[f64], ys: &[f64]) -> Self {
        Self {
            label,
            stroke,
            points: xs.iter().copied().zip(ys.iter().copied()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub traces: Vec<Trace>,
}

impl Figure {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            traces: Vec::new(),
        }
    }

    pub fn push(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    /// Legend flags per trace: only the first trace carrying a label gets a
    /// legend entry, so both bounds of an interval share one entry.
    pub fn legend_flags(&self) -> Vec<bool> {
        legend_flags(self.traces.iter().map(|t| t.label.as_deref()))
    }

    /// Padded axis ranges covering every finite point.
    pub fn extent(&self, padding: f64) -> (Range<f64>, Range<f64>) {
        let mut xs = Extent::default();
        let mut ys = Extent::default();
        for (x, y) in self.traces.iter().flat_map(|t| t.points.iter()) {
            if x.is_finite() && y.is_finite() {
                xs.observe(*x);
                ys.observe(*y);
            }
        }
        (xs.range(padding), ys.range(padding))
    }
}

/// Rows of figures laid out on one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub rows: Vec<Vec<Figure>>,
}

impl Grid {
    /// Figures side by side.
    pub fn row(figures: Vec<Figure>) -> Self {
        Self {
            rows: vec![figures],
        }
    }

    /// Figures stacked top to bottom.
    pub fn column(figures: Vec<Figure>) -> Self {
        Self {
            rows: figures.into_iter().map(|f| vec![f]).collect(),
        }
    }

    /// `(rows, columns)` of the layout.
    pub fn shape(&self) -> (usize, usize) {
        let cols = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        (self.rows.len(), cols)
    }

    pub fn figures(&self) -> impl Iterator<Item = &Figure> {
        self.rows.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trace3d {
    pub label: Option<String>,
    pub stroke: Stroke,
    pub points: Vec<(f64, f64, f64)>,
}

/// 3D line chart: `x` runs along the rotor axis, `y`/`z` carry the two
/// lateral amplitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure3d {
    pub title: String,
    pub axis_labels: [String; 3],
    pub traces: Vec<Trace3d>,
}

impl Figure3d {
    pub fn new(title: impl Into<String>, axis_labels: [&str; 3]) -> Self {
        Self {
            title: title.into(),
            axis_labels: axis_labels.map(str::to_string),
            traces: Vec::new(),
        }
    }

    pub fn push(&mut self, trace: Trace3d) {
        self.traces.push(trace);
    }

    pub fn legend_flags(&self) -> Vec<bool> {
        legend_flags(self.traces.iter().map(|t| t.label.as_deref()))
    }

    pub fn extent(&self, padding: f64) -> (Range<f64>, Range<f64>, Range<f64>) {
        let mut xs = Extent::default();
        let mut ys = Extent::default();
        let mut zs = Extent::default();
        for (x, y, z) in self.traces.iter().flat_map(|t| t.points.iter()) {
            if x.is_finite() && y.is_finite() && z.is_finite() {
                xs.observe(*x);
                ys.observe(*y);
                zs.observe(*z);
            }
        }
        (xs.range(padding), ys.range(padding), zs.range(padding))
    }
}

fn legend_flags<'a>(labels: impl Iterator<Item = Option<&'a str>>) -> Vec<bool> {
    let mut seen: Vec<&str> = Vec::new();
    labels
        .map(|label| match label {
            Some(l) if !seen.contains(&l) => {
                seen.push(l);
                true
            }
            _ => false,
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    min: f64,
    max: f64,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Extent {
    fn observe(&mut self, v: f64) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn range(&self, padding: f64) -> Range<f64> {
        if self.min > self.max {
            return 0.0..1.0;
        }

        let span = self.max - self.min;
        if span <= f64::EPSILON * self.max.abs().max(1.0) {
            return (self.min - 1.0)..(self.max + 1.0);
        }

        let pad = span * padding;
        (self.min - pad)..(self.max + pad)
    }
}
