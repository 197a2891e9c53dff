//! plotters emitters for the chart model
//!
//! The output backend follows the file extension: `.svg` goes through
//! `SVGBackend`, `.png` through `BitMapBackend`.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{debug, info};

use crate::chart::{Figure, Figure3d, Grid, Stroke};
use crate::config::RenderConfig;
use crate::error::render_err;
use crate::PlotError;

const LEGEND_SWATCH_PX: i32 = 20;
const PROJECTION_SCALE: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, PlotError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("svg") => Ok(Self::Svg),
            Some("png") => Ok(Self::Png),
            _ => Err(PlotError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_path(Path::new(&format!("chart.{s}")))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub fn render_figure(fig: &Figure, cfg: &RenderConfig, path: &Path) -> Result<(), PlotError> {
    let format = prepare(path)?;
    let size = (cfg.width, cfg.height);
    match format {
        OutputFormat::Svg => draw_single(&SVGBackend::new(path, size).into_drawing_area(), fig, cfg)?,
        OutputFormat::Png => {
            draw_single(&BitMapBackend::new(path, size).into_drawing_area(), fig, cfg)?
        }
    }

    info!(path = %path.display(), traces = fig.traces.len(), "rendered figure");
    Ok(())
}

/// Renders every figure of `grid` onto one canvas, each cell sized like a
/// single figure.
pub fn render_grid(grid: &Grid, cfg: &RenderConfig, path: &Path) -> Result<(), PlotError> {
    let format = prepare(path)?;
    let (rows, cols) = grid.shape();
    if rows == 0 || cols == 0 {
        return Err(PlotError::Render("grid has no figures".to_string()));
    }

    let size = (cfg.width * cols as u32, cfg.height * rows as u32);
    match format {
        OutputFormat::Svg => draw_grid(&SVGBackend::new(path, size).into_drawing_area(), grid, cfg)?,
        OutputFormat::Png => {
            draw_grid(&BitMapBackend::new(path, size).into_drawing_area(), grid, cfg)?
        }
    }

    info!(
        path = %path.display(),
        rows,
        cols,
        figures = grid.figures().count(),
        "rendered grid"
    );
    Ok(())
}

pub fn render_figure3d(fig: &Figure3d, cfg: &RenderConfig, path: &Path) -> Result<(), PlotError> {
    let format = prepare(path)?;
    let size = (cfg.width, cfg.height);
    match format {
        OutputFormat::Svg => draw_3d(&SVGBackend::new(path, size).into_drawing_area(), fig, cfg)?,
        OutputFormat::Png => draw_3d(&BitMapBackend::new(path, size).into_drawing_area(), fig, cfg)?,
    }

    info!(path = %path.display(), traces = fig.traces.len(), "rendered 3d figure");
    Ok(())
}

fn prepare(path: &Path) -> Result<OutputFormat, PlotError> {
    let format = OutputFormat::from_path(path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(format)
}

fn draw_single<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &Figure,
    cfg: &RenderConfig,
) -> Result<(), PlotError> {
    root.fill(&WHITE).map_err(render_err)?;
    draw_chart(root, fig, cfg)?;
    root.present().map_err(render_err)
}

fn draw_grid<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    grid: &Grid,
    cfg: &RenderConfig,
) -> Result<(), PlotError> {
    root.fill(&WHITE).map_err(render_err)?;
    let (rows, cols) = grid.shape();
    let cells = root.split_evenly((rows, cols));

    for (r, row) in grid.rows.iter().enumerate() {
        for (c, fig) in row.iter().enumerate() {
            draw_chart(&cells[r * cols + c], fig, cfg)?;
        }
    }

    root.present().map_err(render_err)
}

fn style_of(stroke: &Stroke, cfg: &RenderConfig) -> ShapeStyle {
    stroke
        .color
        .mix(stroke.alpha)
        .stroke_width(cfg.stroke_px(stroke.width))
}

fn draw_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    fig: &Figure,
    cfg: &RenderConfig,
) -> Result<(), PlotError> {
    let font = cfg.font_family.as_str();
    let (x_range, y_range) = fig.extent(cfg.axis_padding);

    let mut chart = ChartBuilder::on(area)
        .caption(&fig.title, (font, cfg.title_font_size))
        .margin(cfg.margin)
        .x_label_area_size(cfg.x_label_area)
        .y_label_area_size(cfg.y_label_area)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc(fig.x_label.as_str())
        .y_desc(fig.y_label.as_str())
        .axis_desc_style((font, cfg.axis_label_font_size))
        .label_style((font, cfg.tick_font_size))
        .draw()
        .map_err(render_err)?;

    let mut legend_entries = 0;
    for (trace, in_legend) in fig.traces.iter().zip(fig.legend_flags()) {
        let style = style_of(&trace.stroke, cfg);
        let points: Vec<(f64, f64)> = trace
            .points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        if points.len() < trace.points.len() {
            debug!(
                skipped = trace.points.len() - points.len(),
                label = trace.label.as_deref().unwrap_or(""),
                "dropped non-finite points"
            );
        }

        let anno = if trace.stroke.dashed {
            chart.draw_series(
                dashes(&points, cfg.dash_pieces, lerp2)
                    .into_iter()
                    .map(|seg| PathElement::new(seg, style)),
            )
        } else {
            chart.draw_series(LineSeries::new(points, style))
        }
        .map_err(render_err)?;

        if let (true, Some(label)) = (in_legend, trace.label.as_deref()) {
            anno.label(label).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + LEGEND_SWATCH_PX, y)], style)
            });
            legend_entries += 1;
        }
    }

    if legend_entries > 0 {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(cfg.legend_background_alpha))
            .border_style(BLACK)
            .label_font((font, cfg.legend_font_size))
            .draw()
            .map_err(render_err)?;
    }

    Ok(())
}

fn draw_3d<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &Figure3d,
    cfg: &RenderConfig,
) -> Result<(), PlotError> {
    root.fill(&WHITE).map_err(render_err)?;
    let font = cfg.font_family.as_str();
    let (x_range, y_range, z_range) = fig.extent(cfg.axis_padding);

    let mut chart = ChartBuilder::on(root)
        .caption(&fig.title, (font, cfg.title_font_size))
        .margin(cfg.margin)
        .build_cartesian_3d(x_range, y_range, z_range)
        .map_err(render_err)?;

    chart.with_projection(|mut pb| {
        pb.yaw = cfg.yaw;
        pb.pitch = cfg.pitch;
        pb.scale = PROJECTION_SCALE;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .label_style((font, cfg.tick_font_size))
        .draw()
        .map_err(render_err)?;

    let mut legend_entries = 0;
    for (trace, in_legend) in fig.traces.iter().zip(fig.legend_flags()) {
        let style = style_of(&trace.stroke, cfg);
        let points: Vec<(f64, f64, f64)> = trace
            .points
            .iter()
            .copied()
            .filter(|(x, y, z)| x.is_finite() && y.is_finite() && z.is_finite())
            .collect();

        let anno = if trace.stroke.dashed {
            chart.draw_series(
                dashes(&points, cfg.dash_pieces, lerp3)
                    .into_iter()
                    .map(|seg| PathElement::new(seg, style)),
            )
        } else {
            chart.draw_series(LineSeries::new(points, style))
        }
        .map_err(render_err)?;

        if let (true, Some(label)) = (in_legend, trace.label.as_deref()) {
            anno.label(label).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + LEGEND_SWATCH_PX, y)], style)
            });
            legend_entries += 1;
        }
    }

    if legend_entries > 0 {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(cfg.legend_background_alpha))
            .border_style(BLACK)
            .label_font((font, cfg.legend_font_size))
            .draw()
            .map_err(render_err)?;
    }

    // 3D axes carry no descriptions; name them in the lower-left corner
    let (_, height) = root.dim_in_pixel();
    let line = cfg.axis_label_font_size as i32 + 4;
    for (i, (axis, label)) in ["x", "y", "z"].iter().zip(&fig.axis_labels).enumerate() {
        let y = height as i32 - line * (3 - i as i32);
        root.draw(&Text::new(
            format!("{axis}: {label}"),
            (cfg.margin as i32, y),
            (font, cfg.axis_label_font_size).into_font().color(&BLACK),
        ))
        .map_err(render_err)?;
    }

    root.present().map_err(render_err)
}

fn lerp2(a: (f64, f64), b: (f64, f64), t: f64) -> (f64, f64) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

fn lerp3(a: (f64, f64, f64), b: (f64, f64, f64), t: f64) -> (f64, f64, f64) {
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

/// Splits a polyline into `pieces` equal parameter spans and keeps every
/// other span, starting with the first.
fn dashes<P: Copy>(points: &[P], pieces: usize, lerp: impl Fn(P, P, f64) -> P) -> Vec<Vec<P>> {
    if points.len() < 2 || pieces == 0 {
        return Vec::new();
    }

    let span = (points.len() - 1) as f64;
    let at = |t: f64| {
        let i = (t.floor() as usize).min(points.len() - 2);
        lerp(points[i], points[i + 1], t - i as f64)
    };

    (0..pieces)
        .step_by(2)
        .map(|k| {
            let t0 = span * k as f64 / pieces as f64;
            let t1 = span * (k + 1) as f64 / pieces as f64;
            let mut seg = vec![at(t0)];
            let first_inner = t0.floor() as usize + 1;
            seg.extend(
                (first_inner..points.len())
                    .take_while(|&i| (i as f64) < t1)
                    .map(|i| points[i]),
            );
            seg.push(at(t1));
            seg
        })
        .collect()
}
