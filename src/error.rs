use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("render error: {0}")]
    Render(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("percentile {0} is outside [0, 100]")]
    InvalidPercentile(f64),
    #[error("{context} contains non-finite values")]
    NonFinite { context: &'static str },
    #[error("{context} has an empty ensemble axis")]
    EmptyEnsemble { context: &'static str },
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("degree of freedom {dof} is out of range: response has {available} dofs")]
    DofOutOfRange { dof: usize, available: usize },
    #[error("mode {mode} is out of range: results hold {available} modes")]
    ModeOutOfRange { mode: usize, available: usize },
    #[error("node {0} is not in the node list, please insert a valid node")]
    InvalidNode(usize),
    #[error("plot type {0:?} not supported, choose between '1d', '2d' or '3d'")]
    UnsupportedPlotKind(String),
    #[error("unsupported output format for {}: use .svg or .png", .0.display())]
    UnsupportedFormat(PathBuf),
}

pub(crate) fn ensure_len(
    context: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), PlotError> {
    if expected == actual {
        return Ok(());
    }

    Err(PlotError::ShapeMismatch {
        context,
        expected,
        got: actual,
    })
}

pub(crate) fn render_err<E: std::fmt::Display>(err: E) -> PlotError {
    PlotError::Render(err.to_string())
}
