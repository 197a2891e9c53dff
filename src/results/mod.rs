//! Stochastic result containers
//!
//! Every container holds the ensemble arrays of one analysis, reduces them
//! with [`crate::stats::summarize`] and turns the summaries into chart
//! traces. The curve styling is shared here so each analysis only states its
//! palette choices.

pub mod campbell;
pub mod forced;
pub mod frequency;
pub mod time;

use std::fmt;

use plotters::style::RGBColor;

use crate::chart::{Stroke, Trace, Trace3d};
use crate::palette::{category10, category20c, MEAN_BLACK};
use crate::stats::{CurveRole, EnsembleSummary};

pub use campbell::CampbellResults;
pub use forced::ForcedResponseResults;
pub use frequency::FrequencyResponseResults;
pub use time::{TimeFigure, TimePlot, TimePlotKind, TimeResponseResults};

/// Amplitude unit of a magnitude plot; selects the y axis label only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AmplitudeUnits {
    Meters,
    #[default]
    MicronPkPk,
    Decibel,
}

impl AmplitudeUnits {
    /// `"m"` and `"mic-pk-pk"` select those units, anything else is dB.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "m" => Self::Meters,
            "mic-pk-pk" => Self::MicronPkPk,
            _ => Self::Decibel,
        }
    }

    pub fn axis_label(self) -> &'static str {
        match self {
            Self::Meters => "Amplitude (m)",
            Self::MicronPkPk => "Amplitude (μ pk-pk)",
            Self::Decibel => "Amplitude (dB)",
        }
    }
}

impl fmt::Display for AmplitudeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Meters => "m",
            Self::MicronPkPk => "mic-pk-pk",
            Self::Decibel => "db",
        };
        f.write_str(s)
    }
}

/// Palette used for percentile curves.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PercentilePalette {
    Category10,
    Category20c,
}

/// Color/label rules for turning an [`EnsembleSummary`] into traces.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CurveStyling {
    pub percentile_palette: PercentilePalette,
    /// Fixed color for mean and interval curves; `None` draws the mean black
    /// and colors intervals by their index.
    pub mode_color: Option<RGBColor>,
    /// 1-based mode number appended to mean and interval labels.
    pub mode: Option<usize>,
}

impl CurveStyling {
    pub fn plain(percentile_palette: PercentilePalette) -> Self {
        Self {
            percentile_palette,
            mode_color: None,
            mode: None,
        }
    }

    pub fn for_mode(mode_index: usize) -> Self {
        Self {
            percentile_palette: PercentilePalette::Category20c,
            mode_color: Some(category10(mode_index)),
            mode: Some(mode_index + 1),
        }
    }

    pub fn stroke(&self, role: CurveRole) -> Stroke {
        match role {
            CurveRole::Mean => Stroke::mean(self.mode_color.unwrap_or(MEAN_BLACK)),
            CurveRole::Percentile { index, .. } => Stroke::band(match self.percentile_palette {
                PercentilePalette::Category10 => category10(index),
                PercentilePalette::Category20c => category20c(index),
            }),
            CurveRole::IntervalUpper { index, .. } | CurveRole::IntervalLower { index, .. } => {
                Stroke::band(self.mode_color.unwrap_or_else(|| category10(index)))
            }
        }
    }

    pub fn label(&self, role: CurveRole) -> String {
        match (role, self.mode) {
            (CurveRole::Mean, None) => "Mean".to_string(),
            (CurveRole::Mean, Some(mode)) => format!("Mean - Mode {mode}"),
            (CurveRole::Percentile { level, .. }, _) => format!("percentile: {level}%"),
            (
                CurveRole::IntervalUpper { level, .. } | CurveRole::IntervalLower { level, .. },
                None,
            ) => format!("confidence interval: {level}%"),
            (
                CurveRole::IntervalUpper { level, .. } | CurveRole::IntervalLower { level, .. },
                Some(mode),
            ) => format!("confidence interval: {level}% - Mode {mode}"),
        }
    }

    /// One trace per curve of `summary`, plotted against `abscissa`.
    pub fn traces(&self, abscissa: &[f64], summary: &EnsembleSummary) -> Vec<Trace> {
        summary
            .curves()
            .into_iter()
            .map(|(role, values)| {
                Trace::new(Some(self.label(role)), self.stroke(role), abscissa, values)
            })
            .collect()
    }

    /// Orbit traces pairing the x-direction and y-direction summaries, which
    /// were computed from the same request.
    pub fn orbit_traces(&self, sx: &EnsembleSummary, sy: &EnsembleSummary) -> Vec<Trace> {
        sx.curves()
            .into_iter()
            .zip(sy.curves())
            .map(|((role, xs), (_, ys))| {
                Trace::new(Some(self.label(role)), self.stroke(role), xs, ys)
            })
            .collect()
    }

    /// Orbit traces lifted to 3D at axial position `axial`.
    pub fn orbit_traces_3d(
        &self,
        axial: f64,
        sx: &EnsembleSummary,
        sy: &EnsembleSummary,
    ) -> Vec<Trace3d> {
        self.orbit_traces(sx, sy)
            .into_iter()
            .map(|t| Trace3d {
                label: t.label,
                stroke: t.stroke,
                points: t.points.into_iter().map(|(x, y)| (axial, x, y)).collect(),
            })
            .collect()
    }
}
