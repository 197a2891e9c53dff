use ndarray::{Array2, Axis};

use crate::chart::{Figure, Grid};
use crate::error::ensure_len;
use crate::results::{AmplitudeUnits, CurveStyling, PercentilePalette};
use crate::stats::{summarize, BandRequest, EnsembleSummary};
use crate::PlotError;

/// Frequency response of one input/output pair, magnitude and phase shaped
/// `(frequencies, samples)`.
#[derive(Debug, Clone)]
pub struct FrequencyResponseResults {
    speed_range: Vec<f64>,
    magnitude: Array2<f64>,
    phase: Array2<f64>,
}

impl FrequencyResponseResults {
    pub fn new(
        speed_range: Vec<f64>,
        magnitude: Array2<f64>,
        phase: Array2<f64>,
    ) -> Result<Self, PlotError> {
        let (freqs, samples) = magnitude.dim();
        ensure_len("frequency response speed_range", freqs, speed_range.len())?;
        ensure_len("frequency response phase rows", freqs, phase.dim().0)?;
        ensure_len("frequency response phase samples", samples, phase.dim().1)?;
        if samples == 0 {
            return Err(PlotError::EmptyEnsemble {
                context: "frequency response magnitude",
            });
        }

        Ok(Self {
            speed_range,
            magnitude,
            phase,
        })
    }

    pub fn speed_range(&self) -> &[f64] {
        &self.speed_range
    }

    pub fn magnitude_summary(&self, request: &BandRequest) -> Result<EnsembleSummary, PlotError> {
        summarize(
            self.magnitude.view(),
            Axis(1),
            request,
            "frequency response magnitude",
        )
    }

    pub fn phase_summary(&self, request: &BandRequest) -> Result<EnsembleSummary, PlotError> {
        summarize(self.phase.view(), Axis(1), request, "frequency response phase")
    }

    pub fn plot_magnitude(
        &self,
        request: &BandRequest,
        units: AmplitudeUnits,
    ) -> Result<Figure, PlotError> {
        let summary = self.magnitude_summary(request)?;
        let mut fig = Figure::new(
            "Frequency Response - Magnitude",
            "Frequency",
            units.axis_label(),
        );
        fig.traces = CurveStyling::plain(PercentilePalette::Category10)
            .traces(&self.speed_range, &summary);
        Ok(fig)
    }

    pub fn plot_phase(&self, request: &BandRequest) -> Result<Figure, PlotError> {
        let summary = self.phase_summary(request)?;
        let mut fig = Figure::new("Frequency Response - Phase", "Frequency", "Phase angle");
        fig.traces = CurveStyling::plain(PercentilePalette::Category10)
            .traces(&self.speed_range, &summary);
        Ok(fig)
    }

    /// Magnitude above phase.
    pub fn plot(&self, request: &BandRequest, units: AmplitudeUnits) -> Result<Grid, PlotError> {
        let fig0 = self.plot_magnitude(request, units)?;
        let fig1 = self.plot_phase(request)?;
        Ok(Grid::column(vec![fig0, fig1]))
    }
}
