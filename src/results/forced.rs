use ndarray::{s, Array3, Axis};

use crate::chart::{Figure, Grid};
use crate::error::ensure_len;
use crate::results::{AmplitudeUnits, CurveStyling, PercentilePalette};
use crate::stats::{summarize, BandRequest, EnsembleSummary};
use crate::PlotError;

/// Unbalance response of an ensemble; magnitude and phase are shaped
/// `(samples, frequencies, dofs)`.
#[derive(Debug, Clone)]
pub struct ForcedResponseResults {
    magnitude: Array3<f64>,
    phase: Array3<f64>,
    frequency_range: Vec<f64>,
}

impl ForcedResponseResults {
    pub fn new(
        magnitude: Array3<f64>,
        phase: Array3<f64>,
        frequency_range: Vec<f64>,
    ) -> Result<Self, PlotError> {
        let (samples, freqs, dofs) = magnitude.dim();
        ensure_len("forced response frequency_range", freqs, frequency_range.len())?;
        ensure_len("forced response phase samples", samples, phase.dim().0)?;
        ensure_len("forced response phase frequencies", freqs, phase.dim().1)?;
        ensure_len("forced response phase dofs", dofs, phase.dim().2)?;
        if samples == 0 {
            return Err(PlotError::EmptyEnsemble {
                context: "forced response magnitude",
            });
        }

        Ok(Self {
            magnitude,
            phase,
            frequency_range,
        })
    }

    pub fn frequency_range(&self) -> &[f64] {
        &self.frequency_range
    }

    pub fn n_dofs(&self) -> usize {
        self.magnitude.dim().2
    }

    pub fn check_dof(&self, dof: usize) -> Result<(), PlotError> {
        if dof < self.n_dofs() {
            return Ok(());
        }
        Err(PlotError::DofOutOfRange {
            dof,
            available: self.n_dofs(),
        })
    }

    pub fn magnitude_summary(
        &self,
        dof: usize,
        request: &BandRequest,
    ) -> Result<EnsembleSummary, PlotError> {
        self.check_dof(dof)?;
        summarize(
            self.magnitude.slice(s![.., .., dof]),
            Axis(0),
            request,
            "forced response magnitude",
        )
    }

    pub fn phase_summary(
        &self,
        dof: usize,
        request: &BandRequest,
    ) -> Result<EnsembleSummary, PlotError> {
        self.check_dof(dof)?;
        summarize(
            self.phase.slice(s![.., .., dof]),
            Axis(0),
            request,
            "forced response phase",
        )
    }

    pub fn plot_magnitude(
        &self,
        dof: usize,
        request: &BandRequest,
        units: AmplitudeUnits,
    ) -> Result<Figure, PlotError> {
        let summary = self.magnitude_summary(dof, request)?;
        let mut fig = Figure::new(
            "Unbalance Response - Magnitude",
            "Frequency",
            units.axis_label(),
        );
        fig.traces = CurveStyling::plain(PercentilePalette::Category10)
            .traces(&self.frequency_range, &summary);
        Ok(fig)
    }

    pub fn plot_phase(&self, dof: usize, request: &BandRequest) -> Result<Figure, PlotError> {
        let summary = self.phase_summary(dof, request)?;
        let mut fig = Figure::new("Unbalance Response - Phase", "Frequency", "Phase angle");
        fig.traces = CurveStyling::plain(PercentilePalette::Category10)
            .traces(&self.frequency_range, &summary);
        Ok(fig)
    }

    /// Magnitude above phase for one degree of freedom.
    pub fn plot(
        &self,
        dof: usize,
        request: &BandRequest,
        units: AmplitudeUnits,
    ) -> Result<Grid, PlotError> {
        let fig0 = self.plot_magnitude(dof, request, units)?;
        let fig1 = self.plot_phase(dof, request)?;
        Ok(Grid::column(vec![fig0, fig1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn results() -> ForcedResponseResults {
        // 4 samples, 3 frequencies, 2 dofs
        let magnitude =
            Array3::from_shape_fn((4, 3, 2), |(s, f, d)| (f + 1) as f64 * (d + 1) as f64 + s as f64);
        let phase = Array3::from_shape_fn((4, 3, 2), |(s, _, d)| -(d as f64) - 0.1 * s as f64);
        ForcedResponseResults::new(magnitude, phase, vec![5.0, 10.0, 15.0]).unwrap()
    }

    #[test]
    fn summaries_reduce_over_samples_for_one_dof() {
        let req = BandRequest::new(&[0.0, 100.0], &[]).unwrap();
        let s = results().magnitude_summary(1, &req).unwrap();
        // dof 1: 2 (f + 1) + s
        assert_eq!(s.percentiles[0].values, vec![2.0, 4.0, 6.0]);
        assert_eq!(s.percentiles[1].values, vec![5.0, 7.0, 9.0]);
        assert_abs_diff_eq!(s.mean[0], 3.5, epsilon = 1e-12);
    }

    #[test]
    fn phase_figure_uses_frequency_axis() {
        let fig = results().plot_phase(0, &BandRequest::default()).unwrap();
        assert_eq!(fig.title, "Unbalance Response - Phase");
        assert_eq!(fig.traces.len(), 1);
        assert_abs_diff_eq!(fig.traces[0].points[2].0, 15.0);
        assert_abs_diff_eq!(fig.traces[0].points[2].1, -0.15, epsilon = 1e-12);
    }

    #[test]
    fn rejects_out_of_range_dof() {
        assert!(matches!(
            results().plot(2, &BandRequest::default(), AmplitudeUnits::Decibel),
            Err(PlotError::DofOutOfRange {
                dof: 2,
                available: 2
            })
        ));
    }

    #[test]
    fn check_dof_bounds_on_dof_count() {
        let r = results();
        assert!(r.check_dof(1).is_ok());
        assert!(matches!(
            r.check_dof(2),
            Err(PlotError::DofOutOfRange {
                dof: 2,
                available: 2
            })
        ));
    }

    #[test]
    fn grid_stacks_magnitude_over_phase() {
        let grid = results()
            .plot(0, &BandRequest::default(), AmplitudeUnits::Decibel)
            .unwrap();
        assert_eq!(grid.shape(), (2, 1));
        assert_eq!(grid.rows[0][0].y_label, "Amplitude (dB)");
    }

    #[test]
    fn rejects_mismatched_phase() {
        let magnitude = Array3::<f64>::zeros((2, 3, 1));
        let phase = Array3::<f64>::zeros((2, 3, 2));
        assert!(matches!(
            ForcedResponseResults::new(magnitude, phase, vec![0.0; 3]),
            Err(PlotError::ShapeMismatch {
                context: "forced response phase dofs",
                ..
            })
        ));
    }
}
