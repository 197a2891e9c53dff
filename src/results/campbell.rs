use ndarray::{Array3, Axis};

use crate::chart::{Figure, Grid, Stroke, Trace};
use crate::error::ensure_len;
use crate::palette::HARMONIC_GREY;
use crate::results::CurveStyling;
use crate::stats::{summarize, BandRequest, EnsembleSummary};
use crate::PlotError;

/// Damped natural frequencies and log decrements of an ensemble across a
/// speed sweep, both shaped `(modes, speeds, samples)`.
#[derive(Debug, Clone)]
pub struct CampbellResults {
    speed_range: Vec<f64>,
    wd: Array3<f64>,
    log_dec: Array3<f64>,
}

impl CampbellResults {
    pub fn new(
        speed_range: Vec<f64>,
        wd: Array3<f64>,
        log_dec: Array3<f64>,
    ) -> Result<Self, PlotError> {
        let (modes, speeds, samples) = wd.dim();
        ensure_len("campbell speed_range", speeds, speed_range.len())?;
        ensure_len("campbell log_dec modes", modes, log_dec.dim().0)?;
        ensure_len("campbell log_dec speeds", speeds, log_dec.dim().1)?;
        ensure_len("campbell log_dec samples", samples, log_dec.dim().2)?;
        if samples == 0 {
            return Err(PlotError::EmptyEnsemble { context: "campbell wd" });
        }

        Ok(Self {
            speed_range,
            wd,
            log_dec,
        })
    }

    pub fn speed_range(&self) -> &[f64] {
        &self.speed_range
    }

    pub fn n_modes(&self) -> usize {
        self.wd.dim().0
    }

    pub fn n_samples(&self) -> usize {
        self.wd.dim().2
    }

    pub fn nat_freq_summary(
        &self,
        mode: usize,
        request: &BandRequest,
    ) -> Result<EnsembleSummary, PlotError> {
        self.check_mode(mode)?;
        summarize(self.wd.index_axis(Axis(0), mode), Axis(1), request, "campbell wd")
    }

    pub fn log_dec_summary(
        &self,
        mode: usize,
        request: &BandRequest,
    ) -> Result<EnsembleSummary, PlotError> {
        self.check_mode(mode)?;
        summarize(
            self.log_dec.index_axis(Axis(0), mode),
            Axis(1),
            request,
            "campbell log_dec",
        )
    }

    fn check_mode(&self, mode: usize) -> Result<(), PlotError> {
        if mode < self.n_modes() {
            Ok(())
        } else {
            Err(PlotError::ModeOutOfRange {
                mode,
                available: self.n_modes(),
            })
        }
    }

    /// Damped natural frequencies against rotor speed, with `h x speed`
    /// excitation lines for each entry of `harmonics`.
    pub fn plot_nat_freq(
        &self,
        request: &BandRequest,
        harmonics: &[f64],
    ) -> Result<Figure, PlotError> {
        let mut fig = Figure::new(
            "Campbell Diagram",
            "Rotor Speed",
            "Damped Natural Frequencies",
        );

        for &h in harmonics {
            let line: Vec<f64> = self.speed_range.iter().map(|w| h * w).collect();
            fig.push(Trace::new(
                Some(format!("{h}x")),
                Stroke::guide(HARMONIC_GREY),
                &self.speed_range,
                &line,
            ));
        }

        for mode in 0..self.n_modes() {
            let summary = self.nat_freq_summary(mode, request)?;
            for trace in mode_traces(&self.speed_range, &summary, mode) {
                fig.push(trace);
            }
        }

        Ok(fig)
    }

    /// Logarithmic decrement against rotor speed.
    pub fn plot_log_dec(&self, request: &BandRequest) -> Result<Figure, PlotError> {
        let mut fig = Figure::new("Campbell Diagram", "Rotor speed", "Log Dec");

        for mode in 0..self.n_modes() {
            let summary = self.log_dec_summary(mode, request)?;
            for trace in mode_traces(&self.speed_range, &summary, mode) {
                fig.push(trace);
            }
        }

        Ok(fig)
    }

    /// Natural frequency and log decrement diagrams side by side.
    pub fn plot(&self, request: &BandRequest, harmonics: &[f64]) -> Result<Grid, PlotError> {
        let fig0 = self.plot_nat_freq(request, harmonics)?;
        let fig1 = self.plot_log_dec(request)?;
        Ok(Grid::row(vec![fig0, fig1]))
    }
}

// Mean first, then percentiles and intervals, all tied to the mode color.
fn mode_traces(speed_range: &[f64], summary: &EnsembleSummary, mode: usize) -> Vec<Trace> {
    let mut traces = CurveStyling::for_mode(mode).traces(speed_range, summary);
    traces.rotate_right(1);
    traces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{category10, category20c};
    use approx::assert_abs_diff_eq;

    // two modes, three speeds, four samples; sample s adds s to the base
    fn results() -> CampbellResults {
        let wd = Array3::from_shape_fn((2, 3, 4), |(m, k, s)| {
            100.0 * (m + 1) as f64 + 10.0 * k as f64 + s as f64
        });
        let log_dec = Array3::from_shape_fn((2, 3, 4), |(m, _, s)| 0.1 * (m + 1) as f64 + 0.01 * s as f64);
        CampbellResults::new(vec![0.0, 50.0, 100.0], wd, log_dec).unwrap()
    }

    #[test]
    fn rejects_mismatched_speed_range() {
        let wd = Array3::<f64>::zeros((1, 3, 2));
        let err = CampbellResults::new(vec![0.0, 1.0], wd.clone(), wd).unwrap_err();
        assert!(matches!(
            err,
            PlotError::ShapeMismatch {
                context: "campbell speed_range",
                expected: 3,
                got: 2
            }
        ));
    }

    #[test]
    fn summary_reduces_over_samples() {
        let r = results();
        let req = BandRequest::new(&[50.0], &[]).unwrap();
        let s = r.nat_freq_summary(1, &req).unwrap();
        assert_eq!(s.mean, vec![201.5, 211.5, 221.5]);
        assert_eq!(s.percentiles[0].values, vec![201.5, 211.5, 221.5]);
        assert!(matches!(
            r.log_dec_summary(2, &req),
            Err(PlotError::ModeOutOfRange {
                mode: 2,
                available: 2
            })
        ));
    }

    #[test]
    fn nat_freq_traces_follow_mode_colors() {
        let r = results();
        let req = BandRequest::new(&[5.0, 95.0], &[90.0]).unwrap();
        let fig = r.plot_nat_freq(&req, &[1.0, 2.0]).unwrap();

        // 2 harmonics + per mode: mean + 2 percentiles + 2 interval bounds
        assert_eq!(fig.traces.len(), 2 + 2 * 5);
        assert_eq!(fig.traces[0].label.as_deref(), Some("1x"));
        assert_abs_diff_eq!(fig.traces[1].points[2].1, 200.0, epsilon = 1e-12);

        let mode1 = &fig.traces[2..7];
        assert_eq!(mode1[0].label.as_deref(), Some("Mean - Mode 1"));
        assert_eq!(mode1[0].stroke.color, category10(0));
        assert_eq!(mode1[1].label.as_deref(), Some("percentile: 5%"));
        assert_eq!(mode1[2].stroke.color, category20c(1));
        assert_eq!(
            mode1[3].label.as_deref(),
            Some("confidence interval: 90% - Mode 1")
        );
        assert_eq!(fig.traces[7].label.as_deref(), Some("Mean - Mode 2"));
        assert_eq!(fig.traces[7].stroke.color, category10(1));
    }

    #[test]
    fn grid_places_diagrams_side_by_side() {
        let grid = results().plot(&BandRequest::default(), &[1.0]).unwrap();
        assert_eq!(grid.shape(), (1, 2));
        assert_eq!(grid.rows[0][1].y_label, "Log Dec");
        assert_eq!(grid.rows[0][1].traces.len(), 2);
    }
}
