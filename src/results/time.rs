use std::str::FromStr;

use ndarray::{s, Array3, Axis};

use crate::chart::{Figure, Figure3d, Stroke, Trace3d};
use crate::error::ensure_len;
use crate::palette::MEAN_BLACK;
use crate::results::{CurveStyling, PercentilePalette};
use crate::stats::{summarize, BandRequest, EnsembleSummary};
use crate::PlotError;

/// Degrees of freedom per rotor node: x, y, α, β.
pub const DOFS_PER_NODE: usize = 4;

/// Time-domain response of an ensemble.
///
/// `yout` is shaped `(samples, time, dofs)` with [`DOFS_PER_NODE`] dofs per
/// node; `xout` holds the state history `(samples, time, states)`.
#[derive(Debug, Clone)]
pub struct TimeResponseResults {
    time_range: Vec<f64>,
    yout: Array3<f64>,
    xout: Array3<f64>,
    nodes_list: Vec<usize>,
    nodes_pos: Vec<f64>,
}

/// Which view of the time response to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePlot {
    /// Time history of one degree of freedom.
    Time { dof: usize },
    /// Orbit of one node.
    Orbit2d { node: usize },
    /// Orbits of every node along the rotor axis.
    Orbit3d,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePlotKind {
    OneD,
    TwoD,
    ThreeD,
}

impl FromStr for TimePlotKind {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Self::OneD),
            "2d" => Ok(Self::TwoD),
            "3d" => Ok(Self::ThreeD),
            other => Err(PlotError::UnsupportedPlotKind(other.to_string())),
        }
    }
}

impl TimePlot {
    /// Builds the plot selection from a kind plus the dof/node it needs.
    pub fn from_parts(
        kind: TimePlotKind,
        dof: Option<usize>,
        node: Option<usize>,
    ) -> Result<Self, PlotError> {
        match kind {
            TimePlotKind::OneD => dof.map(|dof| Self::Time { dof }).ok_or_else(|| {
                PlotError::InvalidConfig("a dof is required for 1d time response plots".to_string())
            }),
            TimePlotKind::TwoD => node.map(|node| Self::Orbit2d { node }).ok_or_else(|| {
                PlotError::InvalidConfig("a node is required for 2d orbit plots".to_string())
            }),
            TimePlotKind::ThreeD => Ok(Self::Orbit3d),
        }
    }
}

/// Output of [`TimeResponseResults::plot`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimeFigure {
    Flat(Figure),
    Spatial(Figure3d),
}

/// Name of the observed coordinate of `dof`.
pub fn dof_name(dof: usize) -> &'static str {
    match dof % DOFS_PER_NODE {
        0 => "x",
        1 => "y",
        2 => "α",
        _ => "β",
    }
}

impl TimeResponseResults {
    pub fn new(
        time_range: Vec<f64>,
        yout: Array3<f64>,
        xout: Array3<f64>,
        nodes_list: Vec<usize>,
        nodes_pos: Vec<f64>,
    ) -> Result<Self, PlotError> {
        let (samples, steps, _) = yout.dim();
        ensure_len("time response time_range", steps, time_range.len())?;
        if samples == 0 {
            return Err(PlotError::EmptyEnsemble {
                context: "time response yout",
            });
        }
        if !xout.is_empty() {
            ensure_len("time response xout samples", samples, xout.dim().0)?;
            ensure_len("time response xout steps", steps, xout.dim().1)?;
        }
        if let Some(&node) = nodes_list.iter().find(|&&n| n >= nodes_pos.len()) {
            return Err(PlotError::ShapeMismatch {
                context: "time response nodes_pos",
                expected: node + 1,
                got: nodes_pos.len(),
            });
        }

        Ok(Self {
            time_range,
            yout,
            xout,
            nodes_list,
            nodes_pos,
        })
    }

    pub fn time_range(&self) -> &[f64] {
        &self.time_range
    }

    pub fn xout(&self) -> &Array3<f64> {
        &self.xout
    }

    pub fn nodes_list(&self) -> &[usize] {
        &self.nodes_list
    }

    pub fn n_dofs(&self) -> usize {
        self.yout.dim().2
    }

    /// Ensemble summary of one degree of freedom over time.
    pub fn dof_summary(&self, dof: usize, request: &BandRequest) -> Result<EnsembleSummary, PlotError> {
        if dof >= self.n_dofs() {
            return Err(PlotError::DofOutOfRange {
                dof,
                available: self.n_dofs(),
            });
        }
        summarize(
            self.yout.slice(s![.., .., dof]),
            Axis(0),
            request,
            "time response yout",
        )
    }

    fn node_summaries(
        &self,
        node: usize,
        request: &BandRequest,
    ) -> Result<(EnsembleSummary, EnsembleSummary), PlotError> {
        let sx = self.dof_summary(DOFS_PER_NODE * node, request)?;
        let sy = self.dof_summary(DOFS_PER_NODE * node + 1, request)?;
        Ok((sx, sy))
    }

    pub fn plot_time_response(&self, dof: usize, request: &BandRequest) -> Result<Figure, PlotError> {
        let summary = self.dof_summary(dof, request)?;
        let mut fig = Figure::new(
            format!(
                "Response for node {} and degree of freedom {}",
                dof / DOFS_PER_NODE,
                dof_name(dof)
            ),
            "Time (s)",
            "Amplitude",
        );
        fig.traces = CurveStyling::plain(PercentilePalette::Category10)
            .traces(&self.time_range, &summary);
        Ok(fig)
    }

    /// Orbit of `node`: y-direction against x-direction for every curve.
    pub fn plot_orbit_2d(&self, node: usize, request: &BandRequest) -> Result<Figure, PlotError> {
        if !self.nodes_list.contains(&node) {
            return Err(PlotError::InvalidNode(node));
        }

        let (sx, sy) = self.node_summaries(node, request)?;
        let mut fig = Figure::new(format!("Rotor Orbit: node {node}"), "Amplitude", "Amplitude");
        fig.traces = CurveStyling::plain(PercentilePalette::Category20c).orbit_traces(&sx, &sy);
        Ok(fig)
    }

    /// Orbits of every listed node placed along the rotor axis.
    pub fn plot_orbit_3d(&self, request: &BandRequest) -> Result<Figure3d, PlotError> {
        let mut fig = Figure3d::new(
            "Rotor Orbits",
            [
                "Rotor length (m)",
                "Amplitude - X direction (m)",
                "Amplitude - Y direction (m)",
            ],
        );

        let positions: Vec<f64> = self.nodes_list.iter().map(|&n| self.nodes_pos[n]).collect();
        if let (Some(first), Some(last)) = (
            positions.iter().copied().reduce(f64::min),
            positions.iter().copied().reduce(f64::max),
        ) {
            fig.push(Trace3d {
                label: None,
                stroke: Stroke::guide(MEAN_BLACK),
                points: vec![(first, 0.0, 0.0), (last, 0.0, 0.0)],
            });
        }

        let styling = CurveStyling::plain(PercentilePalette::Category20c);
        for &node in &self.nodes_list {
            let (sx, sy) = self.node_summaries(node, request)?;
            for trace in styling.orbit_traces_3d(self.nodes_pos[node], &sx, &sy) {
                fig.push(trace);
            }
        }

        Ok(fig)
    }

    /// Checks that `selection` names a dof or node these results carry,
    /// without summarizing anything.
    pub fn check(&self, selection: TimePlot) -> Result<(), PlotError> {
        let dof = match selection {
            TimePlot::Time { dof } => dof,
            TimePlot::Orbit2d { node } => {
                if !self.nodes_list.contains(&node) {
                    return Err(PlotError::InvalidNode(node));
                }
                DOFS_PER_NODE * node + 1
            }
            TimePlot::Orbit3d => match self.nodes_list.iter().max() {
                Some(&node) => DOFS_PER_NODE * node + 1,
                None => return Ok(()),
            },
        };
        if dof >= self.n_dofs() {
            return Err(PlotError::DofOutOfRange {
                dof,
                available: self.n_dofs(),
            });
        }
        Ok(())
    }

    pub fn plot(&self, selection: TimePlot, request: &BandRequest) -> Result<TimeFigure, PlotError> {
        match selection {
            TimePlot::Time { dof } => self.plot_time_response(dof, request).map(TimeFigure::Flat),
            TimePlot::Orbit2d { node } => self.plot_orbit_2d(node, request).map(TimeFigure::Flat),
            TimePlot::Orbit3d => self.plot_orbit_3d(request).map(TimeFigure::Spatial),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{category10, category20c};
    use approx::assert_abs_diff_eq;

    // two nodes (8 dofs), five time steps, three samples
    fn results() -> TimeResponseResults {
        let yout = Array3::from_shape_fn((3, 5, 8), |(s, t, d)| {
            (d as f64 + 1.0) * (t as f64) + s as f64
        });
        let xout = Array3::<f64>::zeros((3, 5, 16));
        let time: Vec<f64> = (0..5).map(|t| t as f64 * 0.1).collect();
        TimeResponseResults::new(time, yout, xout, vec![0, 1], vec![0.0, 0.5]).unwrap()
    }

    #[test]
    fn dof_names_cycle_per_node() {
        assert_eq!(dof_name(0), "x");
        assert_eq!(dof_name(5), "y");
        assert_eq!(dof_name(6), "α");
        assert_eq!(dof_name(11), "β");
    }

    #[test]
    fn time_response_title_and_mean() {
        let fig = results()
            .plot_time_response(5, &BandRequest::new(&[], &[90.0]).unwrap())
            .unwrap();
        assert_eq!(fig.title, "Response for node 1 and degree of freedom y");
        assert_eq!(fig.x_label, "Time (s)");

        let mean = fig.traces.last().unwrap();
        // dof 5: 6 t + s, mean over s = 6 t + 1
        assert_abs_diff_eq!(mean.points[2].1, 13.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mean.points[2].0, 0.2, epsilon = 1e-12);
        assert_eq!(fig.traces[0].stroke.color, category10(0));
    }

    #[test]
    fn dof_out_of_range_is_reported() {
        assert!(matches!(
            results().plot_time_response(8, &BandRequest::default()),
            Err(PlotError::DofOutOfRange {
                dof: 8,
                available: 8
            })
        ));
    }

    #[test]
    fn check_matches_what_plot_would_reject() {
        let r = results();
        assert!(r.check(TimePlot::Time { dof: 7 }).is_ok());
        assert!(r.check(TimePlot::Orbit2d { node: 1 }).is_ok());
        assert!(r.check(TimePlot::Orbit3d).is_ok());
        assert!(matches!(
            r.check(TimePlot::Time { dof: 8 }),
            Err(PlotError::DofOutOfRange { dof: 8, .. })
        ));
        assert!(matches!(
            r.check(TimePlot::Orbit2d { node: 4 }),
            Err(PlotError::InvalidNode(4))
        ));
    }

    #[test]
    fn orbit_2d_pairs_x_and_y_dofs() {
        let req = BandRequest::new(&[50.0], &[]).unwrap();
        let fig = results().plot_orbit_2d(1, &req).unwrap();
        assert_eq!(fig.title, "Rotor Orbit: node 1");

        // node 1: x dof 4 -> 5 t + s, y dof 5 -> 6 t + s, median s = 1
        let pct = &fig.traces[0];
        assert_eq!(pct.stroke.color, category20c(0));
        assert_eq!(pct.points[1], (6.0, 7.0));
    }

    #[test]
    fn orbit_2d_rejects_unknown_node() {
        assert!(matches!(
            results().plot(TimePlot::Orbit2d { node: 4 }, &BandRequest::default()),
            Err(PlotError::InvalidNode(4))
        ));
    }

    #[test]
    fn orbit_3d_has_center_line_and_one_trace_set_per_node() {
        let req = BandRequest::new(&[5.0, 95.0], &[50.0]).unwrap();
        let fig = results().plot_orbit_3d(&req).unwrap();

        // center line + 2 nodes x (2 percentiles + 2 bounds + mean)
        assert_eq!(fig.traces.len(), 1 + 2 * 5);
        assert!(fig.traces[0].label.is_none());
        assert_eq!(fig.traces[0].points, vec![(0.0, 0.0, 0.0), (0.5, 0.0, 0.0)]);
        assert!(fig.traces[6..].iter().all(|t| t.points.iter().all(|p| p.0 == 0.5)));
        assert_eq!(fig.axis_labels[0], "Rotor length (m)");
    }

    #[test]
    fn plot_kind_parsing() {
        assert_eq!("3d".parse::<TimePlotKind>().unwrap(), TimePlotKind::ThreeD);
        assert!(matches!(
            "4d".parse::<TimePlotKind>(),
            Err(PlotError::UnsupportedPlotKind(_))
        ));
        assert!(TimePlot::from_parts(TimePlotKind::OneD, None, Some(1)).is_err());
        assert_eq!(
            TimePlot::from_parts(TimePlotKind::TwoD, None, Some(1)).unwrap(),
            TimePlot::Orbit2d { node: 1 }
        );
    }

    #[test]
    fn rejects_node_without_position() {
        let yout = Array3::<f64>::zeros((1, 2, 4));
        let err = TimeResponseResults::new(
            vec![0.0, 1.0],
            yout,
            Array3::zeros((0, 0, 0)),
            vec![0, 3],
            vec![0.0],
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::ShapeMismatch { expected: 4, .. }));
    }
}
