//! Ensemble reductions
//!
//! Percentile curves, symmetric confidence intervals and mean curves taken
//! across the ensemble axis of a 2D view. Percentiles use linear
//! interpolation between closest ranks, so `percentile(v, 50)` is the median
//! and `percentile(v, 0)` / `percentile(v, 100)` are the extremes.

use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::Serialize;

use crate::PlotError;

/// Percentiles and confidence levels requested by a plot call, in percent.
///
/// Both lists are sorted ascending and de-duplicated on construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BandRequest {
    percentiles: Vec<f64>,
    conf_intervals: Vec<f64>,
}

impl BandRequest {
    pub fn new(percentiles: &[f64], conf_intervals: &[f64]) -> Result<Self, PlotError> {
        Ok(Self {
            percentiles: normalize_levels(percentiles)?,
            conf_intervals: normalize_levels(conf_intervals)?,
        })
    }

    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    pub fn conf_intervals(&self) -> &[f64] {
        &self.conf_intervals
    }
}

fn normalize_levels(levels: &[f64]) -> Result<Vec<f64>, PlotError> {
    for &p in levels {
        check_level(p)?;
    }

    let mut sorted = levels.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    Ok(sorted)
}

fn check_level(p: f64) -> Result<(), PlotError> {
    if p.is_finite() && (0.0..=100.0).contains(&p) {
        Ok(())
    } else {
        Err(PlotError::InvalidPercentile(p))
    }
}

/// Percentile curve at a single level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub percentile: f64,
    pub values: Vec<f64>,
}

/// Symmetric confidence interval bracketing the central `level` percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    pub level: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Mean, percentile curves and confidence bands of one ensemble quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleSummary {
    pub mean: Vec<f64>,
    pub percentiles: Vec<Curve>,
    pub intervals: Vec<Band>,
}

/// Role of a curve inside an [`EnsembleSummary`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveRole {
    Mean,
    Percentile { index: usize, level: f64 },
    IntervalUpper { index: usize, level: f64 },
    IntervalLower { index: usize, level: f64 },
}

impl EnsembleSummary {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Curves in drawing order: percentiles, interval bounds (upper before
    /// lower), then the mean.
    pub fn curves(&self) -> Vec<(CurveRole, &[f64])> {
        let mut out = Vec::with_capacity(1 + self.percentiles.len() + 2 * self.intervals.len());

        for (index, curve) in self.percentiles.iter().enumerate() {
            out.push((
                CurveRole::Percentile {
                    index,
                    level: curve.percentile,
                },
                curve.values.as_slice(),
            ));
        }

        for (index, band) in self.intervals.iter().enumerate() {
            out.push((
                CurveRole::IntervalUpper {
                    index,
                    level: band.level,
                },
                band.upper.as_slice(),
            ));
            out.push((
                CurveRole::IntervalLower {
                    index,
                    level: band.level,
                },
                band.lower.as_slice(),
            ));
        }

        out.push((CurveRole::Mean, self.mean.as_slice()));
        out
    }
}

/// Percentile bounds `(50 - p/2, 50 + p/2)` of a `p` percent interval.
pub fn confidence_bounds(level: f64) -> (f64, f64) {
    (50.0 - level / 2.0, 50.0 + level / 2.0)
}

/// Linearly interpolated percentile of `values`, `p` in percent.
pub fn percentile(values: &[f64], p: f64) -> Result<f64, PlotError> {
    check_level(p)?;
    if values.is_empty() {
        return Err(PlotError::EmptyEnsemble {
            context: "percentile input",
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(PlotError::NonFinite {
            context: "percentile input",
        });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(percentile_of_sorted(&sorted, p))
}

fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }

    // clamped so rounding never steps past the neighbouring sample
    let frac = rank - lo as f64;
    (sorted[lo] + (sorted[hi] - sorted[lo]) * frac).clamp(sorted[lo], sorted[hi])
}

/// Ensemble lanes of `view` along `axis`, each sorted ascending.
///
/// One lane per index of the other axis, in that axis' order.
fn sorted_lanes(
    view: ArrayView2<'_, f64>,
    axis: Axis,
    context: &'static str,
) -> Result<Vec<Vec<f64>>, PlotError> {
    if view.len_of(axis) == 0 {
        return Err(PlotError::EmptyEnsemble { context });
    }
    if view.iter().any(|v| !v.is_finite()) {
        return Err(PlotError::NonFinite { context });
    }

    Ok(view
        .lanes(axis)
        .into_iter()
        .map(sorted_lane)
        .collect())
}

fn sorted_lane(lane: ArrayView1<'_, f64>) -> Vec<f64> {
    let mut values = lane.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Percentile `p` of every lane along the ensemble `axis`.
pub fn percentile_along(
    view: ArrayView2<'_, f64>,
    p: f64,
    axis: Axis,
) -> Result<Vec<f64>, PlotError> {
    check_level(p)?;
    let lanes = sorted_lanes(view, axis, "ensemble")?;
    Ok(lanes.iter().map(|lane| percentile_of_sorted(lane, p)).collect())
}

/// Mean of every lane along the ensemble `axis`.
pub fn mean_along(view: ArrayView2<'_, f64>, axis: Axis) -> Result<Vec<f64>, PlotError> {
    if view.len_of(axis) == 0 {
        return Err(PlotError::EmptyEnsemble { context: "ensemble" });
    }
    if view.iter().any(|v| !v.is_finite()) {
        return Err(PlotError::NonFinite { context: "ensemble" });
    }

    view.mean_axis(axis)
        .map(|mean| mean.to_vec())
        .ok_or(PlotError::EmptyEnsemble { context: "ensemble" })
}

/// Symmetric `level` percent confidence band along the ensemble `axis`.
pub fn confidence_band(
    view: ArrayView2<'_, f64>,
    level: f64,
    axis: Axis,
) -> Result<Band, PlotError> {
    check_level(level)?;
    let lanes = sorted_lanes(view, axis, "ensemble")?;
    Ok(band_from_lanes(&lanes, level))
}

fn band_from_lanes(lanes: &[Vec<f64>], level: f64) -> Band {
    let (lo, hi) = confidence_bounds(level);
    Band {
        level,
        lower: lanes.iter().map(|lane| percentile_of_sorted(lane, lo)).collect(),
        upper: lanes.iter().map(|lane| percentile_of_sorted(lane, hi)).collect(),
    }
}

/// Mean, requested percentiles and confidence bands of `view` along `axis`.
///
/// Lanes are sorted once and shared by every requested level.
pub fn summarize(
    view: ArrayView2<'_, f64>,
    axis: Axis,
    request: &BandRequest,
    context: &'static str,
) -> Result<EnsembleSummary, PlotError> {
    let lanes = sorted_lanes(view, axis, context)?;
    let samples = view.len_of(axis) as f64;

    let mean = lanes
        .iter()
        .map(|lane| lane.iter().sum::<f64>() / samples)
        .collect();

    let percentiles = request
        .percentiles()
        .iter()
        .map(|&p| Curve {
            percentile: p,
            values: lanes.iter().map(|lane| percentile_of_sorted(lane, p)).collect(),
        })
        .collect();

    let intervals = request
        .conf_intervals()
        .iter()
        .map(|&level| band_from_lanes(&lanes, level))
        .collect();

    Ok(EnsembleSummary {
        mean,
        percentiles,
        intervals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn percentile_interpolates_between_ranks() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_abs_diff_eq!(percentile(&v, 50.0).unwrap(), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(percentile(&v, 25.0).unwrap(), 1.75, epsilon = 1e-12);
        assert_abs_diff_eq!(percentile(&v, 0.0).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(percentile(&v, 100.0).unwrap(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn percentile_of_single_sample_is_that_sample() {
        assert_eq!(percentile(&[7.5], 13.0).unwrap(), 7.5);
    }

    #[test]
    fn percentile_rejects_out_of_range_levels() {
        assert!(matches!(
            percentile(&[1.0, 2.0], 100.5),
            Err(PlotError::InvalidPercentile(_))
        ));
        assert!(matches!(
            percentile(&[1.0, 2.0], -1.0),
            Err(PlotError::InvalidPercentile(_))
        ));
    }

    #[test]
    fn percentile_rejects_non_finite_values() {
        for values in [
            vec![1.0, f64::NAN],
            vec![f64::NEG_INFINITY, f64::INFINITY],
            vec![0.0, 2.0, f64::INFINITY],
        ] {
            assert!(matches!(
                percentile(&values, 50.0),
                Err(PlotError::NonFinite {
                    context: "percentile input"
                })
            ));
        }
    }

    #[test]
    fn confidence_bounds_are_symmetric_about_median() {
        assert_eq!(confidence_bounds(90.0), (5.0, 95.0));
        assert_eq!(confidence_bounds(0.0), (50.0, 50.0));
    }

    #[test]
    fn reduction_axis_selects_lanes() {
        // rows = sample points, columns = realizations
        let data = array![[1.0, 2.0, 3.0], [10.0, 20.0, 30.0]];
        let along_samples = percentile_along(data.view(), 50.0, Axis(1)).unwrap();
        assert_eq!(along_samples, vec![2.0, 20.0]);

        let along_points = mean_along(data.view(), Axis(0)).unwrap();
        assert_eq!(along_points, vec![5.5, 11.0, 16.5]);
    }

    #[test]
    fn band_brackets_median() {
        let data = array![[0.0, 1.0, 2.0, 3.0, 4.0]];
        let band = confidence_band(data.view(), 50.0, Axis(1)).unwrap();
        assert_abs_diff_eq!(band.lower[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(band.upper[0], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn request_sorts_and_dedups() {
        let req = BandRequest::new(&[95.0, 5.0, 50.0, 5.0], &[90.0, 50.0]).unwrap();
        assert_eq!(req.percentiles(), &[5.0, 50.0, 95.0]);
        assert_eq!(req.conf_intervals(), &[50.0, 90.0]);
        assert!(BandRequest::new(&[f64::NAN], &[]).is_err());
    }

    #[test]
    fn summarize_orders_curves() {
        let data = array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0]];
        let req = BandRequest::new(&[50.0], &[80.0]).unwrap();
        let summary = summarize(data.view(), Axis(1), &req, "test").unwrap();

        assert_eq!(summary.mean, vec![2.0, 4.0]);
        let roles: Vec<CurveRole> = summary.curves().iter().map(|(role, _)| *role).collect();
        assert_eq!(
            roles,
            vec![
                CurveRole::Percentile {
                    index: 0,
                    level: 50.0
                },
                CurveRole::IntervalUpper {
                    index: 0,
                    level: 80.0
                },
                CurveRole::IntervalLower {
                    index: 0,
                    level: 80.0
                },
                CurveRole::Mean,
            ]
        );
    }

    #[test]
    fn summarize_rejects_nan_and_empty() {
        let nan = array![[1.0, f64::NAN]];
        assert!(matches!(
            summarize(nan.view(), Axis(1), &BandRequest::default(), "wd"),
            Err(PlotError::NonFinite { context: "wd" })
        ));

        let empty = ndarray::Array2::<f64>::zeros((3, 0));
        assert!(matches!(
            summarize(empty.view(), Axis(1), &BandRequest::default(), "wd"),
            Err(PlotError::EmptyEnsemble { context: "wd" })
        ));
    }
}
