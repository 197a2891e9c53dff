//! JSON ensemble documents
//!
//! Arrays are plain nested lists in the same axis order as the result
//! types, so a document written by any numerics stack (`tolist()` and
//! friends) loads without conversion.

use std::fs;
use std::path::Path;

use ndarray::{Array2, Array3};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::results::{
    CampbellResults, ForcedResponseResults, FrequencyResponseResults, TimeResponseResults,
};
use crate::PlotError;

type Nested2 = Vec<Vec<f64>>;
type Nested3 = Vec<Vec<Vec<f64>>>;

/// `wd` and `log_dec` are `[mode][speed][sample]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampbellInput {
    pub speed_range: Vec<f64>,
    pub wd: Nested3,
    pub log_dec: Nested3,
}

/// `magnitude` and `phase` are `[frequency][sample]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyResponseInput {
    pub speed_range: Vec<f64>,
    pub magnitude: Nested2,
    pub phase: Nested2,
}

/// `yout` and `xout` are `[sample][time][dof]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeResponseInput {
    pub time_range: Vec<f64>,
    pub yout: Nested3,
    #[serde(default)]
    pub xout: Nested3,
    pub nodes_list: Vec<usize>,
    pub nodes_pos: Vec<f64>,
}

/// `magnitude` and `phase` are `[sample][frequency][dof]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedResponseInput {
    pub frequency_range: Vec<f64>,
    pub magnitude: Nested3,
    pub phase: Nested3,
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, PlotError> {
    let raw = fs::read_to_string(path)?;
    let doc = serde_json::from_str(&raw)?;
    debug!(path = %path.display(), bytes = raw.len(), "loaded ensemble document");
    Ok(doc)
}

pub fn array2(context: &'static str, rows: &[Vec<f64>]) -> Result<Array2<f64>, PlotError> {
    let ncols = rows.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(rows.len() * ncols);
    for row in rows {
        if row.len() != ncols {
            return Err(PlotError::ShapeMismatch {
                context,
                expected: ncols,
                got: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }

    Array2::from_shape_vec((rows.len(), ncols), flat).map_err(|_| PlotError::ShapeMismatch {
        context,
        expected: rows.len() * ncols,
        got: rows.len(),
    })
}

pub fn array3(context: &'static str, blocks: &[Vec<Vec<f64>>]) -> Result<Array3<f64>, PlotError> {
    let nrows = blocks.first().map_or(0, Vec::len);
    let ncols = blocks
        .first()
        .and_then(|b| b.first())
        .map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(blocks.len() * nrows * ncols);
    for block in blocks {
        if block.len() != nrows {
            return Err(PlotError::ShapeMismatch {
                context,
                expected: nrows,
                got: block.len(),
            });
        }
        for row in block {
            if row.len() != ncols {
                return Err(PlotError::ShapeMismatch {
                    context,
                    expected: ncols,
                    got: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
    }

    Array3::from_shape_vec((blocks.len(), nrows, ncols), flat).map_err(|_| {
        PlotError::ShapeMismatch {
            context,
            expected: blocks.len() * nrows * ncols,
            got: blocks.len(),
        }
    })
}

impl TryFrom<CampbellInput> for CampbellResults {
    type Error = PlotError;

    fn try_from(doc: CampbellInput) -> Result<Self, Self::Error> {
        let wd = array3("campbell wd", &doc.wd)?;
        let log_dec = array3("campbell log_dec", &doc.log_dec)?;
        CampbellResults::new(doc.speed_range, wd, log_dec)
    }
}

impl TryFrom<FrequencyResponseInput> for FrequencyResponseResults {
    type Error = PlotError;

    fn try_from(doc: FrequencyResponseInput) -> Result<Self, Self::Error> {
        let magnitude = array2("frequency response magnitude", &doc.magnitude)?;
        let phase = array2("frequency response phase", &doc.phase)?;
        FrequencyResponseResults::new(doc.speed_range, magnitude, phase)
    }
}

impl TryFrom<TimeResponseInput> for TimeResponseResults {
    type Error = PlotError;

    fn try_from(doc: TimeResponseInput) -> Result<Self, Self::Error> {
        let yout = array3("time response yout", &doc.yout)?;
        let xout = array3("time response xout", &doc.xout)?;
        TimeResponseResults::new(doc.time_range, yout, xout, doc.nodes_list, doc.nodes_pos)
    }
}

impl TryFrom<ForcedResponseInput> for ForcedResponseResults {
    type Error = PlotError;

    fn try_from(doc: ForcedResponseInput) -> Result<Self, Self::Error> {
        let magnitude = array3("forced response magnitude", &doc.magnitude)?;
        let phase = array3("forced response phase", &doc.phase)?;
        ForcedResponseResults::new(magnitude, phase, doc.frequency_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn ragged_rows_are_rejected() {
        let err = array2("m", &[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            PlotError::ShapeMismatch {
                context: "m",
                expected: 2,
                got: 1
            }
        ));

        let err = array3("y", &[vec![vec![1.0]], vec![vec![1.0], vec![2.0]]]).unwrap_err();
        assert!(matches!(err, PlotError::ShapeMismatch { expected: 1, got: 2, .. }));
    }

    #[test]
    fn nested_lists_keep_axis_order() {
        let a = array3(
            "wd",
            &[
                vec![vec![1.0, 2.0], vec![3.0, 4.0]],
                vec![vec![5.0, 6.0], vec![7.0, 8.0]],
            ],
        )
        .unwrap();
        assert_eq!(a.dim(), (2, 2, 2));
        assert_eq!(a[[1, 0, 1]], 6.0);
        assert_eq!(array2("e", &[]).unwrap().dim(), (0, 0));
    }

    #[test]
    fn loads_frequency_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"speed_range": [1.0, 2.0],
                "magnitude": [[1.0, 2.0, 3.0], [2.0, 3.0, 4.0]],
                "phase": [[0.0, 0.0, 0.0], [0.1, 0.2, 0.3]]}}"#
        )
        .unwrap();

        let doc: FrequencyResponseInput = load_json(file.path()).unwrap();
        let results = FrequencyResponseResults::try_from(doc).unwrap();
        assert_eq!(results.speed_range(), &[1.0, 2.0]);
    }

    #[test]
    fn time_document_without_states_loads() {
        let doc = TimeResponseInput {
            time_range: vec![0.0, 0.1],
            yout: vec![vec![vec![0.0; 4], vec![1.0; 4]]],
            xout: Vec::new(),
            nodes_list: vec![0],
            nodes_pos: vec![0.0],
        };
        let results = TimeResponseResults::try_from(doc).unwrap();
        assert_eq!(results.n_dofs(), 4);
        assert!(results.xout().is_empty());
    }
}
