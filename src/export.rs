use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::Writer;
use serde::Serialize;
use tracing::info;

use crate::error::ensure_len;
use crate::stats::{BandRequest, EnsembleSummary};
use crate::PlotError;

pub const OUTPUT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub schema_version: String,
    pub kind: String,
    pub generated_at: String,
    pub request: BandRequest,
    pub units: Option<String>,
    pub files: Vec<String>,
}

impl Manifest {
    pub fn new(kind: impl Into<String>, request: &BandRequest) -> Self {
        Self {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            kind: kind.into(),
            generated_at: Utc::now().to_rfc3339(),
            request: request.clone(),
            units: None,
            files: Vec::new(),
        }
    }

    /// Records `path` relative to the run directory when possible. A file
    /// rewritten later in the run is listed once.
    pub fn add_file(&mut self, run_dir: &Path, path: &Path) {
        let rel = path.strip_prefix(run_dir).unwrap_or(path).display().to_string();
        if !self.files.contains(&rel) {
            self.files.push(rel);
        }
    }
}

/// Creates `<base>/<YYYYmmdd-HHMMSS>`, suffixed `-NN` when that already
/// exists.
pub fn create_timestamped_run_dir(base: &Path) -> Result<PathBuf, PlotError> {
    fs::create_dir_all(base)?;

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let mut run_dir = base.join(&timestamp);
    let mut counter = 1_u32;

    while run_dir.exists() {
        run_dir = base.join(format!("{timestamp}-{counter:02}"));
        counter += 1;
    }

    fs::create_dir_all(&run_dir)?;
    Ok(run_dir)
}

fn fmt_f64(value: f64) -> String {
    format!("{value:.10}")
}

fn fmt_level(level: f64) -> String {
    format!("{level}")
}

/// Column names of a summary CSV, in the order the rows are written.
pub fn summary_header(abscissa_name: &str, summary: &EnsembleSummary) -> Vec<String> {
    let mut header = vec![abscissa_name.to_string(), "mean".to_string()];
    header.extend(
        summary
            .percentiles
            .iter()
            .map(|c| format!("p{}", fmt_level(c.percentile))),
    );
    for band in &summary.intervals {
        let level = fmt_level(band.level);
        header.push(format!("ci{level}_lower"));
        header.push(format!("ci{level}_upper"));
    }
    header
}

pub fn write_summary_csv(
    path: &Path,
    abscissa_name: &str,
    abscissa: &[f64],
    summary: &EnsembleSummary,
) -> Result<(), PlotError> {
    ensure_len("summary mean", abscissa.len(), summary.mean.len())?;
    for curve in &summary.percentiles {
        ensure_len("summary percentile", abscissa.len(), curve.values.len())?;
    }
    for band in &summary.intervals {
        ensure_len("summary interval lower", abscissa.len(), band.lower.len())?;
        ensure_len("summary interval upper", abscissa.len(), band.upper.len())?;
    }

    let mut writer = Writer::from_path(path)?;
    writer.write_record(summary_header(abscissa_name, summary))?;

    for (idx, x) in abscissa.iter().enumerate() {
        let mut record = vec![fmt_f64(*x), fmt_f64(summary.mean[idx])];
        record.extend(summary.percentiles.iter().map(|c| fmt_f64(c.values[idx])));
        for band in &summary.intervals {
            record.push(fmt_f64(band.lower[idx]));
            record.push(fmt_f64(band.upper[idx]));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = abscissa.len(), "wrote summary csv");
    Ok(())
}

pub fn write_manifest(run_dir: &Path, manifest: &Manifest) -> Result<PathBuf, PlotError> {
    let path = run_dir.join("manifest.json");
    let payload = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, payload)?;
    Ok(path)
}
