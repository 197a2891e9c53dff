//! Run-directory writers
//!
//! Each writer renders the charts of one result kind, dumps the underlying
//! summaries as CSV and records every file in the run [`Manifest`].

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::RenderConfig;
use crate::export::{write_manifest, write_summary_csv, Manifest};
use crate::render::{render_figure, render_figure3d, render_grid, OutputFormat};
use crate::results::time::DOFS_PER_NODE;
use crate::results::{
    AmplitudeUnits, CampbellResults, ForcedResponseResults, FrequencyResponseResults, TimeFigure,
    TimePlot, TimeResponseResults,
};
use crate::stats::{BandRequest, EnsembleSummary};
use crate::synth::SynthEnsemble;
use crate::PlotError;

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub format: OutputFormat,
    pub render: RenderConfig,
    pub units: AmplitudeUnits,
}

struct RunFiles<'a> {
    dir: &'a Path,
    format: OutputFormat,
    manifest: &'a mut Manifest,
}

impl RunFiles<'_> {
    fn chart(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.{}", self.format.extension()))
    }

    fn csv(
        &mut self,
        stem: &str,
        abscissa_name: &str,
        abscissa: &[f64],
        summary: &EnsembleSummary,
    ) -> Result<(), PlotError> {
        let path = self.dir.join(format!("{stem}.csv"));
        write_summary_csv(&path, abscissa_name, abscissa, summary)?;
        self.manifest.add_file(self.dir, &path);
        Ok(())
    }

    fn record(&mut self, path: &Path) {
        self.manifest.add_file(self.dir, path);
    }
}

pub fn write_campbell(
    results: &CampbellResults,
    request: &BandRequest,
    harmonics: &[f64],
    opts: &ReportOptions,
    run_dir: &Path,
    manifest: &mut Manifest,
) -> Result<(), PlotError> {
    let mut files = RunFiles {
        dir: run_dir,
        format: opts.format,
        manifest,
    };

    let grid = results.plot(request, harmonics)?;
    let path = files.chart("campbell");
    render_grid(&grid, &opts.render, &path)?;
    files.record(&path);

    for mode in 0..results.n_modes() {
        let wd = results.nat_freq_summary(mode, request)?;
        files.csv(
            &format!("campbell_wd_mode{}", mode + 1),
            "speed",
            results.speed_range(),
            &wd,
        )?;
        let log_dec = results.log_dec_summary(mode, request)?;
        files.csv(
            &format!("campbell_log_dec_mode{}", mode + 1),
            "speed",
            results.speed_range(),
            &log_dec,
        )?;
    }

    info!(modes = results.n_modes(), "campbell report written");
    Ok(())
}

pub fn write_frequency_response(
    results: &FrequencyResponseResults,
    request: &BandRequest,
    opts: &ReportOptions,
    run_dir: &Path,
    manifest: &mut Manifest,
) -> Result<(), PlotError> {
    let mut files = RunFiles {
        dir: run_dir,
        format: opts.format,
        manifest,
    };

    let grid = results.plot(request, opts.units)?;
    let path = files.chart("frequency_response");
    render_grid(&grid, &opts.render, &path)?;
    files.record(&path);

    let magnitude = results.magnitude_summary(request)?;
    files.csv(
        "frequency_magnitude",
        "frequency",
        results.speed_range(),
        &magnitude,
    )?;
    let phase = results.phase_summary(request)?;
    files.csv("frequency_phase", "frequency", results.speed_range(), &phase)?;

    info!("frequency response report written");
    Ok(())
}

pub fn write_time_response(
    results: &TimeResponseResults,
    selection: TimePlot,
    request: &BandRequest,
    opts: &ReportOptions,
    run_dir: &Path,
    manifest: &mut Manifest,
) -> Result<(), PlotError> {
    let mut files = RunFiles {
        dir: run_dir,
        format: opts.format,
        manifest,
    };

    let (stem, csv_nodes, csv_dof) = match selection {
        TimePlot::Time { dof } => (format!("time_dof{dof}"), Vec::new(), Some(dof)),
        TimePlot::Orbit2d { node } => (format!("orbit_node{node}"), vec![node], None),
        TimePlot::Orbit3d => ("orbit_3d".to_string(), results.nodes_list().to_vec(), None),
    };

    let path = files.chart(&stem);
    match results.plot(selection, request)? {
        TimeFigure::Flat(fig) => render_figure(&fig, &opts.render, &path)?,
        TimeFigure::Spatial(fig) => render_figure3d(&fig, &opts.render, &path)?,
    }
    files.record(&path);

    if let Some(dof) = csv_dof {
        let summary = results.dof_summary(dof, request)?;
        files.csv(&stem, "time", results.time_range(), &summary)?;
    }
    for node in csv_nodes {
        let sx = results.dof_summary(DOFS_PER_NODE * node, request)?;
        let sy = results.dof_summary(DOFS_PER_NODE * node + 1, request)?;
        files.csv(
            &format!("orbit_node{node}_x"),
            "time",
            results.time_range(),
            &sx,
        )?;
        files.csv(
            &format!("orbit_node{node}_y"),
            "time",
            results.time_range(),
            &sy,
        )?;
    }

    info!(?selection, "time response report written");
    Ok(())
}

pub fn write_forced_response(
    results: &ForcedResponseResults,
    dof: usize,
    request: &BandRequest,
    opts: &ReportOptions,
    run_dir: &Path,
    manifest: &mut Manifest,
) -> Result<(), PlotError> {
    let mut files = RunFiles {
        dir: run_dir,
        format: opts.format,
        manifest,
    };

    let grid = results.plot(dof, request, opts.units)?;
    let path = files.chart(&format!("forced_dof{dof}"));
    render_grid(&grid, &opts.render, &path)?;
    files.record(&path);

    let magnitude = results.magnitude_summary(dof, request)?;
    files.csv(
        &format!("forced_magnitude_dof{dof}"),
        "frequency",
        results.frequency_range(),
        &magnitude,
    )?;
    let phase = results.phase_summary(dof, request)?;
    files.csv(
        &format!("forced_phase_dof{dof}"),
        "frequency",
        results.frequency_range(),
        &phase,
    )?;

    info!(dof, "forced response report written");
    Ok(())
}

/// Every chart of a synthetic ensemble: Campbell, frequency response, the
/// time history and orbit of the middle node, the 3D orbits and the forced
/// response of the middle node's x direction.
pub fn write_demo(
    ensemble: &SynthEnsemble,
    request: &BandRequest,
    harmonics: &[f64],
    opts: &ReportOptions,
    run_dir: &Path,
    manifest: &mut Manifest,
) -> Result<(), PlotError> {
    let nodes = ensemble.time.nodes_list();
    let mid = nodes.get(nodes.len() / 2).copied().unwrap_or(0);
    let dof = DOFS_PER_NODE * mid;

    write_campbell(&ensemble.campbell, request, harmonics, opts, run_dir, manifest)?;
    write_frequency_response(&ensemble.frequency, request, opts, run_dir, manifest)?;
    for selection in [
        TimePlot::Time { dof },
        TimePlot::Orbit2d { node: mid },
        TimePlot::Orbit3d,
    ] {
        write_time_response(&ensemble.time, selection, request, opts, run_dir, manifest)?;
    }
    write_forced_response(&ensemble.forced, dof, request, opts, run_dir, manifest)?;
    Ok(())
}

/// Writes `manifest.json` into the run directory.
pub fn finish(run_dir: &Path, manifest: &Manifest) -> Result<PathBuf, PlotError> {
    let path = write_manifest(run_dir, manifest)?;
    info!(
        path = %path.display(),
        files = manifest.files.len(),
        "run complete"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn failed_chart_stops_before_any_csv() {
        let dir = tempfile::tempdir().unwrap();
        let results = FrequencyResponseResults::new(
            vec![1.0, 2.0],
            Array2::from_elem((2, 3), 1.0),
            Array2::zeros((2, 3)),
        )
        .unwrap();
        let mut manifest = Manifest::new("frequency", &BandRequest::default());

        // a directory named like a chart blocks the chart file itself
        std::fs::create_dir(dir.path().join("frequency_response.svg")).unwrap();
        let err = write_frequency_response(
            &results,
            &BandRequest::default(),
            &ReportOptions::default(),
            dir.path(),
            &mut manifest,
        );
        assert!(err.is_err());
        assert!(manifest.files.is_empty());
        assert!(!dir.path().join("frequency_magnitude.csv").exists());
    }
}
