use std::fs;

use approx::assert_abs_diff_eq;
use rotor_ensemble::export::{create_timestamped_run_dir, write_summary_csv, Manifest};
use rotor_ensemble::input::{load_json, CampbellInput, TimeResponseInput};
use rotor_ensemble::report::{self, ReportOptions};
use rotor_ensemble::synth::{self, SynthConfig};
use rotor_ensemble::{
    BandRequest, CampbellResults, PlotError, TimeFigure, TimePlot, TimeResponseResults,
};

fn small_config() -> SynthConfig {
    SynthConfig {
        samples: 32,
        modes: 2,
        nodes: 3,
        speed_points: 6,
        frequency_points: 11,
        time_points: 20,
        ..SynthConfig::default()
    }
}

#[test]
fn synthetic_campbell_bands_bracket_the_median() {
    let ensemble = synth::generate(&small_config()).unwrap();
    let request = BandRequest::new(&[50.0], &[90.0]).unwrap();

    for mode in 0..ensemble.campbell.n_modes() {
        let s = ensemble.campbell.nat_freq_summary(mode, &request).unwrap();
        let median = &s.percentiles[0].values;
        let band = &s.intervals[0];
        for i in 0..s.len() {
            assert!(band.lower[i] <= median[i] && median[i] <= band.upper[i]);
        }
    }
}

#[test]
fn campbell_document_loads_and_plots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("campbell.json");
    let doc = CampbellInput {
        speed_range: vec![0.0, 100.0],
        wd: vec![vec![vec![10.0, 12.0, 14.0], vec![11.0, 13.0, 15.0]]],
        log_dec: vec![vec![vec![0.1, 0.2, 0.3], vec![0.1, 0.2, 0.3]]],
    };
    fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

    let loaded: CampbellInput = load_json(&path).unwrap();
    let results = CampbellResults::try_from(loaded).unwrap();
    let request = BandRequest::new(&[50.0], &[]).unwrap();
    let grid = results.plot(&request, &[1.0]).unwrap();

    let nat_freq = &grid.rows[0][0];
    let mean = nat_freq
        .traces
        .iter()
        .find(|t| t.label.as_deref() == Some("Mean - Mode 1"))
        .unwrap();
    assert_abs_diff_eq!(mean.points[1].1, 13.0, epsilon = 1e-12);
    assert_eq!(nat_freq.traces[0].label.as_deref(), Some("1x"));
}

#[test]
fn orbit_requests_are_checked_against_the_node_list() {
    let doc = TimeResponseInput {
        time_range: vec![0.0, 0.5, 1.0],
        yout: vec![
            vec![vec![0.0; 8], vec![1.0; 8], vec![0.0; 8]],
            vec![vec![0.0; 8], vec![2.0; 8], vec![0.0; 8]],
        ],
        xout: Vec::new(),
        nodes_list: vec![1],
        nodes_pos: vec![0.0, 0.75],
    };
    let results = TimeResponseResults::try_from(doc).unwrap();
    let request = BandRequest::default();

    assert!(matches!(
        results.plot(TimePlot::Orbit2d { node: 0 }, &request),
        Err(PlotError::InvalidNode(0))
    ));

    match results.plot(TimePlot::Orbit3d, &request).unwrap() {
        TimeFigure::Spatial(fig) => {
            let mean = fig.traces.last().unwrap();
            assert_eq!(mean.points[1], (0.75, 1.5, 1.5));
        }
        TimeFigure::Flat(_) => panic!("3d orbit produced a flat figure"),
    }
}

#[test]
fn summary_csv_matches_forced_summary() {
    let ensemble = synth::generate(&small_config()).unwrap();
    let request = BandRequest::new(&[5.0, 95.0], &[50.0]).unwrap();
    let summary = ensemble.forced.magnitude_summary(4, &request).unwrap();

    let base = tempfile::tempdir().unwrap();
    let dir = create_timestamped_run_dir(base.path()).unwrap();
    let path = dir.join("forced_magnitude_dof4.csv");
    write_summary_csv(&path, "frequency", ensemble.forced.frequency_range(), &summary).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(
        headers,
        ["frequency", "mean", "p5", "p95", "ci50_lower", "ci50_upper"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 11);
    let last_mean: f64 = rows[10][1].parse().unwrap();
    assert_abs_diff_eq!(last_mean, summary.mean[10], epsilon = 1e-9);
}

#[test]
#[ignore = "requires system fonts"]
fn demo_run_writes_charts_csvs_and_manifest() {
    let base = tempfile::tempdir().unwrap();
    let run_dir = create_timestamped_run_dir(base.path()).unwrap();
    let request = BandRequest::new(&[50.0], &[90.0]).unwrap();
    let mut manifest = Manifest::new("demo", &request);

    let ensemble = synth::generate(&small_config()).unwrap();
    report::write_demo(
        &ensemble,
        &request,
        &[1.0, 2.0],
        &ReportOptions::default(),
        &run_dir,
        &mut manifest,
    )
    .unwrap();
    let manifest_path = report::finish(&run_dir, &manifest).unwrap();

    assert!(manifest_path.exists());
    for file in &manifest.files {
        assert!(run_dir.join(file).exists(), "missing {file}");
    }
    assert!(manifest.files.iter().any(|f| f == "campbell.svg"));
    assert!(manifest.files.iter().any(|f| f == "orbit_3d.svg"));
    assert!(manifest.files.iter().any(|f| f == "forced_dof4.svg"));
}
