use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rotor_ensemble::export::{create_timestamped_run_dir, Manifest};
use rotor_ensemble::input::{
    load_json, CampbellInput, ForcedResponseInput, FrequencyResponseInput, TimeResponseInput,
};
use rotor_ensemble::report::{self, ReportOptions};
use rotor_ensemble::synth;
use rotor_ensemble::{
    AmplitudeUnits, BandRequest, CampbellResults, ForcedResponseResults,
    FrequencyResponseResults, OutputFormat, RenderConfig, SynthConfig, SynthEnsemble, TimePlot,
    TimePlotKind, TimeResponseResults,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Percentile bands, confidence intervals and mean curves for stochastic rotor ensembles"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Campbell diagram and log decrement of a speed sweep
    Campbell {
        #[command(flatten)]
        common: Common,
        /// Excitation harmonics drawn as `h x speed` lines
        #[arg(long, value_delimiter = ',', default_value = "1")]
        harmonics: Vec<f64>,
    },
    /// Frequency response magnitude and phase
    Frequency {
        #[command(flatten)]
        common: Common,
    },
    /// Time history (1d), orbit of one node (2d) or orbits along the rotor (3d)
    Time {
        #[command(flatten)]
        common: Common,
        #[arg(long, default_value = "1d")]
        kind: String,
        /// Degree of freedom for 1d plots
        #[arg(long)]
        dof: Option<usize>,
        /// Node for 2d orbits
        #[arg(long)]
        node: Option<usize>,
    },
    /// Unbalance response magnitude and phase of one degree of freedom
    Forced {
        #[command(flatten)]
        common: Common,
        #[arg(long)]
        dof: usize,
    },
    /// Every chart of a seeded synthetic ensemble
    Demo {
        #[command(flatten)]
        common: Common,
        /// Synthetic ensemble settings (TOML)
        #[arg(long)]
        synth: Option<PathBuf>,
        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Ensemble size
        #[arg(long)]
        samples: Option<usize>,
        #[arg(long, value_delimiter = ',', default_value = "1")]
        harmonics: Vec<f64>,
    },
}

#[derive(Debug, Args)]
struct Common {
    /// Ensemble document (JSON); ignored by `demo`
    #[arg(long)]
    input: Option<PathBuf>,

    /// Percentiles to draw, in percent
    #[arg(long = "percentile", value_delimiter = ',')]
    percentiles: Vec<f64>,

    /// Symmetric confidence intervals to draw, in percent
    #[arg(long = "conf-interval", value_delimiter = ',')]
    conf_intervals: Vec<f64>,

    /// Amplitude units: m, mic-pk-pk or db
    #[arg(long, default_value = "mic-pk-pk")]
    units: String,

    /// Render settings (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output base directory; each run gets a timestamped subdirectory
    #[arg(long, default_value = "output-rotor-ensemble")]
    output: PathBuf,

    /// Chart format: svg or png
    #[arg(long, default_value = "svg")]
    format: String,
}

impl Common {
    fn request(&self) -> anyhow::Result<BandRequest> {
        BandRequest::new(&self.percentiles, &self.conf_intervals)
            .context("invalid percentile or confidence interval")
    }

    fn options(&self) -> anyhow::Result<ReportOptions> {
        let render = match &self.config {
            Some(path) => RenderConfig::from_toml_file(path)
                .with_context(|| format!("failed to load render config: {}", path.display()))?,
            None => RenderConfig::default(),
        };
        let format: OutputFormat = self.format.parse()?;
        Ok(ReportOptions {
            format,
            render,
            units: AmplitudeUnits::parse(&self.units),
        })
    }

    fn input(&self) -> anyhow::Result<&Path> {
        self.input
            .as_deref()
            .context("--input is required for this command")
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Inputs of one run, loaded and checked before anything touches the output
/// directory.
enum Job {
    Campbell(CampbellResults, Vec<f64>),
    Frequency(FrequencyResponseResults),
    Time(TimeResponseResults, TimePlot),
    Forced(ForcedResponseResults, usize),
    Demo(SynthEnsemble, Vec<f64>),
}

fn read_input<T: serde::de::DeserializeOwned>(common: &Common) -> anyhow::Result<T> {
    let path = common.input()?;
    load_json(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_job(command: &Command) -> anyhow::Result<Job> {
    let job = match command {
        Command::Campbell { common, harmonics } => {
            let doc: CampbellInput = read_input(common)?;
            Job::Campbell(CampbellResults::try_from(doc)?, harmonics.clone())
        }
        Command::Frequency { common } => {
            let doc: FrequencyResponseInput = read_input(common)?;
            Job::Frequency(FrequencyResponseResults::try_from(doc)?)
        }
        Command::Time {
            common,
            kind,
            dof,
            node,
        } => {
            let selection = TimePlot::from_parts(kind.parse::<TimePlotKind>()?, *dof, *node)?;
            let doc: TimeResponseInput = read_input(common)?;
            let results = TimeResponseResults::try_from(doc)?;
            results.check(selection)?;
            Job::Time(results, selection)
        }
        Command::Forced { common, dof } => {
            let doc: ForcedResponseInput = read_input(common)?;
            let results = ForcedResponseResults::try_from(doc)?;
            results.check_dof(*dof)?;
            Job::Forced(results, *dof)
        }
        Command::Demo {
            synth: synth_path,
            seed,
            samples,
            harmonics,
            ..
        } => {
            let mut cfg = match synth_path {
                Some(path) => SynthConfig::from_toml_file(path)
                    .with_context(|| format!("failed to load synth config: {}", path.display()))?,
                None => SynthConfig::default(),
            };
            if let Some(v) = seed {
                cfg.seed = *v;
            }
            if let Some(v) = samples {
                cfg.samples = *v;
            }
            Job::Demo(synth::generate(&cfg)?, harmonics.clone())
        }
    };
    Ok(job)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let (kind, common) = match &cli.command {
        Command::Campbell { common, .. } => ("campbell", common),
        Command::Frequency { common } => ("frequency", common),
        Command::Time { common, .. } => ("time", common),
        Command::Forced { common, .. } => ("forced", common),
        Command::Demo { common, .. } => ("demo", common),
    };

    let request = common.request()?;
    let opts = common.options()?;
    let job = load_job(&cli.command)?;

    let run_dir = create_timestamped_run_dir(&common.output)
        .with_context(|| format!("failed to create run directory under {}", common.output.display()))?;
    let mut manifest = Manifest::new(kind, &request);
    manifest.units = Some(opts.units.to_string());

    match &job {
        Job::Campbell(results, harmonics) => {
            report::write_campbell(results, &request, harmonics, &opts, &run_dir, &mut manifest)?;
        }
        Job::Frequency(results) => {
            report::write_frequency_response(results, &request, &opts, &run_dir, &mut manifest)?;
        }
        Job::Time(results, selection) => {
            report::write_time_response(
                results,
                *selection,
                &request,
                &opts,
                &run_dir,
                &mut manifest,
            )?;
        }
        Job::Forced(results, dof) => {
            report::write_forced_response(
                results,
                *dof,
                &request,
                &opts,
                &run_dir,
                &mut manifest,
            )?;
        }
        Job::Demo(ensemble, harmonics) => {
            report::write_demo(ensemble, &request, harmonics, &opts, &run_dir, &mut manifest)?;
        }
    }

    let manifest_path = report::finish(&run_dir, &manifest)?;

    println!("Run directory: {}", run_dir.display());
    println!("Files written: {}", manifest.files.len());
    println!("Manifest: {}", manifest_path.display());
    Ok(())
}
