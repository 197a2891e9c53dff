//! rotor-ensemble - statistical charts for stochastic rotordynamics
//!
//! Takes ensembles of simulated rotor outputs (damped natural frequencies,
//! log decrements, frequency, time and unbalance responses) and summarizes
//! them across the ensemble axis as percentile curves, symmetric confidence
//! intervals and mean curves, then renders those summaries as SVG or PNG
//! charts.

pub mod chart;
pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod palette;
pub mod render;
pub mod report;
pub mod results;
pub mod stats;
pub mod synth;

// Re-export main types
pub use chart::{Figure, Figure3d, Grid};
pub use config::RenderConfig;
pub use error::PlotError;
pub use render::OutputFormat;
pub use results::{
    AmplitudeUnits, CampbellResults, ForcedResponseResults, FrequencyResponseResults, TimeFigure,
    TimePlot, TimePlotKind, TimeResponseResults,
};
pub use stats::{BandRequest, EnsembleSummary};
pub use synth::{SynthConfig, SynthEnsemble};
