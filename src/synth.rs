//! Seeded synthetic ensembles
//!
//! A Jeffcott-style rotor with perturbed stiffness and damping, evaluated in
//! closed form. Each sample draws one stiffness and one damping factor from
//! normal distributions; every result kind is then derived from the same
//! draws, so the four ensembles of one [`SynthEnsemble`] describe the same
//! population of rotors.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fs;
use std::path::Path;

use ndarray::{Array2, Array3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::results::time::DOFS_PER_NODE;
use crate::results::{
    CampbellResults, ForcedResponseResults, FrequencyResponseResults, TimeResponseResults,
};
use crate::PlotError;

/// Perturbation factors never drop below this, keeping every rotor stable.
const MIN_FACTOR: f64 = 0.05;
const MAX_DAMPING_RATIO: f64 = 0.99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub seed: u64,
    pub samples: usize,
    /// Whirl modes in the Campbell diagram; consecutive pairs are the
    /// backward/forward branches of one bending mode.
    pub modes: usize,
    pub nodes: usize,
    /// Shaft length [m]
    pub shaft_length: f64,
    /// Modal mass [kg]
    pub mass: f64,
    /// Nominal stiffness [N/m]
    pub stiffness: f64,
    /// Nominal damping [N s/m]
    pub damping: f64,
    /// Gyroscopic split per unit speed
    pub gyroscopic: f64,
    /// Unbalance [kg m]
    pub unbalance: f64,
    /// Relative standard deviation of stiffness
    pub stiffness_spread: f64,
    /// Relative standard deviation of damping
    pub damping_spread: f64,
    /// Upper end of the Campbell sweep [rad/s]
    pub speed_max: f64,
    pub speed_points: usize,
    /// Upper end of the frequency sweep [rad/s]
    pub frequency_max: f64,
    pub frequency_points: usize,
    /// Speed of the time-domain run [rad/s]
    pub rotor_speed: f64,
    /// Duration of the time-domain run [s]
    pub duration: f64,
    pub time_points: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            samples: 64,
            modes: 4,
            nodes: 5,
            shaft_length: 1.5,
            mass: 30.0,
            stiffness: 3.0e6,
            damping: 600.0,
            gyroscopic: 0.4,
            unbalance: 1.0e-4,
            stiffness_spread: 0.08,
            damping_spread: 0.15,
            speed_max: 1000.0,
            speed_points: 41,
            frequency_max: 1000.0,
            frequency_points: 201,
            rotor_speed: 250.0,
            duration: 0.1,
            time_points: 400,
        }
    }
}

impl SynthConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, PlotError> {
        let raw = fs::read_to_string(path)?;
        let cfg: SynthConfig = toml::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PlotError> {
        if self.samples == 0 {
            return Err(PlotError::InvalidConfig("samples must be > 0".to_string()));
        }
        if self.modes == 0 || self.nodes == 0 {
            return Err(PlotError::InvalidConfig(
                "modes and nodes must be > 0".to_string(),
            ));
        }
        if self.speed_points < 2 || self.frequency_points < 2 || self.time_points < 2 {
            return Err(PlotError::InvalidConfig(
                "speed_points, frequency_points and time_points must be >= 2".to_string(),
            ));
        }

        let positive = [
            ("shaft_length", self.shaft_length),
            ("mass", self.mass),
            ("stiffness", self.stiffness),
            ("speed_max", self.speed_max),
            ("frequency_max", self.frequency_max),
            ("duration", self.duration),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlotError::InvalidConfig(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }

        let non_negative = [
            ("damping", self.damping),
            ("gyroscopic", self.gyroscopic),
            ("unbalance", self.unbalance),
            ("rotor_speed", self.rotor_speed),
            ("stiffness_spread", self.stiffness_spread),
            ("damping_spread", self.damping_spread),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PlotError::InvalidConfig(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }

        Ok(())
    }

    fn node_positions(&self) -> Vec<f64> {
        if self.nodes == 1 {
            return vec![0.5 * self.shaft_length];
        }
        let step = self.shaft_length / (self.nodes - 1) as f64;
        (0..self.nodes).map(|n| n as f64 * step).collect()
    }

    /// Lateral mode shape at `pos` and its slope; the supports are flexible
    /// so the shaft ends still move.
    fn mode_shape(&self, pos: f64) -> (f64, f64) {
        let arg = PI * pos / self.shaft_length;
        (0.2 + 0.8 * arg.sin(), 0.8 * PI / self.shaft_length * arg.cos())
    }
}

/// One rotor realization.
#[derive(Debug, Clone, Copy)]
struct Rotor {
    mass: f64,
    stiffness: f64,
    damping: f64,
}

impl Rotor {
    fn natural_frequency(&self) -> f64 {
        (self.stiffness / self.mass).sqrt()
    }

    /// Receptance magnitude and phase at `w`.
    fn receptance(&self, w: f64) -> (f64, f64) {
        let re = self.stiffness - self.mass * w * w;
        let im = self.damping * w;
        (1.0 / re.hypot(im), -im.atan2(re))
    }
}

/// Damped natural frequency and log decrement of whirl mode `mode`.
fn whirl_mode(rotor: &Rotor, gyroscopic: f64, mode: usize, speed: f64) -> (f64, f64) {
    let order = (mode / 2 + 1) as f64;
    let wn = rotor.natural_frequency() * order * order;
    let half = 0.5 * gyroscopic * speed * order;
    let w = if mode % 2 == 0 {
        wn.hypot(half) - half
    } else {
        wn.hypot(half) + half
    };

    let zeta = (rotor.damping / (2.0 * rotor.mass * w)).min(MAX_DAMPING_RATIO);
    let root = (1.0 - zeta * zeta).sqrt();
    (w * root, 2.0 * PI * zeta / root)
}

#[derive(Debug, Clone)]
pub struct SynthEnsemble {
    pub campbell: CampbellResults,
    pub frequency: FrequencyResponseResults,
    pub time: TimeResponseResults,
    pub forced: ForcedResponseResults,
}

fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    let step = (end - start) / (points - 1) as f64;
    (0..points).map(|i| start + i as f64 * step).collect()
}

fn draw_rotors(cfg: &SynthConfig) -> Result<Vec<Rotor>, PlotError> {
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
    let k_noise = Normal::new(0.0, cfg.stiffness_spread)
        .map_err(|e| PlotError::InvalidConfig(format!("stiffness_spread: {e}")))?;
    let c_noise = Normal::new(0.0, cfg.damping_spread)
        .map_err(|e| PlotError::InvalidConfig(format!("damping_spread: {e}")))?;

    Ok((0..cfg.samples)
        .map(|_| {
            let k = (1.0 + k_noise.sample(&mut rng)).max(MIN_FACTOR);
            let c = (1.0 + c_noise.sample(&mut rng)).max(MIN_FACTOR);
            Rotor {
                mass: cfg.mass,
                stiffness: cfg.stiffness * k,
                damping: cfg.damping * c,
            }
        })
        .collect())
}

pub fn generate(cfg: &SynthConfig) -> Result<SynthEnsemble, PlotError> {
    cfg.validate()?;
    let rotors = draw_rotors(cfg)?;

    let campbell = campbell(cfg, &rotors)?;
    let frequency = frequency_response(cfg, &rotors)?;
    let time = time_response(cfg, &rotors)?;
    let forced = forced_response(cfg, &rotors)?;

    info!(
        seed = cfg.seed,
        samples = cfg.samples,
        modes = cfg.modes,
        nodes = cfg.nodes,
        "generated synthetic ensemble"
    );

    Ok(SynthEnsemble {
        campbell,
        frequency,
        time,
        forced,
    })
}

fn campbell(cfg: &SynthConfig, rotors: &[Rotor]) -> Result<CampbellResults, PlotError> {
    let speeds = linspace(0.0, cfg.speed_max, cfg.speed_points);
    let shape = (cfg.modes, speeds.len(), rotors.len());
    let mut wd = Array3::zeros(shape);
    let mut log_dec = Array3::zeros(shape);

    for mode in 0..cfg.modes {
        for (k, &speed) in speeds.iter().enumerate() {
            for (s, rotor) in rotors.iter().enumerate() {
                let (w, ld) = whirl_mode(rotor, cfg.gyroscopic, mode, speed);
                wd[[mode, k, s]] = w;
                log_dec[[mode, k, s]] = ld;
            }
        }
    }

    CampbellResults::new(speeds, wd, log_dec)
}

fn frequency_response(
    cfg: &SynthConfig,
    rotors: &[Rotor],
) -> Result<FrequencyResponseResults, PlotError> {
    let freqs = linspace(0.0, cfg.frequency_max, cfg.frequency_points);
    let mut magnitude = Array2::zeros((freqs.len(), rotors.len()));
    let mut phase = Array2::zeros((freqs.len(), rotors.len()));

    for (f, &w) in freqs.iter().enumerate() {
        for (s, rotor) in rotors.iter().enumerate() {
            let (mag, phs) = rotor.receptance(w);
            magnitude[[f, s]] = mag;
            phase[[f, s]] = phs;
        }
    }

    FrequencyResponseResults::new(freqs, magnitude, phase)
}

/// Steady unbalance amplitude and phase of the shaft center at `speed`.
fn unbalance_response(cfg: &SynthConfig, rotor: &Rotor, speed: f64) -> (f64, f64) {
    let (mag, phs) = rotor.receptance(speed);
    (cfg.unbalance * speed * speed * mag, phs)
}

fn time_response(cfg: &SynthConfig, rotors: &[Rotor]) -> Result<TimeResponseResults, PlotError> {
    let time = linspace(0.0, cfg.duration, cfg.time_points);
    let positions = cfg.node_positions();
    let dofs = DOFS_PER_NODE * cfg.nodes;
    let mut yout = Array3::zeros((rotors.len(), time.len(), dofs));
    let mut xout = Array3::zeros((rotors.len(), time.len(), 2 * dofs));
    let w = cfg.rotor_speed;

    for (s, rotor) in rotors.iter().enumerate() {
        let (amp, phs) = unbalance_response(cfg, rotor, w);
        for (t, &tt) in time.iter().enumerate() {
            let (cos, sin) = ((w * tt + phs).cos(), (w * tt + phs).sin());
            for (n, &pos) in positions.iter().enumerate() {
                let (shape, slope) = cfg.mode_shape(pos);
                let base = DOFS_PER_NODE * n;
                let disp = [
                    amp * shape * cos,
                    amp * shape * sin,
                    amp * slope * cos,
                    amp * slope * sin,
                ];
                let vel = [
                    -amp * shape * w * sin,
                    amp * shape * w * cos,
                    -amp * slope * w * sin,
                    amp * slope * w * cos,
                ];
                for i in 0..DOFS_PER_NODE {
                    yout[[s, t, base + i]] = disp[i];
                    xout[[s, t, base + i]] = disp[i];
                    xout[[s, t, dofs + base + i]] = vel[i];
                }
            }
        }
    }

    TimeResponseResults::new(time, yout, xout, (0..cfg.nodes).collect(), positions)
}

fn forced_response(
    cfg: &SynthConfig,
    rotors: &[Rotor],
) -> Result<ForcedResponseResults, PlotError> {
    let freqs = linspace(0.0, cfg.frequency_max, cfg.frequency_points);
    let positions = cfg.node_positions();
    let dofs = DOFS_PER_NODE * cfg.nodes;
    let mut magnitude = Array3::zeros((rotors.len(), freqs.len(), dofs));
    let mut phase = Array3::zeros((rotors.len(), freqs.len(), dofs));

    for (s, rotor) in rotors.iter().enumerate() {
        for (f, &w) in freqs.iter().enumerate() {
            let (amp, phs) = unbalance_response(cfg, rotor, w);
            for (n, &pos) in positions.iter().enumerate() {
                let (shape, slope) = cfg.mode_shape(pos);
                let base = DOFS_PER_NODE * n;
                let mags = [amp * shape, amp * shape, amp * slope.abs(), amp * slope.abs()];
                let phases = [phs, phs - FRAC_PI_2, phs, phs - FRAC_PI_2];
                for i in 0..DOFS_PER_NODE {
                    magnitude[[s, f, base + i]] = mags[i];
                    phase[[s, f, base + i]] = phases[i];
                }
            }
        }
    }

    ForcedResponseResults::new(magnitude, phase, freqs)
}
