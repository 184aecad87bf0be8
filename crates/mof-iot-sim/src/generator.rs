//! ---
//! mof_section: "11-simulation"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Inlet concentration and process noise generators."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{Context, Result};
use mof_iot_common::config::{InletNoise, SimulationConfig};
use rand::prelude::*;
use rand_distr::Normal;
use tracing::debug;

use crate::error::SimError;
use crate::replay::ScenarioReplay;

/// How the upstream inlet concentration is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum InletMode {
    /// `base` plus bounded noise of at most `amplitude` mg/L.
    Randomized {
        base: f64,
        amplitude: f64,
        noise: InletNoise,
    },
    /// Constant concentration.
    Fixed(f64),
    /// Recorded readings, cycled.
    Scenario(PathBuf),
}

/// Draws inlet concentrations and pre-breakthrough efficiency jitter.
#[derive(Debug)]
pub struct InletGenerator {
    mode: InletMode,
    rng: StdRng,
    gaussian: Option<Normal<f64>>,
    efficiency_jitter: f64,
    replay: Option<ScenarioReplay>,
}

impl InletGenerator {
    /// `seed = None` draws entropy from the OS.
    pub fn new(mode: InletMode, efficiency_jitter: f64, seed: Option<u64>) -> Result<Self> {
        let gaussian = match &mode {
            InletMode::Randomized {
                amplitude,
                noise: InletNoise::Gaussian,
                ..
            } if *amplitude > 0.0 => Some(
                Normal::new(0.0, amplitude / 3.0)
                    .map_err(|err| SimError::InvalidNoise(err.to_string()))?,
            ),
            _ => None,
        };
        let replay = match &mode {
            InletMode::Scenario(path) => Some(
                ScenarioReplay::from_path(path)
                    .with_context(|| format!("unable to load scenario {}", path.display()))?,
            ),
            _ => None,
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(mode = ?mode, efficiency_jitter, seeded = seed.is_some(), "inlet generator ready");
        Ok(Self {
            mode,
            rng,
            gaussian,
            efficiency_jitter: efficiency_jitter.max(0.0),
            replay,
        })
    }

    /// Pick the mode implied by the simulation settings.
    ///
    /// A scenario file wins; zero noise yields a fixed inlet.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let mode = match &config.scenario_file {
            Some(path) => InletMode::Scenario(path.clone()),
            None if config.inlet_noise_mg_l == 0.0 => InletMode::Fixed(config.inlet_base_mg_l),
            None => InletMode::Randomized {
                base: config.inlet_base_mg_l,
                amplitude: config.inlet_noise_mg_l,
                noise: config.inlet_noise,
            },
        };
        Self::new(mode, config.efficiency_jitter, config.random_seed)
    }

    pub fn mode(&self) -> &InletMode {
        &self.mode
    }

    /// Next inlet concentration in mg/L. Never negative.
    pub fn next_inlet(&mut self) -> f64 {
        let value = match &self.mode {
            InletMode::Fixed(base) => *base,
            InletMode::Randomized {
                base, amplitude, ..
            } => {
                let (base, amplitude) = (*base, *amplitude);
                base + self.noise_sample(amplitude)
            }
            InletMode::Scenario(_) => self
                .replay
                .as_mut()
                .and_then(ScenarioReplay::next_inlet)
                .unwrap_or(0.0),
        };
        value.max(0.0)
    }

    /// Additive efficiency noise in `[0, efficiency_jitter)`.
    pub fn efficiency_jitter(&mut self) -> f64 {
        if self.efficiency_jitter > 0.0 {
            self.rng.gen_range(0.0..self.efficiency_jitter)
        } else {
            0.0
        }
    }

    fn noise_sample(&mut self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        match &self.gaussian {
            Some(normal) => normal.sample(&mut self.rng).clamp(-amplitude, amplitude),
            None => self.rng.gen_range(-amplitude..=amplitude),
        }
    }
}
