//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Shared primitives and utilities for the core runtime."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_column_label() -> String {
    "column-a".to_owned()
}

fn default_capacity_mg_per_g() -> f64 {
    250.0
}

fn default_adsorbent_mass_g() -> f64 {
    10_000.0
}

fn default_warning_threshold() -> f64 {
    0.85
}

fn default_critical_threshold() -> f64 {
    0.90
}

fn default_inlet_base() -> f64 {
    50.0
}

fn default_inlet_noise() -> f64 {
    2.0
}

fn default_efficiency_jitter() -> f64 {
    0.001
}

fn default_residual_outlet() -> f64 {
    0.01
}

fn default_time_acceleration() -> f64 {
    3600.0
}

fn default_tick_interval() -> Duration {
    Duration::from_millis(1500)
}

fn default_flow_rate() -> f64 {
    20.0
}

fn default_max_flow_rate() -> f64 {
    500.0
}

fn default_history_capacity() -> usize {
    20
}

fn default_log_capacity() -> usize {
    100
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Upper bound on the pre-breakthrough efficiency jitter that keeps removal efficiency <= 1.
pub const MAX_EFFICIENCY_JITTER: f64 = 0.002;

/// Primary configuration object for the column monitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub column: ColumnConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and defaults are in effect.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "MOF_IOT_CONFIG";

    /// Load configuration from disk, respecting the `MOF_IOT_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// An explicit `MOF_IOT_CONFIG` path must exist. Otherwise the first existing
    /// candidate wins, and the validated defaults are used when none exists.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!(
            inspected = candidates.len(),
            "no configuration file found; using defaults"
        );
        let config = AppConfig::default();
        config.validate()?;
        Ok(LoadedAppConfig {
            config,
            source: None,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse::<AppConfig>()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Validate structural invariants. Any failure here is a startup error.
    pub fn validate(&self) -> Result<()> {
        self.column.validate()?;
        self.thresholds.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Physical description of the adsorption column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default = "default_column_label")]
    pub label: String,
    /// Copper uptake per gram of MOF (mg/g).
    #[serde(default = "default_capacity_mg_per_g")]
    pub capacity_mg_per_g: f64,
    /// Adsorbent charge in the cartridge (g).
    #[serde(default = "default_adsorbent_mass_g")]
    pub adsorbent_mass_g: f64,
}

impl ColumnConfig {
    /// Total column capacity in milligrams.
    pub fn max_load_mg(&self) -> f64 {
        self.capacity_mg_per_g * self.adsorbent_mass_g
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.capacity_mg_per_g.is_finite() && self.capacity_mg_per_g > 0.0,
            "column.capacity_mg_per_g must be positive, got {}",
            self.capacity_mg_per_g
        );
        ensure!(
            self.adsorbent_mass_g.is_finite() && self.adsorbent_mass_g > 0.0,
            "column.adsorbent_mass_g must be positive, got {}",
            self.adsorbent_mass_g
        );
        ensure!(
            self.max_load_mg().is_finite(),
            "column capacity overflows: {} mg/g x {} g",
            self.capacity_mg_per_g,
            self.adsorbent_mass_g
        );
        Ok(())
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            label: default_column_label(),
            capacity_mg_per_g: default_capacity_mg_per_g(),
            adsorbent_mass_g: default_adsorbent_mass_g(),
        }
    }
}

/// Saturation thresholds driving the status controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdConfig {
    #[serde(default = "default_warning_threshold")]
    pub warning: f64,
    #[serde(default = "default_critical_threshold")]
    pub critical: f64,
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.warning > 0.0 && self.warning < self.critical && self.critical <= 1.0) {
            return Err(anyhow!(
                "thresholds must satisfy 0 < warning < critical <= 1 (warning={}, critical={})",
                self.warning,
                self.critical
            ));
        }
        Ok(())
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            warning: default_warning_threshold(),
            critical: default_critical_threshold(),
        }
    }
}

/// Distribution used for inlet concentration noise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InletNoise {
    #[default]
    Uniform,
    /// Normal noise with `sigma = amplitude / 3`, truncated to the amplitude band.
    Gaussian,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_inlet_base")]
    pub inlet_base_mg_l: f64,
    #[serde(default = "default_inlet_noise")]
    pub inlet_noise_mg_l: f64,
    #[serde(default)]
    pub inlet_noise: InletNoise,
    #[serde(default = "default_efficiency_jitter")]
    pub efficiency_jitter: f64,
    #[serde(default = "default_residual_outlet")]
    pub residual_outlet_mg_l: f64,
    #[serde(default = "default_time_acceleration")]
    pub time_acceleration: f64,
    #[serde(default = "default_tick_interval", rename = "tick_interval_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub tick_interval: Duration,
    #[serde(default = "default_flow_rate")]
    pub default_flow_rate_l_min: f64,
    /// Operator input ceiling, only surfaced to the presentation layer.
    #[serde(default = "default_max_flow_rate")]
    pub max_flow_rate_l_min: f64,
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub scenario_file: Option<PathBuf>,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    #[serde(default)]
    pub auto_start: bool,
}

impl SimulationConfig {
    /// A noise-free configuration: fixed inlet, no efficiency jitter.
    pub fn deterministic(mut self) -> Self {
        self.inlet_noise_mg_l = 0.0;
        self.efficiency_jitter = 0.0;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.inlet_base_mg_l.is_finite() && self.inlet_base_mg_l >= 0.0,
            "simulation.inlet_base_mg_l must be non-negative"
        );
        ensure!(
            self.inlet_noise_mg_l >= 0.0 && self.inlet_noise_mg_l <= self.inlet_base_mg_l,
            "simulation.inlet_noise_mg_l must lie within [0, inlet_base_mg_l]"
        );
        ensure!(
            (0.0..=MAX_EFFICIENCY_JITTER).contains(&self.efficiency_jitter),
            "simulation.efficiency_jitter must lie within [0, {}]",
            MAX_EFFICIENCY_JITTER
        );
        ensure!(
            self.residual_outlet_mg_l.is_finite() && self.residual_outlet_mg_l >= 0.0,
            "simulation.residual_outlet_mg_l must be non-negative"
        );
        ensure!(
            self.time_acceleration.is_finite() && self.time_acceleration > 0.0,
            "simulation.time_acceleration must be positive"
        );
        ensure!(
            !self.tick_interval.is_zero(),
            "simulation.tick_interval_ms must be greater than zero"
        );
        ensure!(
            self.default_flow_rate_l_min.is_finite() && self.default_flow_rate_l_min >= 0.0,
            "simulation.default_flow_rate_l_min must be non-negative"
        );
        ensure!(
            self.history_capacity > 0 && self.log_capacity > 0,
            "simulation history/log capacities must be at least 1"
        );
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            inlet_base_mg_l: default_inlet_base(),
            inlet_noise_mg_l: default_inlet_noise(),
            inlet_noise: InletNoise::default(),
            efficiency_jitter: default_efficiency_jitter(),
            residual_outlet_mg_l: default_residual_outlet(),
            time_acceleration: default_time_acceleration(),
            tick_interval: default_tick_interval(),
            default_flow_rate_l_min: default_flow_rate(),
            max_flow_rate_l_min: default_max_flow_rate(),
            random_seed: None,
            scenario_file: None,
            history_capacity: default_history_capacity(),
            log_capacity: default_log_capacity(),
            auto_start: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_reference_column() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.column.max_load_mg(), 2_500_000.0);
        assert_eq!(config.thresholds.critical, 0.90);
        assert_eq!(config.simulation.tick_interval, Duration::from_millis(1500));
        assert_eq!(config.simulation.history_capacity, 20);
        assert_eq!(config.simulation.log_capacity, 100);
    }

    #[test]
    fn parses_partial_toml() {
        let config: AppConfig = r#"
            [column]
            label = "pilot"
            adsorbent_mass_g = 500.0

            [simulation]
            tick_interval_ms = 250
            inlet_noise = "gaussian"
        "#
        .parse()
        .unwrap();
        assert_eq!(config.column.label, "pilot");
        assert_eq!(config.column.max_load_mg(), 125_000.0);
        assert_eq!(config.simulation.tick_interval, Duration::from_millis(250));
        assert_eq!(config.simulation.inlet_noise, InletNoise::Gaussian);
        assert_eq!(config.simulation.default_flow_rate_l_min, 20.0);
    }

    #[test]
    fn zero_capacity_fails_fast() {
        let err = "[column]\ncapacity_mg_per_g = 0.0\n"
            .parse::<AppConfig>()
            .unwrap_err();
        assert!(format!("{err:#}").contains("capacity_mg_per_g"));

        let err = "[column]\nadsorbent_mass_g = -5.0\n"
            .parse::<AppConfig>()
            .unwrap_err();
        assert!(format!("{err:#}").contains("adsorbent_mass_g"));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let result = "[thresholds]\nwarning = 0.95\ncritical = 0.90\n".parse::<AppConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn noise_wider_than_base_is_rejected() {
        let result = "[simulation]\ninlet_base_mg_l = 1.0\ninlet_noise_mg_l = 2.0\n"
            .parse::<AppConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn loads_first_existing_candidate() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[column]\nlabel = \"from-file\"")?;
        file.flush()?;
        let missing = PathBuf::from("does/not/exist.toml");
        let loaded =
            AppConfig::load_with_source(&[missing, file.path().to_path_buf()])?;
        assert_eq!(loaded.config.column.label, "from-file");
        assert_eq!(loaded.source.as_deref(), Some(file.path()));
        Ok(())
    }

    #[test]
    fn deterministic_strips_noise() {
        let sim = SimulationConfig::default().deterministic();
        assert_eq!(sim.inlet_noise_mg_l, 0.0);
        assert_eq!(sim.efficiency_jitter, 0.0);
        sim.validate().unwrap();
    }
}
