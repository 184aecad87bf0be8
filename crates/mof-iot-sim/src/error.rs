//! ---
//! mof_section: "11-simulation"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Simulation engine error types."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("column capacity must be positive and finite ({capacity_mg_per_g} mg/g x {adsorbent_mass_g} g)")]
    InvalidCapacity {
        capacity_mg_per_g: f64,
        adsorbent_mass_g: f64,
    },
    #[error("flow rate must be a finite, non-negative number of L/min, got {0}")]
    InvalidFlowRate(f64),
    #[error("flow rate '{0}' is not a number")]
    MalformedFlowRate(String),
    #[error("invalid inlet noise: {0}")]
    InvalidNoise(String),
}
