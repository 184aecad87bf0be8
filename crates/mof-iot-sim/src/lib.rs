//! ---
//! mof_section: "11-simulation"
//! mof_subsection: "01-bootstrap"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Simulation runtime module exports and shared types."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
//! Simulation engine for the MOF adsorption column: a fixed-capacity mass sink
//! fed by a noisy inlet, with a cubic breakthrough curve and explicit-Euler
//! mass balance.

pub mod engine;
pub mod error;
pub mod flow;
pub mod generator;
pub mod model;
pub mod replay;
pub mod samples;

pub use engine::{advance, AdsorptionEngine, EngineParams, MassBalance, SimulationState, TickOutcome};
pub use error::SimError;
pub use flow::FlowRate;
pub use generator::{InletGenerator, InletMode};
pub use model::{BreakthroughCurve, ColumnCapacity};
pub use replay::{ScenarioReplay, ScenarioReading};
pub use samples::SensorSample;
