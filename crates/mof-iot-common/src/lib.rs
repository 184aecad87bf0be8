//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Shared primitives and utilities for the core runtime."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
//! Shared primitives for the MOF IoT monitor workspace: configuration loading,
//! tracing setup, clock labels and tick timing.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod time;

pub use config::{
    AppConfig, ColumnConfig, InletNoise, LoadedAppConfig, LoggingConfig, SimulationConfig,
    ThresholdConfig,
};
pub use logging::{init_tracing, LogFormat};
pub use metrics::{JitterSummary, LoopTimingReporter};
