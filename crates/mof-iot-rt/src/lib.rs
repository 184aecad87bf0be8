//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Runtime helpers supporting the monitor loop."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
//! Tick sources for the simulation loop. The monitor never owns a global timer;
//! it is handed one of these instead.

pub mod scheduling;

pub use scheduling::{FixedTicks, IntervalTicks, ManualTicks, Tick, TickFeeder, TickSource};
