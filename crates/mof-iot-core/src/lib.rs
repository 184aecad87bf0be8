//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Column monitor, status machine and runtime lifecycle."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
//! Column monitor core: status machine, event journal, operator commands and
//! the async loop that drives them.

pub mod buffer;
pub mod command;
pub mod journal;
pub mod monitor;
pub mod runtime;
pub mod status;

pub use buffer::BoundedBuffer;
pub use command::{Command, CommandError, CommandOutcome};
pub use journal::{EventJournal, LogCategory, LogEntry};
pub use monitor::{ColumnMonitor, DashboardSnapshot};
pub use runtime::{MonitorHandle, MonitorRuntime, RunSummary, RuntimeError};
pub use status::{StatusController, SystemStatus, Transition, TransitionCause};
