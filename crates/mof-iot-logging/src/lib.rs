//! ---
//! mof_section: "03-logging"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Structured logging adapters and sinks."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Structured logging helpers shared by the simulation and control crates.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for tests and tools.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogContext<'a> {
    /// Column label associated with the log event.
    pub column: Option<&'a str>,
    /// Simulation tick counter.
    pub tick: Option<u64>,
    /// Controller status at the time of the event.
    pub status: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a column label.
    pub fn with_column(mut self, column: &'a str) -> Self {
        self.column = Some(column);
        self
    }

    /// Attach a tick value.
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Attach a status label.
    pub fn with_status(mut self, status: &'a str) -> Self {
        self.status = Some(status);
        self
    }
}

/// High-level outcome used when emitting operator command events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The command was applied.
    Success,
    /// The command was rejected.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized system event with a success/fault outcome.
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let ctx = context.copied().unwrap_or_default();
    let column = ctx.column.unwrap_or("");
    let tick = ctx.tick.unwrap_or_default();
    let status = ctx.status.unwrap_or("");
    match outcome {
        SystemEventOutcome::Success => tracing::info!(
            event,
            outcome = outcome.as_str(),
            column,
            tick,
            status,
            message = %message
        ),
        SystemEventOutcome::Fault => tracing::error!(
            event,
            outcome = outcome.as_str(),
            column,
            tick,
            status,
            message = %message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_emit_without_panic() {
        init();
        let ctx = LogContext::new()
            .with_column("column-a")
            .with_tick(7)
            .with_status("NORMAL");
        mof_info!(context = ctx, "column online");
        mof_debug!("debug message");
        mof_warn!(context = ctx, "saturation at {:.1}%", 86.2);
    }

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }

    #[test]
    fn system_event_helper_emits() {
        init();
        let ctx = LogContext::new().with_column("column-a");
        log_system_event(
            Some(&ctx),
            "command.flow_rate",
            "flow rate updated",
            SystemEventOutcome::Success,
        );
        log_system_event(
            None,
            "command.flow_rate",
            "flow rate rejected",
            SystemEventOutcome::Fault,
        );
    }
}
