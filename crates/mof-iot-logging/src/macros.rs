//! ---
//! mof_section: "03-logging"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Structured logging adapters and sinks."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---

/// Emit a log event at the given level enriched with column context.
#[macro_export]
macro_rules! mof_event {
    ($level:expr, context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            column = ctx.column.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            status = ctx.status.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($level:expr, $($arg:tt)+) => {{
        $crate::mof_event!($level, context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit an informational log enriched with column context.
#[macro_export]
macro_rules! mof_info {
    ($($arg:tt)+) => {
        $crate::mof_event!(tracing::Level::INFO, $($arg)+)
    };
}

/// Emit a warning log enriched with column context.
#[macro_export]
macro_rules! mof_warn {
    ($($arg:tt)+) => {
        $crate::mof_event!(tracing::Level::WARN, $($arg)+)
    };
}

/// Emit a debug log enriched with column context.
#[macro_export]
macro_rules! mof_debug {
    ($($arg:tt)+) => {
        $crate::mof_event!(tracing::Level::DEBUG, $($arg)+)
    };
}
