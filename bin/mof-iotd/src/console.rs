//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "binary"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Operator console parsing and snapshot rendering."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use mof_iot_core::{Command, CommandError, DashboardSnapshot, LogEntry};

pub const HELP: &str = "commands: start | stop | toggle | reset | maintain | flow <L/min> | status | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(Command),
    Status,
    Help,
    Quit,
}

/// Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleInput>, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let input = match trimmed.to_ascii_lowercase().as_str() {
        "status" => ConsoleInput::Status,
        "help" | "?" => ConsoleInput::Help,
        "quit" | "exit" => ConsoleInput::Quit,
        _ => ConsoleInput::Command(trimmed.parse()?),
    };
    Ok(Some(input))
}

/// One line for the most recent sample.
pub fn render_sample_line(snapshot: &DashboardSnapshot) -> Option<String> {
    let sample = snapshot.latest()?;
    Some(format!(
        "[{}] {:<8} in {:>6.2} mg/L  out {:>7.3} mg/L  sat {:>6.2}%  flow {}",
        sample.time_label,
        snapshot.status,
        sample.inlet_concentration,
        sample.outlet_concentration,
        sample.saturation_percent(),
        snapshot.flow_rate
    ))
}

pub fn render_status(snapshot: &DashboardSnapshot) -> String {
    let mut lines = vec![
        format!(
            "column {} ({})",
            snapshot.column,
            if snapshot.active { "running" } else { "stopped" }
        ),
        format!("status      {}", snapshot.status),
        format!(
            "saturation  {:.2}% (warning {:.0}%, critical {:.0}%)",
            snapshot.saturation * 100.0,
            snapshot.warning_threshold * 100.0,
            snapshot.capacity_threshold * 100.0
        ),
        format!(
            "load        {:.1} / {:.1} g",
            snapshot.accumulated_load_mg / 1000.0,
            snapshot.max_load_mg / 1000.0
        ),
        format!(
            "flow rate   {} (max {:.0} L/min)",
            snapshot.flow_rate, snapshot.max_flow_rate
        ),
        format!("ticks       {}", snapshot.ticks),
    ];
    if snapshot.maintenance_required() {
        lines.push("maintenance required: type 'maintain' after replacing the cartridge".into());
    }
    lines.join("\n")
}

pub fn render_entry(entry: &LogEntry) -> String {
    format!(
        "{} [{}] {}",
        entry.clock_label(),
        entry.category,
        entry.message
    )
}

/// Remembers the last journal entry printed so each entry is shown once.
#[derive(Debug, Default)]
pub struct JournalCursor {
    last_seen: Option<LogEntry>,
}

impl JournalCursor {
    pub fn fresh<'a>(&mut self, log: &'a [LogEntry]) -> &'a [LogEntry] {
        let start = match &self.last_seen {
            Some(seen) => log
                .iter()
                .rposition(|entry| entry.id == seen.id)
                .map_or(0, |index| index + 1),
            None => 0,
        };
        if let Some(last) = log.last() {
            self.last_seen = Some(last.clone());
        }
        &log[start..]
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mof_iot_common::config::AppConfig;
    use mof_iot_core::{ColumnMonitor, SystemStatus};

    use super::*;

    fn monitor() -> ColumnMonitor {
        let mut config = AppConfig::default();
        config.simulation = config.simulation.deterministic();
        ColumnMonitor::from_config(&config).unwrap()
    }

    #[test]
    fn parses_console_lines() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("status").unwrap(), Some(ConsoleInput::Status));
        assert_eq!(parse_line("QUIT").unwrap(), Some(ConsoleInput::Quit));
        assert_eq!(
            parse_line("flow 12").unwrap(),
            Some(ConsoleInput::Command(Command::SetFlowRate(12.0)))
        );
        assert!(parse_line("open valve").is_err());
    }

    #[test]
    fn sample_line_shows_latest_reading() {
        let mut monitor = monitor();
        assert_eq!(render_sample_line(&monitor.snapshot()), None);
        monitor.start();
        monitor.tick(Duration::from_millis(1500));
        let line = render_sample_line(&monitor.snapshot()).unwrap();
        assert!(line.contains("NORMAL"));
        assert!(line.contains("in  50.00 mg/L"));
        assert!(line.contains("out   0.100 mg/L"));
        assert!(line.contains("20.00 L/min"));
    }

    #[test]
    fn status_flags_required_maintenance() {
        let mut monitor = monitor();
        monitor.start();
        for _ in 0..40 {
            monitor.tick(Duration::from_millis(1500));
        }
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.status, SystemStatus::Critical);
        let status = render_status(&snapshot);
        assert!(status.contains("status      CRITICAL"));
        assert!(status.contains("maintenance required"));
        assert!(status.contains("/ 2500.0 g"));
    }

    #[test]
    fn journal_cursor_yields_each_entry_once() {
        let mut monitor = monitor();
        let mut cursor = JournalCursor::default();
        monitor.start();
        let snapshot = monitor.snapshot();
        assert_eq!(cursor.fresh(&snapshot.log).len(), 2);
        assert!(cursor.fresh(&snapshot.log).is_empty());

        monitor.stop();
        let snapshot = monitor.snapshot();
        let fresh = cursor.fresh(&snapshot.log);
        assert_eq!(fresh.len(), 1);
        assert!(render_entry(&fresh[0]).ends_with("[ACTION] Stop command received. Shutting down..."));
    }
}
