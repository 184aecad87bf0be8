//! ---
//! mof_section: "11-simulation"
//! mof_subsection: "01-bootstrap"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Offline breakthrough run generator."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
//! Drives the column monitor over a fixed number of ticks without waiting on
//! the wall clock and writes one row per tick.
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, ValueEnum};
use mof_iot_common::config::AppConfig;
use mof_iot_core::{ColumnMonitor, SystemStatus};
use mof_iot_rt::FixedTicks;
use serde::Serialize;

/// Upper bound for `--ticks`; every row is held in memory before writing.
const MAX_TICKS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate MOF column breakthrough runs",
    long_about = None
)]
struct Cli {
    /// Configuration file; built-in defaults are used when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of ticks to simulate (upper bound with --until-critical)
    #[arg(
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TICKS)
    )]
    ticks: u64,

    /// Stop at the first tick that enters CRITICAL
    #[arg(long, conflicts_with = "auto_maintain")]
    until_critical: bool,

    /// Confirm maintenance whenever the column enters CRITICAL
    #[arg(long)]
    auto_maintain: bool,

    /// Flow rate in L/min (defaults to the configured value)
    #[arg(long)]
    flow_rate: Option<f64>,

    /// Random seed for inlet noise and efficiency jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Fixed inlet concentration and no efficiency jitter
    #[arg(long)]
    deterministic: bool,

    /// Recorded inlet readings (CSV/JSON) replayed in a loop
    #[arg(long = "scenario", value_name = "FILE")]
    scenario_file: Option<PathBuf>,

    /// Output file path. Use '-' for stdout.
    #[arg(long, default_value = "breakthrough.csv")]
    output: PathBuf,

    /// Explicit output format when extension is ambiguous
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct GeneratedRow {
    tick: u64,
    timestamp: i64,
    time_label: String,
    inlet_mg_l: f64,
    outlet_mg_l: f64,
    saturation: f64,
    status: SystemStatus,
    flow_rate_l_min: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    mof_iot_logging::init();

    ensure!(
        (1..=MAX_TICKS).contains(&cli.ticks),
        "ticks must be between 1 and {MAX_TICKS}"
    );
    let format = determine_format(&cli.output, cli.format)?;
    let config = build_config(&cli)?;
    let rows = generate(&cli, &config, Local::now())?;

    match format {
        OutputFormat::Csv => write_csv(&cli.output, &rows)?,
        OutputFormat::Json => write_json(&cli.output, &rows)?,
    }

    if cli.output.as_os_str() != "-" {
        let last = rows.last().map(|row| row.status).unwrap_or_default();
        eprintln!(
            "generated {} ticks for {} (final status {}) -> {}",
            rows.len(),
            config.column.label,
            last,
            cli.output.display()
        );
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    if cli.deterministic {
        config.simulation = config.simulation.deterministic();
    }
    if let Some(seed) = cli.seed {
        config.simulation.random_seed = Some(seed);
    }
    if let Some(path) = &cli.scenario_file {
        config.simulation.scenario_file = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

fn generate(cli: &Cli, config: &AppConfig, start: DateTime<Local>) -> Result<Vec<GeneratedRow>> {
    let mut monitor = ColumnMonitor::from_config(config)?;
    if let Some(rate) = cli.flow_rate {
        monitor
            .set_flow_rate(rate)
            .with_context(|| format!("invalid --flow-rate {rate}"))?;
    }
    monitor.start_at(start);

    let step = config.simulation.tick_interval;
    let mut rows = Vec::new();
    for tick in FixedTicks::new(cli.ticks, step) {
        let at = tick_timestamp(start, step, tick.sequence)?;
        let before = monitor.status();
        let Some(sample) = monitor.tick_at(tick.elapsed, at) else {
            break;
        };
        let status = monitor.status();
        rows.push(GeneratedRow {
            tick: tick.sequence,
            timestamp: sample.timestamp,
            time_label: sample.time_label,
            inlet_mg_l: sample.inlet_concentration,
            outlet_mg_l: sample.outlet_concentration,
            saturation: sample.saturation,
            status,
            flow_rate_l_min: monitor.flow_rate().l_per_min(),
        });

        let entered_critical = status == SystemStatus::Critical && before != status;
        if entered_critical && cli.until_critical {
            break;
        }
        if entered_critical && cli.auto_maintain {
            monitor.confirm_maintenance_at(at);
        }
    }
    Ok(rows)
}

fn tick_timestamp(start: DateTime<Local>, step: Duration, sequence: u64) -> Result<DateTime<Local>> {
    let offset = u32::try_from(sequence)
        .ok()
        .and_then(|sequence| step.checked_mul(sequence))
        .with_context(|| format!("tick {sequence} is out of range for a {step:?} step"))?;
    let offset = chrono::Duration::from_std(offset)?;
    start
        .checked_add_signed(offset)
        .with_context(|| format!("tick {sequence} timestamp overflows the calendar"))
}

fn determine_format(path: &Path, override_format: Option<OutputFormat>) -> Result<OutputFormat> {
    if let Some(format) = override_format {
        return Ok(format);
    }
    if path.as_os_str() == "-" {
        return Ok(OutputFormat::Json);
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(OutputFormat::Json),
        _ => Ok(OutputFormat::Csv),
    }
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdout()));
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    Ok(Box::new(file))
}

fn write_csv(path: &Path, rows: &[GeneratedRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(open_output(path)?);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(path: &Path, rows: &[GeneratedRow]) -> Result<()> {
    let mut writer = open_output(path)?;
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::{Builder, NamedTempFile};

    fn base_cli() -> Cli {
        Cli {
            config: None,
            ticks: 60,
            until_critical: false,
            auto_maintain: false,
            flow_rate: None,
            seed: Some(7),
            deterministic: true,
            scenario_file: None,
            output: PathBuf::from("out.csv"),
            format: None,
        }
    }

    fn run(cli: &Cli) -> Vec<GeneratedRow> {
        let config = build_config(cli).unwrap();
        generate(cli, &config, Local::now()).unwrap()
    }

    #[test]
    fn deterministic_run_reaches_critical_through_warning() {
        let rows = run(&base_cli());
        assert_eq!(rows.len(), 60);
        let first_warning = rows
            .iter()
            .position(|row| row.status == SystemStatus::Warning)
            .unwrap();
        let first_critical = rows
            .iter()
            .position(|row| row.status == SystemStatus::Critical)
            .unwrap();
        assert!(first_warning < first_critical);
        assert!(rows
            .iter()
            .all(|row| row.outlet_mg_l <= row.inlet_mg_l && (0.0..=1.0).contains(&row.saturation)));
    }

    #[test]
    fn until_critical_stops_on_entry() {
        let mut cli = base_cli();
        cli.until_critical = true;
        cli.ticks = 500;
        let rows = run(&cli);
        assert_eq!(rows.last().unwrap().status, SystemStatus::Critical);
        assert_eq!(
            rows.iter()
                .filter(|row| row.status == SystemStatus::Critical)
                .count(),
            1
        );
    }

    #[test]
    fn auto_maintain_cycles_the_column() {
        let mut cli = base_cli();
        cli.auto_maintain = true;
        cli.ticks = 200;
        let rows = run(&cli);
        let entries = rows
            .windows(2)
            .filter(|pair| {
                pair[0].status != SystemStatus::Critical && pair[1].status == SystemStatus::Critical
            })
            .count();
        assert!(entries >= 2);
    }

    #[test]
    fn flow_rate_override_is_validated() {
        let mut cli = base_cli();
        cli.flow_rate = Some(-2.0);
        let config = build_config(&cli).unwrap();
        assert!(generate(&cli, &config, Local::now()).is_err());

        cli.flow_rate = Some(0.0);
        let rows = run(&cli);
        assert!(rows.iter().all(|row| row.saturation == 0.0));
    }

    #[test]
    fn timestamps_follow_tick_interval() {
        let cli = base_cli();
        let config = build_config(&cli).unwrap();
        let start = Local::now();
        let rows = generate(&cli, &config, start).unwrap();
        assert_eq!(rows[1].timestamp - rows[0].timestamp, 1500);
    }

    #[test]
    fn tick_count_is_bounded_on_the_command_line() {
        assert!(Cli::try_parse_from(["mof-iot-simgen", "--ticks", "0"]).is_err());
        assert!(Cli::try_parse_from(["mof-iot-simgen", "--ticks", "18446744073709551615"]).is_err());
        let cli = Cli::try_parse_from(["mof-iot-simgen", "--ticks", "1000000"]).unwrap();
        assert_eq!(cli.ticks, MAX_TICKS);
    }

    #[test]
    fn tick_timestamp_rejects_overflowing_offsets() {
        let start = Local::now();
        let step = Duration::from_millis(1500);
        let at = tick_timestamp(start, step, 2).unwrap();
        assert_eq!(at.timestamp_millis() - start.timestamp_millis(), 3000);
        assert!(tick_timestamp(start, step, u64::from(u32::MAX) + 1).is_err());
        assert!(tick_timestamp(start, Duration::from_secs(u64::MAX / 2), 4).is_err());
    }

    #[test]
    fn determine_format_defaults_csv() {
        let format = determine_format(Path::new("run.data"), None).unwrap();
        assert!(matches!(format, OutputFormat::Csv));
        let format = determine_format(Path::new("-"), None).unwrap();
        assert!(matches!(format, OutputFormat::Json));
    }

    #[test]
    fn scenario_file_drives_inlet() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "inlet_mg_l").unwrap();
        writeln!(file, "40.0").unwrap();
        writeln!(file, "60.0").unwrap();
        file.flush().unwrap();

        let mut cli = base_cli();
        cli.ticks = 4;
        cli.scenario_file = Some(file.path().to_path_buf());
        let inlets: Vec<_> = run(&cli).iter().map(|row| row.inlet_mg_l).collect();
        assert_eq!(inlets, vec![40.0, 60.0, 40.0, 60.0]);
    }

    #[test]
    fn csv_output_has_header_and_rows() {
        let mut cli = base_cli();
        cli.ticks = 3;
        let rows = run(&cli);
        let file = NamedTempFile::new().unwrap();
        write_csv(file.path(), &rows).unwrap();
        let contents = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "tick,timestamp,time_label,inlet_mg_l,outlet_mg_l,saturation,status,flow_rate_l_min"
        );
        assert_eq!(lines.count(), 3);
        assert!(contents.contains(",NORMAL,"));
    }
}
