//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "binary"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Binary entrypoint for the MOF IoT monitor daemon."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
mod console;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mof_iot_common::config::{AppConfig, LoadedAppConfig};
use mof_iot_common::init_tracing;
use mof_iot_core::{ColumnMonitor, Command, MonitorHandle, MonitorRuntime};
use mof_iot_rt::IntervalTicks;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

use crate::console::{parse_line, render_entry, render_sample_line, render_status, ConsoleInput, JournalCursor, HELP};

#[derive(Debug, Parser)]
#[command(author, version, about = "MOF IoT column monitor daemon", long_about = None)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Start monitoring immediately")]
    auto_start: bool,

    #[arg(long, value_name = "L/MIN", help = "Override the initial flow rate")]
    flow_rate: Option<f64>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Write the tick jitter summary as JSON on shutdown"
    )]
    jitter_report: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the monitor with an interactive console")]
    Run,
    #[command(about = "Validate the configuration and print the effective values")]
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(cli.config.as_ref())?;

    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::CheckConfig => {
            match &loaded.source {
                Some(path) => println!("# source: {}", path.display()),
                None => println!("# source: built-in defaults"),
            }
            println!("{}", toml::to_string_pretty(&loaded.config)?);
        }
        Commands::Run => {
            init_tracing("mof-iotd", &loaded.config.logging)?;
            match &loaded.source {
                Some(path) => info!(config_path = %path.display(), "configuration loaded"),
                None => info!("no configuration file found; running with defaults"),
            }
            run_daemon(&cli, loaded.config).await?;
        }
    }
    Ok(())
}

fn load_config(explicit: Option<&PathBuf>) -> Result<LoadedAppConfig> {
    if let Some(path) = explicit {
        let config = AppConfig::from_path(path)?;
        return Ok(LoadedAppConfig {
            config,
            source: Some(path.clone()),
        });
    }
    let candidates = [
        PathBuf::from("configs/mof-iot.toml"),
        PathBuf::from("configs/mof-iot.example.toml"),
    ];
    AppConfig::load_with_source(&candidates)
}

async fn run_daemon(cli: &Cli, config: AppConfig) -> Result<()> {
    let monitor = ColumnMonitor::from_config(&config)?;
    let ticks = IntervalTicks::new(config.simulation.tick_interval);
    let handle = MonitorRuntime::spawn(monitor, ticks);

    if let Some(rate) = cli.flow_rate {
        handle
            .send(Command::SetFlowRate(rate))
            .await
            .with_context(|| format!("invalid --flow-rate {rate}"))?;
    }
    if cli.auto_start || config.simulation.auto_start {
        handle.send(Command::Start).await?;
    }

    info!(
        column = %config.column.label,
        tick_interval_ms = config.simulation.tick_interval.as_millis() as u64,
        "daemon running; type 'help' for console commands"
    );
    println!("{HELP}");
    run_console(&handle).await?;

    let summary = handle.shutdown().await?;
    if let Some(jitter) = &summary.jitter {
        info!(
            samples = jitter.samples,
            mean_abs_deviation_us = jitter.mean_abs_deviation_us,
            max_late_us = jitter.max_late_us,
            late_ticks = jitter.late_ticks,
            "tick jitter summary"
        );
    }
    if let (Some(path), Some(jitter)) = (&cli.jitter_report, &summary.jitter) {
        let json = serde_json::to_vec_pretty(jitter)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write jitter report {}", path.display()))?;
        info!(path = %path.display(), "jitter report written");
    }
    Ok(())
}

async fn run_console(handle: &MonitorHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = handle.subscribe();
    let mut cursor = JournalCursor::default();
    let mut last_tick = 0u64;
    let mut stdin_open = true;
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("ctrl-c received; shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("monitor loop ended unexpectedly");
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                for entry in cursor.fresh(&snapshot.log) {
                    println!("{}", render_entry(entry));
                }
                if snapshot.ticks != last_tick {
                    last_tick = snapshot.ticks;
                    if let Some(line) = render_sample_line(&snapshot) {
                        println!("{line}");
                    }
                }
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    info!("stdin closed; console input disabled");
                    stdin_open = false;
                    continue;
                };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(ConsoleInput::Quit)) => break,
                    Ok(Some(ConsoleInput::Help)) => println!("{HELP}"),
                    Ok(Some(ConsoleInput::Status)) => println!("{}", render_status(&handle.snapshot())),
                    Ok(Some(ConsoleInput::Command(command))) => {
                        if let Err(err) = handle.send(command).await {
                            println!("error: {err}");
                        }
                    }
                    Err(err) => println!("error: {err}; {HELP}"),
                }
            }
        }
    }
    Ok(())
}
