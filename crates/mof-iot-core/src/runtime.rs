//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Async monitor loop and control handle."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
//! The monitor runs on a single task, so a command is never interleaved with
//! a half-applied tick. Shutdown wins over everything pending. Ticks already
//! queued are applied before the next command, which means a batch source
//! such as `FixedTicks` runs to exhaustion before commands are served.

use mof_iot_common::metrics::{JitterSummary, LoopTimingReporter};
use mof_iot_rt::TickSource;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::command::{Command, CommandError, CommandOutcome};
use crate::monitor::{ColumnMonitor, DashboardSnapshot};

const COMMAND_QUEUE_DEPTH: usize = 32;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("monitor loop is no longer running")]
    Stopped,
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("monitor task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
struct CommandRequest {
    command: Command,
    reply: oneshot::Sender<Result<CommandOutcome, CommandError>>,
}

/// What the loop hands back once it stops.
#[derive(Debug)]
pub struct RunSummary {
    pub monitor: ColumnMonitor,
    /// Tick spacing jitter while the monitor was active.
    pub jitter: Option<JitterSummary>,
    /// Ticks received from the source, including those ignored while offline.
    pub ticks_received: u64,
}

pub struct MonitorRuntime;

impl MonitorRuntime {
    /// Spawn the monitor loop on the current tokio runtime.
    pub fn spawn<T>(monitor: ColumnMonitor, ticks: T) -> MonitorHandle
    where
        T: TickSource + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (snapshot_tx, snapshot_rx) = watch::channel(monitor.snapshot());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(run_monitor(
            monitor,
            ticks,
            command_rx,
            snapshot_tx,
            shutdown_rx,
        ));
        MonitorHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Control surface for a running monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    commands: mpsc::Sender<CommandRequest>,
    snapshots: watch::Receiver<DashboardSnapshot>,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<RunSummary>,
}

impl MonitorHandle {
    /// Apply a command and wait for the resulting state.
    pub async fn send(&self, command: Command) -> Result<CommandOutcome, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(CommandRequest { command, reply })
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        let outcome = rx.await.map_err(|_| RuntimeError::Stopped)??;
        Ok(outcome)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every applied tick or command.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn shutdown(self) -> Result<RunSummary, RuntimeError> {
        let _ = self.shutdown.send(());
        let summary = self.task.await?;
        info!(
            ticks = summary.ticks_received,
            status = %summary.monitor.status(),
            "monitor shutdown complete"
        );
        Ok(summary)
    }
}

async fn run_monitor<T: TickSource>(
    mut monitor: ColumnMonitor,
    mut ticks: T,
    mut commands: mpsc::Receiver<CommandRequest>,
    snapshots: watch::Sender<DashboardSnapshot>,
    mut shutdown: broadcast::Receiver<()>,
) -> RunSummary {
    let period = ticks.period();
    let reporter = LoopTimingReporter::new(period);
    let mut ticks_done = false;
    let mut ticks_received = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                debug!("monitor shutdown signal received");
                break;
            }
            tick = ticks.next_tick(), if !ticks_done => {
                let Some(tick) = tick else {
                    debug!(ticks = ticks_received, "tick source exhausted");
                    ticks_done = true;
                    continue;
                };
                ticks_received += 1;
                if !monitor.is_active() {
                    reporter.reset_baseline();
                    continue;
                }
                if let Some(deviation_us) = reporter.record_tick() {
                    trace!(tick = tick.sequence, deviation_us, "monitor tick");
                }
                if monitor.tick(tick.elapsed).is_some() {
                    snapshots.send_replace(monitor.snapshot());
                }
            }
            request = commands.recv() => {
                let Some(CommandRequest { command, reply }) = request else {
                    debug!("all monitor handles dropped");
                    break;
                };
                let result = monitor.apply(command);
                if !monitor.is_active() {
                    reporter.reset_baseline();
                }
                snapshots.send_replace(monitor.snapshot());
                let _ = reply.send(result);
            }
        }
    }

    RunSummary {
        jitter: reporter.summary(),
        monitor,
        ticks_received,
    }
}
