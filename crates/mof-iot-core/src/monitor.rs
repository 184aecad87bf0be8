//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Column monitor: simulation state, status and operator commands."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local};
use mof_iot_common::config::{AppConfig, ColumnConfig};
use mof_iot_logging::{log_system_event, mof_debug, mof_info, mof_warn, LogContext, SystemEventOutcome};
use mof_iot_sim::{AdsorptionEngine, FlowRate, SensorSample, SimulationState};
use serde::Serialize;

use crate::buffer::BoundedBuffer;
use crate::command::{Command, CommandError, CommandOutcome};
use crate::journal::{EventJournal, LogCategory, LogEntry};
use crate::status::{StatusController, SystemStatus, Transition, TransitionCause};

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub column: String,
    pub active: bool,
    pub status: SystemStatus,
    pub saturation: f64,
    pub flow_rate: FlowRate,
    pub max_flow_rate: f64,
    /// Critical threshold, drawn as the reference line on the saturation chart.
    pub capacity_threshold: f64,
    pub warning_threshold: f64,
    pub accumulated_load_mg: f64,
    pub max_load_mg: f64,
    pub ticks: u64,
    pub history: Vec<SensorSample>,
    pub log: Vec<LogEntry>,
}

impl DashboardSnapshot {
    pub fn latest(&self) -> Option<&SensorSample> {
        self.history.last()
    }

    pub fn maintenance_required(&self) -> bool {
        self.status == SystemStatus::Critical
    }
}

/// Owns the simulation state and applies ticks and operator commands in sequence.
#[derive(Debug)]
pub struct ColumnMonitor {
    column: ColumnConfig,
    engine: AdsorptionEngine,
    state: SimulationState,
    controller: StatusController,
    history: BoundedBuffer<SensorSample>,
    journal: EventJournal,
    flow_rate: FlowRate,
    default_flow_rate: FlowRate,
    max_flow_rate: f64,
    saturation: f64,
    active: bool,
}

impl ColumnMonitor {
    /// Build a monitor from validated configuration. Invalid capacity or
    /// thresholds fail here rather than producing NaN saturation later.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let engine = AdsorptionEngine::from_config(config)?;
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: &AppConfig, engine: AdsorptionEngine) -> Result<Self> {
        config.validate()?;
        let default_flow_rate = FlowRate::new(config.simulation.default_flow_rate_l_min)?;
        Ok(Self {
            column: config.column.clone(),
            engine,
            state: SimulationState::default(),
            controller: StatusController::new(config.thresholds),
            history: BoundedBuffer::new(config.simulation.history_capacity),
            journal: EventJournal::new(config.simulation.log_capacity),
            flow_rate: default_flow_rate,
            default_flow_rate,
            max_flow_rate: config.simulation.max_flow_rate_l_min,
            saturation: 0.0,
            active: false,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn status(&self) -> SystemStatus {
        self.controller.status()
    }

    pub fn saturation(&self) -> f64 {
        self.saturation
    }

    pub fn flow_rate(&self) -> FlowRate {
        self.flow_rate
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn history(&self) -> impl Iterator<Item = &SensorSample> {
        self.history.iter()
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    /// OFFLINE -> NORMAL. Returns the active flag.
    pub fn start(&mut self) -> bool {
        self.start_at(Local::now())
    }

    pub fn start_at(&mut self, at: DateTime<Local>) -> bool {
        if self.active {
            return true;
        }
        self.active = true;
        self.set_status(SystemStatus::Normal, TransitionCause::Started);
        self.log(
            LogCategory::Action,
            "Monitoring system started. Connecting probes...",
            at,
        );
        self.log(
            LogCategory::Info,
            format!("Sensor online: {} discharge outlet", self.column.label),
            at,
        );
        true
    }

    /// Any -> OFFLINE. The accumulated load is kept. Returns the active flag.
    pub fn stop(&mut self) -> bool {
        self.stop_at(Local::now())
    }

    pub fn stop_at(&mut self, at: DateTime<Local>) -> bool {
        self.active = false;
        if !self.set_status(SystemStatus::Offline, TransitionCause::Stopped) {
            return false;
        }
        self.log(
            LogCategory::Action,
            "Stop command received. Shutting down...",
            at,
        );
        false
    }

    pub fn toggle(&mut self) -> bool {
        if self.active {
            self.stop()
        } else {
            self.start()
        }
    }

    /// Regenerate the column: zero load, empty history, default flow rate and
    /// NORMAL status whether or not the monitor is running.
    pub fn reset(&mut self) {
        self.reset_at(Local::now())
    }

    pub fn reset_at(&mut self, at: DateTime<Local>) {
        self.state = SimulationState::default();
        self.history.clear();
        self.saturation = 0.0;
        self.flow_rate = self.default_flow_rate;
        self.set_status(SystemStatus::Normal, TransitionCause::Reset);
        self.log(LogCategory::Action, "System reset. MOF column regenerated.", at);
        let capacity_g = self.engine.params().capacity.max_load_mg() / 1000.0;
        self.log(
            LogCategory::Info,
            format!(
                "Calibration: maximum adsorption capacity {} g ({} mg/g basis)",
                capacity_g, self.column.capacity_mg_per_g
            ),
            at,
        );
        self.log(
            LogCategory::Info,
            "Valve switched to primary adsorption column.",
            at,
        );
    }

    /// Cartridge replaced: zero load and NORMAL status from any state.
    pub fn confirm_maintenance(&mut self) {
        self.confirm_maintenance_at(Local::now())
    }

    pub fn confirm_maintenance_at(&mut self, at: DateTime<Local>) {
        self.state = self.state.regenerated();
        self.saturation = 0.0;
        self.set_status(SystemStatus::Normal, TransitionCause::Maintenance);
        self.log(
            LogCategory::Action,
            "Cartridge replacement confirmed. System back to normal operation.",
            at,
        );
    }

    /// Negative or non-finite values are rejected and leave the flow rate unchanged.
    pub fn set_flow_rate(&mut self, l_per_min: f64) -> Result<FlowRate, CommandError> {
        match FlowRate::new(l_per_min) {
            Ok(rate) => {
                self.flow_rate = rate;
                mof_debug!(context = self.log_context(), "flow rate set to {}", rate);
                Ok(rate)
            }
            Err(err) => {
                log_system_event(
                    Some(&self.log_context()),
                    "command.set_flow_rate",
                    &err.to_string(),
                    SystemEventOutcome::Fault,
                );
                Err(err.into())
            }
        }
    }

    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        match command {
            Command::Start => {
                self.start();
            }
            Command::Stop => {
                self.stop();
            }
            Command::Toggle => {
                self.toggle();
            }
            Command::Reset => self.reset(),
            Command::ConfirmMaintenance => self.confirm_maintenance(),
            Command::SetFlowRate(value) => {
                self.set_flow_rate(value)?;
            }
        }
        log_system_event(
            Some(&self.log_context()),
            &format!("command.{}", command.name()),
            "command applied",
            SystemEventOutcome::Success,
        );
        Ok(CommandOutcome {
            active: self.active,
            status: self.status(),
            flow_rate: self.flow_rate,
        })
    }

    /// Advance the simulation by one wall-clock step. Ignored while inactive.
    pub fn tick(&mut self, elapsed: Duration) -> Option<SensorSample> {
        self.tick_at(elapsed, Local::now())
    }

    pub fn tick_at(&mut self, elapsed: Duration, at: DateTime<Local>) -> Option<SensorSample> {
        if !self.active {
            mof_debug!(context = self.log_context(), "tick ignored while offline");
            return None;
        }
        let outcome = self.engine.tick(self.state, self.flow_rate, elapsed, at);
        self.state = outcome.state;
        self.saturation = outcome.balance.saturation;
        self.history.push(outcome.sample.clone());

        if let Some(transition) = self.controller.evaluate(self.saturation) {
            self.on_threshold_transition(transition, at);
        }
        Some(outcome.sample)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let thresholds = self.controller.thresholds();
        DashboardSnapshot {
            column: self.column.label.clone(),
            active: self.active,
            status: self.status(),
            saturation: self.saturation,
            flow_rate: self.flow_rate,
            max_flow_rate: self.max_flow_rate,
            capacity_threshold: thresholds.critical,
            warning_threshold: thresholds.warning,
            accumulated_load_mg: self.state.accumulated_load_mg,
            max_load_mg: self.engine.params().capacity.max_load_mg(),
            ticks: self.state.steps,
            history: self.history.to_vec(),
            log: self.journal.entries(),
        }
    }

    fn on_threshold_transition(&mut self, transition: Transition, at: DateTime<Local>) {
        match transition.cause {
            TransitionCause::CriticalThreshold { saturation } => {
                self.log(
                    LogCategory::Alert,
                    format!(
                        "MOF saturation at {:.1}%! Breakthrough imminent.",
                        saturation * 100.0
                    ),
                    at,
                );
                self.log(
                    LogCategory::Info,
                    "Maintenance crew notified for cartridge replacement.",
                    at,
                );
                self.log(
                    LogCategory::Action,
                    "Operator confirmation required: replace adsorption column.",
                    at,
                );
            }
            TransitionCause::WarningThreshold { saturation } => {
                mof_debug!(
                    context = self.log_context(),
                    "warning threshold crossed at {:.2}%",
                    saturation * 100.0
                );
                self.log(
                    LogCategory::Alert,
                    format!(
                        "Saturation approaching threshold (>{:.0}%), removal efficiency declining",
                        saturation * 100.0
                    ),
                    at,
                );
            }
            TransitionCause::Recovered { saturation } => {
                mof_info!(
                    context = self.log_context(),
                    "saturation back below warning threshold ({:.1}%)",
                    saturation * 100.0
                );
            }
            _ => {}
        }
    }

    /// Returns whether the status actually changed.
    fn set_status(&mut self, next: SystemStatus, cause: TransitionCause) -> bool {
        let Some(transition) = self.controller.force(next, cause) else {
            return false;
        };
        mof_debug!(
            context = self.log_context(),
            "status {} -> {} ({:?})",
            transition.from,
            transition.to,
            transition.cause
        );
        true
    }

    fn log(&mut self, category: LogCategory, message: impl Into<String>, at: DateTime<Local>) {
        let entry = self.journal.record(category, message, at);
        let ctx = self.log_context();
        match category {
            LogCategory::Alert => mof_warn!(context = ctx, "[{}] {}", entry.category, entry.message),
            LogCategory::Info | LogCategory::Action => {
                mof_info!(context = ctx, "[{}] {}", entry.category, entry.message)
            }
        }
    }

    fn log_context(&self) -> LogContext<'_> {
        LogContext::new()
            .with_column(&self.column.label)
            .with_tick(self.state.steps)
            .with_status(self.controller.status().as_str())
    }
}
