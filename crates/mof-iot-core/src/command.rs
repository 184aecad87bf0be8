//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Operator commands accepted by the column monitor."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use std::str::FromStr;

use mof_iot_sim::{FlowRate, SimError};
use serde::Serialize;
use thiserror::Error;

use crate::status::SystemStatus;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Toggle,
    Reset,
    ConfirmMaintenance,
    /// Raw operator value in L/min, validated when applied.
    SetFlowRate(f64),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Toggle => "toggle",
            Command::Reset => "reset",
            Command::ConfirmMaintenance => "confirm_maintenance",
            Command::SetFlowRate(_) => "set_flow_rate",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    InvalidFlowRate(#[from] SimError),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("command '{0}' requires an argument")]
    MissingArgument(&'static str),
    #[error("'{0}' is not a number")]
    MalformedNumber(String),
    #[error("empty command")]
    Empty,
}

/// State reported back after a command is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommandOutcome {
    pub active: bool,
    pub status: SystemStatus,
    pub flow_rate: FlowRate,
}

impl FromStr for Command {
    type Err = CommandError;

    /// Console syntax: `start`, `stop`, `toggle`, `reset`, `maintain`/`confirm`,
    /// `flow <L/min>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();
        let command = match verb.as_str() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "toggle" => Command::Toggle,
            "reset" => Command::Reset,
            "maintain" | "confirm" | "maintenance" => Command::ConfirmMaintenance,
            "flow" => {
                let raw = parts.next().ok_or(CommandError::MissingArgument("flow"))?;
                let value = raw
                    .parse::<f64>()
                    .map_err(|_| CommandError::MalformedNumber(raw.to_owned()))?;
                Command::SetFlowRate(value)
            }
            _ => return Err(CommandError::UnknownCommand(verb)),
        };
        Ok(command)
    }
}
