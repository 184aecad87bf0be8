//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Saturation-driven status state machine."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
//! Status state machine.
//!
//! Threshold transitions are edge-triggered: [`StatusController::evaluate`]
//! reports a [`Transition`] only on the tick the status changes, so callers
//! can attach one-shot side effects to it. CRITICAL is sticky and is left only
//! through an explicit command.

use mof_iot_common::config::ThresholdConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SystemStatus {
    #[default]
    Offline,
    Normal,
    Warning,
    Critical,
}

impl SystemStatus {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Why the status changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionCause {
    Started,
    Stopped,
    Reset,
    Maintenance,
    WarningThreshold { saturation: f64 },
    CriticalThreshold { saturation: f64 },
    Recovered { saturation: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: SystemStatus,
    pub to: SystemStatus,
    pub cause: TransitionCause,
}

#[derive(Debug, Clone)]
pub struct StatusController {
    status: SystemStatus,
    thresholds: ThresholdConfig,
}

impl StatusController {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self {
            status: SystemStatus::Offline,
            thresholds,
        }
    }

    pub fn status(&self) -> SystemStatus {
        self.status
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        self.thresholds
    }

    /// Apply the threshold table for one tick.
    pub fn evaluate(&mut self, saturation: f64) -> Option<Transition> {
        let ThresholdConfig { warning, critical } = self.thresholds;
        let (next, cause) = match self.status {
            SystemStatus::Offline | SystemStatus::Critical => return None,
            SystemStatus::Normal | SystemStatus::Warning if saturation >= critical => (
                SystemStatus::Critical,
                TransitionCause::CriticalThreshold { saturation },
            ),
            SystemStatus::Normal if saturation >= warning => (
                SystemStatus::Warning,
                TransitionCause::WarningThreshold { saturation },
            ),
            SystemStatus::Warning if saturation < warning => (
                SystemStatus::Normal,
                TransitionCause::Recovered { saturation },
            ),
            SystemStatus::Normal | SystemStatus::Warning => return None,
        };
        self.transition(next, cause)
    }

    /// Command-driven change. Returns `None` when the status is unchanged.
    pub fn force(&mut self, next: SystemStatus, cause: TransitionCause) -> Option<Transition> {
        self.transition(next, cause)
    }

    fn transition(&mut self, next: SystemStatus, cause: TransitionCause) -> Option<Transition> {
        if next == self.status {
            return None;
        }
        let from = std::mem::replace(&mut self.status, next);
        Some(Transition {
            from,
            to: next,
            cause,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> StatusController {
        let mut controller = StatusController::new(ThresholdConfig::default());
        controller.force(SystemStatus::Normal, TransitionCause::Started);
        controller
    }

    #[test]
    fn starts_offline_and_ignores_saturation() {
        let mut controller = StatusController::new(ThresholdConfig::default());
        assert_eq!(controller.status(), SystemStatus::Offline);
        assert_eq!(controller.evaluate(0.99), None);
        assert_eq!(controller.status(), SystemStatus::Offline);
    }

    #[test]
    fn normal_to_warning_is_edge_triggered() {
        let mut controller = running();
        assert_eq!(controller.evaluate(0.5), None);
        let transition = controller.evaluate(0.85).unwrap();
        assert_eq!(transition.from, SystemStatus::Normal);
        assert_eq!(transition.to, SystemStatus::Warning);
        assert_eq!(controller.evaluate(0.86), None);
        assert_eq!(controller.evaluate(0.87), None);
    }

    #[test]
    fn warning_to_critical_fires_once() {
        let mut controller = running();
        controller.evaluate(0.86);
        let transition = controller.evaluate(0.90).unwrap();
        assert_eq!(transition.to, SystemStatus::Critical);
        assert!(matches!(
            transition.cause,
            TransitionCause::CriticalThreshold { .. }
        ));
        for _ in 0..10 {
            assert_eq!(controller.evaluate(0.97), None);
        }
    }

    #[test]
    fn normal_jumps_straight_to_critical() {
        let mut controller = running();
        let transition = controller.evaluate(0.95).unwrap();
        assert_eq!(transition.from, SystemStatus::Normal);
        assert_eq!(transition.to, SystemStatus::Critical);
    }

    #[test]
    fn warning_recovers_below_threshold() {
        let mut controller = running();
        controller.evaluate(0.86);
        let transition = controller.evaluate(0.2).unwrap();
        assert_eq!(transition.to, SystemStatus::Normal);
        assert!(matches!(transition.cause, TransitionCause::Recovered { .. }));
    }

    #[test]
    fn critical_is_sticky_until_forced() {
        let mut controller = running();
        controller.evaluate(0.95);
        assert_eq!(controller.evaluate(0.0), None);
        assert_eq!(controller.status(), SystemStatus::Critical);
        let transition = controller
            .force(SystemStatus::Normal, TransitionCause::Maintenance)
            .unwrap();
        assert_eq!(transition.from, SystemStatus::Critical);
        assert_eq!(controller.status(), SystemStatus::Normal);
    }

    #[test]
    fn forcing_current_status_is_silent() {
        let mut controller = running();
        assert_eq!(
            controller.force(SystemStatus::Normal, TransitionCause::Reset),
            None
        );
    }

    #[test]
    fn status_labels() {
        assert_eq!(SystemStatus::Critical.to_string(), "CRITICAL");
        assert_eq!(SystemStatus::Warning.as_str(), "WARNING");
        assert_eq!("OFFLINE".parse::<SystemStatus>().unwrap(), SystemStatus::Offline);
    }
}
