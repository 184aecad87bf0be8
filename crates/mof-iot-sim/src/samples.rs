//! ---
//! mof_section: "11-simulation"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Sensor samples emitted by the simulation engine."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use chrono::{DateTime, TimeZone};
use mof_iot_common::time::axis_label;
use serde::{Deserialize, Serialize};

/// One simulated reading, rounded to display precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSample {
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    pub time_label: String,
    /// mg/L, two decimals.
    pub inlet_concentration: f64,
    /// mg/L, three decimals. Never above the inlet reading.
    pub outlet_concentration: f64,
    /// Fraction in `[0, 1]`, four decimals.
    pub saturation: f64,
}

impl SensorSample {
    pub fn new<Tz: TimeZone>(
        at: &DateTime<Tz>,
        inlet_mg_l: f64,
        outlet_mg_l: f64,
        saturation: f64,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let inlet = round_to(inlet_mg_l.max(0.0), 2);
        let outlet = round_to(outlet_mg_l.max(0.0), 3).min(inlet);
        Self {
            timestamp: at.timestamp_millis(),
            time_label: axis_label(at),
            inlet_concentration: inlet,
            outlet_concentration: outlet,
            saturation: round_to(saturation.clamp(0.0, 1.0), 4),
        }
    }

    /// Saturation as a percentage for display.
    pub fn saturation_percent(&self) -> f64 {
        self.saturation * 100.0
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
