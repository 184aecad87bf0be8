//! ---
//! mof_section: "11-simulation"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Validated operator flow-rate parameter."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Volumetric flow through the column in L/min. Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FlowRate(f64);

impl FlowRate {
    pub const ZERO: FlowRate = FlowRate(0.0);

    pub fn new(l_per_min: f64) -> Result<Self> {
        if !l_per_min.is_finite() || l_per_min < 0.0 {
            return Err(SimError::InvalidFlowRate(l_per_min));
        }
        // normalise -0.0
        Ok(Self(if l_per_min == 0.0 { 0.0 } else { l_per_min }))
    }

    pub fn l_per_min(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for FlowRate {
    type Error = SimError;

    fn try_from(value: f64) -> Result<Self> {
        FlowRate::new(value)
    }
}

impl From<FlowRate> for f64 {
    fn from(value: FlowRate) -> Self {
        value.0
    }
}

impl FromStr for FlowRate {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| SimError::MalformedFlowRate(trimmed.to_owned()))?;
        FlowRate::new(value)
    }
}

impl fmt::Display for FlowRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} L/min", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zero_and_positive() {
        assert_eq!(FlowRate::new(0.0).unwrap(), FlowRate::ZERO);
        assert_eq!(FlowRate::new(20.0).unwrap().l_per_min(), 20.0);
        assert_eq!(FlowRate::new(-0.0).unwrap().l_per_min().to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        assert_eq!(FlowRate::new(-1.0), Err(SimError::InvalidFlowRate(-1.0)));
        assert!(FlowRate::new(f64::NAN).is_err());
        assert!(FlowRate::new(f64::INFINITY).is_err());
    }

    #[test]
    fn parses_operator_text() {
        assert_eq!("  35.5 ".parse::<FlowRate>().unwrap().l_per_min(), 35.5);
        assert_eq!(
            "fast".parse::<FlowRate>(),
            Err(SimError::MalformedFlowRate("fast".into()))
        );
        assert!("-3".parse::<FlowRate>().is_err());
    }

    #[test]
    fn serde_rejects_negative() {
        assert!(serde_json::from_str::<FlowRate>("-2.0").is_err());
        let rate: FlowRate = serde_json::from_str("12.5").unwrap();
        assert_eq!(serde_json::to_string(&rate).unwrap(), "12.5");
        assert_eq!(rate.to_string(), "12.50 L/min");
    }
}
