//! ---
//! mof_section: "11-simulation"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Mass-balance integration of the adsorption column."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
//! Explicit-Euler integration of `d(load)/dt = Q * (Cin - Cout)`.
//!
//! Each tick converts the wall-clock step into simulated minutes through the
//! time-acceleration factor and adds `(Cin - Cout) * Q * dt_sim` milligrams to
//! the accumulated load. Saturation and efficiency are taken from the load
//! *before* the step. The accumulator itself is not clamped; only the
//! reported ratio is, and overshoot is limited to one step because efficiency
//! reaches zero at full saturation.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local};
use mof_iot_common::config::AppConfig;
use mof_iot_common::time::simulated_minutes;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::flow::FlowRate;
use crate::generator::InletGenerator;
use crate::model::{BreakthroughCurve, ColumnCapacity};
use crate::samples::SensorSample;

/// Mutable process state owned by the engine loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub accumulated_load_mg: f64,
    pub steps: u64,
}

impl SimulationState {
    /// Regenerated cartridge.
    pub fn regenerated(self) -> Self {
        Self {
            accumulated_load_mg: 0.0,
            ..self
        }
    }
}

/// Fixed numerical parameters of the column model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    pub capacity: ColumnCapacity,
    pub curve: BreakthroughCurve,
    pub time_acceleration: f64,
    /// Baseline outlet reading (mg/L); the outlet never reads below it.
    pub residual_outlet_mg_l: f64,
}

impl EngineParams {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            capacity: ColumnCapacity::from_config(&config.column)?,
            curve: BreakthroughCurve::default(),
            time_acceleration: config.simulation.time_acceleration,
            residual_outlet_mg_l: config.simulation.residual_outlet_mg_l,
        })
    }
}

/// Unrounded result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassBalance {
    pub inlet_mg_l: f64,
    pub outlet_mg_l: f64,
    pub efficiency: f64,
    /// Saturation before the step, clamped to `[0, 1]`.
    pub saturation: f64,
    pub adsorbed_mg: f64,
}

/// Pure integration step. `inlet_mg_l` and `jitter` are supplied by the caller.
pub fn advance(
    params: &EngineParams,
    state: SimulationState,
    inlet_mg_l: f64,
    jitter: f64,
    flow: FlowRate,
    elapsed: Duration,
) -> (MassBalance, SimulationState) {
    let inlet = inlet_mg_l.max(0.0);
    let saturation = params.capacity.saturation(state.accumulated_load_mg);
    let efficiency = params.curve.efficiency(saturation, jitter);
    let outlet = (inlet * (1.0 - efficiency))
        .max(params.residual_outlet_mg_l)
        .min(inlet);

    let dt_minutes = simulated_minutes(elapsed, params.time_acceleration);
    let adsorbed_mg = (inlet - outlet) * flow.l_per_min() * dt_minutes;

    let next = SimulationState {
        accumulated_load_mg: state.accumulated_load_mg + adsorbed_mg,
        steps: state.steps + 1,
    };
    let balance = MassBalance {
        inlet_mg_l: inlet,
        outlet_mg_l: outlet,
        efficiency,
        saturation,
        adsorbed_mg,
    };
    (balance, next)
}

/// Output of [`AdsorptionEngine::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub sample: SensorSample,
    pub balance: MassBalance,
    pub state: SimulationState,
}

/// Stochastic front-end around [`advance`].
#[derive(Debug)]
pub struct AdsorptionEngine {
    params: EngineParams,
    generator: InletGenerator,
}

impl AdsorptionEngine {
    pub fn new(params: EngineParams, generator: InletGenerator) -> Self {
        Self { params, generator }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let params = EngineParams::from_config(config)?;
        let generator = InletGenerator::from_config(&config.simulation)?;
        Ok(Self::new(params, generator))
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn saturation(&self, state: &SimulationState) -> f64 {
        self.params.capacity.saturation(state.accumulated_load_mg)
    }

    pub fn tick(
        &mut self,
        state: SimulationState,
        flow: FlowRate,
        elapsed: Duration,
        at: DateTime<Local>,
    ) -> TickOutcome {
        let inlet = self.generator.next_inlet();
        let jitter = self.generator.efficiency_jitter();
        let (balance, state) = advance(&self.params, state, inlet, jitter, flow, elapsed);
        trace!(
            step = state.steps,
            inlet = balance.inlet_mg_l,
            outlet = balance.outlet_mg_l,
            efficiency = balance.efficiency,
            saturation = balance.saturation,
            load_mg = state.accumulated_load_mg,
            "adsorption step"
        );
        let sample = SensorSample::new(
            &at,
            balance.inlet_mg_l,
            balance.outlet_mg_l,
            balance.saturation,
        );
        TickOutcome {
            sample,
            balance,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::InletMode;

    const STEP: Duration = Duration::from_millis(1500);

    fn params() -> EngineParams {
        EngineParams::from_config(&AppConfig::default()).unwrap()
    }

    fn rate(value: f64) -> FlowRate {
        FlowRate::new(value).unwrap()
    }

    #[test]
    fn fresh_column_removes_almost_everything() {
        let (balance, next) = advance(&params(), SimulationState::default(), 50.0, 0.0, rate(20.0), STEP);
        assert_eq!(balance.saturation, 0.0);
        assert_eq!(balance.efficiency, 0.998);
        assert!((balance.outlet_mg_l - 0.1).abs() < 1e-9);
        // (50 - 0.1) mg/L * 20 L/min * 90 min
        assert!((balance.adsorbed_mg - 89_820.0).abs() < 1e-6);
        assert_eq!(next.steps, 1);
    }

    #[test]
    fn zero_flow_transfers_no_mass() {
        let state = SimulationState {
            accumulated_load_mg: 1_000.0,
            steps: 3,
        };
        let (balance, next) = advance(&params(), state, 50.0, 0.0, FlowRate::ZERO, STEP);
        assert_eq!(balance.adsorbed_mg, 0.0);
        assert_eq!(next.accumulated_load_mg, 1_000.0);
    }

    #[test]
    fn outlet_is_floored_but_never_above_inlet() {
        let (balance, _) = advance(&params(), SimulationState::default(), 50.0, 0.002, rate(1.0), STEP);
        assert_eq!(balance.outlet_mg_l, 0.01);

        let (balance, _) = advance(&params(), SimulationState::default(), 0.005, 0.0, rate(1.0), STEP);
        assert_eq!(balance.outlet_mg_l, 0.005);
        assert_eq!(balance.adsorbed_mg, 0.0);
    }

    #[test]
    fn full_column_passes_everything() {
        let p = params();
        let state = SimulationState {
            accumulated_load_mg: p.capacity.max_load_mg() * 1.01,
            steps: 0,
        };
        let (balance, next) = advance(&p, state, 50.0, 0.0, rate(20.0), STEP);
        assert_eq!(balance.saturation, 1.0);
        assert_eq!(balance.outlet_mg_l, 50.0);
        assert_eq!(next.accumulated_load_mg, state.accumulated_load_mg);
    }

    #[test]
    fn regenerated_keeps_step_counter() {
        let state = SimulationState {
            accumulated_load_mg: 12.0,
            steps: 9,
        };
        assert_eq!(
            state.regenerated(),
            SimulationState {
                accumulated_load_mg: 0.0,
                steps: 9
            }
        );
    }

    #[test]
    fn engine_tick_emits_rounded_sample() -> Result<()> {
        let generator = InletGenerator::new(InletMode::Fixed(50.0), 0.0, Some(1))?;
        let mut engine = AdsorptionEngine::new(params(), generator);
        let outcome = engine.tick(SimulationState::default(), rate(20.0), STEP, Local::now());
        assert_eq!(outcome.sample.inlet_concentration, 50.0);
        assert_eq!(outcome.sample.outlet_concentration, 0.1);
        assert_eq!(outcome.sample.saturation, 0.0);
        assert!(outcome.state.accumulated_load_mg > 0.0);
        Ok(())
    }
}
