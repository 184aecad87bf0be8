//! ---
//! mof_section: "11-simulation"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Column capacity and breakthrough-curve model."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
//! Physical model of the MOF cartridge.
//!
//! The column is a fixed-capacity mass sink. Removal efficiency follows a
//! piecewise breakthrough curve in saturation `s`:
//!
//! ```text
//! s <  knee : eta = pre_breakthrough + jitter
//! s >= knee : p = clamp((s - knee) / band, 0, 1)
//!             eta = plateau * (1 - p^3)
//! ```
//!
//! The cubic keeps efficiency near the plateau just past the knee and
//! collapses it as the cartridge approaches full load.

use mof_iot_common::config::ColumnConfig;
use serde::Serialize;

use crate::error::{Result, SimError};

/// Total adsorption capacity of the cartridge in milligrams. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnCapacity {
    max_load_mg: f64,
}

impl ColumnCapacity {
    pub fn new(capacity_mg_per_g: f64, adsorbent_mass_g: f64) -> Result<Self> {
        let max_load_mg = capacity_mg_per_g * adsorbent_mass_g;
        let valid = capacity_mg_per_g.is_finite()
            && adsorbent_mass_g.is_finite()
            && capacity_mg_per_g > 0.0
            && adsorbent_mass_g > 0.0
            && max_load_mg.is_finite();
        if !valid {
            return Err(SimError::InvalidCapacity {
                capacity_mg_per_g,
                adsorbent_mass_g,
            });
        }
        Ok(Self { max_load_mg })
    }

    pub fn from_config(column: &ColumnConfig) -> Result<Self> {
        Self::new(column.capacity_mg_per_g, column.adsorbent_mass_g)
    }

    pub fn max_load_mg(&self) -> f64 {
        self.max_load_mg
    }

    /// Fraction of capacity consumed, clamped to `[0, 1]`.
    pub fn saturation(&self, accumulated_load_mg: f64) -> f64 {
        // max/min rather than clamp so a NaN load reports as empty
        (accumulated_load_mg / self.max_load_mg).max(0.0).min(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakthroughCurve {
    /// Saturation at which breakthrough begins.
    pub knee: f64,
    /// Width of the breakthrough band above the knee.
    pub band: f64,
    /// Base efficiency below the knee.
    pub pre_breakthrough: f64,
    /// Efficiency at the start of the breakthrough band.
    pub plateau: f64,
}

impl Default for BreakthroughCurve {
    fn default() -> Self {
        Self {
            knee: 0.8,
            band: 0.2,
            pre_breakthrough: 0.998,
            plateau: 0.99,
        }
    }
}

impl BreakthroughCurve {
    /// Removal efficiency in `[0, 1]` at the given saturation.
    ///
    /// `jitter` only applies below the knee.
    pub fn efficiency(&self, saturation: f64, jitter: f64) -> f64 {
        let s = saturation.max(0.0).min(1.0);
        let efficiency = if s < self.knee {
            self.pre_breakthrough + jitter
        } else {
            let progress = ((s - self.knee) / self.band).clamp(0.0, 1.0);
            self.plateau * (1.0 - progress.powi(3))
        };
        efficiency.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_column_holds_two_and_a_half_kilograms() {
        let capacity = ColumnCapacity::from_config(&ColumnConfig::default()).unwrap();
        assert_eq!(capacity.max_load_mg(), 2_500_000.0);
    }

    #[test]
    fn zero_or_negative_capacity_is_rejected() {
        assert!(ColumnCapacity::new(0.0, 10_000.0).is_err());
        assert!(ColumnCapacity::new(250.0, -1.0).is_err());
        assert!(ColumnCapacity::new(f64::NAN, 1.0).is_err());
        assert!(ColumnCapacity::new(f64::MAX, f64::MAX).is_err());
    }

    #[test]
    fn saturation_is_clamped() {
        let capacity = ColumnCapacity::new(1.0, 100.0).unwrap();
        assert_eq!(capacity.saturation(0.0), 0.0);
        assert_eq!(capacity.saturation(50.0), 0.5);
        assert_eq!(capacity.saturation(1_000.0), 1.0);
        assert_eq!(capacity.saturation(-5.0), 0.0);
        assert_eq!(capacity.saturation(f64::NAN), 0.0);
    }

    #[test]
    fn efficiency_is_near_unity_before_knee() {
        let curve = BreakthroughCurve::default();
        assert_eq!(curve.efficiency(0.0, 0.0), 0.998);
        assert!((curve.efficiency(0.79, 0.0005) - 0.9985).abs() < 1e-12);
    }

    #[test]
    fn efficiency_collapses_past_knee() {
        let curve = BreakthroughCurve::default();
        let at_knee = curve.efficiency(0.8, 0.0);
        let early = curve.efficiency(0.81, 0.0);
        let late = curve.efficiency(0.95, 0.0);
        assert!((at_knee - 0.99).abs() < 1e-12);
        assert!(late < early);
        assert!((late - 0.99 * (1.0 - 0.75f64.powi(3))).abs() < 1e-12);
        assert_eq!(curve.efficiency(1.0, 0.0), 0.0);
    }

    #[test]
    fn efficiency_is_monotone_over_band() {
        let curve = BreakthroughCurve::default();
        let mut previous = curve.efficiency(0.8, 0.0);
        for step in 1..=200 {
            let s = 0.8 + 0.2 * step as f64 / 200.0;
            let current = curve.efficiency(s, 0.0);
            assert!(current <= previous);
            assert!((0.0..=1.0).contains(&current));
            previous = current;
        }
    }

    #[test]
    fn jitter_never_pushes_efficiency_above_one() {
        let curve = BreakthroughCurve::default();
        assert_eq!(curve.efficiency(0.1, 0.5), 1.0);
    }
}
