//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Shared primitives and utilities for the core runtime."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use std::time::Duration;

use chrono::{DateTime, TimeZone};

/// Chart axis label (`MM:SS`).
pub fn axis_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%M:%S").to_string()
}

/// Journal clock label (`HH:MM:SS`, 24h).
pub fn clock_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M:%S").to_string()
}

/// Convert a wall-clock step into simulated process minutes.
pub fn simulated_minutes(wall_clock: Duration, acceleration: f64) -> f64 {
    wall_clock.as_secs_f64() / 60.0 * acceleration
}

/// Signed deviation of `actual` from `expected` in microseconds.
pub fn jitter_us(actual: Duration, expected: Duration) -> i64 {
    let actual_us = actual.as_secs_f64() * 1_000_000.0;
    let expected_us = expected.as_secs_f64() * 1_000_000.0;
    (actual_us - expected_us).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn labels_use_fixed_width_fields() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 7, 3, 9).unwrap();
        assert_eq!(axis_label(&at), "03:09");
        assert_eq!(clock_label(&at), "07:03:09");
    }

    #[test]
    fn one_and_a_half_seconds_is_ninety_minutes_at_3600x() {
        let minutes = simulated_minutes(Duration::from_millis(1500), 3600.0);
        assert!((minutes - 90.0).abs() < 1e-9);
    }

    #[test]
    fn jitter_is_signed() {
        assert_eq!(
            jitter_us(Duration::from_millis(9), Duration::from_millis(10)),
            -1000
        );
        assert_eq!(
            jitter_us(Duration::from_millis(1503), Duration::from_millis(1500)),
            3000
        );
    }
}
