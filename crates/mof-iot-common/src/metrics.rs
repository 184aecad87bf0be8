//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Sampling loop timing statistics for the monitor runtime."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
//! The monitor may run for days, so tick spacing is folded into a running
//! aggregate instead of a sample list. Deviations are signed: positive
//! means the sensor reading arrived late.
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::time::jitter_us;

/// Running statistics over signed tick deviations (microseconds).
#[derive(Debug, Default, Clone, Copy)]
struct DeviationStats {
    samples: u64,
    mean_us: f64,
    m2: f64,
    abs_sum_us: f64,
    max_late_us: i64,
    max_early_us: i64,
    late_ticks: u64,
}

impl DeviationStats {
    // Welford update.
    fn push(&mut self, deviation_us: i64, late_tolerance_us: i64) {
        let value = deviation_us as f64;
        self.samples += 1;
        let delta = value - self.mean_us;
        self.mean_us += delta / self.samples as f64;
        self.m2 += delta * (value - self.mean_us);
        self.abs_sum_us += value.abs();
        self.max_late_us = self.max_late_us.max(deviation_us);
        self.max_early_us = self.max_early_us.max(-deviation_us);
        if deviation_us > late_tolerance_us {
            self.late_ticks += 1;
        }
    }

    fn summary(&self, target: Duration) -> Option<JitterSummary> {
        if self.samples == 0 {
            return None;
        }
        let std_dev_us = if self.samples > 1 {
            (self.m2 / (self.samples - 1) as f64).sqrt()
        } else {
            0.0
        };
        Some(JitterSummary {
            target_interval_ms: target.as_millis() as u64,
            samples: self.samples,
            mean_deviation_us: self.mean_us,
            mean_abs_deviation_us: self.abs_sum_us / self.samples as f64,
            std_dev_us,
            max_late_us: self.max_late_us,
            max_early_us: self.max_early_us,
            late_ticks: self.late_ticks,
        })
    }
}

/// Shutdown report for the sampling loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JitterSummary {
    pub target_interval_ms: u64,
    pub samples: u64,
    pub mean_deviation_us: f64,
    pub mean_abs_deviation_us: f64,
    pub std_dev_us: f64,
    pub max_late_us: i64,
    pub max_early_us: i64,
    /// Ticks that arrived more than 10% of the interval late.
    pub late_ticks: u64,
}

#[derive(Debug, Default)]
struct TimingState {
    last_tick: Option<Instant>,
    stats: DeviationStats,
}

/// Measures simulation tick spacing against the configured interval.
#[derive(Debug)]
pub struct LoopTimingReporter {
    target_interval: Duration,
    late_tolerance_us: i64,
    state: Mutex<TimingState>,
}

impl LoopTimingReporter {
    pub fn new(target_interval: Duration) -> Self {
        Self {
            target_interval,
            late_tolerance_us: (target_interval.as_micros() / 10) as i64,
            state: Mutex::new(TimingState::default()),
        }
    }

    pub fn record_tick(&self) -> Option<i64> {
        self.record_tick_at(Instant::now())
    }

    /// Returns the signed deviation from the target interval, or `None` for
    /// the first tick after a baseline reset.
    pub fn record_tick_at(&self, now: Instant) -> Option<i64> {
        let mut state = self.state.lock();
        let previous = state.last_tick.replace(now)?;
        let deviation = jitter_us(now.saturating_duration_since(previous), self.target_interval);
        state.stats.push(deviation, self.late_tolerance_us);
        Some(deviation)
    }

    /// Forget the previous tick so a pause while OFFLINE is not reported.
    pub fn reset_baseline(&self) {
        self.state.lock().last_tick = None;
    }

    pub fn summary(&self) -> Option<JitterSummary> {
        self.state.lock().stats.summary(self.target_interval)
    }
}
