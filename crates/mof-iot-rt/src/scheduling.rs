//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Runtime helpers supporting the monitor loop."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// One scheduling event handed to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1-based sequence number within the source.
    pub sequence: u64,
    /// Wall-clock step the engine should integrate over.
    pub elapsed: Duration,
}

/// Source of simulation ticks. `None` means the source is exhausted.
#[async_trait]
pub trait TickSource: Send {
    async fn next_tick(&mut self) -> Option<Tick>;

    /// Nominal spacing between ticks, used for jitter reporting.
    fn period(&self) -> Duration;
}

/// Wall-clock interval ticks. Missed ticks are delayed rather than burst.
#[derive(Debug)]
pub struct IntervalTicks {
    interval: tokio::time::Interval,
    period: Duration,
    sequence: u64,
}

impl IntervalTicks {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            period,
            sequence: 0,
        }
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) -> Option<Tick> {
        self.interval.tick().await;
        self.sequence += 1;
        trace!(sequence = self.sequence, "interval tick");
        Some(Tick {
            sequence: self.sequence,
            elapsed: self.period,
        })
    }

    fn period(&self) -> Duration {
        self.period
    }
}

/// A bounded run of ticks with a constant step and no waiting.
#[derive(Debug, Clone)]
pub struct FixedTicks {
    step: Duration,
    remaining: u64,
    sequence: u64,
}

impl FixedTicks {
    pub fn new(count: u64, step: Duration) -> Self {
        Self {
            step,
            remaining: count,
            sequence: 0,
        }
    }
}

impl Iterator for FixedTicks {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.sequence += 1;
        Some(Tick {
            sequence: self.sequence,
            elapsed: self.step,
        })
    }
}

#[async_trait]
impl TickSource for FixedTicks {
    async fn next_tick(&mut self) -> Option<Tick> {
        self.next()
    }

    fn period(&self) -> Duration {
        self.step
    }
}

/// Ticks fed explicitly through a [`TickFeeder`]. Exhausted once every feeder is dropped.
#[derive(Debug)]
pub struct ManualTicks {
    rx: mpsc::UnboundedReceiver<Duration>,
    period: Duration,
    sequence: u64,
}

/// Sending half of [`ManualTicks`].
#[derive(Debug, Clone)]
pub struct TickFeeder {
    tx: mpsc::UnboundedSender<Duration>,
    period: Duration,
}

impl ManualTicks {
    pub fn new(period: Duration) -> (TickFeeder, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            TickFeeder { tx, period },
            Self {
                rx,
                period,
                sequence: 0,
            },
        )
    }
}

impl TickFeeder {
    /// Queue one tick with the nominal period. Returns `false` once the source is gone.
    pub fn tick(&self) -> bool {
        self.tick_with(self.period)
    }

    pub fn tick_with(&self, elapsed: Duration) -> bool {
        self.tx.send(elapsed).is_ok()
    }
}

#[async_trait]
impl TickSource for ManualTicks {
    async fn next_tick(&mut self) -> Option<Tick> {
        let elapsed = self.rx.recv().await?;
        self.sequence += 1;
        Some(Tick {
            sequence: self.sequence,
            elapsed,
        })
    }

    fn period(&self) -> Duration {
        self.period
    }
}
