//! Unbounded outer loop around [`SimulationCycle`]
//!
//! Runs cycle after cycle: ticks `0..total_ticks` each produce band records,
//! then the cycle boundary retracts every band and the next cycle starts
//! from tick 0 with every band ABSENT. Cancellation is checked at tick
//! boundaries only; the inter-tick wait itself is not interrupted.

use super::cycle::SimulationCycle;
use super::record::{ClearReason, Envelope, OutboundRecord};
use crate::publish::Publisher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared stop flag checked by the loop between ticks
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Fresh, not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop at the next tick boundary
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether [`CancellationToken::cancel`] has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Blocking wait between ticks
pub trait Pacer {
    /// Wait for `interval`
    fn wait(&mut self, interval: Duration);
}

/// Sleeps the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn wait(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

/// Returns immediately; replays a run as fast as it can be computed
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPacer;

impl Pacer for NoopPacer {
    fn wait(&mut self, _interval: Duration) {}
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles that reached their boundary
    pub cycles_completed: u64,
    /// Ticks processed across all cycles
    pub ticks_processed: u64,
    /// Records the publisher accepted
    pub records_published: u64,
    /// Records that failed to serialize or publish
    pub publish_failures: u64,
    /// Bands skipped because their outline could not be built
    pub geometry_skips: u64,
    /// Whether the run ended through cancellation
    pub cancelled: bool,
}

/// Repeats cycles and hands their records to a publisher
#[derive(Debug)]
pub struct CycleRepeater<P: Publisher, T: Pacer> {
    cycle: SimulationCycle,
    publisher: P,
    pacer: T,
    cancel: CancellationToken,
    max_cycles: Option<u64>,
    purge_on_start: bool,
    summary: RunSummary,
}

impl<P: Publisher, T: Pacer> CycleRepeater<P, T> {
    /// Repeat `cycle` forever, publishing through `publisher`
    pub fn new(cycle: SimulationCycle, publisher: P, pacer: T) -> Self {
        Self {
            cycle,
            publisher,
            pacer,
            cancel: CancellationToken::new(),
            max_cycles: None,
            purge_on_start: true,
            summary: RunSummary::default(),
        }
    }

    /// Stop when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Stop after `cycles` complete cycles (`None` runs forever)
    pub fn with_max_cycles(mut self, cycles: Option<u64>) -> Self {
        self.max_cycles = cycles;
        self
    }

    /// Whether to publish a PURGE before the first cycle
    pub fn with_purge_on_start(mut self, purge: bool) -> Self {
        self.purge_on_start = purge;
        self
    }

    /// Token that stops this repeater
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The wrapped cycle
    pub fn cycle(&self) -> &SimulationCycle {
        &self.cycle
    }

    /// The publisher
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Take the publisher back
    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// Run until cancelled or until the cycle bound is reached
    ///
    /// A cancelled run retracts every band before returning so downstream
    /// consumers are not left holding outlines from a dead producer.
    pub fn run(&mut self) -> RunSummary {
        let clock = *self.cycle.clock();
        info!(
            interval = ?clock.interval(),
            duration = ?clock.duration(),
            ticks_per_cycle = clock.total_ticks(),
            max_cycles = ?self.max_cycles,
            "Starting storm simulation"
        );

        if self.purge_on_start {
            let purge = Envelope::new(self.cycle.topics(), OutboundRecord::Purge);
            self.publish(&purge);
        }

        loop {
            if self.max_cycles.is_some_and(|max| self.summary.cycles_completed >= max) {
                break;
            }

            let cycle_index = self.cycle.cycle_index();
            info!(cycle = cycle_index, "Cycle started");

            for tick in 0..clock.total_ticks() {
                if self.cancel.is_cancelled() {
                    return self.shut_down(tick);
                }

                let report = self.cycle.process_tick(tick);
                self.summary.ticks_processed += 1;
                self.summary.geometry_skips += report.geometry_skips as u64;
                for envelope in &report.envelopes {
                    self.publish(envelope);
                }

                self.pacer.wait(clock.interval());
            }

            for envelope in self.cycle.end_cycle() {
                self.publish(&envelope);
            }
            self.summary.cycles_completed += 1;
            info!(
                cycle = cycle_index,
                published = self.summary.records_published,
                failures = self.summary.publish_failures,
                "Cycle complete, restarting"
            );

            if self.cancel.is_cancelled() {
                self.summary.cancelled = true;
                break;
            }
        }

        info!(
            cycles = self.summary.cycles_completed,
            ticks = self.summary.ticks_processed,
            "Storm simulation stopped"
        );
        self.summary
    }

    fn shut_down(&mut self, tick: u64) -> RunSummary {
        info!(
            cycle = self.cycle.cycle_index(),
            tick,
            "Cancellation requested, retracting all wind levels"
        );
        for envelope in self.cycle.retract_all(tick, ClearReason::Shutdown) {
            self.publish(&envelope);
        }
        self.summary.cancelled = true;
        self.summary
    }

    fn publish(&mut self, envelope: &Envelope) {
        let payload = match envelope.payload() {
            Ok(payload) => payload,
            Err(e) => {
                self.summary.publish_failures += 1;
                warn!(topic = %envelope.topic, "Failed to serialize record: {e}");
                return;
            }
        };

        match self.publisher.publish(&envelope.topic, &payload) {
            Ok(()) => {
                self.summary.records_published += 1;
                debug!(
                    topic = %envelope.topic,
                    action = envelope.record.action(),
                    "Published"
                );
            }
            Err(e) => {
                self.summary.publish_failures += 1;
                warn!(topic = %envelope.topic, "Publish failed: {e}");
            }
        }
    }
}
