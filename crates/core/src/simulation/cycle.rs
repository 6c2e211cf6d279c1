//! One cycle of the simulation: tick processing and band lifecycle
//!
//! Every (storm, level) pair is either ACTIVE or ABSENT. Each tick the new
//! existence flag is compared with the previous phase:
//!
//! | previous | exists | record            |
//! |----------|--------|-------------------|
//! | ABSENT   | yes    | PUT (birth)       |
//! | ACTIVE   | yes    | PUT (refresh)     |
//! | ACTIVE   | no     | one CLEAR         |
//! | ABSENT   | no     | nothing           |
//!
//! Storms are processed in configuration order and levels in their
//! configured order, which fixes the record order within and across ticks.

use super::clock::{SimClock, TickTime};
use super::record::{put_record, ClearReason, ClearRecord, Envelope, OutboundRecord, Topics};
use crate::storm::model::WindLevelModel;
use crate::storm::polygon::PolygonSynthesizer;
use crate::storm::state::{BandShape, StormState, StormTick};
use crate::storm::{LevelId, Storm};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

/// Lifecycle phase of one (storm, level) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelPhase {
    /// Producing PUT records
    Active,
    /// Not producing records
    Absent,
}

/// Outcome of observing one pair at one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// ABSENT to ACTIVE
    Born,
    /// ACTIVE to ACTIVE
    Refreshed,
    /// ACTIVE to ABSENT
    Ceased,
    /// ABSENT to ABSENT
    Dormant,
}

impl Transition {
    /// Whether the transition leaves the pair ACTIVE
    pub fn is_active(self) -> bool {
        matches!(self, Transition::Born | Transition::Refreshed)
    }
}

/// Per-pair lifecycle state carried from one tick to the next
///
/// Pairs never observed are ABSENT, so the first tick a band exists is a
/// birth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleTracker {
    phases: FxHashMap<LevelId, LevelPhase>,
}

impl LifecycleTracker {
    /// Every pair ABSENT
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase of `id`
    pub fn phase(&self, id: &LevelId) -> LevelPhase {
        self.phases.get(id).copied().unwrap_or(LevelPhase::Absent)
    }

    /// Record this tick's existence flag for `id` and report the transition
    pub fn observe(&mut self, id: &LevelId, exists: bool) -> Transition {
        let previous = self.phase(id);
        let next = if exists {
            LevelPhase::Active
        } else {
            LevelPhase::Absent
        };
        let _ = self.phases.insert(id.clone(), next);

        match (previous, next) {
            (LevelPhase::Absent, LevelPhase::Active) => Transition::Born,
            (LevelPhase::Active, LevelPhase::Active) => Transition::Refreshed,
            (LevelPhase::Active, LevelPhase::Absent) => Transition::Ceased,
            (LevelPhase::Absent, LevelPhase::Absent) => Transition::Dormant,
        }
    }

    /// Number of ACTIVE pairs
    pub fn active_count(&self) -> usize {
        self.phases
            .values()
            .filter(|p| **p == LevelPhase::Active)
            .count()
    }

    /// Back to every pair ABSENT
    pub fn reset(&mut self) {
        self.phases.clear();
    }
}

/// Records and counters produced by one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Records in emission order
    pub envelopes: Vec<Envelope>,
    /// Storm summaries in configuration order
    pub storms: Vec<StormTick>,
    /// Bands that became active
    pub births: usize,
    /// Bands that ceased
    pub retractions: usize,
    /// Bands skipped because their outline could not be built
    pub geometry_skips: usize,
}

/// Drives every storm through one cycle at a time
#[derive(Debug, Clone)]
pub struct SimulationCycle {
    storms: Vec<StormState>,
    model: WindLevelModel,
    synthesizer: PolygonSynthesizer,
    clock: SimClock,
    topics: Topics,
    lifecycle: LifecycleTracker,
    cycle_index: u64,
}

impl SimulationCycle {
    /// Cycle over `storms` in the given order
    pub fn new(
        storms: Vec<Storm>,
        model: WindLevelModel,
        synthesizer: PolygonSynthesizer,
        clock: SimClock,
        topics: Topics,
    ) -> Self {
        Self {
            storms: storms.into_iter().map(StormState::new).collect(),
            model,
            synthesizer,
            clock,
            topics,
            lifecycle: LifecycleTracker::new(),
            cycle_index: 0,
        }
    }

    /// Clock shared by every cycle
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Topic layout
    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Number of the current cycle, starting at 0
    pub fn cycle_index(&self) -> u64 {
        self.cycle_index
    }

    /// Lifecycle state of every pair
    pub fn lifecycle(&self) -> &LifecycleTracker {
        &self.lifecycle
    }

    /// Storm states in processing order
    pub fn storms(&self) -> &[StormState] {
        &self.storms
    }

    /// Every (storm, level) identity in processing order
    pub fn level_ids(&self) -> impl Iterator<Item = &LevelId> {
        self.storms.iter().flat_map(|s| s.level_ids().iter())
    }

    /// Advance every storm to `tick` and produce its records
    pub fn process_tick(&mut self, tick: u64) -> TickReport {
        let time = self.clock.time_at(tick);
        let mut report = TickReport::default();

        for state in &mut self.storms {
            let storm_tick = state.advance(&self.model, &self.synthesizer, time);
            debug!(
                storm = %storm_tick.storm,
                tick,
                cycle = self.cycle_index,
                wind = %storm_tick.peak_wind,
                category = storm_tick.category,
                pressure_hpa = storm_tick.pressure_hpa,
                center = %storm_tick.center,
                "Storm advanced"
            );

            for band in &storm_tick.bands {
                let transition = self.lifecycle.observe(&band.id, band.exists());
                match transition {
                    Transition::Born | Transition::Refreshed => {
                        if transition == Transition::Born {
                            report.births += 1;
                            info!(
                                storm = %storm_tick.storm,
                                level = %band.level,
                                id = %band.id,
                                tick,
                                radius = %band.snapshot.radius,
                                "Wind level became active"
                            );
                        }
                        match &band.shape {
                            BandShape::Shaped(polygon) => {
                                let put =
                                    put_record(&storm_tick, band, polygon.to_geometry(), self.cycle_index);
                                report
                                    .envelopes
                                    .push(Envelope::new(&self.topics, OutboundRecord::Put(put)));
                            }
                            BandShape::Invalid(e) => {
                                report.geometry_skips += 1;
                                warn!(
                                    storm = %storm_tick.storm,
                                    level = %band.level,
                                    tick,
                                    "Skipping PUT: {e}"
                                );
                            }
                            BandShape::Absent => {}
                        }
                    }
                    Transition::Ceased => {
                        report.retractions += 1;
                        info!(
                            storm = %storm_tick.storm,
                            level = %band.level,
                            id = %band.id,
                            tick,
                            wind = %band.snapshot.wind_speed,
                            "Wind level ceased, sending CLEAR"
                        );
                        let clear = ClearRecord {
                            id: band.id.clone(),
                            storm: storm_tick.storm.clone(),
                            wind_level: band.level,
                            reason: ClearReason::Ceased,
                            tick,
                            timestamp: time.elapsed.as_secs_f64(),
                            cycle: self.cycle_index,
                        };
                        report
                            .envelopes
                            .push(Envelope::new(&self.topics, OutboundRecord::Clear(clear)));
                    }
                    Transition::Dormant => {}
                }
            }

            report.storms.push(storm_tick);
        }

        report
    }

    /// CLEAR for every configured pair, whatever its phase
    ///
    /// Downstream state is treated as stale, so ABSENT pairs are cleared too.
    /// Leaves every pair ABSENT.
    pub fn retract_all(&mut self, tick: u64, reason: ClearReason) -> Vec<Envelope> {
        let time: TickTime = self.clock.time_at(tick);
        let mut envelopes = Vec::new();

        for state in &self.storms {
            let storm = state.storm();
            for (level, id) in storm.levels().iter().zip(state.level_ids()) {
                let clear = ClearRecord {
                    id: id.clone(),
                    storm: storm.name().to_string(),
                    wind_level: level.level,
                    reason,
                    tick,
                    timestamp: time.elapsed.as_secs_f64(),
                    cycle: self.cycle_index,
                };
                envelopes.push(Envelope::new(&self.topics, OutboundRecord::Clear(clear)));
            }
        }

        self.lifecycle.reset();
        envelopes
    }

    /// End the current cycle: CLEAR every pair, reset every storm, and
    /// move on to the next cycle number
    pub fn end_cycle(&mut self) -> Vec<Envelope> {
        let envelopes = self.retract_all(self.clock.total_ticks(), ClearReason::CycleEnd);
        for state in &mut self.storms {
            state.reset();
        }
        self.cycle_index += 1;
        envelopes
    }
}
