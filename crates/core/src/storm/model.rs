//! Per-level wind and radius evolution
//!
//! For one level of one storm at one tick:
//!
//! ```text
//! speed  = max(0, base_speed + trend · f + amplitude · noise(tick / period))
//! radius = base_radius · scale(speed)            (clamped to >= 0)
//! exists = radius > epsilon
//! ```
//!
//! `f` is the cycle time fraction and `noise` a smooth hash noise in [-1, 1]
//! seeded per storm and level. Falling below epsilon is the ordinary way a
//! band disappears, not an error.

use super::{LevelConfig, Storm};
use crate::core_types::noise::{mix_seed, temporal_noise};
use crate::core_types::{GeoPoint, Kilometers, MilesPerHour};
use crate::simulation::clock::TickTime;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Radius at or below which a band is considered gone
pub const DEFAULT_EXISTENCE_EPSILON_KM: f64 = 0.5;

/// Noise channel for central pressure (levels use 1..=5)
const PRESSURE_CHANNEL: i32 = 16;

/// Ticks between independent pressure samples
const PRESSURE_PERIOD_TICKS: f64 = 3.0;

/// Lowest central pressure the model reports
const MIN_PRESSURE_HPA: f64 = 900.0;

/// State of one level at one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSnapshot {
    /// Tick the snapshot was taken at
    pub tick: u64,
    /// Cycle time fraction in [0, 1]
    pub fraction: f64,
    /// Storm centre, shared by every level of the storm
    pub center: GeoPoint,
    /// Sustained wind of the band
    pub wind_speed: MilesPerHour,
    /// Radius after scaling, never negative
    pub radius: Kilometers,
    /// Whether the radius is above the existence epsilon
    pub exists: bool,
}

/// Evaluates levels against the simulated clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindLevelModel {
    seed: u32,
    epsilon: Kilometers,
}

impl WindLevelModel {
    /// Model for a run seeded with `seed`
    pub fn new(seed: u32, epsilon: Kilometers) -> Self {
        Self {
            seed,
            epsilon: epsilon.clamp_non_negative(),
        }
    }

    /// Run seed
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Existence threshold
    pub fn epsilon(&self) -> Kilometers {
        self.epsilon
    }

    /// Seed of a storm, derived from the run seed and the storm name
    pub fn storm_seed(&self, storm: &Storm) -> u32 {
        let mut hasher = FxHasher::default();
        storm.name().hash(&mut hasher);
        mix_seed(self.seed, hasher.finish() as u32)
    }

    /// Seed for the outline of `level` at `tick`
    ///
    /// Keyed by (storm, level, tick) so each band wobbles independently and
    /// every tick gets a fresh outline.
    pub fn jitter_seed(&self, storm: &Storm, level: &LevelConfig, tick: u64) -> u32 {
        let level_seed = mix_seed(self.storm_seed(storm), u32::from(level.level.number()));
        mix_seed(level_seed, tick as u32)
    }

    /// Storm centre at `time`
    pub fn center(storm: &Storm, time: TickTime) -> GeoPoint {
        storm.path().position_at(time.fraction)
    }

    /// Sustained wind of `level` at `time`, never negative
    pub fn wind_speed(&self, storm: &Storm, level: &LevelConfig, time: TickTime) -> MilesPerHour {
        let t = time.tick as f64 / level.oscillation_period_ticks;
        let oscillation = temporal_noise(t, i32::from(level.level.number()), self.storm_seed(storm));
        let trend = *storm.intensity_trend() * time.fraction;
        MilesPerHour::new(*level.base_speed + trend + *level.speed_amplitude * oscillation)
            .clamp_non_negative()
    }

    /// Radius of `level` at wind speed `speed`, never negative
    pub fn effective_radius(level: &LevelConfig, speed: MilesPerHour) -> Kilometers {
        (level.base_radius * level.scaling.scale(speed)).clamp_non_negative()
    }

    /// Full snapshot of `level`, whether or not it exists
    pub fn snapshot(&self, storm: &Storm, level: &LevelConfig, time: TickTime) -> LevelSnapshot {
        let wind_speed = self.wind_speed(storm, level, time);
        let radius = Self::effective_radius(level, wind_speed);
        LevelSnapshot {
            tick: time.tick,
            fraction: time.fraction,
            center: Self::center(storm, time),
            wind_speed,
            radius,
            exists: radius > self.epsilon,
        }
    }

    /// Snapshot of `level` if it exists at `time`, `None` if it has weakened away
    pub fn evaluate(
        &self,
        storm: &Storm,
        level: &LevelConfig,
        time: TickTime,
    ) -> Option<LevelSnapshot> {
        Some(self.snapshot(storm, level, time)).filter(|s| s.exists)
    }

    /// Central pressure for a storm whose strongest band blows at `peak`
    pub fn central_pressure_hpa(&self, storm: &Storm, peak: MilesPerHour, tick: u64) -> f64 {
        let noise = temporal_noise(
            tick as f64 / PRESSURE_PERIOD_TICKS,
            PRESSURE_CHANNEL,
            self.storm_seed(storm),
        );
        (1010.0 - 0.8 * *peak + 2.0 * noise).max(MIN_PRESSURE_HPA)
    }
}
