//! One storm advancing through a cycle
//!
//! [`StormState`] evaluates every configured level in configuration order
//! and shapes the ones that exist. It keeps no per-level lifecycle; that
//! belongs to the cycle driver.

use super::model::{LevelSnapshot, WindLevelModel};
use super::polygon::{Polygon, PolygonSynthesizer};
use super::{saffir_simpson_category, LevelId, Storm, WindLevel};
use crate::core_types::{GeoPoint, MilesPerHour};
use crate::error::GeometryError;
use crate::simulation::clock::TickTime;

/// Outline of a band at one tick
#[derive(Debug, Clone, PartialEq)]
pub enum BandShape {
    /// The band does not exist this tick
    Absent,
    /// The band exists and has an outline
    Shaped(Polygon),
    /// The band exists but its outline could not be built
    Invalid(GeometryError),
}

/// One level of one storm at one tick
#[derive(Debug, Clone, PartialEq)]
pub struct BandReading {
    /// Stable identity of the (storm, level) pair
    pub id: LevelId,
    /// Which band
    pub level: WindLevel,
    /// Label from configuration
    pub label: String,
    /// Computed wind, radius and existence
    pub snapshot: LevelSnapshot,
    /// Outline, if the band exists
    pub shape: BandShape,
}

impl BandReading {
    /// Whether the band exists this tick
    pub fn exists(&self) -> bool {
        self.snapshot.exists
    }
}

/// All levels of one storm at one tick
#[derive(Debug, Clone, PartialEq)]
pub struct StormTick {
    /// Storm name
    pub storm: String,
    /// Clock position
    pub time: TickTime,
    /// Storm centre
    pub center: GeoPoint,
    /// Strongest band wind
    pub peak_wind: MilesPerHour,
    /// Saffir-Simpson category of `peak_wind`
    pub category: u8,
    /// Central pressure
    pub pressure_hpa: f64,
    /// Levels in configuration order
    pub bands: Vec<BandReading>,
}

/// Derived, per-cycle state of one storm
#[derive(Debug, Clone)]
pub struct StormState {
    storm: Storm,
    level_ids: Vec<LevelId>,
    last_tick: Option<u64>,
}

impl StormState {
    /// Fresh state at the start of a cycle
    pub fn new(storm: Storm) -> Self {
        let level_ids = storm
            .levels()
            .iter()
            .map(|l| storm.level_id(l.level))
            .collect();
        Self {
            storm,
            level_ids,
            last_tick: None,
        }
    }

    /// Immutable configuration
    pub fn storm(&self) -> &Storm {
        &self.storm
    }

    /// Identities of every configured level, in configuration order
    pub fn level_ids(&self) -> &[LevelId] {
        &self.level_ids
    }

    /// Last tick this storm advanced to, `None` right after a reset
    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Forget cycle progress
    pub fn reset(&mut self) {
        self.last_tick = None;
    }

    /// Evaluate and shape every level at `time`
    pub fn advance(
        &mut self,
        model: &WindLevelModel,
        synthesizer: &PolygonSynthesizer,
        time: TickTime,
    ) -> StormTick {
        let storm = &self.storm;
        let center = WindLevelModel::center(storm, time);

        let bands: Vec<BandReading> = storm
            .levels()
            .iter()
            .zip(&self.level_ids)
            .map(|(level, id)| {
                let snapshot = model.snapshot(storm, level, time);
                let shape = if snapshot.exists {
                    let seed = model.jitter_seed(storm, level, time.tick);
                    match synthesizer.synthesize(
                        snapshot.center,
                        snapshot.radius,
                        &level.asymmetry,
                        level.jitter,
                        seed,
                    ) {
                        Ok(polygon) => BandShape::Shaped(polygon),
                        Err(e) => BandShape::Invalid(e),
                    }
                } else {
                    BandShape::Absent
                };

                BandReading {
                    id: id.clone(),
                    level: level.level,
                    label: level.label.clone(),
                    snapshot,
                    shape,
                }
            })
            .collect();

        let peak_wind = bands
            .iter()
            .map(|b| b.snapshot.wind_speed)
            .max()
            .unwrap_or(MilesPerHour::ZERO);

        self.last_tick = Some(time.tick);

        StormTick {
            storm: storm.name().to_string(),
            time,
            center,
            peak_wind,
            category: saffir_simpson_category(peak_wind),
            pressure_hpa: model.central_pressure_hpa(storm, peak_wind, time.tick),
            bands,
        }
    }
}
