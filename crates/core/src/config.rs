//! Startup configuration
//!
//! Loaded from TOML, every field optional:
//!
//! ```toml
//! [transport]
//! host = "localhost"
//! port = 1883
//!
//! [simulation]
//! interval_secs = 10
//! duration_secs = 600
//! seed = 42
//!
//! [[storms]]
//! name = "Marie"
//! path = [[15.0, -75.0], [27.0, -80.0]]   # [lat, lon] waypoints
//! intensity_trend_mph = -30.0
//!
//! [[storms.levels]]
//! level = "L1"
//! base_radius_km = 300.0
//! base_speed_mph = 45.0
//!
//! [[storms.levels]]
//! level = "L5"
//! base_radius_km = 40.0
//! base_speed_mph = 85.0
//! scaling = { threshold = 74.0 }
//! asymmetry = { kind = "cosine", bias = 45.0, amplitude = 0.2 }
//! ```
//!
//! The raw file model is validated once into a [`Scenario`]; any problem is
//! a [`ConfigError`] raised before the loop starts.

use crate::core_types::{GeoPoint, Kilometers, MilesPerHour};
use crate::error::ConfigError;
use crate::simulation::clock::SimClock;
use crate::simulation::cycle::SimulationCycle;
use crate::simulation::record::{Topics, DEFAULT_TOPIC_PREFIX};
use crate::storm::model::{WindLevelModel, DEFAULT_EXISTENCE_EPSILON_KM};
use crate::storm::polygon::{PolygonSynthesizer, DEFAULT_VERTEX_COUNT};
use crate::storm::{AsymmetryProfile, LevelConfig, RadiusScaling, Storm, WindLevel};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Broker settings, handed through to the transport untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Broker host
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Optional user name
    pub username: Option<String>,
    /// Optional password
    pub password: Option<String>,
    /// Client identifier presented to the broker
    pub client_id: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: None,
            password: None,
            client_id: "hurricane-sim".to_string(),
        }
    }
}

/// Clock and loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    /// Seconds between ticks
    pub interval_secs: f64,
    /// Seconds per cycle
    pub duration_secs: f64,
    /// Noise seed; drawn at random when absent
    pub seed: Option<u32>,
    /// Vertices per band outline
    pub vertex_count: usize,
    /// Radius at or below which a band does not exist
    pub existence_epsilon_km: f64,
    /// Topic prefix
    pub topic_prefix: String,
    /// Publish a PURGE before the first cycle
    pub purge_on_start: bool,
    /// Stop after this many cycles; runs forever when absent
    pub max_cycles: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            interval_secs: 10.0,
            duration_secs: 600.0,
            seed: None,
            vertex_count: DEFAULT_VERTEX_COUNT,
            existence_epsilon_km: DEFAULT_EXISTENCE_EPSILON_KM,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            purge_on_start: true,
            max_cycles: None,
        }
    }
}

/// One band as written in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelFileConfig {
    /// `"L1"`..`"L5"`
    pub level: String,
    /// Label; the level's default label when absent
    #[serde(default)]
    pub label: Option<String>,
    /// Radius at scale 1
    pub base_radius_km: f64,
    /// Mean sustained wind
    pub base_speed_mph: f64,
    /// Half-range of the wind oscillation
    #[serde(default = "default_speed_amplitude")]
    pub speed_amplitude_mph: f64,
    /// Ticks between independent oscillation samples
    #[serde(default = "default_oscillation_period")]
    pub oscillation_period_ticks: f64,
    /// Directional bias; quadrant profile when absent
    #[serde(default)]
    pub asymmetry: Option<AsymmetryProfile>,
    /// Per-vertex jitter amplitude
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Wind to radius relationship
    #[serde(default)]
    pub scaling: RadiusScaling,
}

fn default_speed_amplitude() -> f64 {
    5.0
}

fn default_oscillation_period() -> f64 {
    6.0
}

fn default_jitter() -> f64 {
    0.05
}

/// One storm as written in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StormConfig {
    /// Unique name
    pub name: String,
    /// Identity prefix; first letter of the name when absent
    #[serde(default)]
    pub code: Option<String>,
    /// `[lat, lon]` waypoints, at least two
    pub path: Vec<[f64; 2]>,
    /// Change of every band's wind across the cycle
    #[serde(default)]
    pub intensity_trend_mph: f64,
    /// Bands in emission order
    pub levels: Vec<LevelFileConfig>,
}

/// Everything read at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Broker settings
    pub transport: TransportConfig,
    /// Clock and loop settings
    pub simulation: SimulationSettings,
    /// Storms in processing order
    pub storms: Vec<StormConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            simulation: SimulationSettings::default(),
            storms: vec![classic_storm()],
        }
    }
}

/// The classic five-band hurricane crossing the Caribbean toward Florida
///
/// Bands share a strengthening wind; each appears once the wind crosses its
/// threshold.
pub fn classic_storm() -> StormConfig {
    let band = |level: &str, radius: f64, threshold: f64| LevelFileConfig {
        level: level.to_string(),
        label: None,
        base_radius_km: radius,
        base_speed_mph: 50.0,
        speed_amplitude_mph: 3.0,
        oscillation_period_ticks: default_oscillation_period(),
        asymmetry: None,
        jitter: default_jitter(),
        scaling: RadiusScaling {
            threshold: Some(MilesPerHour::new(threshold)),
            ..RadiusScaling::default()
        },
    };

    StormConfig {
        name: "Marie".to_string(),
        code: None,
        path: vec![[15.0, -70.0], [28.5, -80.0]],
        intensity_trend_mph: 30.0,
        levels: vec![
            band("L1", 250.0, 0.0),
            band("L2", 200.0, 25.0),
            band("L3", 150.0, 39.0),
            band("L4", 100.0, 58.0),
            band("L5", 50.0, 74.0),
        ],
    }
}

/// Validated configuration, ready to run
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Storms in processing order
    pub storms: Vec<Storm>,
    /// Cycle clock
    pub clock: SimClock,
    /// Resolved noise seed
    pub seed: u32,
    /// Outline builder
    pub synthesizer: PolygonSynthesizer,
    /// Existence threshold
    pub epsilon: Kilometers,
    /// Topic layout
    pub topics: Topics,
    /// Publish a PURGE before the first cycle
    pub purge_on_start: bool,
    /// Cycle bound
    pub max_cycles: Option<u64>,
}

impl Scenario {
    /// Build the cycle driver for this scenario
    pub fn into_cycle(self) -> SimulationCycle {
        SimulationCycle::new(
            self.storms,
            WindLevelModel::new(self.seed, self.epsilon),
            self.synthesizer,
            self.clock,
            self.topics,
        )
    }
}

impl SimulationConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`SimulationConfig::from_toml_str`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate into a runnable [`Scenario`]
    ///
    /// # Errors
    /// Any [`ConfigError`] describing the first problem found.
    pub fn validate(&self) -> Result<Scenario, ConfigError> {
        let settings = &self.simulation;
        let interval = seconds("interval_secs", settings.interval_secs)?;
        let duration = seconds("duration_secs", settings.duration_secs)?;
        let clock = SimClock::new(interval, duration)?;

        if settings.vertex_count < 3 {
            return Err(ConfigError::Invalid(format!(
                "vertex_count must be at least 3, got {}",
                settings.vertex_count
            )));
        }
        if !(settings.existence_epsilon_km.is_finite() && settings.existence_epsilon_km >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "existence_epsilon_km must be non-negative, got {}",
                settings.existence_epsilon_km
            )));
        }
        if settings.topic_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid("topic_prefix must not be empty".to_string()));
        }
        if self.storms.is_empty() {
            return Err(ConfigError::Invalid("no storms configured".to_string()));
        }

        let storms = self
            .storms
            .iter()
            .map(build_storm)
            .collect::<Result<Vec<_>, _>>()?;

        let mut names = FxHashSet::default();
        let mut ids = FxHashSet::default();
        for storm in &storms {
            if !names.insert(storm.name()) {
                return Err(ConfigError::DuplicateStorm(storm.name().to_string()));
            }
            for level in storm.levels() {
                let id = storm.level_id(level.level);
                if !ids.insert(id.clone()) {
                    return Err(ConfigError::DuplicateLevelId(id.to_string()));
                }
            }
        }

        let seed = match settings.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u32>();
                info!(seed, "No seed configured, drew one at random");
                seed
            }
        };

        Ok(Scenario {
            storms,
            clock,
            seed,
            synthesizer: PolygonSynthesizer::new(settings.vertex_count),
            epsilon: Kilometers::new(settings.existence_epsilon_km),
            topics: Topics::new(&settings.topic_prefix),
            purge_on_start: settings.purge_on_start,
            max_cycles: settings.max_cycles,
        })
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration, ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ConfigError::InvalidTiming(format!(
            "{field} must be a positive number of seconds, got {value}"
        )));
    }
    Duration::try_from_secs_f64(value)
        .map_err(|e| ConfigError::InvalidTiming(format!("{field}: {e}")))
}

fn build_storm(raw: &StormConfig) -> Result<Storm, ConfigError> {
    let levels = raw
        .levels
        .iter()
        .map(|l| build_level(&raw.name, l))
        .collect::<Result<Vec<_>, _>>()?;

    Storm::new(
        raw.name.clone(),
        raw.code.clone(),
        raw.path.iter().copied().map(GeoPoint::from).collect(),
        MilesPerHour::new(raw.intensity_trend_mph),
        levels,
    )
}

fn build_level(storm: &str, raw: &LevelFileConfig) -> Result<LevelConfig, ConfigError> {
    let level = WindLevel::parse(&raw.level).ok_or_else(|| ConfigError::UnknownLevel {
        storm: storm.to_string(),
        level: raw.level.clone(),
    })?;

    let mut config = LevelConfig::new(
        level,
        Kilometers::new(raw.base_radius_km),
        MilesPerHour::new(raw.base_speed_mph),
    );
    if let Some(label) = &raw.label {
        config.label.clone_from(label);
    }
    config.speed_amplitude = MilesPerHour::new(raw.speed_amplitude_mph);
    config.oscillation_period_ticks = raw.oscillation_period_ticks;
    if let Some(asymmetry) = raw.asymmetry {
        config.asymmetry = asymmetry;
    }
    config.jitter = raw.jitter;
    config.scaling = raw.scaling;
    Ok(config)
}
