//! Storm configuration and per-tick band evaluation
//!
//! A [`Storm`] is immutable once built: a named track plus the wind bands
//! (levels L1..L5) it carries. Everything that changes from tick to tick is
//! derived by [`model::WindLevelModel`] and shaped by
//! [`polygon::PolygonSynthesizer`].

pub mod model;
pub mod polygon;
pub mod state;

use crate::core_types::{Degrees, GeoPoint, Kilometers, MilesPerHour, StormPath};
use crate::error::ConfigError;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;

pub use model::{LevelSnapshot, WindLevelModel};
pub use polygon::{Polygon, PolygonSynthesizer};
pub use state::{StormState, StormTick};

/// Upper bound for per-vertex jitter amplitude
pub const MAX_JITTER: f64 = 0.5;

// ============================================================================
// LEVELS
// ============================================================================

/// Wind-intensity band of a storm
///
/// L5 is the innermost, highest-wind band; L1 the outermost. Nesting is a
/// property of configuration, nothing enforces radius ordering at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WindLevel {
    /// Outermost band
    L1,
    /// Second band
    L2,
    /// Third band
    L3,
    /// Fourth band
    L4,
    /// Innermost band
    L5,
}

impl WindLevel {
    /// All levels, outermost first
    pub const ALL: [WindLevel; 5] = [
        WindLevel::L1,
        WindLevel::L2,
        WindLevel::L3,
        WindLevel::L4,
        WindLevel::L5,
    ];

    /// Level number 1..=5
    pub fn number(self) -> u8 {
        match self {
            WindLevel::L1 => 1,
            WindLevel::L2 => 2,
            WindLevel::L3 => 3,
            WindLevel::L4 => 4,
            WindLevel::L5 => 5,
        }
    }

    /// Canonical name (`"L1"`..`"L5"`)
    pub fn name(self) -> &'static str {
        match self {
            WindLevel::L1 => "L1",
            WindLevel::L2 => "L2",
            WindLevel::L3 => "L3",
            WindLevel::L4 => "L4",
            WindLevel::L5 => "L5",
        }
    }

    /// Human-readable label used when a level configures none
    pub fn default_label(self) -> &'static str {
        match self {
            WindLevel::L1 => "Low Pressure",
            WindLevel::L2 => "Depression",
            WindLevel::L3 => "Tropical Storm",
            WindLevel::L4 => "Strong TS",
            WindLevel::L5 => "Hurricane",
        }
    }

    /// Parse `"L3"`, `"l3"` or `"3"`
    pub fn parse(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        let digits = trimmed
            .strip_prefix('L')
            .or_else(|| trimmed.strip_prefix('l'))
            .unwrap_or(trimmed);
        match digits {
            "1" => Some(WindLevel::L1),
            "2" => Some(WindLevel::L2),
            "3" => Some(WindLevel::L3),
            "4" => Some(WindLevel::L4),
            "5" => Some(WindLevel::L5),
            _ => None,
        }
    }
}

impl fmt::Display for WindLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stable identity of one (storm, level) pair: `{storm_code}{level_number}`
///
/// Used as the correlation key across ticks and as the last topic segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LevelId(String);

impl LevelId {
    /// Build the identity for `level` of the storm with code `storm_code`
    pub fn new(storm_code: &str, level: WindLevel) -> Self {
        LevelId(format!("{storm_code}{}", level.number()))
    }

    /// Identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Saffir-Simpson category for a sustained wind speed (0 below hurricane force)
pub fn saffir_simpson_category(speed: MilesPerHour) -> u8 {
    let mph = *speed;
    if mph >= 157.0 {
        5
    } else if mph >= 130.0 {
        4
    } else if mph >= 111.0 {
        3
    } else if mph >= 96.0 {
        2
    } else if mph >= 74.0 {
        1
    } else {
        0
    }
}

// ============================================================================
// RADIUS SCALING
// ============================================================================

/// Whether stronger wind grows or shrinks a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleDirection {
    /// Stronger wind, larger band
    Increasing,
    /// Stronger wind, smaller band
    Decreasing,
}

/// Monotonic map from wind speed to a radius multiplier
///
/// `scale(speed) = max(min_scale, 1 ± gain · (speed − reference))`, with the
/// sign given by `direction`. An optional `threshold` zeroes the scale on the
/// weak side (below it for `Increasing`, above it for `Decreasing`), which
/// keeps the map monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RadiusScaling {
    /// Direction of the relationship
    pub direction: ScaleDirection,
    /// Speed at which the scale is exactly 1
    pub reference: MilesPerHour,
    /// Change in scale per mph away from the reference (>= 0)
    pub gain_per_mph: f64,
    /// Lower bound of the linear part (>= 0)
    pub min_scale: f64,
    /// Speed past which the band ceases to exist
    pub threshold: Option<MilesPerHour>,
}

impl Default for RadiusScaling {
    fn default() -> Self {
        Self {
            direction: ScaleDirection::Increasing,
            reference: MilesPerHour::new(25.0),
            gain_per_mph: 0.01,
            min_scale: 1.0,
            threshold: None,
        }
    }
}

impl RadiusScaling {
    /// Radius multiplier at `speed`, never negative
    pub fn scale(&self, speed: MilesPerHour) -> f64 {
        let delta = *speed - *self.reference;
        match self.direction {
            ScaleDirection::Increasing => {
                if self.threshold.is_some_and(|t| speed < t) {
                    return 0.0;
                }
                (1.0 + self.gain_per_mph * delta).max(self.min_scale).max(0.0)
            }
            ScaleDirection::Decreasing => {
                if self.threshold.is_some_and(|t| speed > t) {
                    return 0.0;
                }
                (1.0 - self.gain_per_mph * delta).max(self.min_scale).max(0.0)
            }
        }
    }
}

// ============================================================================
// ASYMMETRY
// ============================================================================

/// Directional bias applied to a band's radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AsymmetryProfile {
    /// `1 + amplitude · cos(θ − bias)`: one bulge toward `bias`
    Cosine {
        /// Direction of the bulge (0° east, counter-clockwise)
        bias: Degrees,
        /// Relative bulge size in [0, 1)
        amplitude: f64,
    },
    /// Per-quadrant factors anchored at the quadrant centres and blended
    /// with a cosine ease between neighbours
    Quadrants {
        /// North-east factor (anchored at 45°)
        ne: f64,
        /// North-west factor (anchored at 135°)
        nw: f64,
        /// South-west factor (anchored at 225°)
        sw: f64,
        /// South-east factor (anchored at 315°)
        se: f64,
    },
}

impl Default for AsymmetryProfile {
    fn default() -> Self {
        // Right-front quadrant strongest, as in a northern-hemisphere storm
        AsymmetryProfile::Quadrants {
            ne: 1.2,
            nw: 1.0,
            sw: 0.8,
            se: 1.0,
        }
    }
}

impl AsymmetryProfile {
    /// Radius multiplier in direction `theta` (radians, 0 east, CCW)
    pub fn factor(&self, theta: f64) -> f64 {
        match *self {
            AsymmetryProfile::Cosine { bias, amplitude } => {
                1.0 + amplitude * (theta - bias.to_radians()).cos()
            }
            AsymmetryProfile::Quadrants { ne, nw, sw, se } => {
                let anchors = [ne, nw, sw, se];
                // Shift so the NE anchor sits at 0, then step a quarter turn per anchor
                let shifted = (theta - PI / 4.0).rem_euclid(TAU);
                let sector = ((shifted / FRAC_PI_2) as usize).min(3);
                let ratio = (shifted - sector as f64 * FRAC_PI_2) / FRAC_PI_2;
                let blend = (1.0 - (ratio * PI).cos()) / 2.0;
                let f0 = anchors[sector];
                let f1 = anchors[(sector + 1) % 4];
                f0 * (1.0 - blend) + f1 * blend
            }
        }
    }

    /// Smallest factor the profile can produce
    pub fn min_factor(&self) -> f64 {
        match *self {
            AsymmetryProfile::Cosine { amplitude, .. } => 1.0 - amplitude.abs(),
            AsymmetryProfile::Quadrants { ne, nw, sw, se } => ne.min(nw).min(sw).min(se),
        }
    }
}

// ============================================================================
// LEVEL + STORM CONFIGURATION
// ============================================================================

/// Configuration of one wind band of one storm
#[derive(Debug, Clone, PartialEq)]
pub struct LevelConfig {
    /// Which band this is
    pub level: WindLevel,
    /// Human-readable label carried in PUT metadata
    pub label: String,
    /// Radius at scale 1
    pub base_radius: Kilometers,
    /// Mean sustained wind of the band
    pub base_speed: MilesPerHour,
    /// Half-range of the wind oscillation
    pub speed_amplitude: MilesPerHour,
    /// Ticks between independent oscillation samples
    pub oscillation_period_ticks: f64,
    /// Directional bias of the band outline
    pub asymmetry: AsymmetryProfile,
    /// Per-vertex jitter amplitude in [0, `MAX_JITTER`)
    pub jitter: f64,
    /// Wind speed to radius relationship
    pub scaling: RadiusScaling,
}

impl LevelConfig {
    /// Defaults for `level` with the given base radius and speed
    pub fn new(level: WindLevel, base_radius: Kilometers, base_speed: MilesPerHour) -> Self {
        Self {
            level,
            label: level.default_label().to_string(),
            base_radius,
            base_speed,
            speed_amplitude: MilesPerHour::new(5.0),
            oscillation_period_ticks: 6.0,
            asymmetry: AsymmetryProfile::default(),
            jitter: 0.05,
            scaling: RadiusScaling::default(),
        }
    }

    fn validate(&self, storm: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidLevelParameter {
            storm: storm.to_string(),
            level: self.level.to_string(),
            reason,
        };

        if !(self.base_radius.is_finite() && *self.base_radius > 0.0) {
            return Err(invalid(format!(
                "base radius must be positive, got {}",
                *self.base_radius
            )));
        }
        if !(self.base_speed.is_finite() && *self.base_speed >= 0.0) {
            return Err(invalid(format!(
                "base speed must be non-negative, got {}",
                *self.base_speed
            )));
        }
        if !(self.speed_amplitude.is_finite() && *self.speed_amplitude >= 0.0) {
            return Err(invalid(format!(
                "speed amplitude must be non-negative, got {}",
                *self.speed_amplitude
            )));
        }
        if !(self.oscillation_period_ticks.is_finite() && self.oscillation_period_ticks > 0.0) {
            return Err(invalid(format!(
                "oscillation period must be positive, got {}",
                self.oscillation_period_ticks
            )));
        }
        if !(0.0..MAX_JITTER).contains(&self.jitter) {
            return Err(invalid(format!(
                "jitter must be in [0, {MAX_JITTER}), got {}",
                self.jitter
            )));
        }
        if let AsymmetryProfile::Cosine { amplitude, .. } = self.asymmetry {
            if !(0.0..1.0).contains(&amplitude) {
                return Err(invalid(format!(
                    "asymmetry amplitude must be in [0, 1), got {amplitude}"
                )));
            }
        }
        let min_factor = self.asymmetry.min_factor();
        if !min_factor.is_finite() || min_factor <= 0.0 {
            return Err(invalid("asymmetry factors must be positive".to_string()));
        }
        let s = &self.scaling;
        if !(s.gain_per_mph.is_finite() && s.gain_per_mph >= 0.0) {
            return Err(invalid(format!(
                "scaling gain must be non-negative, got {}",
                s.gain_per_mph
            )));
        }
        if !(s.min_scale.is_finite() && s.min_scale >= 0.0) {
            return Err(invalid(format!(
                "scaling floor must be non-negative, got {}",
                s.min_scale
            )));
        }
        Ok(())
    }
}

/// A named storm: its track and the wind bands it carries
#[derive(Debug, Clone, PartialEq)]
pub struct Storm {
    name: String,
    code: String,
    path: StormPath,
    intensity_trend: MilesPerHour,
    levels: Vec<LevelConfig>,
}

impl Storm {
    /// Build and validate a storm
    ///
    /// `code` defaults to the upper-cased first letter of `name`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for an empty name, a path with fewer than two
    /// points or out-of-range coordinates, no levels, duplicate levels or
    /// any out-of-range level parameter.
    pub fn new(
        name: impl Into<String>,
        code: Option<String>,
        path: Vec<GeoPoint>,
        intensity_trend: MilesPerHour,
        levels: Vec<LevelConfig>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid("storm name must not be empty".to_string()));
        }

        let code = match code {
            Some(code) if !code.trim().is_empty() => code.trim().to_string(),
            Some(_) => {
                return Err(ConfigError::Invalid(format!(
                    "storm '{name}' has an empty code"
                )))
            }
            None => name
                .trim()
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect::<String>())
                .unwrap_or_default(),
        };

        if let Some(bad) = path.iter().find(|p| !p.is_valid()) {
            return Err(ConfigError::MalformedPath {
                storm: name,
                reason: format!("waypoint {bad} is out of range"),
            });
        }
        let point_count = path.len();
        let path = StormPath::new(path).ok_or_else(|| ConfigError::MalformedPath {
            storm: name.clone(),
            reason: format!("needs at least 2 waypoints, got {point_count}"),
        })?;

        if !intensity_trend.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "storm '{name}' has a non-finite intensity trend"
            )));
        }

        if levels.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "storm '{name}' configures no levels"
            )));
        }
        let mut seen = FxHashSet::default();
        for level in &levels {
            if !seen.insert(level.level) {
                return Err(ConfigError::DuplicateLevel {
                    storm: name,
                    level: level.level.to_string(),
                });
            }
            level.validate(&name)?;
        }

        Ok(Self {
            name,
            code,
            path,
            intensity_trend,
            levels,
        })
    }

    /// Storm name, unique within a run
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short code used to build level identities
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Track followed during a cycle
    pub fn path(&self) -> &StormPath {
        &self.path
    }

    /// Change of every band's wind over a full cycle
    pub fn intensity_trend(&self) -> MilesPerHour {
        self.intensity_trend
    }

    /// Configured levels in emission order
    pub fn levels(&self) -> &[LevelConfig] {
        &self.levels
    }

    /// Identity of one of this storm's levels
    pub fn level_id(&self, level: WindLevel) -> LevelId {
        LevelId::new(&self.code, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn marie_levels() -> Vec<LevelConfig> {
        vec![
            LevelConfig::new(WindLevel::L1, Kilometers::new(300.0), MilesPerHour::new(40.0)),
            LevelConfig::new(WindLevel::L5, Kilometers::new(40.0), MilesPerHour::new(90.0)),
        ]
    }

    fn marie_path() -> Vec<GeoPoint> {
        vec![GeoPoint::new(15.0, -75.0), GeoPoint::new(27.0, -80.0)]
    }

    #[test]
    fn test_level_parse_and_identity() {
        assert_eq!(WindLevel::parse("L3"), Some(WindLevel::L3));
        assert_eq!(WindLevel::parse("l5"), Some(WindLevel::L5));
        assert_eq!(WindLevel::parse("2"), Some(WindLevel::L2));
        assert_eq!(WindLevel::parse("L6"), None);
        assert_eq!(WindLevel::parse("hurricane"), None);

        assert_eq!(LevelId::new("M", WindLevel::L5).as_str(), "M5");
    }

    #[test]
    fn test_category_thresholds() {
        assert_eq!(saffir_simpson_category(MilesPerHour::new(73.9)), 0);
        assert_eq!(saffir_simpson_category(MilesPerHour::new(74.0)), 1);
        assert_eq!(saffir_simpson_category(MilesPerHour::new(96.0)), 2);
        assert_eq!(saffir_simpson_category(MilesPerHour::new(111.0)), 3);
        assert_eq!(saffir_simpson_category(MilesPerHour::new(130.0)), 4);
        assert_eq!(saffir_simpson_category(MilesPerHour::new(157.0)), 5);
    }

    #[test]
    fn test_default_scaling_matches_classic_growth() {
        let s = RadiusScaling::default();
        // 1 + (ws - 25) / 100, floored at 1
        assert_relative_eq!(s.scale(MilesPerHour::new(125.0)), 2.0);
        assert_relative_eq!(s.scale(MilesPerHour::new(10.0)), 1.0);
    }

    #[test]
    fn test_threshold_zeroes_weak_side() {
        let inc = RadiusScaling {
            threshold: Some(MilesPerHour::new(74.0)),
            ..RadiusScaling::default()
        };
        assert_eq!(inc.scale(MilesPerHour::new(73.0)), 0.0);
        assert!(inc.scale(MilesPerHour::new(74.0)) > 0.0);

        let dec = RadiusScaling {
            direction: ScaleDirection::Decreasing,
            reference: MilesPerHour::new(50.0),
            gain_per_mph: 0.02,
            min_scale: 0.0,
            threshold: Some(MilesPerHour::new(90.0)),
        };
        assert_relative_eq!(dec.scale(MilesPerHour::new(50.0)), 1.0);
        assert_relative_eq!(dec.scale(MilesPerHour::new(75.0)), 0.5);
        assert_eq!(dec.scale(MilesPerHour::new(91.0)), 0.0);
    }

    #[test]
    fn test_cosine_profile_peaks_at_bias() {
        let p = AsymmetryProfile::Cosine {
            bias: Degrees::new(90.0),
            amplitude: 0.3,
        };
        assert_relative_eq!(p.factor(FRAC_PI_2), 1.3, epsilon = 1e-12);
        assert_relative_eq!(p.factor(3.0 * FRAC_PI_2), 0.7, epsilon = 1e-12);
        assert_relative_eq!(p.min_factor(), 0.7);
    }

    #[test]
    fn test_quadrant_profile_hits_anchors_and_blends() {
        let p = AsymmetryProfile::default();
        assert_relative_eq!(p.factor(PI / 4.0), 1.2, epsilon = 1e-12);
        assert_relative_eq!(p.factor(3.0 * PI / 4.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.factor(5.0 * PI / 4.0), 0.8, epsilon = 1e-12);
        assert_relative_eq!(p.factor(7.0 * PI / 4.0), 1.0, epsilon = 1e-12);
        // Halfway between NE (1.2) and NW (1.0)
        assert_relative_eq!(p.factor(FRAC_PI_2), 1.1, epsilon = 1e-12);
        // Wraps through east between SE (1.0) and NE (1.2)
        assert_relative_eq!(p.factor(0.0), 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_storm_defaults_code_from_name() {
        let storm = Storm::new("marie", None, marie_path(), MilesPerHour::ZERO, marie_levels())
            .unwrap();
        assert_eq!(storm.code(), "M");
        assert_eq!(storm.level_id(WindLevel::L1).as_str(), "M1");
        assert_eq!(storm.levels().len(), 2);
    }

    #[test]
    fn test_storm_rejects_short_path() {
        let err = Storm::new(
            "Marie",
            None,
            vec![GeoPoint::new(15.0, -75.0)],
            MilesPerHour::ZERO,
            marie_levels(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedPath { .. }));
    }

    #[test]
    fn test_storm_rejects_duplicate_level() {
        let mut levels = marie_levels();
        levels.push(levels[0].clone());
        let err = Storm::new("Marie", None, marie_path(), MilesPerHour::ZERO, levels).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateLevel { .. }));
    }

    #[test]
    fn test_storm_rejects_non_positive_radius() {
        let mut levels = marie_levels();
        levels[1].base_radius = Kilometers::new(0.0);
        let err = Storm::new("Marie", None, marie_path(), MilesPerHour::ZERO, levels).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLevelParameter { .. }));
    }

    #[test]
    fn test_storm_rejects_collapsing_asymmetry() {
        let mut levels = marie_levels();
        levels[0].asymmetry = AsymmetryProfile::Cosine {
            bias: Degrees::new(0.0),
            amplitude: 1.0,
        };
        assert!(Storm::new("Marie", None, marie_path(), MilesPerHour::ZERO, levels).is_err());
    }
}
