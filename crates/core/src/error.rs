//! Error types for geometry synthesis, publishing and configuration

use thiserror::Error;

/// Errors raised while synthesizing a band polygon
///
/// Fatal only to the record being built: the cycle logs and skips it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Radius, vertex count or asymmetry cannot produce a ring
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl GeometryError {
    /// Radius that is zero, negative or not finite
    pub fn non_positive_radius(radius_km: f64) -> Self {
        Self::InvalidGeometry(format!("radius must be finite and positive, got {radius_km} km"))
    }

    /// Fewer than three vertices
    pub fn degenerate_vertex_count(count: usize) -> Self {
        Self::InvalidGeometry(format!("a ring needs at least 3 vertices, got {count}"))
    }

    /// Asymmetry factor that collapses part of the ring
    pub fn non_positive_factor(angle_deg: f64, factor: f64) -> Self {
        Self::InvalidGeometry(format!(
            "asymmetry factor at {angle_deg:.1}° must be positive, got {factor}"
        ))
    }
}

/// Errors raised by a [`crate::publish::Publisher`]
///
/// Never fatal to the simulation loop.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Writing to the underlying sink failed
    #[error("publish I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The record could not be serialized
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The transport refused the message
    #[error("transport rejected message on '{topic}': {reason}")]
    Rejected {
        /// Topic the message was addressed to
        topic: String,
        /// Transport-provided reason
        reason: String,
    },
}

/// Errors raised while loading or validating configuration
///
/// Always fatal: they are reported before the loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config '{path}': {source}")]
    Io {
        /// Path that could not be read
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// Failed to parse the configuration file
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Tick interval or cycle duration unusable
    #[error("invalid timing: {0}")]
    InvalidTiming(String),
    /// Storm path too short or containing invalid coordinates
    #[error("storm '{storm}' has a malformed path: {reason}")]
    MalformedPath {
        /// Storm name
        storm: String,
        /// What is wrong with the path
        reason: String,
    },
    /// Level name outside L1..L5
    #[error("storm '{storm}' configures unknown level '{level}' (expected L1..L5)")]
    UnknownLevel {
        /// Storm name
        storm: String,
        /// Offending level name
        level: String,
    },
    /// Same level configured twice for one storm
    #[error("storm '{storm}' configures level {level} more than once")]
    DuplicateLevel {
        /// Storm name
        storm: String,
        /// Repeated level
        level: String,
    },
    /// Same storm name used twice
    #[error("storm name '{0}' is used more than once")]
    DuplicateStorm(String),
    /// Two (storm, level) pairs map to the same identity
    #[error("level identity '{0}' is not unique; give storms distinct codes")]
    DuplicateLevelId(String),
    /// A numeric level or storm parameter is out of range
    #[error("storm '{storm}' level {level}: {reason}")]
    InvalidLevelParameter {
        /// Storm name
        storm: String,
        /// Level being configured
        level: String,
        /// What is wrong
        reason: String,
    },
    /// Any other invalid setting
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
