//! Hurricane Wind-Field Simulation Core Library
//!
//! Moves one or more named storms along configured tracks and, on a fixed
//! clock, turns each storm's wind bands (levels L1..L5) into closed
//! geographic outlines. Bands are published as PUT records while they exist,
//! retracted with a single CLEAR when they cease, and the whole scenario
//! restarts from the beginning of the track at the end of every cycle.
//!
//! ## Pipeline
//!
//! - [`storm::WindLevelModel`] derives center, wind speed and radius per tick
//! - [`storm::PolygonSynthesizer`] shapes each band into an asymmetric outline
//! - [`simulation::SimulationCycle`] tracks band lifecycles and builds records
//! - [`simulation::CycleRepeater`] paces ticks and hands records to a
//!   [`publish::Publisher`]

// Core types and utilities
pub mod core_types;
pub mod error;

// Storm model, band outlines and the tick loop
pub mod simulation;
pub mod storm;

// Outer surfaces
pub mod config;
pub mod publish;

// Re-export core types
pub use core_types::{Degrees, GeoPoint, Kilometers, MilesPerHour, StormPath};
pub use error::{ConfigError, GeometryError, PublishError};

// Re-export storm types
pub use storm::{
    saffir_simpson_category, AsymmetryProfile, LevelConfig, LevelId, Polygon, PolygonSynthesizer,
    RadiusScaling, ScaleDirection, Storm, StormState, StormTick, WindLevel, WindLevelModel,
};

// Re-export simulation types
pub use config::{Scenario, SimulationConfig};
pub use publish::{JsonLinesPublisher, LogPublisher, Publisher, RecordingPublisher};
pub use simulation::{
    CancellationToken, ClearReason, CycleRepeater, Envelope, NoopPacer, OutboundRecord, Pacer,
    RunSummary, SimClock, SimulationCycle, ThreadPacer, TickReport, Topics,
};
