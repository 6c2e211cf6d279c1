//! Core types and utilities

pub mod geo;
pub mod noise;
pub mod units;

pub use geo::{GeoPoint, StormPath};
pub use units::{Degrees, Kilometers, MilesPerHour};
