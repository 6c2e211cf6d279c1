//! Semantic unit types for storm quantities
//!
//! Newtype wrappers keep distances, wind speeds and angles from being mixed
//! up when they flow through the geometry pipeline.
//!
//! # Design Philosophy
//! - All quantities use f64: they end up as geographic coordinates
//! - Total ordering via `Ord` (NaN sorts above every value)
//! - `Deref` to the raw value for arithmetic-heavy call sites
//! - Serde support as plain numbers
//!
//! # Usage
//! ```
//! use hurricane_sim_core::core_types::units::{Degrees, Kilometers, MilesPerHour};
//!
//! let radius = Kilometers::new(150.0);
//! assert!((*radius.to_lat_degrees() - 1.3566).abs() < 1e-3);
//!
//! let bias = Degrees::new(45.0);
//! assert!((bias.to_radians() - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
//!
//! let wind = MilesPerHour::new(80.0);
//! assert!(wind > MilesPerHour::new(74.0));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, Mul};

/// Kilometres per degree of latitude
pub const KM_PER_DEGREE_LAT: f64 = 110.574;

/// Kilometres per degree of longitude at the equator
pub const KM_PER_DEGREE_LON_EQUATOR: f64 = 111.320;

/// Compare f64 values with total ordering using Rust's built-in `total_cmp`
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

// ============================================================================
// DISTANCE
// ============================================================================

/// Distance in kilometres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Kilometers(f64);

impl Eq for Kilometers {}

impl PartialOrd for Kilometers {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Kilometers {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Kilometers {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Kilometers {
    /// Zero distance
    pub const ZERO: Kilometers = Kilometers(0.0);

    /// Create a new distance. Not validated: geometry code reports
    /// non-positive radii as errors instead of panicking.
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Kilometers(value)
    }

    /// Degrees of latitude spanned by this distance
    #[inline]
    #[must_use]
    pub fn to_lat_degrees(self) -> Degrees {
        Degrees(self.0 / KM_PER_DEGREE_LAT)
    }

    /// Degrees of longitude spanned by this distance at `latitude`
    ///
    /// Flat-earth approximation; the cosine is floored so the result stays
    /// finite next to the poles.
    #[inline]
    #[must_use]
    pub fn to_lon_degrees(self, latitude: Degrees) -> Degrees {
        let cos_lat = latitude.to_radians().cos().abs().max(1e-6);
        Degrees(self.0 / (KM_PER_DEGREE_LON_EQUATOR * cos_lat))
    }

    /// Clamp negative distances to zero
    #[inline]
    #[must_use]
    pub fn clamp_non_negative(self) -> Self {
        Kilometers(self.0.max(0.0))
    }
}

impl Mul<f64> for Kilometers {
    type Output = Kilometers;
    fn mul(self, rhs: f64) -> Kilometers {
        Kilometers(self.0 * rhs)
    }
}

impl fmt::Display for Kilometers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} km", self.0)
    }
}

// ============================================================================
// WIND SPEED
// ============================================================================

/// Sustained wind speed in miles per hour
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MilesPerHour(f64);

impl Eq for MilesPerHour {}

impl PartialOrd for MilesPerHour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MilesPerHour {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for MilesPerHour {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl MilesPerHour {
    /// Calm
    pub const ZERO: MilesPerHour = MilesPerHour(0.0);

    /// Create a new wind speed
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        MilesPerHour(value)
    }

    /// Clamp negative speeds to calm
    #[inline]
    #[must_use]
    pub fn clamp_non_negative(self) -> Self {
        MilesPerHour(self.0.max(0.0))
    }
}

impl fmt::Display for MilesPerHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} mph", self.0)
    }
}

// ============================================================================
// ANGLE
// ============================================================================

/// Angle in degrees
///
/// Used both for geographic coordinates and for directions, which follow
/// the math convention: 0° points east, angles grow counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Degrees(f64);

impl Eq for Degrees {}

impl PartialOrd for Degrees {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Degrees {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Degrees {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Degrees {
    /// Create a new angle
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Degrees(value)
    }

    /// Convert to radians
    #[inline]
    #[must_use]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_km_to_degrees_matches_reference_constants() {
        let km = Kilometers::new(110.574);
        assert_relative_eq!(*km.to_lat_degrees(), 1.0, epsilon = 1e-12);

        let at_equator = Kilometers::new(111.320).to_lon_degrees(Degrees::new(0.0));
        assert_relative_eq!(*at_equator, 1.0, epsilon = 1e-12);

        // Longitude degrees stretch away from the equator
        let at_60 = Kilometers::new(111.320).to_lon_degrees(Degrees::new(60.0));
        assert_relative_eq!(*at_60, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lon_degrees_stay_finite_at_pole() {
        let d = Kilometers::new(10.0).to_lon_degrees(Degrees::new(90.0));
        assert!(d.is_finite());
    }

    #[test]
    fn test_ordering_and_clamping() {
        assert!(MilesPerHour::new(96.0) < MilesPerHour::new(111.0));
        assert_eq!(MilesPerHour::new(-3.0).clamp_non_negative(), MilesPerHour::ZERO);
        assert_eq!(Kilometers::new(-0.5).clamp_non_negative(), Kilometers::ZERO);
        assert_eq!(Kilometers::new(1.0).max(Kilometers::new(2.0)), Kilometers::new(2.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Kilometers::new(12.345).to_string(), "12.3 km");
        assert_eq!(MilesPerHour::new(74.0).to_string(), "74.0 mph");
    }
}
