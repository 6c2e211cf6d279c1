//! Geographic points and storm tracks
//!
//! Offsets use a flat-earth approximation around the point being offset.
//! Storm bands span a few hundred kilometres at most, so no geodesic
//! correction is applied.

use super::units::{Degrees, Kilometers};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude, positive north
    pub lat: f64,
    /// Longitude, positive east
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point
    #[inline]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both coordinates are finite and within their valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Point reached by moving `distance` in direction `angle_rad`
    ///
    /// The angle follows the math convention (0 = east, counter-clockwise).
    pub fn offset(&self, distance: Kilometers, angle_rad: f64) -> GeoPoint {
        let dlat = *distance.to_lat_degrees();
        let dlon = *distance.to_lon_degrees(Degrees::new(self.lat));
        GeoPoint {
            lat: self.lat + dlat * angle_rad.sin(),
            lon: self.lon + dlon * angle_rad.cos(),
        }
    }

    /// Linear interpolation between two points in degree space
    pub fn lerp(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }

    /// Planar distance in degree space (used only to weight path segments)
    fn degree_distance(&self, other: &GeoPoint) -> f64 {
        (other.lat - self.lat).hypot(other.lon - self.lon)
    }

    /// `[lon, lat]` position as used by GeoJSON
    pub fn to_position(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl From<[f64; 2]> for GeoPoint {
    /// Build from a `[lat, lon]` pair
    fn from(pair: [f64; 2]) -> Self {
        GeoPoint::new(pair[0], pair[1])
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.lat, self.lon)
    }
}

/// Ordered track of waypoints a storm follows during one cycle
///
/// Interpolation walks the polyline at constant speed: the time fraction is
/// mapped onto cumulative segment length, so a long leg takes longer than a
/// short one.
#[derive(Debug, Clone, PartialEq)]
pub struct StormPath {
    waypoints: Vec<GeoPoint>,
    /// Cumulative length at each waypoint, `cumulative[0] == 0`
    cumulative: Vec<f64>,
}

impl StormPath {
    /// Build a path from at least two waypoints
    ///
    /// Returns `None` for fewer than two waypoints.
    pub fn new(waypoints: Vec<GeoPoint>) -> Option<Self> {
        if waypoints.len() < 2 {
            return None;
        }

        let mut cumulative = Vec::with_capacity(waypoints.len());
        let mut total = 0.0;
        cumulative.push(total);
        for pair in waypoints.windows(2) {
            total += pair[0].degree_distance(&pair[1]);
            cumulative.push(total);
        }

        Some(Self {
            waypoints,
            cumulative,
        })
    }

    /// First waypoint
    pub fn start(&self) -> GeoPoint {
        self.waypoints[0]
    }

    /// Last waypoint
    pub fn end(&self) -> GeoPoint {
        self.waypoints[self.waypoints.len() - 1]
    }

    /// All waypoints in order
    pub fn waypoints(&self) -> &[GeoPoint] {
        &self.waypoints
    }

    /// Position at time fraction `fraction` (clamped to [0, 1])
    pub fn position_at(&self, fraction: f64) -> GeoPoint {
        let fraction = fraction.clamp(0.0, 1.0);
        let total = self.cumulative[self.cumulative.len() - 1];
        if total <= f64::EPSILON {
            // Stationary storm: every waypoint is the same point
            return self.start();
        }

        let target = fraction * total;
        let segment = self
            .cumulative
            .windows(2)
            .position(|w| target <= w[1])
            .unwrap_or(self.waypoints.len() - 2);

        let seg_start = self.cumulative[segment];
        let seg_len = self.cumulative[segment + 1] - seg_start;
        let local = if seg_len <= f64::EPSILON {
            0.0
        } else {
            (target - seg_start) / seg_len
        };

        self.waypoints[segment].lerp(&self.waypoints[segment + 1], local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_two_point_path_is_plain_lerp() {
        let path = StormPath::new(vec![GeoPoint::new(15.0, -75.0), GeoPoint::new(27.0, -80.0)])
            .unwrap();

        let mid = path.position_at(0.5);
        assert_relative_eq!(mid.lat, 21.0);
        assert_relative_eq!(mid.lon, -77.5);

        assert_eq!(path.position_at(0.0), path.start());
        assert_eq!(path.position_at(1.0), path.end());
        // Out-of-range fractions clamp to the ends
        assert_eq!(path.position_at(1.7), path.end());
        assert_eq!(path.position_at(-0.2), path.start());
    }

    #[test]
    fn test_multi_segment_path_walks_by_length() {
        // First leg 3° long, second leg 1° long
        let path = StormPath::new(vec![
            GeoPoint::new(10.0, -60.0),
            GeoPoint::new(13.0, -60.0),
            GeoPoint::new(13.0, -61.0),
        ])
        .unwrap();

        let turn = path.position_at(0.75);
        assert_relative_eq!(turn.lat, 13.0, epsilon = 1e-12);
        assert_relative_eq!(turn.lon, -60.0, epsilon = 1e-12);

        let on_second_leg = path.position_at(0.875);
        assert_relative_eq!(on_second_leg.lat, 13.0, epsilon = 1e-12);
        assert_relative_eq!(on_second_leg.lon, -60.5, epsilon = 1e-12);
    }

    #[test]
    fn test_path_requires_two_points() {
        assert!(StormPath::new(vec![GeoPoint::new(0.0, 0.0)]).is_none());
        assert!(StormPath::new(Vec::new()).is_none());
    }

    #[test]
    fn test_stationary_path() {
        let p = GeoPoint::new(20.0, -70.0);
        let path = StormPath::new(vec![p, p]).unwrap();
        assert_eq!(path.position_at(0.3), p);
    }

    #[test]
    fn test_offset_north_and_east() {
        let origin = GeoPoint::new(0.0, 0.0);
        let north = origin.offset(Kilometers::new(110.574), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(north.lat, 1.0, epsilon = 1e-9);
        assert_relative_eq!(north.lon, 0.0, epsilon = 1e-9);

        let east = origin.offset(Kilometers::new(111.320), 0.0);
        assert_relative_eq!(east.lon, 1.0, epsilon = 1e-9);
        assert_relative_eq!(east.lat, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_validity() {
        assert!(GeoPoint::new(27.0, -80.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
    }
}
