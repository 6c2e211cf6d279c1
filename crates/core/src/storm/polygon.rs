//! Irregular band outlines
//!
//! A band is drawn as a star-shaped ring around the storm centre. For each
//! of `N` evenly spaced directions θ the radial distance is
//!
//! ```text
//! r(θ) = radius · asymmetry(θ) · (1 + jitter · noise(seed, i))
//! ```
//!
//! where `noise` is the stateless lattice hash in [-1, 1] keyed by the seed
//! and the vertex index. Identical inputs give identical rings; a new seed
//! each tick makes the outline wobble.

use super::AsymmetryProfile;
use crate::core_types::noise::lattice_noise;
use crate::core_types::{GeoPoint, Kilometers};
use crate::error::GeometryError;
use serde::Serialize;
use std::f64::consts::TAU;

/// Vertex count used when none is configured
pub const DEFAULT_VERTEX_COUNT: usize = 64;

/// Closed ring of band vertices
///
/// Holds exactly `N` distinct vertices in increasing angular order starting
/// due east. The ring is implicitly closed; [`Polygon::to_geometry`] repeats
/// the first vertex at the end, as GeoJSON requires.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<GeoPoint>,
}

impl Polygon {
    /// Vertices in angular order, without the closing repeat
    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    /// Number of distinct vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the ring has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Explicitly closed `[lon, lat]` ring (N + 1 positions)
    pub fn closed_ring(&self) -> Vec<[f64; 2]> {
        let mut ring: Vec<[f64; 2]> = self.vertices.iter().map(GeoPoint::to_position).collect();
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
        ring
    }

    /// GeoJSON `Polygon` geometry with a single outer ring
    pub fn to_geometry(&self) -> Geometry {
        Geometry {
            kind: "Polygon",
            coordinates: vec![self.closed_ring()],
        }
    }
}

/// GeoJSON geometry object as carried in PUT payloads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    /// GeoJSON type tag
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Rings of `[lon, lat]` positions
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

/// Builds band outlines with a fixed vertex count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolygonSynthesizer {
    vertex_count: usize,
}

impl Default for PolygonSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_VERTEX_COUNT)
    }
}

impl PolygonSynthesizer {
    /// Synthesizer producing rings of `vertex_count` vertices
    ///
    /// The count is checked on every call so that a degenerate value surfaces
    /// as [`GeometryError`] at the record that needs it.
    pub const fn new(vertex_count: usize) -> Self {
        Self { vertex_count }
    }

    /// Configured vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Jitter multiplier for vertex `index` under `seed`, in `[1 - jitter, 1 + jitter]`
    #[inline]
    pub fn jitter_factor(jitter: f64, seed: u32, index: usize) -> f64 {
        1.0 + jitter * lattice_noise(index as i32, 0, 0, seed)
    }

    /// Synthesize the outline of a band
    ///
    /// # Errors
    /// [`GeometryError::InvalidGeometry`] when `radius` is not a positive
    /// finite distance, the vertex count is below 3, or the asymmetry
    /// profile collapses some direction to a non-positive radius.
    pub fn synthesize(
        &self,
        center: GeoPoint,
        radius: Kilometers,
        asymmetry: &AsymmetryProfile,
        jitter: f64,
        jitter_seed: u32,
    ) -> Result<Polygon, GeometryError> {
        if !radius.is_finite() || *radius <= 0.0 {
            return Err(GeometryError::non_positive_radius(*radius));
        }
        if self.vertex_count < 3 {
            return Err(GeometryError::degenerate_vertex_count(self.vertex_count));
        }

        let step = TAU / self.vertex_count as f64;
        let jitter = jitter.abs();
        let mut vertices = Vec::with_capacity(self.vertex_count);

        for i in 0..self.vertex_count {
            let theta = i as f64 * step;

            let direction_factor = asymmetry.factor(theta);
            if !direction_factor.is_finite() || direction_factor <= 0.0 {
                return Err(GeometryError::non_positive_factor(
                    theta.to_degrees(),
                    direction_factor,
                ));
            }

            let distance = radius * direction_factor * Self::jitter_factor(jitter, jitter_seed, i);
            vertices.push(center.offset(distance, theta));
        }

        Ok(Polygon { vertices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Degrees;
    use approx::assert_relative_eq;

    fn round() -> AsymmetryProfile {
        AsymmetryProfile::Cosine {
            bias: Degrees::new(0.0),
            amplitude: 0.0,
        }
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let synth = PolygonSynthesizer::new(48);
        let center = GeoPoint::new(20.0, -72.0);
        let profile = AsymmetryProfile::Cosine {
            bias: Degrees::new(30.0),
            amplitude: 0.25,
        };

        let a = synth
            .synthesize(center, Kilometers::new(150.0), &profile, 0.15, 1234)
            .unwrap();
        let b = synth
            .synthesize(center, Kilometers::new(150.0), &profile, 0.15, 1234)
            .unwrap();
        assert_eq!(a, b);

        let c = synth
            .synthesize(center, Kilometers::new(150.0), &profile, 0.15, 1235)
            .unwrap();
        assert_ne!(a, c, "a different seed should wobble the outline");
    }

    #[test]
    fn test_vertex_count_and_closure() {
        for n in [3, 4, 17, 64] {
            let poly = PolygonSynthesizer::new(n)
                .synthesize(GeoPoint::new(0.0, 0.0), Kilometers::new(10.0), &round(), 0.1, 7)
                .unwrap();
            assert_eq!(poly.len(), n);
            assert!(!poly.is_empty());

            let ring = poly.closed_ring();
            assert_eq!(ring.len(), n + 1);
            assert_eq!(ring.first(), ring.last());

            let geometry = poly.to_geometry();
            assert_eq!(geometry.kind, "Polygon");
            assert_eq!(geometry.coordinates.len(), 1);
        }
    }

    #[test]
    fn test_vertices_in_increasing_angle() {
        let center = GeoPoint::new(0.0, 0.0);
        let poly = PolygonSynthesizer::new(32)
            .synthesize(center, Kilometers::new(50.0), &round(), 0.15, 99)
            .unwrap();

        let angles: Vec<f64> = poly
            .vertices()
            .iter()
            .map(|v| (v.lat - center.lat).atan2(v.lon - center.lon).rem_euclid(TAU))
            .collect();
        assert!(angles[0] < 1e-9, "first vertex points due east");
        for pair in angles.windows(2) {
            assert!(pair[1] > pair[0], "angles must increase: {pair:?}");
        }
    }

    #[test]
    fn test_radius_without_jitter_or_bias() {
        // Equator: one degree each way is a fixed distance
        let poly = PolygonSynthesizer::new(4)
            .synthesize(GeoPoint::new(0.0, 0.0), Kilometers::new(110.574), &round(), 0.0, 0)
            .unwrap();
        let north = poly.vertices()[1];
        assert_relative_eq!(north.lat, 1.0, epsilon = 1e-9);
        assert_relative_eq!(north.lon, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        for i in 0..256 {
            let f = PolygonSynthesizer::jitter_factor(0.15, 5, i);
            assert!((0.85..=1.15).contains(&f), "jitter {f} out of bounds");
        }
    }

    #[test]
    fn test_bias_stretches_toward_bias_direction() {
        let profile = AsymmetryProfile::Cosine {
            bias: Degrees::new(90.0),
            amplitude: 0.5,
        };
        let poly = PolygonSynthesizer::new(4)
            .synthesize(GeoPoint::new(0.0, 0.0), Kilometers::new(100.0), &profile, 0.0, 0)
            .unwrap();
        let north_reach = poly.vertices()[1].lat;
        let south_reach = -poly.vertices()[3].lat;
        assert_relative_eq!(north_reach / south_reach, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        let synth = PolygonSynthesizer::default();
        let center = GeoPoint::new(10.0, 10.0);
        for r in [0.0, -5.0, f64::NAN] {
            let err = synth
                .synthesize(center, Kilometers::new(r), &round(), 0.1, 1)
                .unwrap_err();
            assert!(matches!(err, GeometryError::InvalidGeometry(_)));
        }
    }

    #[test]
    fn test_rejects_degenerate_vertex_count() {
        for n in [0, 1, 2] {
            let err = PolygonSynthesizer::new(n)
                .synthesize(GeoPoint::new(0.0, 0.0), Kilometers::new(10.0), &round(), 0.1, 1)
                .unwrap_err();
            assert!(matches!(err, GeometryError::InvalidGeometry(_)));
        }
    }

    #[test]
    fn test_rejects_collapsing_asymmetry() {
        let profile = AsymmetryProfile::Cosine {
            bias: Degrees::new(0.0),
            amplitude: 1.5,
        };
        let err = PolygonSynthesizer::new(8)
            .synthesize(GeoPoint::new(0.0, 0.0), Kilometers::new(10.0), &profile, 0.0, 1)
            .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidGeometry(_)));
    }
}
