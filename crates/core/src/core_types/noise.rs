//! Stateless hash noise for band wobble and wind fluctuation
//!
//! Every value is a pure function of its integer lattice coordinates and a
//! seed, so the same inputs always give the same output and no random
//! source has to be threaded through the simulation. Used for:
//! - Per-vertex polygon jitter (keyed by seed and vertex index)
//! - Wind speed oscillation (smooth in tick index)
//! - Central pressure fluctuation

/// Seed multipliers for lattice axes
/// Using prime numbers for better distribution
const SEED_X: u32 = 1619;
const SEED_Y: u32 = 31337;
const SEED_Z: u32 = 6971;
const SEED_W: u32 = 1013;

/// Maximum value for positive i32 as f64 for safe conversion
const MAX_I32_POSITIVE: f64 = 0x7fff_ffff as f64;

/// Decorrelation offset between the two halves of [`mix_seed`]
const MIX_SALT: u32 = 0x9e37_79b9;

/// Integer hash of a 4D lattice point
///
/// Returns a value in [0, 1].
#[inline]
fn hash_4d(x: i32, y: i32, z: i32, w: i32, seed: u32) -> f64 {
    let mut n = x
        .wrapping_mul(SEED_X as i32)
        .wrapping_add(y.wrapping_mul(SEED_Y as i32))
        .wrapping_add(z.wrapping_mul(SEED_Z as i32))
        .wrapping_add(w.wrapping_mul(SEED_W as i32))
        .wrapping_add(seed as i32);
    n = (n << 13) ^ n;
    n = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789221))
        .wrapping_add(1376312589);
    f64::from(n & 0x7fff_ffff) / MAX_I32_POSITIVE
}

/// Smooth interpolation function (Hermite curve)
#[inline]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Derive a child seed from a parent seed and a stream index
///
/// Used to give every (storm, level, tick) its own jitter seed.
#[inline]
pub fn mix_seed(seed: u32, stream: u32) -> u32 {
    let a = hash_4d(stream as i32, 0, 0, 0, seed);
    let b = hash_4d(stream as i32, 1, 0, 0, seed ^ MIX_SALT);
    // Two 31-bit halves folded into one 32-bit seed
    let hi = (a * MAX_I32_POSITIVE) as u32;
    let lo = (b * MAX_I32_POSITIVE) as u32;
    hi.rotate_left(16) ^ lo
}

/// Lattice value noise in [-1, 1]
///
/// Deterministic in `(x, y, z, seed)` with no smoothing between points.
#[inline]
pub fn lattice_noise(x: i32, y: i32, z: i32, seed: u32) -> f64 {
    hash_4d(x, y, z, 0, seed) * 2.0 - 1.0
}

/// 1D value noise in [-1, 1] with smooth continuity in `t`
///
/// `t` is measured in lattice units; integer steps land on independent hash
/// values and everything in between is Hermite-blended. `channel` separates
/// independent noise streams under the same seed.
pub fn temporal_noise(t: f64, channel: i32, seed: u32) -> f64 {
    let t0 = t.floor();
    let i0 = t0 as i32;
    let ft = smoothstep(t - t0);

    let v0 = hash_4d(i0, channel, 0, 1, seed);
    let v1 = hash_4d(i0.wrapping_add(1), channel, 0, 1, seed);

    let v = v0 + ft * (v1 - v0);
    v * 2.0 - 1.0
}
