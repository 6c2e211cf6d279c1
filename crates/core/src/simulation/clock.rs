//! Simulated clock: tick index to elapsed time and cycle fraction

use crate::error::ConfigError;
use std::time::Duration;

/// Position of one tick on the simulated clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickTime {
    /// Tick index within the cycle
    pub tick: u64,
    /// Simulated time since the cycle started
    pub elapsed: Duration,
    /// `elapsed / duration`, in [0, 1]
    pub fraction: f64,
}

/// Fixed-interval clock for one cycle
///
/// A cycle of duration `D` at interval `I` has `D / I` ticks numbered
/// `0..total_ticks`. The cycle boundary falls on tick `total_ticks`, whose
/// slot belongs to the end-of-cycle retraction rather than to band updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    interval: Duration,
    duration: Duration,
    total_ticks: u64,
}

impl SimClock {
    /// Clock stepping by `interval` across `duration`
    ///
    /// # Errors
    /// [`ConfigError::InvalidTiming`] when the interval is zero or longer
    /// than the duration.
    pub fn new(interval: Duration, duration: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidTiming(
                "tick interval must be positive".to_string(),
            ));
        }
        if duration < interval {
            return Err(ConfigError::InvalidTiming(format!(
                "cycle duration {duration:?} is shorter than the tick interval {interval:?}"
            )));
        }

        let total_ticks = (duration.as_nanos() / interval.as_nanos()) as u64;
        Ok(Self {
            interval,
            duration,
            total_ticks,
        })
    }

    /// Spacing between ticks
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Length of one cycle
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of band-update ticks per cycle
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Time at `tick`; ticks past the boundary report a fraction of 1
    pub fn time_at(&self, tick: u64) -> TickTime {
        let elapsed = self.interval.saturating_mul(u32::try_from(tick).unwrap_or(u32::MAX));
        let fraction = (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0);
        TickTime {
            tick,
            elapsed,
            fraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tick_count_and_fraction() {
        let clock = SimClock::new(Duration::from_secs(10), Duration::from_secs(600)).unwrap();
        assert_eq!(clock.total_ticks(), 60);

        let t = clock.time_at(45);
        assert_eq!(t.elapsed, Duration::from_secs(450));
        assert_relative_eq!(t.fraction, 0.75);

        assert_relative_eq!(clock.time_at(0).fraction, 0.0);
        assert_relative_eq!(clock.time_at(60).fraction, 1.0);
        assert_relative_eq!(clock.time_at(61).fraction, 1.0);
    }

    #[test]
    fn test_partial_interval_truncates() {
        let clock = SimClock::new(Duration::from_secs(7), Duration::from_secs(30)).unwrap();
        assert_eq!(clock.total_ticks(), 4);
    }

    #[test]
    fn test_fraction_follows_elapsed_time_when_interval_does_not_divide() {
        let clock = SimClock::new(Duration::from_secs(7), Duration::from_secs(30)).unwrap();

        let t = clock.time_at(3);
        assert_eq!(t.elapsed, Duration::from_secs(21));
        assert_relative_eq!(t.fraction, 0.7, epsilon = 1e-12);

        // Last update tick stays short of the end of the track
        assert_relative_eq!(clock.time_at(4).fraction, 28.0 / 30.0, epsilon = 1e-12);
        assert_relative_eq!(clock.time_at(5).fraction, 1.0);
    }

    #[test]
    fn test_rejects_bad_timing() {
        assert!(SimClock::new(Duration::ZERO, Duration::from_secs(60)).is_err());
        assert!(SimClock::new(Duration::from_secs(10), Duration::from_secs(5)).is_err());
    }
}
