//! Virtual-time environment.
//!
//! Time is a shared counter of milliseconds since the start of the
//! simulation. Nothing advances it except [`SimEnv::advance`] and
//! [`Environment::sleep`], so every run with the same inputs sees the same
//! timings.

use std::{
    ops::{Add, Sub},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use parley_core::env::Environment;

/// Wall-clock instant the simulation starts at (2023-11-14T22:13:20Z).
const SIM_EPOCH_MS: i64 = 1_700_000_000_000;

/// Point in simulated time: offset since the simulation started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Instant `ms` milliseconds after the start.
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    /// Offset since the start.
    pub fn since_start(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    /// Saturates at zero, like `std::time::Instant`.
    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Shared virtual clock.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    millis: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock at the start of the simulation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, duration: Duration) {
        self.millis.fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Wall-clock time matching [`Environment::now`], for relay timestamps.
    pub fn wall_clock(&self) -> DateTime<Utc> {
        let offset = self.millis.load(Ordering::SeqCst) as i64;
        DateTime::from_timestamp_millis(SIM_EPOCH_MS + offset).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant::from_millis(self.millis.load(Ordering::SeqCst))
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();

        env.advance(Duration::from_millis(250));

        assert_eq!(other.now(), SimInstant::from_millis(250));
        assert_eq!(other.now() - SimInstant::from_millis(100), Duration::from_millis(150));
    }

    #[test]
    fn subtraction_saturates() {
        assert_eq!(SimInstant::from_millis(1) - SimInstant::from_millis(5), Duration::ZERO);
    }

    #[test]
    fn wall_clock_follows_virtual_time() {
        let env = SimEnv::new();
        let start = env.wall_clock();
        env.advance(Duration::from_secs(3));
        assert_eq!((env.wall_clock() - start).num_seconds(), 3);
    }
}
