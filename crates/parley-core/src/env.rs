//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from the system clock. Production uses
//! `std::time::Instant`; simulation uses a virtual clock that only moves when
//! the test advances it.

use std::{
    future::Future,
    ops::{Add, Sub},
    time::Duration,
};

/// Point in monotonic time usable by the session state machines.
///
/// Blanket-implemented for every type with the required arithmetic, so
/// `std::time::Instant` and simulated instants both qualify.
pub trait Moment:
    Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = Self>
{
}

impl<T> Moment for T where
    T: Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = T>
{
}

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// - `now()` never goes backwards within one execution context.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    type Instant: Moment;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this; state machines never sleep.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
