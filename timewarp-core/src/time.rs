//! Virtual time and the tick-clock provider.
//!
//! Simulation progress is measured in [`VirtualTime`], a logical clock that
//! is entirely decoupled from wall-clock time. Wall-clock pacing of the
//! cooperative tick loop goes through the [`TickClock`] provider so that
//! runners can swap real delays for simulated ones.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A point on the simulation's logical clock.
///
/// Virtual time only moves through event timestamps: processing an event
/// advances the local clock to the event's timestamp, and a rollback moves
/// it backwards. [`VirtualTime::MAX`] is the sentinel an idle process
/// contributes to GVT reduction, meaning "no lower bound from me".
///
/// # Examples
///
/// ```
/// use timewarp_core::VirtualTime;
///
/// let t = VirtualTime::new(42);
/// assert!(VirtualTime::ZERO < t);
/// assert!(t < VirtualTime::MAX);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct VirtualTime(u64);

impl VirtualTime {
    /// The origin of virtual time.
    pub const ZERO: VirtualTime = VirtualTime(0);

    /// Sentinel for "no pending work": greater than every real timestamp.
    pub const MAX: VirtualTime = VirtualTime(u64::MAX);

    /// Create a virtual time from a raw tick count.
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Raw tick count of this virtual time.
    pub const fn ticks(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == VirtualTime::MAX {
            write!(f, "t=∞")
        } else {
            write!(f, "t={}", self.0)
        }
    }
}

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The awaited operation did not complete within its deadline.
    #[error("operation timed out")]
    Elapsed,
}

/// Provider trait for pacing cooperative loops.
///
/// Implementations decide what a wall-clock delay means: the production
/// [`TokioClock`] uses real timers, while a simulated clock can advance
/// instantly for deterministic tests.
#[async_trait(?Send)]
pub trait TickClock: Clone {
    /// Sleep for the specified duration.
    async fn sleep(&self, duration: Duration);

    /// Run a future with a timeout.
    ///
    /// Returns `Ok(result)` if the future completes within the timeout,
    /// or `Err(TimeError::Elapsed)` if it times out.
    async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, TimeError>
    where
        F: std::future::Future<Output = T>;
}

/// Real clock using Tokio's time facilities.
#[derive(Debug, Clone, Default)]
pub struct TokioClock;

impl TokioClock {
    /// Create a new Tokio-backed clock.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl TickClock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, TimeError>
    where
        F: std::future::Future<Output = T>,
    {
        match tokio::time::timeout(duration, future).await {
            Ok(result) => Ok(result),
            Err(_) => Err(TimeError::Elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_time_ordering() {
        assert!(VirtualTime::ZERO < VirtualTime::new(1));
        assert!(VirtualTime::new(1) < VirtualTime::new(2));
        assert!(VirtualTime::new(u64::MAX - 1) < VirtualTime::MAX);
    }

    #[test]
    fn test_virtual_time_display() {
        assert_eq!(VirtualTime::new(7).to_string(), "t=7");
        assert_eq!(VirtualTime::MAX.to_string(), "t=∞");
    }

    #[test]
    fn test_virtual_time_serde_roundtrip() {
        let t = VirtualTime::new(1234);
        let json = serde_json::to_string(&t).expect("serialize");
        let decoded: VirtualTime = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(t, decoded);
    }

    #[tokio::test]
    async fn test_tokio_clock_timeout_elapsed() {
        let clock = TokioClock::new();
        let result = clock
            .timeout(Duration::from_millis(5), std::future::pending::<()>())
            .await;
        assert_eq!(result, Err(TimeError::Elapsed));
    }

    #[tokio::test]
    async fn test_tokio_clock_timeout_completes() {
        let clock = TokioClock::new();
        let result = clock
            .timeout(Duration::from_millis(50), async { 42 })
            .await;
        assert_eq!(result, Ok(42));
    }
}
