//! Loop clock and frame timestamping.
//!
//! Timestamps are seconds since the loop-start instant `t0`, taken at the
//! moment each capture begins. They must never decrease; a regression means
//! the clock source is broken and is reported instead of forwarded.

use std::time::Instant;

use thiserror::Error;

/// Source of instants for the acquisition loop.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// `std::time::Instant` backed clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Timestamp ordering violations.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ClockError {
    #[error("capture instant precedes loop start")]
    BeforeStart,
    #[error("clock went backwards: {current:.6}s after {previous:.6}s")]
    Regressed { previous: f64, current: f64 },
}

/// Converts capture instants into loop-relative timestamps.
#[derive(Clone, Debug)]
pub struct Timestamper {
    t0: Instant,
    last: Option<f64>,
}

impl Timestamper {
    /// Anchor timestamps at the loop-start instant.
    pub fn start(t0: Instant) -> Self {
        Self { t0, last: None }
    }

    /// Timestamp of the last accepted capture.
    pub fn last(&self) -> Option<f64> {
        self.last
    }

    /// Seconds from `t0` to `at`. Equal timestamps are accepted.
    pub fn stamp(&mut self, at: Instant) -> Result<f64, ClockError> {
        let current = at
            .checked_duration_since(self.t0)
            .ok_or(ClockError::BeforeStart)?
            .as_secs_f64();
        if let Some(previous) = self.last {
            if current < previous {
                return Err(ClockError::Regressed { previous, current });
            }
        }
        self.last = Some(current);
        Ok(current)
    }
}
