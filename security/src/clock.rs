//! Time source for the rate limiter and date-dependent checks
//!
//! Production code uses [`SystemClock`]. [`MockClock`] moves only when told
//! to, so window expiry and time-of-day rules can be tested deterministically.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic and wall-clock time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Monotonic instant, used for rate windows
    fn now(&self) -> Instant;

    /// Wall-clock time, used for expiry and time-of-day rules
    fn utc_now(&self) -> DateTime<Utc>;
}

/// System clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock
///
/// Clones share the same time, so a clone handed to a limiter can be advanced
/// from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    state: Arc<Mutex<(Instant, DateTime<Utc>)>>,
}

impl MockClock {
    /// Start at the given wall-clock time
    pub fn at(utc: DateTime<Utc>) -> Self {
        Self {
            state: Arc::new(Mutex::new((Instant::now(), utc))),
        }
    }

    /// Start at the current time
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Move both clocks forward
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.0 += duration;
        state.1 += chrono::Duration::milliseconds(duration.as_millis() as i64);
    }

    /// Jump the wall clock without touching the monotonic instant
    pub fn set_utc(&self, utc: DateTime<Utc>) {
        self.state.lock().1 = utc;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.state.lock().0
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.state.lock().1
    }
}
