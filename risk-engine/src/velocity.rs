//! Request velocity lookup
//!
//! The scorer never reaches into limiter internals; it asks a
//! [`VelocitySource`] how many requests a client made recently.

use security::RateLimiter;
use std::time::Duration;

/// Source of recent request counts per client
pub trait VelocitySource {
    /// Requests recorded for `identifier` within the trailing `window`
    fn velocity(&self, identifier: &str, window: Duration) -> usize;
}

impl VelocitySource for RateLimiter {
    fn velocity(&self, identifier: &str, window: Duration) -> usize {
        RateLimiter::velocity(self, identifier, window)
    }
}

impl<T: VelocitySource + ?Sized> VelocitySource for std::sync::Arc<T> {
    fn velocity(&self, identifier: &str, window: Duration) -> usize {
        (**self).velocity(identifier, window)
    }
}
