//! Sliding-window rate limiting
//!
//! Each (client identifier, endpoint class) pair keeps the instants of its
//! recent requests. A request is admitted while fewer than `max_requests`
//! instants fall inside the trailing window.
//!
//! All clients share one lock. That serializes unrelated callers, which is
//! acceptable at the request rates this gate sees. Counters live in memory
//! only; a restart clears them.

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Endpoint family sharing one request budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointClass {
    /// Card number / expiry / CVV checks
    CardValidation,
    /// Payment creation and confirmation
    PaymentProcessing,
    /// Everything else
    GeneralApi,
}

impl EndpointClass {
    /// Every class, in slot order
    pub const ALL: [EndpointClass; 3] = [
        EndpointClass::CardValidation,
        EndpointClass::PaymentProcessing,
        EndpointClass::GeneralApi,
    ];

    /// Config / metrics name
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::CardValidation => "card_validation",
            EndpointClass::PaymentProcessing => "payment_processing",
            EndpointClass::GeneralApi => "general_api",
        }
    }

    fn slot(&self) -> usize {
        match self {
            EndpointClass::CardValidation => 0,
            EndpointClass::PaymentProcessing => 1,
            EndpointClass::GeneralApi => 2,
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request budget for one endpoint class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRule {
    /// Requests admitted per window; 0 blocks everything
    pub max_requests: u32,

    /// Window length in seconds
    pub window_secs: u64,
}

impl LimitRule {
    /// Create a rule
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    /// Window length
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limiter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    /// Card validation endpoints
    pub card_validation: LimitRule,

    /// Payment endpoints
    pub payment_processing: LimitRule,

    /// General API endpoints
    pub general_api: LimitRule,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            card_validation: LimitRule::new(10, 60),
            payment_processing: LimitRule::new(5, 60),
            general_api: LimitRule::new(100, 60),
        }
    }
}

impl RateLimiterConfig {
    /// Rule for an endpoint class
    pub fn rule(&self, class: EndpointClass) -> LimitRule {
        match class {
            EndpointClass::CardValidation => self.card_validation,
            EndpointClass::PaymentProcessing => self.payment_processing,
            EndpointClass::GeneralApi => self.general_api,
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RateLimitResult {
    /// Request admitted and recorded
    Allowed {
        /// Requests left in the current window
        remaining: u32,
    },

    /// Request refused; nothing recorded
    Denied {
        /// Time until the oldest recorded request leaves the window
        retry_after: Duration,
    },
}

impl RateLimitResult {
    /// Whether the request was admitted
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Request instants of one client, one deque per endpoint class
#[derive(Debug, Default)]
struct ClientWindows {
    slots: [VecDeque<Instant>; 3],
}

impl ClientWindows {
    fn is_empty(&self) -> bool {
        self.slots.iter().all(VecDeque::is_empty)
    }
}

/// Drop instants older than `window`
fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = timestamps.front() {
        if now.saturating_duration_since(oldest) > window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

/// Per-client, per-endpoint-class sliding-window limiter
///
/// Construct one per process and share it through `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
    clients: Mutex<HashMap<String, ClientWindows>>,
}

impl RateLimiter {
    /// Create a limiter on the system clock
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create a limiter on an explicit clock
    pub fn with_clock(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Check and record one request
    pub fn check(&self, identifier: &str, class: EndpointClass) -> RateLimitResult {
        let rule = self.config.rule(class);
        let window = rule.window();
        let max_requests = rule.max_requests as usize;
        let now = self.clock.now();

        // Nothing is ever admitted, so nothing needs tracking
        if max_requests == 0 {
            warn!(
                identifier,
                class = %class,
                retry_after_ms = window.as_millis() as u64,
                "Rate limit exceeded"
            );
            return RateLimitResult::Denied { retry_after: window };
        }

        let mut clients = self.clients.lock();
        let timestamps = &mut clients
            .entry(identifier.to_string())
            .or_default()
            .slots[class.slot()];

        prune(timestamps, now, window);

        if timestamps.len() >= max_requests {
            let retry_after = match timestamps.front() {
                Some(&oldest) => window.saturating_sub(now.saturating_duration_since(oldest)),
                None => window,
            };
            warn!(
                identifier,
                class = %class,
                retry_after_ms = retry_after.as_millis() as u64,
                "Rate limit exceeded"
            );
            return RateLimitResult::Denied { retry_after };
        }

        timestamps.push_back(now);
        let remaining = (max_requests - timestamps.len()) as u32;
        debug!(identifier, class = %class, remaining, "Request admitted");

        RateLimitResult::Allowed { remaining }
    }

    /// Like [`check`](Self::check), but a denial becomes
    /// [`Error::RateLimitExceeded`]. Returns the remaining budget.
    pub fn enforce(&self, identifier: &str, class: EndpointClass) -> Result<u32> {
        match self.check(identifier, class) {
            RateLimitResult::Allowed { remaining } => Ok(remaining),
            RateLimitResult::Denied { retry_after } => {
                Err(Error::RateLimitExceeded { class, retry_after })
            }
        }
    }

    /// Requests recorded for `identifier` within the trailing `window`,
    /// summed over every endpoint class
    ///
    /// Instants are only retained for their class window, so a lookback
    /// longer than that window sees at most what the limiter still holds.
    pub fn velocity(&self, identifier: &str, window: Duration) -> usize {
        let now = self.clock.now();
        let clients = self.clients.lock();

        clients.get(identifier).map_or(0, |client| {
            client
                .slots
                .iter()
                .flatten()
                .filter(|&&ts| now.saturating_duration_since(ts) <= window)
                .count()
        })
    }

    /// Drop clients whose recorded instants have all aged out; returns how
    /// many were removed
    pub fn purge_idle(&self) -> usize {
        let now = self.clock.now();
        let mut clients = self.clients.lock();
        let before = clients.len();

        clients.retain(|_, client| {
            for class in EndpointClass::ALL {
                prune(
                    &mut client.slots[class.slot()],
                    now,
                    self.config.rule(class).window(),
                );
            }
            !client.is_empty()
        });

        let removed = before - clients.len();
        if removed > 0 {
            debug!(removed, tracked = clients.len(), "Purged idle rate limit entries");
        }
        removed
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().len()
    }
}
