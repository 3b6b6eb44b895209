//! Minimum-interval pacing for sources with usage policies.
//!
//! [`RateLimiter::await_slot`] blocks the calling thread until the configured
//! interval has elapsed since the previous slot was granted. The first slot
//! is granted immediately. State is a single timestamp owned by the limiter,
//! so a fresh limiter per run carries nothing over between runs.

use std::rc::Rc;
use std::time::{Duration, Instant};

/// Default spacing between calls: one request per second plus a margin.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1100);

/// Source of time for the limiter.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant::now`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Enforces a minimum interval between granted slots.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use geoharvest_data::rate_limit::RateLimiter;
///
/// let mut limiter = RateLimiter::new(Duration::from_millis(5));
/// assert_eq!(limiter.await_slot(), Duration::ZERO);
/// limiter.await_slot();
/// ```
#[derive(Debug)]
pub struct RateLimiter<C = SystemClock> {
    min_interval: Duration,
    last_granted: Option<Instant>,
    clock: C,
}

impl RateLimiter {
    /// Limiter on the system clock.
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self::with_clock(min_interval, SystemClock)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Limiter on an explicit clock.
    #[must_use]
    pub const fn with_clock(min_interval: Duration, clock: C) -> Self {
        Self {
            min_interval,
            last_granted: None,
            clock,
        }
    }

    /// Configured interval.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until a slot is available, then claim it.
    ///
    /// Returns how long the call waited.
    pub fn await_slot(&mut self) -> Duration {
        let waited = match self.last_granted {
            Some(previous) => {
                let elapsed = self.clock.now().saturating_duration_since(previous);
                let remaining = self.min_interval.saturating_sub(elapsed);
                if !remaining.is_zero() {
                    log::debug!("rate limiter waiting {remaining:?}");
                    self.clock.sleep(remaining);
                }
                remaining
            }
            None => Duration::ZERO,
        };
        self.last_granted = Some(self.clock.now());
        waited
    }
}
