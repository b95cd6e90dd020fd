//! Rate limiting for WebSocket frames.
//!
//! Every connection carries a [`MessageLimits`]: a burst window and a
//! sustained window, both of which must admit a frame before it is handled.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Rate limiter using a sliding window algorithm
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recent requests
    timestamps: VecDeque<Instant>,
    /// Maximum number of requests allowed in the window
    max_requests: usize,
    /// Time window for rate limiting
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    ///
    /// ```
    /// use truco_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// // Allow 10 requests per second
    /// let limiter = RateLimiter::new(10, Duration::from_secs(1));
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Burst protection: 10 frames per second
    pub fn burst() -> Self {
        Self::new(10, Duration::from_secs(1))
    }

    /// Sustained usage: 100 frames per minute
    pub fn sustained() -> Self {
        Self::new(100, Duration::from_secs(60))
    }

    /// Check if a request should be allowed
    ///
    /// # Example
    ///
    /// ```
    /// # use truco_server::api::rate_limiter::RateLimiter;
    /// # use std::time::Duration;
    /// let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
    /// for _ in 0..5 {
    ///     assert!(limiter.check());
    /// }
    /// assert!(!limiter.check());
    /// ```
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    /// [`check`](Self::check) against an explicit clock reading.
    pub fn check_at(&mut self, now: Instant) -> bool {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        self.timestamps.push_back(now);
        true
    }

    /// Time until the oldest request leaves the window, measured from `now`.
    pub fn reset_in(&self, now: Instant) -> Option<Duration> {
        self.timestamps.front().map(|oldest| {
            let elapsed = now.duration_since(*oldest);
            self.window.saturating_sub(elapsed)
        })
    }
}

/// Which window refused a frame, and when to try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limited {
    pub window: &'static str,
    pub retry_in: Duration,
}

/// Burst and sustained limits for one connection.
#[derive(Debug)]
pub struct MessageLimits {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self::new(RateLimiter::burst(), RateLimiter::sustained())
    }
}

impl MessageLimits {
    pub fn new(burst: RateLimiter, sustained: RateLimiter) -> Self {
        Self { burst, sustained }
    }

    /// Admit a frame arriving now.
    ///
    /// # Errors
    ///
    /// Names the window that is exhausted.
    pub fn admit(&mut self) -> Result<(), Limited> {
        self.admit_at(Instant::now())
    }

    pub fn admit_at(&mut self, now: Instant) -> Result<(), Limited> {
        if !self.burst.check_at(now) {
            return Err(Limited {
                window: "burst",
                retry_in: self.burst.reset_in(now).unwrap_or_default(),
            });
        }
        // A frame the sustained window refuses still counts toward burst.
        if !self.sustained.check_at(now) {
            return Err(Limited {
                window: "sustained",
                retry_in: self.sustained.reset_in(now).unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_allows_within_limit() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
        for _ in 0..5 {
            assert!(limiter.check(), "Should allow requests within limit");
        }
    }

    #[test]
    fn test_rate_limiter_blocks_over_limit() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(1));
        for _ in 0..3 {
            assert!(limiter.check());
        }
        assert!(!limiter.check(), "Should block request over limit");
    }

    #[test]
    fn test_rate_limiter_window_expiry() {
        let start = Instant::now();
        let mut limiter = RateLimiter::new(2, Duration::from_millis(100));

        assert!(limiter.check_at(start));
        assert!(limiter.check_at(start));
        assert!(!limiter.check_at(start + Duration::from_millis(50)));

        assert!(
            limiter.check_at(start + Duration::from_millis(150)),
            "Should allow after window expires"
        );
    }

    #[test]
    fn test_reset_in() {
        let start = Instant::now();
        let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
        assert!(limiter.reset_in(start).is_none());

        limiter.check_at(start);
        assert_eq!(
            limiter.reset_in(start + Duration::from_millis(400)),
            Some(Duration::from_millis(600))
        );
    }

    #[test]
    fn test_burst_limiter() {
        let mut limiter = RateLimiter::burst();
        for _ in 0..10 {
            assert!(limiter.check());
        }
        assert!(!limiter.check(), "Burst limiter should block 11th request");
    }

    #[test]
    fn test_message_limits_name_the_exhausted_window() {
        let start = Instant::now();
        let mut limits = MessageLimits::default();

        for _ in 0..10 {
            limits.admit_at(start).unwrap();
        }
        let limited = limits.admit_at(start).unwrap_err();
        assert_eq!(limited.window, "burst");
        assert!(limited.retry_in <= Duration::from_secs(1));

        // Ten a second for ten seconds exhausts the minute.
        let mut refused = None;
        for second in 1..=10u64 {
            for _ in 0..10 {
                if let Err(limited) = limits.admit_at(start + Duration::from_millis(second * 1001)) {
                    refused = Some(limited);
                }
            }
        }
        assert_eq!(refused.map(|l| l.window), Some("sustained"));
    }
}
