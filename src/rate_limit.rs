use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Reset requests allowed per email within [`RESET_REQUEST_WINDOW_SECS`].
pub const RESET_REQUEST_LIMIT: u32 = 5;
pub const RESET_REQUEST_WINDOW_SECS: u64 = 15 * 60;

/// Failed OTP attempts tolerated per email within [`OTP_FAILURE_WINDOW_SECS`].
pub const OTP_FAILURE_LIMIT: u32 = 5;
pub const OTP_FAILURE_WINDOW_SECS: u64 = 15 * 60;

/// Failed logins tolerated per email within [`LOGIN_FAILURE_WINDOW_SECS`].
pub const LOGIN_FAILURE_LIMIT: u32 = 5;
pub const LOGIN_FAILURE_WINDOW_SECS: u64 = 15 * 60;

/// Per-email throttle on "forgot password" requests using a fixed window.
pub struct ResetRequestLimiter {
    /// email -> (count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    limit: u32,
    window: Duration,
}

impl ResetRequestLimiter {
    pub fn new() -> Self {
        Self::with_limit(RESET_REQUEST_LIMIT, RESET_REQUEST_WINDOW_SECS)
    }

    pub fn with_limit(limit: u32, window_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Count a request. Returns Ok(()) or Err with retry-after seconds.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let now = Instant::now();

        let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= self.limit {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed));
        }

        *count += 1;
        Ok(())
    }

    /// Remove stale entries older than the given duration.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

impl Default for ResetRequestLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-email lockout after repeated failures (wrong OTPs, wrong passwords).
///
/// Every attempt reserves a slot up front; callers refund it with
/// [`FailureLimiter::release`] unless the attempt failed. Reserving and
/// checking happen under one map entry lock, so concurrent guesses cannot
/// all slip past a limit that only one of them should have seen.
pub struct FailureLimiter {
    /// email -> (reserved_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    limit: u32,
    window: Duration,
}

impl FailureLimiter {
    pub fn otp() -> Self {
        Self::with_limit(OTP_FAILURE_LIMIT, OTP_FAILURE_WINDOW_SECS)
    }

    pub fn login() -> Self {
        Self::with_limit(LOGIN_FAILURE_LIMIT, LOGIN_FAILURE_WINDOW_SECS)
    }

    pub fn with_limit(limit: u32, window_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Reserve an attempt. Returns Ok(()) or Err with retry-after seconds.
    pub fn try_acquire(&self, email: &str) -> Result<(), u64> {
        let now = Instant::now();

        let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 0;
            *start = now;
        }

        if *count >= self.limit {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed));
        }

        *count += 1;
        Ok(())
    }

    /// Give back a slot taken by [`FailureLimiter::try_acquire`] for an
    /// attempt that did not fail.
    pub fn release(&self, email: &str) {
        if let Some(mut entry) = self.entries.get_mut(&email.to_lowercase()) {
            let (count, _) = entry.value_mut();
            *count = count.saturating_sub(1);
        }
    }

    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}
