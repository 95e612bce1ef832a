//! Lock timing settings.

use std::time::Duration;

/// How long the lock lives and how acquisition waits for it.
#[derive(Debug, Clone, PartialEq)]
pub struct LockSettings {
    /// Expiry set on the key when acquired. Must be positive.
    pub ttl_seconds: u64,
    /// Give up after this many seconds; 0 waits forever.
    pub acquire_timeout_seconds: u64,
    /// Pause between two acquisition attempts.
    pub poll_interval_seconds: f64,
}

impl LockSettings {
    /// TTL in milliseconds as sent with `PX`.
    ///
    /// Saturates instead of overflowing; configuration validation rejects
    /// TTLs that would not fit.
    pub fn ttl_millis(&self) -> u64 {
        self.ttl_seconds.saturating_mul(1000)
    }

    /// `None` when acquisition is unbounded.
    pub fn acquire_timeout(&self) -> Option<Duration> {
        (self.acquire_timeout_seconds > 0).then(|| Duration::from_secs(self.acquire_timeout_seconds))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_seconds).unwrap_or_default()
    }
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 60,
            acquire_timeout_seconds: 0,
            poll_interval_seconds: 0.5,
        }
    }
}
