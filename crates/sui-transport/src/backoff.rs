//! Reconnect policy for the subscription socket.

use std::time::Duration;

use sui_steps_types::env_utils::env_var_or;

/// Exponential backoff: attempt `n` (0-based) waits `base * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first attempt.
    pub base: Duration,
    /// Attempts made before giving up.
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    const DEFAULT_BASE_MS: u64 = 1000;
    const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self { base, max_attempts }
    }

    /// Policy from `SUI_STEPS_RECONNECT_BASE_MS` / `SUI_STEPS_RECONNECT_MAX_ATTEMPTS`.
    pub fn from_env() -> Self {
        Self {
            base: Duration::from_millis(env_var_or(
                "SUI_STEPS_RECONNECT_BASE_MS",
                Self::DEFAULT_BASE_MS,
            )),
            max_attempts: env_var_or(
                "SUI_STEPS_RECONNECT_MAX_ATTEMPTS",
                Self::DEFAULT_MAX_ATTEMPTS,
            ),
        }
    }

    /// Delay before attempt `attempt`, or `None` once attempts are exhausted.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        Some(self.base.saturating_mul(factor))
    }

    /// All delays in attempt order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).filter_map(|a| self.delay(a))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(Self::DEFAULT_BASE_MS),
            Self::DEFAULT_MAX_ATTEMPTS,
        )
    }
}
