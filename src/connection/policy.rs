//! Reconnect scheduling.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay used by the default fixed policy.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;

/// How long to wait before the next connection attempt.
///
/// `attempt` counts consecutive failed or dropped connections since the last
/// successful open, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Same delay every time, retried forever.
    Fixed { delay_ms: u64 },
    /// Doubles per consecutive failure, capped at `max_ms`.
    Exponential { initial_ms: u64, max_ms: u64 },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed {
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

impl ReconnectPolicy {
    /// Exponential policy starting at the default delay and capped at 30s.
    pub fn backoff() -> Self {
        Self::Exponential {
            initial_ms: DEFAULT_RECONNECT_DELAY_MS,
            max_ms: 30_000,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Self::Exponential { initial_ms, max_ms } => {
                let exponent = attempt.saturating_sub(1).min(32);
                let factor = 1u64 << exponent;
                let delay = initial_ms.saturating_mul(factor).min(max_ms);
                Duration::from_millis(delay)
            }
        }
    }
}
