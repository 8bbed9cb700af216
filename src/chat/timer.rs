//! Response timer shown beside the typing indicator.

use std::time::Duration;
use tokio::time::Instant;

/// Colour band of the elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerBand {
    /// Up to 5 s.
    Fast,
    /// Over 5 s, up to 10 s.
    Slow,
    /// Over 10 s.
    VerySlow,
}

impl TimerBand {
    pub fn for_elapsed(elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        if secs > 10.0 {
            Self::VerySlow
        } else if secs > 5.0 {
            Self::Slow
        } else {
            Self::Fast
        }
    }
}

/// Time since the last message was sent.
#[derive(Debug, Default)]
pub struct ResponseTimer {
    started: Option<Instant>,
}

impl ResponseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Instant) {
        self.started = Some(now);
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started.map(|start| now.saturating_duration_since(start))
    }

    /// Stop and log the total. `None` if the timer was not running.
    pub fn stop(&mut self, now: Instant) -> Option<Duration> {
        let elapsed = self.elapsed(now)?;
        self.started = None;
        tracing::info!(
            target: "performance",
            elapsed_ms = elapsed.as_millis() as u64,
            "Response time"
        );
        Some(elapsed)
    }

    /// `"3.4s"` plus its band, while running.
    pub fn display(&self, now: Instant) -> Option<(String, TimerBand)> {
        self.elapsed(now).map(|elapsed| {
            (
                format!("{:.1}s", elapsed.as_secs_f64()),
                TimerBand::for_elapsed(elapsed),
            )
        })
    }
}
