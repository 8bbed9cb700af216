//! Spinner frames for the typing indicator and tool panel.
//!
//! Frames are picked from elapsed time, so the spinner needs no task of its
//! own; the UI loop redraws on every tick.

use std::time::Duration;

/// Braille dots, the default.
pub const DOTS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Animation frames and their pace.
#[derive(Debug, Clone)]
pub struct Spinner {
    frames: &'static [&'static str],
    interval: Duration,
}

impl Spinner {
    pub fn new(frames: &'static [&'static str], interval: Duration) -> Self {
        Self { frames, interval }
    }

    /// Frame to show `elapsed` after the animation started.
    pub fn frame_at(&self, elapsed: Duration) -> &'static str {
        if self.frames.is_empty() {
            return "";
        }
        let step = self.interval.as_millis().max(1);
        let index = (elapsed.as_millis() / step) as usize % self.frames.len();
        self.frames[index]
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new(DOTS, Duration::from_millis(80))
    }
}
