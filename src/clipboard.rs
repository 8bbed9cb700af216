//! System clipboard access.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Copy failed: {0}")]
    Write(String),
}

/// Something text can be copied into.
pub trait ClipboardSink {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// arboard backed clipboard.
pub struct ArboardClipboard {
    inner: arboard::Clipboard,
}

impl ArboardClipboard {
    /// Connect to the system clipboard. Fails on headless sessions.
    pub fn new() -> Result<Self, ClipboardError> {
        let inner =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl ClipboardSink for ArboardClipboard {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// Open the system clipboard if there is one.
pub fn system_clipboard() -> Option<Box<dyn ClipboardSink>> {
    match ArboardClipboard::new() {
        Ok(clipboard) => Some(Box::new(clipboard)),
        Err(e) => {
            tracing::info!(error = %e, "Copy commands disabled");
            None
        }
    }
}
