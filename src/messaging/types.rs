//! Events delivered to the UI loop.

use crate::connection::ConnectionState;
use crate::export::{ExportError, ExportedFile};
use crate::protocol::ServerFrame;

/// Anything a background task wants the UI to know about.
#[derive(Debug)]
pub enum AppEvent {
    /// The socket opened or closed.
    Connection(ConnectionState),
    /// A parsed frame from the backend.
    Frame(ServerFrame),
    /// A conversation export finished.
    ExportFinished(Result<ExportedFile, ExportError>),
}

impl AppEvent {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Frame(frame) => frame.kind(),
            Self::ExportFinished(_) => "export_finished",
        }
    }
}
