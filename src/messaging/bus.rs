//! Event bus feeding the UI loop.
//!
//! Unbounded on purpose: text chunks must never be dropped because the UI was
//! busy drawing a frame.

use super::AppEvent;
use crate::connection::ConnectionState;
use crate::export::{ExportError, ExportedFile};
use crate::protocol::ServerFrame;
use tokio::sync::mpsc;

/// Sender half of the event bus.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventSender {
    /// Send an event.
    pub fn send(&self, event: AppEvent) -> Result<(), BusError> {
        self.tx.send(event).map_err(|_| BusError::Closed)?;
        Ok(())
    }

    /// Publish a connection state change.
    pub fn connection(&self, state: ConnectionState) {
        let _ = self.send(AppEvent::Connection(state));
    }

    /// Publish an inbound frame.
    pub fn frame(&self, frame: ServerFrame) {
        let _ = self.send(AppEvent::Frame(frame));
    }

    /// Publish the outcome of an export.
    pub fn export_finished(&self, result: Result<ExportedFile, ExportError>) {
        let _ = self.send(AppEvent::ExportFinished(result));
    }
}

/// Receiver half of the event bus.
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventReceiver {
    /// Receive the next event.
    pub async fn recv(&mut self) -> Result<AppEvent, BusError> {
        self.rx.recv().await.ok_or(BusError::Closed)
    }

    /// Try to receive an event without waiting.
    pub fn try_recv(&mut self) -> Result<Option<AppEvent>, BusError> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(BusError::Closed),
        }
    }
}

/// Single-consumer event bus.
pub struct EventBus {
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Get a sender.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Give up the bus's own sender and keep only the receiving end.
    ///
    /// The receiver reports [`BusError::Closed`] once every sender handed out
    /// by [`sender`](Self::sender) has been dropped.
    pub fn into_receiver(self) -> EventReceiver {
        EventReceiver { rx: self.rx }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Bus errors.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Channel closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // EventBus Tests
    // =========================================================================

    #[test]
    fn test_event_bus_default() {
        let bus = EventBus::default();
        let _sender = bus.sender();
        let _receiver = bus.into_receiver();
    }

    #[test]
    fn test_sender_is_clone() {
        let bus = EventBus::new();
        let sender1 = bus.sender();
        let sender2 = sender1.clone();
        let mut receiver = bus.into_receiver();

        sender1.connection(ConnectionState::Connected);
        sender2.connection(ConnectionState::Disconnected);

        assert!(receiver.try_recv().unwrap().is_some());
        assert!(receiver.try_recv().unwrap().is_some());
    }

    // =========================================================================
    // EventSender Tests
    // =========================================================================

    #[test]
    fn test_sender_frame() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let mut receiver = bus.into_receiver();

        sender.frame(ServerFrame::Thinking {
            content: "hmm".to_string(),
        });

        match receiver.try_recv().unwrap().unwrap() {
            AppEvent::Frame(ServerFrame::Thinking { content }) => assert_eq!(content, "hmm"),
            other => panic!("Expected Thinking frame, got {:?}", other),
        }
    }

    #[test]
    fn test_sender_export_finished() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let mut receiver = bus.into_receiver();

        sender.export_finished(Err(ExportError::InvalidResponse));

        let event = receiver.try_recv().unwrap().unwrap();
        assert_eq!(event.label(), "export_finished");
        assert!(matches!(
            event,
            AppEvent::ExportFinished(Err(ExportError::InvalidResponse))
        ));
    }

    #[test]
    fn test_send_after_receiver_dropped_is_error() {
        let bus = EventBus::new();
        let sender = bus.sender();
        drop(bus.into_receiver());

        let result = sender.send(AppEvent::Connection(ConnectionState::Connected));
        assert!(matches!(result, Err(BusError::Closed)));

        // Helpers swallow the error.
        sender.connection(ConnectionState::Connected);
    }

    // =========================================================================
    // EventReceiver Tests
    // =========================================================================

    #[test]
    fn test_receiver_try_recv_empty() {
        let bus = EventBus::new();
        let _sender = bus.sender();
        let mut receiver = bus.into_receiver();

        assert!(receiver.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_receiver_closed_when_all_senders_dropped() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let mut receiver = bus.into_receiver();

        sender.connection(ConnectionState::Connected);
        drop(sender);

        assert!(receiver.recv().await.is_ok());
        assert!(matches!(receiver.recv().await, Err(BusError::Closed)));
        assert!(matches!(receiver.try_recv(), Err(BusError::Closed)));
    }

    #[tokio::test]
    async fn test_events_keep_order_across_tasks() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let mut receiver = bus.into_receiver();

        let handle = tokio::spawn(async move {
            for chunk in ["a", "b", "c"] {
                sender.frame(ServerFrame::TextChunk {
                    content: chunk.to_string(),
                    full_content: None,
                });
            }
        });
        handle.await.unwrap();

        let mut seen = String::new();
        for _ in 0..3 {
            if let AppEvent::Frame(ServerFrame::TextChunk { content, .. }) =
                receiver.recv().await.unwrap()
            {
                seen.push_str(&content);
            }
        }
        assert_eq!(seen, "abc");
    }

    #[test]
    fn test_bus_error_display() {
        assert_eq!(BusError::Closed.to_string(), "Channel closed");
    }
}
