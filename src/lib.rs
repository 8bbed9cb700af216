//! streamchat library
//!
//! Terminal client for a streaming chat backend. The binary wires these
//! pieces together; they are exposed here so integration tests can drive
//! them without a terminal.
//!
//! ## Main Components
//!
//! - [`connection`] - WebSocket connection manager with reconnect policy
//! - [`protocol`] - Wire frames exchanged with the backend
//! - [`messaging`] - Event bus between background tasks and the UI loop
//! - [`chat`] - Conversation state, streaming state machine, tool tracker, timer
//! - [`render`] - Markdown and syntax highlighting for the terminal
//! - [`notify`] - Desktop notifications gated on permission and focus
//! - [`export`] - Conversation export over HTTP
//! - [`clipboard`] - System clipboard access
//! - [`ui`] - Full-screen terminal UI
//! - [`config`] - Settings and XDG directories
//!
//! ## Quick Start
//!
//! ```ignore
//! use streamchat::{connection, ChatApp, ConnectionManager, EventBus, ReconnectPolicy, WsConnector};
//!
//! let bus = EventBus::new();
//! let (handle, link) = connection::channel();
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! ConnectionManager::new(url, ReconnectPolicy::default(), WsConnector, bus.sender())
//!     .spawn(link, shutdown_rx);
//! let app = ChatApp::new(handle);
//! ```

pub mod chat;
pub mod clipboard;
pub mod config;
pub mod connection;
pub mod export;
pub mod messaging;
pub mod notify;
pub mod protocol;
pub mod render;
pub mod ui;

// Re-export commonly used types
pub use chat::{ChatApp, ChatMessage, Conversation, Effect, MessageRole, Modal};
pub use config::{ClientConfig, ConfigOverrides, XdgDirs};
pub use connection::{
    ConnectionHandle, ConnectionManager, ConnectionState, ReconnectPolicy, WsConnector,
};
pub use export::{ExportClient, ExportError};
pub use messaging::{AppEvent, EventBus, EventSender};
pub use notify::{DesktopNotifier, Notifications, PermissionStore};
pub use protocol::{parse_frame, ClientFrame, ServerFrame};
pub use render::{Highlighter, MarkdownRenderer};
