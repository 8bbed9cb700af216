//! Chat application state.
//!
//! [`ChatApp`] is the one context object behind the UI. It owns the
//! conversation and every indicator, applies events from the bus, and turns
//! submitted input into frames or commands. It never touches the terminal.

pub mod commands;
pub mod conversation;
pub mod streaming;
pub mod timer;
pub mod tools;

pub use commands::{parse_command, Command, COMMANDS};
pub use conversation::{ChatMessage, Conversation, MessageRole};
pub use streaming::{ChunkOutcome, StreamSummary, StreamingMessage};
pub use timer::{ResponseTimer, TimerBand};
pub use tools::{ActiveTool, ToolTracker, ToolUse};

use crate::clipboard::ClipboardSink;
use crate::connection::{ConnectionHandle, ConnectionState};
use crate::messaging::AppEvent;
use crate::notify::Notifications;
use crate::protocol::{ClientFrame, ResultFrame, ServerFrame};
use crate::render::MarkdownRenderer;
use std::time::Duration;
use tokio::time::Instant;

/// How long a toast stays up.
pub const TOAST_DURATION: Duration = Duration::from_millis(2000);

/// Shown when a `result` carries `is_error`.
const RESULT_ERROR_MESSAGE: &str = "The assistant reported an error during execution";

/// Transient status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

/// What a confirmation dialog will do when accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    ClearConversation,
    EnableNotifications,
}

/// Modal overlay. Input goes to the modal while one is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Alert(String),
    Confirm {
        prompt: String,
        action: ConfirmAction,
    },
    Help(String),
}

/// Work the UI loop has to do after a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Input was not accepted; keep it in the input box.
    Rejected,
    /// Fetch and save the export of this conversation.
    Export(String),
    Quit,
}

pub struct ChatApp {
    connection: ConnectionHandle,
    connection_state: ConnectionState,
    conversation: Conversation,
    stream: StreamingMessage,
    tools: ToolTracker,
    timer: ResponseTimer,
    notifications: Notifications,
    clipboard: Option<Box<dyn ClipboardSink>>,
    renderer: MarkdownRenderer,
    detect_tools: bool,
    awaiting_response: bool,
    toast: Option<Toast>,
    modal: Option<Modal>,
}

impl ChatApp {
    pub fn new(connection: ConnectionHandle) -> Self {
        let connection_state = connection.state();
        Self {
            connection,
            connection_state,
            conversation: Conversation::new(),
            stream: StreamingMessage::new(),
            tools: ToolTracker::new(),
            timer: ResponseTimer::new(),
            notifications: Notifications::disabled(),
            clipboard: None,
            renderer: MarkdownRenderer::new(),
            detect_tools: false,
            awaiting_response: false,
            toast: None,
            modal: None,
        }
    }

    pub fn with_notifications(mut self, notifications: Notifications) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Option<Box<dyn ClipboardSink>>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_renderer(mut self, renderer: MarkdownRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Enable keyword based tool detection on streamed text.
    pub fn with_tool_detection(mut self, enabled: bool) -> Self {
        self.detect_tools = enabled;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn tools(&self) -> &ToolTracker {
        &self.tools
    }

    pub fn timer(&self) -> &ResponseTimer {
        &self.timer
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_streaming()
    }

    /// Waiting for the first chunk of a response.
    pub fn is_typing(&self) -> bool {
        self.timer.is_running()
    }

    /// Sending is disabled from submit until `result` or `error`.
    pub fn input_enabled(&self) -> bool {
        !self.awaiting_response && self.modal.is_none()
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.notifications.set_focused(focused);
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Handle text submitted from the input box.
    pub fn submit(&mut self, input: &str, now: Instant) -> Effect {
        let text = input.trim();
        if text.is_empty() || self.modal.is_some() {
            return Effect::Rejected;
        }

        if let Some(command) = parse_command(text) {
            return self.run_command(command, now);
        }

        if self.awaiting_response {
            self.show_toast("Waiting for the current response", now);
            return Effect::Rejected;
        }
        if !self.connection.is_connected() {
            self.show_toast("Not connected", now);
            return Effect::Rejected;
        }

        let frame = ClientFrame::new(text, self.conversation.id.clone());
        if !self.connection.send(frame) {
            self.show_toast("Not connected", now);
            return Effect::Rejected;
        }

        self.conversation.add_user_message(text);
        self.awaiting_response = true;
        self.timer.start(now);
        Effect::None
    }

    fn run_command(&mut self, command: Command, now: Instant) -> Effect {
        tracing::debug!(?command, "Command");
        match command {
            Command::Clear => {
                self.modal = Some(Modal::Confirm {
                    prompt: "Clear the whole conversation?".to_string(),
                    action: ConfirmAction::ClearConversation,
                });
            }
            Command::Export => return self.begin_export(),
            Command::Copy(block) => self.copy(block, now),
            Command::Help => self.modal = Some(Modal::Help(commands::help_text())),
            Command::Notify => self.request_notifications(),
            Command::Quit => return Effect::Quit,
            Command::Unknown(name) => {
                self.show_toast(&format!("Unknown command: /{}", name), now);
                return Effect::Rejected;
            }
            Command::Invalid(message) => {
                self.show_toast(&message, now);
                return Effect::Rejected;
            }
        }
        Effect::None
    }

    /// Start an export, or explain why there is nothing to export.
    pub fn begin_export(&mut self) -> Effect {
        match &self.conversation.id {
            Some(id) => Effect::Export(id.clone()),
            None => {
                self.modal = Some(Modal::Alert("No conversation to export".to_string()));
                Effect::None
            }
        }
    }

    /// `/notify`: confirm first unless the answer is already known.
    pub fn request_notifications(&mut self) {
        self.modal = Some(match self.notifications.needs_confirmation() {
            Some(feedback) => Modal::Alert(feedback.message().to_string()),
            None => Modal::Confirm {
                prompt: "Enable desktop notifications?".to_string(),
                action: ConfirmAction::EnableNotifications,
            },
        });
    }

    /// Answer the open modal. Alerts and help are dismissed either way.
    pub fn resolve_modal(&mut self, accepted: bool) {
        let Some(modal) = self.modal.take() else {
            return;
        };
        if let Modal::Confirm { action, .. } = modal {
            match action {
                ConfirmAction::ClearConversation if accepted => self.clear_conversation(),
                ConfirmAction::ClearConversation => {}
                ConfirmAction::EnableNotifications => {
                    let feedback = self.notifications.resolve_request(accepted);
                    self.modal = Some(Modal::Alert(feedback.message().to_string()));
                }
            }
        }
    }

    /// Reset id, messages, counters and any response in flight.
    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
        self.stream.reset();
        self.tools.clear();
        self.timer = ResponseTimer::new();
        self.awaiting_response = false;
        tracing::info!("Conversation cleared");
    }

    /// Copy the last response, or one of its code blocks (1-based).
    pub fn copy(&mut self, block: Option<usize>, now: Instant) {
        let text = match self.copy_target(block) {
            Ok(text) => text,
            Err(message) => {
                self.show_toast(&message, now);
                return;
            }
        };

        let message = match self.clipboard.as_mut() {
            None => "Clipboard unavailable".to_string(),
            Some(clipboard) => match clipboard.copy_text(&text) {
                Ok(()) => "✅ Copied!".to_string(),
                Err(e) => {
                    tracing::warn!(error = %e, "Copy failed");
                    e.to_string()
                }
            },
        };
        self.show_toast(&message, now);
    }

    fn copy_target(&self, block: Option<usize>) -> Result<String, String> {
        let message = self
            .conversation
            .last_assistant()
            .ok_or_else(|| "Nothing to copy yet".to_string())?;
        match block {
            None => Ok(message.content.clone()),
            Some(n) => n
                .checked_sub(1)
                .and_then(|i| message.code_blocks().get(i))
                .map(|b| b.code.clone())
                .ok_or_else(|| format!("No code block {}", n)),
        }
    }

    fn show_toast(&mut self, message: &str, now: Instant) {
        self.toast = Some(Toast {
            message: message.to_string(),
            expires_at: now + TOAST_DURATION,
        });
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Expire toasts and tool indicators. Returns true if a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.tools.tick(now);
        if self.toast.as_ref().is_some_and(|t| t.expires_at <= now) {
            self.toast = None;
            changed = true;
        }
        changed || self.timer.is_running()
    }

    /// Apply an event from the bus.
    pub fn handle_event(&mut self, event: AppEvent, now: Instant) {
        match event {
            AppEvent::Connection(state) => {
                tracing::debug!(?state, "Connection state");
                self.connection_state = state;
            }
            AppEvent::Frame(frame) => self.handle_frame(frame, now),
            AppEvent::ExportFinished(Ok(file)) => {
                self.modal = Some(Modal::Alert(format!(
                    "Exported to {}",
                    file.path.display()
                )));
            }
            AppEvent::ExportFinished(Err(e)) => {
                tracing::error!(error = %e, "Export failed");
                self.modal = Some(Modal::Alert(format!("Export failed: {}", e)));
            }
        }
    }

    fn handle_frame(&mut self, frame: ServerFrame, now: Instant) {
        match frame {
            ServerFrame::UserMessageSaved { conversation_id } => {
                self.conversation.set_id(conversation_id);
            }
            ServerFrame::TextChunk { content, .. } => {
                let outcome = self
                    .stream
                    .on_chunk(&mut self.conversation, &self.renderer, &content);
                if outcome == ChunkOutcome::Started {
                    tracing::debug!("First chunk received");
                    self.timer.stop(now);
                }
                if self.detect_tools {
                    self.tools.detect_tools_in_message(&content, now);
                }
            }
            ServerFrame::Thinking { content } => {
                self.stream.on_thinking(&mut self.conversation, &content);
            }
            ServerFrame::Result(result) => self.finish_response(result, now),
            ServerFrame::Error { error } => self.fail_response(error, now),
            ServerFrame::ToolUse { tool, action } => {
                self.tools.add_tool(&tool, action.as_deref());
            }
            ServerFrame::ToolResult { tool } => self.tools.remove_tool(&tool, now),
        }
    }

    fn finish_response(&mut self, result: ResultFrame, now: Instant) {
        self.timer.stop(now);
        let summary = self
            .stream
            .finalize(&mut self.conversation, &self.renderer, &result.content);
        self.conversation.record_response(result.cost);
        self.awaiting_response = false;

        tracing::info!(
            target: "performance",
            duration_ms = result.duration_ms,
            cost = result.cost,
            chunks = summary.chunks,
            num_turns = result.num_turns,
            is_error = result.is_error,
            "Response complete"
        );

        self.notifications.notify_response(&result.content);

        if result.is_error {
            self.conversation.push(ChatMessage::error(RESULT_ERROR_MESSAGE));
        }
    }

    fn fail_response(&mut self, error: String, now: Instant) {
        tracing::error!(error = %error, "Server reported an error");
        self.timer.stop(now);
        self.stream.abort(&mut self.conversation);
        self.awaiting_response = false;
        self.notifications.notify_error(&error);
        self.conversation.push(ChatMessage::error(error));
    }
}
