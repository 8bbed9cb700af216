//! Conversation state
//!
//! Messages in display order plus the counters shown in the header.

use crate::render::{CodeBlock, MarkdownRenderer, RenderedMarkdown};
use chrono::{DateTime, Local};
use ratatui::text::Line;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
    Error,
}

impl MessageRole {
    /// Header label shown above the message.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "👤 You",
            Self::Assistant => "🤖 Assistant",
            Self::Error => "❌ Error",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    /// Raw text. Markdown for assistant messages.
    pub content: String,
    pub rendered: RenderedMarkdown,
    pub timestamp: DateTime<Local>,
    /// Reasoning aside, only while the message streams.
    pub thinking: Option<String>,
    pub streaming: bool,
    /// Set once the authoritative content arrived; copy targets only exist then.
    pub finalized: bool,
}

impl ChatMessage {
    fn new(role: MessageRole, content: String, rendered: RenderedMarkdown) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            rendered,
            timestamp: Local::now(),
            thinking: None,
            streaming: false,
            finalized: false,
        }
    }

    /// User text is shown verbatim, never as markdown.
    pub fn user(content: impl Into<String>) -> Self {
        let content = content.into();
        let rendered = plain(&content);
        let mut msg = Self::new(MessageRole::User, content, rendered);
        msg.finalized = true;
        msg
    }

    /// Empty assistant message that is about to receive chunks.
    pub fn streaming_assistant() -> Self {
        let mut msg = Self::new(MessageRole::Assistant, String::new(), RenderedMarkdown::default());
        msg.streaming = true;
        msg
    }

    /// Complete assistant message.
    pub fn assistant(content: impl Into<String>, renderer: &MarkdownRenderer) -> Self {
        let mut msg = Self::new(MessageRole::Assistant, String::new(), RenderedMarkdown::default());
        msg.finalize(content.into(), renderer);
        msg
    }

    pub fn error(message: impl Into<String>) -> Self {
        let content = message.into();
        let rendered = plain(&content);
        let mut msg = Self::new(MessageRole::Error, content, rendered);
        msg.finalized = true;
        msg
    }

    /// Replace the content and re-render it.
    pub fn set_content(&mut self, content: String, renderer: &MarkdownRenderer) {
        self.rendered = renderer.render(&content);
        self.content = content;
    }

    /// Install authoritative content and end streaming.
    pub fn finalize(&mut self, content: String, renderer: &MarkdownRenderer) {
        self.set_content(content, renderer);
        self.thinking = None;
        self.streaming = false;
        self.finalized = true;
    }

    pub fn code_blocks(&self) -> &[CodeBlock] {
        &self.rendered.code_blocks
    }

    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

fn plain(content: &str) -> RenderedMarkdown {
    RenderedMarkdown {
        lines: content.lines().map(|l| Line::raw(l.to_string())).collect(),
        code_blocks: Vec::new(),
    }
}

/// A conversation (list of messages)
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// Assigned by the backend once the first message is saved.
    pub id: Option<String>,
    pub messages: Vec<ChatMessage>,
    /// User messages sent plus assistant responses completed.
    pub message_count: usize,
    pub total_cost: f64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, returning its index.
    pub fn push(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) -> usize {
        self.message_count += 1;
        self.push(ChatMessage::user(content))
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ChatMessage> {
        self.messages.get_mut(index)
    }

    /// Count a completed response and add its cost.
    pub fn record_response(&mut self, cost: Option<f64>) {
        self.message_count += 1;
        if let Some(cost) = cost {
            self.total_cost += cost;
        }
    }

    /// Bind the conversation id; a changed id replaces the old one.
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        if self.id.as_deref() != Some(id.as_str()) {
            tracing::debug!(conversation_id = %id, "Conversation bound");
            self.id = Some(id);
        }
    }

    /// Last finalized assistant message, the target of copy actions.
    pub fn last_assistant(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant && m.finalized)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
