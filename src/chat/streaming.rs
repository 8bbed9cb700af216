//! Streaming state machine for the in-flight assistant message.
//!
//! ```text
//!            first chunk                 result / error
//!   Idle ─────────────────▶ Streaming ─────────────────▶ Idle
//!                            │    ▲
//!                            └────┘ chunk: append + re-render
//! ```
//!
//! The whole buffer is re-rendered on every chunk. On `result` the server's
//! content replaces whatever was streamed.

use super::conversation::{ChatMessage, Conversation};
use crate::render::MarkdownRenderer;

#[derive(Debug, Default)]
enum StreamState {
    #[default]
    Idle,
    Streaming {
        /// Index of the on-screen message in the conversation.
        index: usize,
        buffer: String,
        chunks: usize,
    },
}

/// What a chunk did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// First chunk: a new message was created.
    Started,
    Appended,
}

/// Summary of a finished stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Message the stream ended in, if one exists.
    pub index: Option<usize>,
    pub chunks: usize,
}

/// Drives one assistant message from first chunk to finalize.
#[derive(Debug, Default)]
pub struct StreamingMessage {
    state: StreamState,
}

impl StreamingMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.state, StreamState::Streaming { .. })
    }

    /// Accumulated raw text of the in-flight message.
    #[cfg(test)]
    pub(crate) fn buffer(&self) -> Option<&str> {
        match &self.state {
            StreamState::Streaming { buffer, .. } => Some(buffer),
            StreamState::Idle => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn chunk_count(&self) -> usize {
        match &self.state {
            StreamState::Streaming { chunks, .. } => *chunks,
            StreamState::Idle => 0,
        }
    }

    /// Append a chunk, creating the message on the first one.
    pub fn on_chunk(
        &mut self,
        conversation: &mut Conversation,
        renderer: &MarkdownRenderer,
        chunk: &str,
    ) -> ChunkOutcome {
        let outcome = if self.is_streaming() {
            ChunkOutcome::Appended
        } else {
            let index = conversation.push(ChatMessage::streaming_assistant());
            self.state = StreamState::Streaming {
                index,
                buffer: String::new(),
                chunks: 0,
            };
            ChunkOutcome::Started
        };

        if let StreamState::Streaming {
            index,
            buffer,
            chunks,
        } = &mut self.state
        {
            buffer.push_str(chunk);
            *chunks += 1;
            match conversation.get_mut(*index) {
                Some(msg) => msg.set_content(buffer.clone(), renderer),
                None => tracing::warn!(index = *index, "Streaming message vanished"),
            }
        }

        outcome
    }

    /// Show reasoning beside the in-flight message. Ignored while idle.
    pub fn on_thinking(&mut self, conversation: &mut Conversation, content: &str) -> bool {
        let StreamState::Streaming { index, .. } = &self.state else {
            tracing::debug!("Thinking frame with no message in flight");
            return false;
        };
        match conversation.get_mut(*index) {
            Some(msg) => {
                msg.thinking = Some(content.to_string());
                true
            }
            None => false,
        }
    }

    /// Install the authoritative content and go idle.
    ///
    /// Without a message in flight a new finalized message is appended, unless
    /// `content` is empty.
    pub fn finalize(
        &mut self,
        conversation: &mut Conversation,
        renderer: &MarkdownRenderer,
        content: &str,
    ) -> StreamSummary {
        match std::mem::take(&mut self.state) {
            StreamState::Streaming { index, chunks, .. } => {
                let index = match conversation.get_mut(index) {
                    Some(msg) => {
                        msg.finalize(content.to_string(), renderer);
                        Some(index)
                    }
                    None => None,
                };
                StreamSummary { index, chunks }
            }
            StreamState::Idle => {
                let index = if content.is_empty() {
                    None
                } else {
                    Some(conversation.push(ChatMessage::assistant(content, renderer)))
                };
                StreamSummary { index, chunks: 0 }
            }
        }
    }

    /// Stop streaming without new content. The partial message stays visible.
    pub fn abort(&mut self, conversation: &mut Conversation) -> StreamSummary {
        match std::mem::take(&mut self.state) {
            StreamState::Streaming { index, chunks, .. } => {
                if let Some(msg) = conversation.get_mut(index) {
                    msg.streaming = false;
                    msg.thinking = None;
                }
                StreamSummary {
                    index: Some(index),
                    chunks,
                }
            }
            StreamState::Idle => StreamSummary {
                index: None,
                chunks: 0,
            },
        }
    }

    /// Forget any in-flight message (conversation cleared).
    pub fn reset(&mut self) {
        self.state = StreamState::Idle;
    }
}
