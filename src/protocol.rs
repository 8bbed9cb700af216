//! Wire protocol spoken with the chat backend.
//!
//! Both directions carry JSON text frames. Inbound frames are discriminated by
//! their `type` field; anything we do not recognise is skipped rather than
//! treated as fatal.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Frame types this client understands.
pub const KNOWN_FRAME_TYPES: &[&str] = &[
    "user_message_saved",
    "text_chunk",
    "thinking",
    "result",
    "error",
    "tool_use",
    "tool_result",
];

/// Outbound frame: a single user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFrame {
    pub message: String,
    /// `None` until the backend has assigned an id to the conversation.
    pub conversation_id: Option<String>,
}

impl ClientFrame {
    pub fn new(message: impl Into<String>, conversation_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id,
        }
    }

    /// Serialize to the JSON text sent over the socket.
    pub fn to_json(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(FrameError::Encode)
    }
}

/// Completion payload for one assistant turn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultFrame {
    /// Authoritative final content. Replaces whatever was streamed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_error: bool,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub num_turns: Option<u32>,
}

/// Inbound frame from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// The user's message was stored; carries the (possibly new) conversation id.
    UserMessageSaved { conversation_id: String },
    /// Incremental assistant text.
    TextChunk {
        content: String,
        #[serde(default)]
        full_content: Option<String>,
    },
    /// Reasoning text shown beside the in-flight message.
    Thinking { content: String },
    /// End of the assistant turn.
    Result(ResultFrame),
    /// Application error reported by the backend. Ends the turn.
    Error { error: String },
    /// A backend tool started.
    ToolUse {
        tool: String,
        #[serde(default)]
        action: Option<String>,
    },
    /// A backend tool finished.
    ToolResult { tool: String },
}

impl ServerFrame {
    /// The `type` discriminator of this frame.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserMessageSaved { .. } => "user_message_saved",
            Self::TextChunk { .. } => "text_chunk",
            Self::Thinking { .. } => "thinking",
            Self::Result(_) => "result",
            Self::Error { .. } => "error",
            Self::ToolUse { .. } => "tool_use",
            Self::ToolResult { .. } => "tool_result",
        }
    }
}

/// Errors raised while decoding or encoding frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Frame has no string `type` field")]
    MissingType,

    #[error("Malformed `{kind}` frame: {source}")]
    InvalidShape {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Parse one inbound text frame.
///
/// Returns `Ok(None)` for well-formed frames of an unknown type. Malformed
/// input is an error; callers log it and drop the frame.
pub fn parse_frame(text: &str) -> Result<Option<ServerFrame>, FrameError> {
    let value: Value = serde_json::from_str(text).map_err(FrameError::InvalidJson)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(FrameError::MissingType)?
        .to_string();

    if !KNOWN_FRAME_TYPES.contains(&kind.as_str()) {
        tracing::debug!(frame_type = %kind, "Ignoring frame of unknown type");
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| FrameError::InvalidShape { kind, source })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Outbound
    // =========================================================================

    #[test]
    fn test_client_frame_without_conversation_serializes_null() {
        let frame = ClientFrame::new("hello", None);
        let json: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"message": "hello", "conversation_id": null}));
    }

    #[test]
    fn test_client_frame_with_conversation() {
        let frame = ClientFrame::new("again", Some("c1".to_string()));
        let json: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(json["conversation_id"], "c1");
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    #[test]
    fn test_parse_user_message_saved() {
        let frame = parse_frame(r#"{"type":"user_message_saved","conversation_id":"c1"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            frame,
            ServerFrame::UserMessageSaved {
                conversation_id: "c1".to_string()
            }
        );
        assert_eq!(frame.kind(), "user_message_saved");
    }

    #[test]
    fn test_parse_text_chunk_with_full_content() {
        let frame = parse_frame(
            r#"{"type":"text_chunk","content":"lo","full_content":"hello"}"#,
        )
        .unwrap()
        .unwrap();
        match frame {
            ServerFrame::TextChunk {
                content,
                full_content,
            } => {
                assert_eq!(content, "lo");
                assert_eq!(full_content.as_deref(), Some("hello"));
            }
            other => panic!("Expected TextChunk, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_result_full() {
        let frame = parse_frame(
            r#"{"type":"result","content":"done","cost":0.012,"duration_ms":1500,
                "is_error":false,"thinking":null,"num_turns":2}"#,
        )
        .unwrap()
        .unwrap();
        let ServerFrame::Result(result) = frame else {
            panic!("Expected Result frame");
        };
        assert_eq!(result.content, "done");
        assert_eq!(result.cost, Some(0.012));
        assert_eq!(result.duration_ms, Some(1500));
        assert!(!result.is_error);
        assert_eq!(result.num_turns, Some(2));
    }

    #[test]
    fn test_parse_result_null_content_defaults_to_empty() {
        let frame = parse_frame(r#"{"type":"result","content":null,"is_error":null}"#)
            .unwrap()
            .unwrap();
        let ServerFrame::Result(result) = frame else {
            panic!("Expected Result frame");
        };
        assert_eq!(result.content, "");
        assert!(!result.is_error);
        assert_eq!(result.cost, None);
    }

    #[test]
    fn test_parse_error_frame() {
        let frame = parse_frame(r#"{"type":"error","error":"boom"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            frame,
            ServerFrame::Error {
                error: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_parse_tool_frames() {
        let start = parse_frame(r#"{"type":"tool_use","tool":"Read","action":"src/lib.rs"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(start.kind(), "tool_use");
        let end = parse_frame(r#"{"type":"tool_result","tool":"Read"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            end,
            ServerFrame::ToolResult {
                tool: "Read".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let parsed = parse_frame(r#"{"type":"heartbeat","n":3}"#).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = parse_frame("{not json").unwrap_err();
        assert!(matches!(err, FrameError::InvalidJson(_)));
    }

    #[test]
    fn test_missing_type_is_error() {
        let err = parse_frame(r#"{"content":"x"}"#).unwrap_err();
        assert!(matches!(err, FrameError::MissingType));
        let err = parse_frame(r#"{"type":7}"#).unwrap_err();
        assert!(matches!(err, FrameError::MissingType));
    }

    #[test]
    fn test_known_type_with_bad_fields_is_error() {
        let err = parse_frame(r#"{"type":"text_chunk","content":42}"#).unwrap_err();
        match err {
            FrameError::InvalidShape { kind, .. } => assert_eq!(kind, "text_chunk"),
            other => panic!("Expected InvalidShape, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_shape_display_names_frame_type() {
        let err = parse_frame(r#"{"type":"error"}"#).unwrap_err();
        assert!(err.to_string().contains("`error`"));
    }
}
