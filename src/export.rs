//! Conversation export.
//!
//! The backend renders a conversation as markdown; we fetch it and write it
//! into the export directory.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name used when the server's suggestion is unusable.
const FALLBACK_FILENAME: &str = "conversation.md";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Export failures. All of them end up in a modal alert.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(StatusCode),

    #[error("{0}")]
    Server(String),

    #[error("Unexpected export response")]
    InvalidResponse,

    #[error("Failed to save export: {0}")]
    Io(#[from] std::io::Error),
}

/// Successful export body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportPayload {
    pub markdown: String,
    pub filename: String,
}

/// Where an export ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub filename: String,
}

/// HTTP client for the export endpoint.
#[derive(Clone)]
pub struct ExportClient {
    http: reqwest::Client,
    base_url: String,
    export_dir: PathBuf,
}

impl ExportClient {
    pub fn new(base_url: impl Into<String>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            export_dir: export_dir.into(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn export_url(&self, conversation_id: &str) -> String {
        format!(
            "{}/conversations/{}/export",
            self.base_url.trim_end_matches('/'),
            conversation_id
        )
    }

    /// Fetch the rendered conversation.
    pub async fn fetch(&self, conversation_id: &str) -> Result<ExportPayload, ExportError> {
        let url = self.export_url(conversation_id);
        tracing::debug!(%url, "Requesting export");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(ExportError::Status(status)),
            Err(e) => return Err(e.into()),
        };

        parse_export_body(status, body)
    }

    /// Fetch and save. Returns the written file.
    pub async fn export(&self, conversation_id: &str) -> Result<ExportedFile, ExportError> {
        let payload = self.fetch(conversation_id).await?;
        let exported = save_export(&self.export_dir, &payload).await?;
        tracing::info!(path = %exported.path.display(), "Conversation exported");
        Ok(exported)
    }
}

/// Interpret an export response body.
///
/// Besides the plain `{markdown, filename}` / `{error}` objects, the backend
/// answers unknown ids with a `[{"error": ...}, 404]` pair.
pub fn parse_export_body(status: StatusCode, body: Value) -> Result<ExportPayload, ExportError> {
    let object = match body {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        other => other,
    };

    if let Some(message) = object.get("error").and_then(Value::as_str) {
        return Err(ExportError::Server(message.to_string()));
    }
    if !status.is_success() {
        return Err(ExportError::Status(status));
    }

    serde_json::from_value(object).map_err(|_| ExportError::InvalidResponse)
}

/// Reduce a server-suggested name to a plain file name inside the export dir.
pub fn sanitize_filename(suggested: &str) -> String {
    Path::new(suggested.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Write an export payload into `dir`, creating it if needed.
pub async fn save_export(dir: &Path, payload: &ExportPayload) -> Result<ExportedFile, ExportError> {
    tokio::fs::create_dir_all(dir).await?;
    let filename = sanitize_filename(&payload.filename);
    let path = dir.join(&filename);
    tokio::fs::write(&path, payload.markdown.as_bytes()).await?;
    Ok(ExportedFile { path, filename })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    // =========================================================================
    // Response Parsing
    // =========================================================================

    #[test]
    fn test_parse_success_body() {
        let payload = parse_export_body(
            StatusCode::OK,
            json!({"markdown": "# Chat", "filename": "conversa_1234abcd.md"}),
        )
        .unwrap();
        assert_eq!(payload.markdown, "# Chat");
        assert_eq!(payload.filename, "conversa_1234abcd.md");
    }

    #[test]
    fn test_parse_error_object() {
        let err = parse_export_body(StatusCode::OK, json!({"error": "Conversation not found"}))
            .unwrap_err();
        assert!(matches!(err, ExportError::Server(ref m) if m == "Conversation not found"));
        assert_eq!(err.to_string(), "Conversation not found");
    }

    #[test]
    fn test_parse_error_pair() {
        let err = parse_export_body(
            StatusCode::OK,
            json!([{"error": "Conversation not found"}, 404]),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::Server(_)));
    }

    #[test]
    fn test_parse_http_failure_without_error_field() {
        let err = parse_export_body(StatusCode::BAD_GATEWAY, json!({"detail": "x"})).unwrap_err();
        assert!(matches!(err, ExportError::Status(StatusCode::BAD_GATEWAY)));
    }

    #[test]
    fn test_parse_missing_fields() {
        let err = parse_export_body(StatusCode::OK, json!({"markdown": "only"})).unwrap_err();
        assert!(matches!(err, ExportError::InvalidResponse));
    }

    // =========================================================================
    // URL + File Handling
    // =========================================================================

    #[test]
    fn test_export_url_trims_trailing_slash() {
        let client = ExportClient::new("http://localhost:8000/", "/tmp");
        assert_eq!(
            client.export_url("abc"),
            "http://localhost:8000/conversations/abc/export"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("chat.md"), "chat.md");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("/abs/path/x.md"), "x.md");
        assert_eq!(sanitize_filename(""), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename(".."), FALLBACK_FILENAME);
    }

    #[tokio::test]
    async fn test_save_export_creates_dir_and_writes() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("exports");
        let payload = ExportPayload {
            markdown: "# Hello\n".to_string(),
            filename: "../chat.md".to_string(),
        };

        let exported = save_export(&dir, &payload).await.unwrap();

        assert_eq!(exported.filename, "chat.md");
        assert_eq!(exported.path, dir.join("chat.md"));
        assert_eq!(std::fs::read_to_string(&exported.path).unwrap(), "# Hello\n");
    }
}
