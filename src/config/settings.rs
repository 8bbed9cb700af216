//! Client settings from a TOML file, overridden by the command line.

use super::XdgDirs;
use crate::connection::{ReconnectPolicy, DEFAULT_WS_URL};
use crate::render::DEFAULT_THEME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default base URL of the HTTP API.
pub const DEFAULT_HTTP_BASE: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Everything the client needs to start.
///
/// Every field has a default, so a config file only lists what it changes:
///
/// ```toml
/// ws_url = "ws://chat.internal:8000/ws/chat"
/// detect_tools = true
///
/// [reconnect]
/// strategy = "exponential"
/// initial_ms = 1000
/// max_ms = 30000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub ws_url: String,
    pub http_base: String,
    pub reconnect: ReconnectPolicy,
    /// Defaults to the XDG data directory.
    pub export_dir: Option<PathBuf>,
    /// Guess tool activity from streamed text.
    pub detect_tools: bool,
    /// syntect theme for code blocks.
    pub theme: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            http_base: DEFAULT_HTTP_BASE.to_string(),
            reconnect: ReconnectPolicy::default(),
            export_dir: None,
            detect_tools: false,
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

/// Command-line values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ws_url: Option<String>,
    pub http_base: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub detect_tools: bool,
    /// Switch to exponential reconnect backoff.
    pub backoff: bool,
}

impl ClientConfig {
    /// Load from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Load from `path`, or defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.ws_url {
            self.ws_url = url;
        }
        if let Some(base) = overrides.http_base {
            self.http_base = base;
        }
        if let Some(dir) = overrides.export_dir {
            self.export_dir = Some(dir);
        }
        if overrides.detect_tools {
            self.detect_tools = true;
        }
        if overrides.backoff {
            self.reconnect = ReconnectPolicy::backoff();
        }
        self
    }

    /// Export directory, falling back to the XDG data directory.
    pub fn resolved_export_dir(&self, dirs: &XdgDirs) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| dirs.export_dir())
    }
}
