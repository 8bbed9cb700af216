//! Desktop notifications.
//!
//! Notifications are opt-in: nothing is shown until the user enables them
//! with `/notify`, and even then only while the terminal is unfocused.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Auto-close delay for desktop notifications.
pub const NOTIFICATION_TIMEOUT_MS: u32 = 5000;

const MAX_BODY_CHARS: usize = 100;
const RESPONSE_PREVIEW_CHARS: usize = 80;
const PERMISSION_FILE: &str = "notifications.json";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification service unavailable: {0}")]
    Desktop(String),

    #[error("Failed to persist notification permission: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid permission file: {0}")]
    Json(#[from] serde_json::Error),
}

/// User's notification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Never asked.
    #[default]
    Default,
    Granted,
    Denied,
}

/// Platform notification sink.
pub trait Notifier: Send + Sync {
    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// notify-rust backed notifier.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut notification = notify_rust::Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(body)
            .timeout(notify_rust::Timeout::Milliseconds(NOTIFICATION_TIMEOUT_MS));

        // The D-Bus round trip blocks; keep it off the UI loop.
        std::thread::spawn(move || {
            if let Err(e) = notification.show() {
                tracing::warn!(error = %e, "Desktop notification failed");
            }
        });
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PermissionFile {
    permission: Permission,
}

/// Permission persisted as JSON in the state directory.
#[derive(Debug, Clone)]
pub struct PermissionStore {
    path: PathBuf,
}

impl PermissionStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(PERMISSION_FILE),
        }
    }

    /// Stored permission; `Default` when missing or unreadable.
    pub fn load(&self) -> Permission {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Permission::Default,
        };
        match serde_json::from_str::<PermissionFile>(&content) {
            Ok(file) => file.permission,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring invalid permission file");
                Permission::Default
            }
        }
    }

    pub fn save(&self, permission: Permission) -> Result<(), NotifyError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&PermissionFile { permission })?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Outcome of an explicit permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionFeedback {
    AlreadyEnabled,
    Enabled,
    Denied,
    Unsupported,
}

impl PermissionFeedback {
    pub fn message(&self) -> &'static str {
        match self {
            Self::AlreadyEnabled => "✅ Notifications are already enabled!",
            Self::Enabled => "✅ Notifications enabled!",
            Self::Denied => "❌ Permission denied. You will not receive notifications.",
            Self::Unsupported => "Desktop notifications are not available.",
        }
    }
}

/// Permission + focus gate in front of a [`Notifier`].
pub struct Notifications {
    notifier: Option<Box<dyn Notifier>>,
    permission: Permission,
    focused: bool,
    store: Option<PermissionStore>,
}

impl Notifications {
    pub fn new(notifier: Option<Box<dyn Notifier>>, store: Option<PermissionStore>) -> Self {
        let permission = store.as_ref().map(PermissionStore::load).unwrap_or_default();
        if permission == Permission::Granted {
            tracing::debug!("Desktop notifications enabled");
        }
        Self {
            notifier,
            permission,
            focused: true,
            store,
        }
    }

    /// No notifier and no persistence.
    pub fn disabled() -> Self {
        Self::new(None, None)
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn is_supported(&self) -> bool {
        self.notifier.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some() && self.permission == Permission::Granted
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Show a notification if enabled and the terminal is unfocused.
    /// Returns whether one was sent.
    pub fn notify(&self, title: &str, body: &str) -> bool {
        if !self.is_enabled() || self.focused {
            return false;
        }
        let Some(notifier) = &self.notifier else {
            return false;
        };

        let body = truncate_chars(body, MAX_BODY_CHARS);
        match notifier.show(title, &body) {
            Ok(()) => {
                tracing::info!(title, "Notification sent");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Notification failed");
                false
            }
        }
    }

    pub fn notify_response(&self, content: &str) -> bool {
        let preview: String = content.chars().take(RESPONSE_PREVIEW_CHARS).collect();
        self.notify("🤖 Assistant replied", &preview)
    }

    pub fn notify_error(&self, message: &str) -> bool {
        self.notify("❌ Chat error", message)
    }

    /// Whether `/notify` needs a confirmation step.
    pub fn needs_confirmation(&self) -> Option<PermissionFeedback> {
        if !self.is_supported() {
            Some(PermissionFeedback::Unsupported)
        } else if self.permission == Permission::Granted {
            Some(PermissionFeedback::AlreadyEnabled)
        } else {
            None
        }
    }

    /// Record the user's answer to the confirmation.
    pub fn resolve_request(&mut self, accepted: bool) -> PermissionFeedback {
        if let Some(feedback) = self.needs_confirmation() {
            return feedback;
        }

        self.permission = if accepted {
            Permission::Granted
        } else {
            Permission::Denied
        };
        if let Some(store) = &self.store {
            if let Err(e) = store.save(self.permission) {
                tracing::warn!(error = %e, "Could not persist notification permission");
            }
        }

        if accepted {
            self.notify(
                "🎉 Notifications enabled",
                "You will be notified when the assistant replies",
            );
            PermissionFeedback::Enabled
        } else {
            PermissionFeedback::Denied
        }
    }
}

/// Truncate to `max` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}
