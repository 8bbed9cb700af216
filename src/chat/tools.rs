//! Tool activity panel state.
//!
//! Tools become active either through explicit `tool_use` / `tool_result`
//! frames or, when enabled, by keyword detection in streamed text. The panel
//! stays up for a short grace period after the last tool finishes.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::Instant;

/// Delay between the last tool finishing and the panel hiding.
pub const HIDE_GRACE: Duration = Duration::from_millis(1000);

/// Lifetime of a tool activated by keyword detection.
pub const DETECTED_TOOL_TTL: Duration = Duration::from_millis(3000);

/// Tool uses kept in the history; older entries are dropped first.
pub const MAX_TOOL_HISTORY: usize = 100;

const GENERIC_ICON: &str = "🔧";
const GENERIC_DESCRIPTION: &str = "Processing...";

/// Icon for a tool name.
pub fn tool_icon(tool: &str) -> &'static str {
    match tool {
        "Read" => "📖",
        "Write" => "✍️",
        "Edit" => "📝",
        "Bash" => "💻",
        "Grep" => "🔍",
        "Glob" => "📁",
        "WebFetch" => "🌐",
        "Task" => "🤖",
        _ => GENERIC_ICON,
    }
}

/// Default description for a tool name.
pub fn tool_description(tool: &str) -> &'static str {
    match tool {
        "Read" => "Reading file...",
        "Write" => "Writing file...",
        "Edit" => "Editing code...",
        "Bash" => "Running command...",
        "Grep" => "Searching code...",
        "Glob" => "Finding files...",
        "WebFetch" => "Fetching from the web...",
        "Task" => "Running subagent...",
        _ => GENERIC_DESCRIPTION,
    }
}

fn detection_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            ("Read", r"(?i)reading|lendo arquivo|file at"),
            ("Bash", r"(?i)running command|executando|bash"),
            ("Grep", r"(?i)searching|buscando|grep"),
            ("Write", r"(?i)creating file|criando arquivo|write"),
        ]
        .into_iter()
        .filter_map(|(tool, pattern)| Regex::new(pattern).ok().map(|re| (tool, re)))
        .collect()
    })
}

/// One active tool as shown in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTool {
    pub name: String,
    pub description: String,
}

impl ActiveTool {
    pub fn icon(&self) -> &'static str {
        tool_icon(&self.name)
    }
}

/// A recorded tool use.
#[derive(Debug, Clone)]
pub struct ToolUse {
    pub tool: String,
    pub action: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Tracks active tools and panel visibility.
#[derive(Debug, Default)]
pub struct ToolTracker {
    /// Insertion ordered.
    active: Vec<ActiveTool>,
    history: Vec<ToolUse>,
    visible: bool,
    hide_at: Option<Instant>,
    /// Detected tools and when they expire.
    pending_removals: Vec<(String, Instant)>,
}

impl ToolTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a tool active and show the panel.
    pub fn add_tool(&mut self, name: &str, action: Option<&str>) {
        let description = action
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| tool_description(name))
            .to_string();

        match self.active.iter_mut().find(|t| t.name == name) {
            Some(tool) => tool.description = description,
            None => self.active.push(ActiveTool {
                name: name.to_string(),
                description,
            }),
        }

        self.history.push(ToolUse {
            tool: name.to_string(),
            action: action.map(str::to_string),
            timestamp: Utc::now(),
        });
        if self.history.len() > MAX_TOOL_HISTORY {
            let excess = self.history.len() - MAX_TOOL_HISTORY;
            self.history.drain(..excess);
        }

        self.visible = true;
        self.hide_at = None;

        tracing::info!(tool = name, action = action.unwrap_or(""), "Tool in use");
    }

    /// Mark a tool finished. The panel hides [`HIDE_GRACE`] after the set empties.
    pub fn remove_tool(&mut self, name: &str, now: Instant) {
        self.active.retain(|t| t.name != name);
        self.pending_removals.retain(|(tool, _)| tool != name);

        if self.active.is_empty() && self.visible && self.hide_at.is_none() {
            self.hide_at = Some(now + HIDE_GRACE);
        }
    }

    /// Keyword detection over streamed text.
    ///
    /// Each matching tool is activated and scheduled for removal
    /// [`DETECTED_TOOL_TTL`] later; a repeat match pushes the removal back.
    pub fn detect_tools_in_message(&mut self, text: &str, now: Instant) -> Vec<&'static str> {
        let mut detected = Vec::new();
        for (tool, pattern) in detection_patterns() {
            if !pattern.is_match(text) {
                continue;
            }
            self.add_tool(tool, Some(tool_description(tool)));

            let deadline = now + DETECTED_TOOL_TTL;
            match self.pending_removals.iter_mut().find(|(t, _)| t.as_str() == *tool) {
                Some((_, at)) => *at = deadline,
                None => self.pending_removals.push((tool.to_string(), deadline)),
            }
            detected.push(*tool);
        }
        detected
    }

    /// Fire due removals and hides. Returns true if anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        let due: Vec<String> = self
            .pending_removals
            .iter()
            .filter(|(_, at)| *at <= now)
            .map(|(tool, _)| tool.clone())
            .collect();
        for tool in due {
            self.remove_tool(&tool, now);
            changed = true;
        }

        if let Some(at) = self.hide_at {
            if at <= now {
                self.hide_at = None;
                self.visible = false;
                self.active.clear();
                changed = true;
            }
        }

        changed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn active_tools(&self) -> &[ActiveTool] {
        &self.active
    }

    pub fn history(&self) -> &[ToolUse] {
        &self.history
    }

    /// Drop all state, history included.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tracker: &ToolTracker) -> Vec<&str> {
        tracker.active_tools().iter().map(|t| t.name.as_str()).collect()
    }

    // =========================================================================
    // Tables
    // =========================================================================

    #[test]
    fn test_icon_and_description_fallbacks() {
        assert_eq!(tool_icon("Read"), "📖");
        assert_eq!(tool_icon("Mystery"), GENERIC_ICON);
        assert_eq!(tool_description("Bash"), "Running command...");
        assert_eq!(tool_description("Mystery"), GENERIC_DESCRIPTION);
    }

    // =========================================================================
    // Add / Remove
    // =========================================================================

    #[test]
    fn test_add_tool_shows_panel_and_records_history() {
        let mut tracker = ToolTracker::new();
        tracker.add_tool("Read", Some("src/main.rs"));

        assert!(tracker.is_visible());
        assert_eq!(tracker.active_tools()[0].description, "src/main.rs");
        assert_eq!(tracker.active_tools()[0].icon(), "📖");
        assert_eq!(tracker.history().len(), 1);
        assert_eq!(tracker.history()[0].action.as_deref(), Some("src/main.rs"));
    }

    #[test]
    fn test_add_tool_without_action_uses_table() {
        let mut tracker = ToolTracker::new();
        tracker.add_tool("Glob", None);
        assert_eq!(tracker.active_tools()[0].description, "Finding files...");
    }

    #[test]
    fn test_add_same_tool_twice_keeps_one_entry() {
        let mut tracker = ToolTracker::new();
        tracker.add_tool("Bash", None);
        tracker.add_tool("Bash", Some("ls"));
        assert_eq!(names(&tracker), vec!["Bash"]);
        assert_eq!(tracker.history().len(), 2);
    }

    #[test]
    fn test_history_capped_oldest_dropped() {
        let mut tracker = ToolTracker::new();
        for i in 0..MAX_TOOL_HISTORY + 5 {
            tracker.add_tool("Bash", Some(&format!("cmd {}", i)));
        }
        assert_eq!(tracker.history().len(), MAX_TOOL_HISTORY);
        assert_eq!(tracker.history()[0].action.as_deref(), Some("cmd 5"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panel_hides_after_grace() {
        let mut tracker = ToolTracker::new();
        let start = Instant::now();
        tracker.add_tool("Read", None);
        tracker.remove_tool("Read", start);

        assert!(tracker.is_visible());
        assert!(!tracker.tick(start + Duration::from_millis(999)));
        assert!(tracker.is_visible());
        assert!(tracker.tick(start + Duration::from_millis(1000)));
        assert!(!tracker.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_with_others_active_keeps_panel() {
        let mut tracker = ToolTracker::new();
        let start = Instant::now();
        tracker.add_tool("Read", None);
        tracker.add_tool("Grep", None);
        tracker.remove_tool("Read", start);

        tracker.tick(start + Duration::from_secs(5));
        assert!(tracker.is_visible());
        assert_eq!(names(&tracker), vec!["Grep"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_during_grace_cancels_hide() {
        let mut tracker = ToolTracker::new();
        let start = Instant::now();
        tracker.add_tool("Read", None);
        tracker.remove_tool("Read", start);
        tracker.add_tool("Write", None);

        tracker.tick(start + Duration::from_secs(2));
        assert!(tracker.is_visible());
        assert_eq!(names(&tracker), vec!["Write"]);
    }

    // =========================================================================
    // Detection
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_detect_is_case_insensitive() {
        let mut tracker = ToolTracker::new();
        let detected = tracker.detect_tools_in_message("Now RUNNING COMMAND cargo", Instant::now());
        assert_eq!(detected, vec!["Bash"]);
        assert_eq!(names(&tracker), vec!["Bash"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detect_multiple_tools_in_table_order() {
        let mut tracker = ToolTracker::new();
        let detected =
            tracker.detect_tools_in_message("searching then reading the file", Instant::now());
        assert_eq!(detected, vec!["Read", "Grep"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detect_nothing() {
        let mut tracker = ToolTracker::new();
        assert!(tracker
            .detect_tools_in_message("just a plain answer", Instant::now())
            .is_empty());
        assert!(!tracker.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detected_tool_expires_then_panel_hides() {
        let mut tracker = ToolTracker::new();
        let start = Instant::now();
        tracker.detect_tools_in_message("grep for it", start);

        tracker.tick(start + Duration::from_millis(2999));
        assert_eq!(names(&tracker), vec!["Grep"]);

        tracker.tick(start + Duration::from_millis(3000));
        assert!(names(&tracker).is_empty());
        assert!(tracker.is_visible());

        tracker.tick(start + Duration::from_millis(4000));
        assert!(!tracker.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_detection_pushes_deadline() {
        let mut tracker = ToolTracker::new();
        let start = Instant::now();
        tracker.detect_tools_in_message("bash", start);
        tracker.detect_tools_in_message("bash again", start + Duration::from_millis(2000));

        tracker.tick(start + Duration::from_millis(3500));
        assert_eq!(names(&tracker), vec!["Bash"]);

        tracker.tick(start + Duration::from_millis(5000));
        assert!(names(&tracker).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut tracker = ToolTracker::new();
        tracker.add_tool("Task", None);
        tracker.clear();
        assert!(!tracker.is_visible());
        assert!(tracker.history().is_empty());
    }
}
