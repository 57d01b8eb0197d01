//! Read-only mirror of the server-held edit queue, plus the helpers the
//! assistant needs around it: display text, mutation queries, failure
//! detection and growth tracking.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::EditId;

/// Word-bounded, case-insensitive "error" in an agent reply.
static ERROR_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\berror\b").expect("valid regex"));

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    Voiceover,
    TextOverlay,
    Trim,
    Filter,
}

impl EditType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Voiceover => "voiceover",
            Self::TextOverlay => "text_overlay",
            Self::Trim => "trim",
            Self::Filter => "filter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditStatus {
    Pending,
    Applied,
    Reverted,
    Overwritten,
    Superseded,
}

impl EditStatus {
    /// Label shown next to an edit.
    pub fn label(self) -> &'static str {
        match self {
            Self::Applied => "Active",
            Self::Overwritten => "Replaced",
            Self::Reverted => "Deactivated",
            Self::Superseded => "Modified",
            Self::Pending => "Pending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRecord {
    pub id: EditId,
    #[serde(rename = "type")]
    pub edit_type: EditType,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    pub timestamp: String,
    pub status: EditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_video_url: Option<String>,
}

impl EditRecord {
    /// One-line human description, e.g. `Trim: 0.0s to 2.5s`.
    pub fn describe(&self) -> String {
        let text = self.param_str("text").unwrap_or_default();
        match self.edit_type {
            EditType::Voiceover => {
                format!("Voiceover: \"{text}\" at {}", self.param_time("start_ms"))
            }
            EditType::TextOverlay => format!(
                "Text: \"{text}\" from {} to {}",
                self.param_time("start_ms"),
                self.param_time("end_ms")
            ),
            EditType::Trim => format!(
                "Trim: {} to {}",
                self.param_time("start_ms"),
                self.param_time("end_ms")
            ),
            EditType::Filter => format!(
                "Filter: {}",
                self.param_str("filter_type").unwrap_or("unknown")
            ),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == EditStatus::Applied
    }

    fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(serde_json::Value::as_str)
    }

    fn param_time(&self, key: &str) -> String {
        match self.params.get(key).and_then(serde_json::Value::as_f64) {
            Some(ms) => format_ms(ms),
            None => "?".to_string(),
        }
    }
}

/// Milliseconds as seconds with one decimal.
pub fn format_ms(ms: f64) -> String {
    format!("{:.1}s", ms / 1000.0)
}

/// Snapshot of a session's edit queue as returned by the edit-queue service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditQueueSnapshot {
    pub session_id: String,
    pub original_video_url: String,
    #[serde(default)]
    pub edits: Vec<EditRecord>,
    pub current_video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl EditQueueSnapshot {
    pub fn active_count(&self) -> usize {
        self.edits.iter().filter(|e| e.is_active()).count()
    }

    /// Most recent applied edit of `edit_type`.
    pub fn find_latest_applied(&self, edit_type: EditType) -> Option<&EditRecord> {
        self.edits
            .iter()
            .rev()
            .find(|e| e.edit_type == edit_type && e.is_active())
    }
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Edit-queue changes requested through the agent in natural language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMutation {
    Remove,
    Reactivate,
    Deactivate,
}

impl EditMutation {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Remove => "Remove",
            Self::Reactivate => "Reactivate",
            Self::Deactivate => "Deactivate",
        }
    }

    /// The instruction relayed to the agent.
    pub fn query(self, edit_id: &str) -> String {
        format!("{} edit with ID {edit_id}", self.verb())
    }
}

/// The mutation channel has no status codes; a reply mentioning an error
/// is taken as failure.
pub fn mutation_failed(reply_text: &str) -> bool {
    ERROR_KEYWORD_RE.is_match(reply_text)
}

// ---------------------------------------------------------------------------
// Growth tracking
// ---------------------------------------------------------------------------

/// Raises a transient "new edit" indicator when the edit count grows
/// between two refreshes of the same session.
#[derive(Debug, Clone, Default)]
pub struct EditQueueTracker {
    last_count: Option<usize>,
    new_edits: bool,
}

impl EditQueueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh snapshot. Returns `true` when the count grew.
    ///
    /// The first observation after a reset only sets the baseline.
    pub fn observe(&mut self, snapshot: &EditQueueSnapshot) -> bool {
        let count = snapshot.edits.len();
        let grew = self.last_count.is_some_and(|last| count > last);
        self.last_count = Some(count);
        if grew {
            self.new_edits = true;
        }
        grew
    }

    pub fn has_new_edits(&self) -> bool {
        self.new_edits
    }

    pub fn acknowledge(&mut self) {
        self.new_edits = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
