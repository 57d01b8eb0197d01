//! Session records from the session store and the opaque state blob the
//! assistant keeps in them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::ChatTurn;
use crate::error::CoreError;
use crate::recommendation::Recommendation;
use crate::types::{SessionPk, Timestamp};

/// A persisted editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub pk: SessionPk,
    #[serde(default)]
    pub app_name: Option<String>,
    pub user_id: String,
    pub session_id: String,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub feature_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub state: Option<serde_json::Value>,
}

impl Session {
    pub fn updated_at_utc(&self) -> Option<Timestamp> {
        parse_timestamp(&self.updated_at)
    }
}

/// Immutable server-side snapshot taken whenever an edit is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionVersion {
    pub id: i64,
    pub version_number: i64,
    #[serde(default)]
    pub video_url: Option<String>,
    pub created_at: String,
}

impl SessionVersion {
    pub fn created_at_utc(&self) -> Option<Timestamp> {
        parse_timestamp(&self.created_at)
    }
}

/// Whether `version` is the newest of `versions` (ordered by number, ascending).
pub fn is_latest_version(version: &SessionVersion, versions: &[SessionVersion]) -> bool {
    versions
        .last()
        .is_some_and(|last| last.version_number == version.version_number)
}

/// Fields sent when a session is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: String,
    pub session_id: String,
    pub video_id: Option<String>,
    pub video_url: Option<String>,
    pub feature_id: Option<String>,
}

// ---------------------------------------------------------------------------
// State blob
// ---------------------------------------------------------------------------

/// What the assistant stores in a session's state: the transcript and the
/// recommendation ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStateBlob {
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl SessionStateBlob {
    /// Read the blob from a session's `state`. An absent or null state is
    /// an empty blob; anything else malformed is a validation error.
    pub fn from_state(state: Option<&serde_json::Value>) -> Result<Self, CoreError> {
        match state {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| CoreError::Validation(format!("Malformed session state: {e}"))),
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, CoreError> {
        serde_json::to_value(self)
            .map_err(|e| CoreError::Internal(format!("Cannot serialize session state: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parse a server timestamp: RFC 3339, or a naive ISO-8601 value taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Short relative age: `Just now`, `5m ago`, `3h ago`, `2d ago`, or the date.
pub fn format_age(then: Timestamp, now: Timestamp) -> String {
    let minutes = (now - then).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        then.format("%Y-%m-%d %H:%M").to_string()
    }
}
