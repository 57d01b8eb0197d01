//! Chat turns: the immutable messages that make up a session transcript.

use serde::{Deserialize, Serialize};

/// Who produced a [`ChatTurn`].
///
/// Older state blobs used `"model"` for agent turns; it is accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "model")]
    Agent,
}

/// Media attached to an agent turn: at most one video, any number of audio clips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_urls: Option<Vec<String>>,
}

impl MediaAttachment {
    pub fn is_empty(&self) -> bool {
        self.video_url.is_none() && self.audio_urls().is_empty()
    }

    /// Audio candidates, treating an absent list as empty.
    pub fn audio_urls(&self) -> &[String] {
        self.audio_urls.as_deref().unwrap_or(&[])
    }
}

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaAttachment>,
    /// Set on agent turns that report a successful edit-queue mutation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_edit_queue_success: bool,
    /// Internal instruction sent when a session opens; never rendered.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_bootstrap: bool,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            media: None,
            is_edit_queue_success: false,
            is_bootstrap: false,
        }
    }

    pub fn agent(text: impl Into<String>, media: Option<MediaAttachment>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            media: media.filter(|m| !m.is_empty()),
            is_edit_queue_success: false,
            is_bootstrap: false,
        }
    }

    /// Hidden user turn carrying the session's opening instruction.
    pub fn bootstrap(text: impl Into<String>) -> Self {
        Self {
            is_bootstrap: true,
            ..Self::user(text)
        }
    }

    /// Empty agent turn shown while a request is in flight.
    pub fn placeholder() -> Self {
        Self::agent("", None)
    }

    /// Agent turn reporting a failed request.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::agent(format!("Error: {message}"), None)
    }

    pub fn with_edit_queue_success(mut self) -> Self {
        self.is_edit_queue_success = true;
        self
    }

    pub fn video_url(&self) -> Option<&str> {
        self.media.as_ref().and_then(|m| m.video_url.as_deref())
    }
}
