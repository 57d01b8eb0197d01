//! Recommendation entity, status values, canonical titles and the
//! duplicate rule applied before a new pending recommendation is created.

use serde::{Deserialize, Serialize};

use crate::types::RecommendationId;

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

pub const TITLE_AUDIO_RECOMMENDATION: &str = "Audio Recommendation";
pub const TITLE_VIDEO_RECOMMENDATION: &str = "Video Edit Recommendation";
pub const TITLE_EDIT_RECOMMENDATION: &str = "Edit Recommendation";
pub const TITLE_VIDEO_APPLIED: &str = "Video Edit Applied";
pub const TITLE_AUDIO_APPLIED: &str = "Audio Applied";

/// Titles written by older clients.
pub const LEGACY_TITLE_AUDIO_GENERATED: &str = "Audio Generated";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    Pending,
    Processing,
    Accepted,
    Rejected,
}

impl RecommendationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Free-form details the agent attaches to a proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A proposed (or applied) edit awaiting or recording a user decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: RecommendationId,
    pub title: String,
    pub description: String,
    pub status: RecommendationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecommendationMetadata>,
    /// Index of the chat turn this recommendation was derived from.
    /// Older blobs call it `messageIndex`.
    #[serde(default, alias = "messageIndex", skip_serializing_if = "Option::is_none")]
    pub turn_index: Option<usize>,
    /// Position in acceptance order; set on every transition to ACCEPTED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_seq: Option<u64>,
}

impl Recommendation {
    pub fn has_video(&self) -> bool {
        self.video_url.is_some()
    }

    pub fn audio_urls(&self) -> &[String] {
        self.audio_urls.as_deref().unwrap_or(&[])
    }

    /// Needs the agent to materialise a video before it can be accepted.
    pub fn needs_materialization(&self) -> bool {
        !self.has_video()
    }

    /// Copy with the legacy title fix-up applied. Status is untouched.
    pub fn normalized(&self) -> Self {
        Self {
            title: normalize_title(&self.title, self.status).to_string(),
            ..self.clone()
        }
    }

    /// Whether `self` proposes the same change as an existing recommendation:
    /// identical description and an identical video, or an identical audio set.
    pub fn duplicates(&self, existing: &Recommendation) -> bool {
        if self.description != existing.description {
            return false;
        }
        let same_video = matches!(
            (&self.video_url, &existing.video_url),
            (Some(a), Some(b)) if a == b
        );
        let same_audio = match (&self.audio_urls, &existing.audio_urls) {
            (Some(a), Some(b)) => audio_key(a) == audio_key(b),
            _ => false,
        };
        same_video || same_audio
    }
}

/// Serialized form of an audio candidate list used for duplicate checks.
fn audio_key(urls: &[String]) -> String {
    serde_json::to_string(urls).unwrap_or_default()
}

/// Map titles written under older conventions to the canonical ones.
pub fn normalize_title(title: &str, status: RecommendationStatus) -> &str {
    match status {
        RecommendationStatus::Pending => match title {
            TITLE_VIDEO_APPLIED => TITLE_VIDEO_RECOMMENDATION,
            LEGACY_TITLE_AUDIO_GENERATED => TITLE_AUDIO_RECOMMENDATION,
            other => other,
        },
        RecommendationStatus::Accepted => match title {
            TITLE_VIDEO_RECOMMENDATION | TITLE_VIDEO_APPLIED => TITLE_VIDEO_APPLIED,
            TITLE_AUDIO_RECOMMENDATION | LEGACY_TITLE_AUDIO_GENERATED => TITLE_AUDIO_APPLIED,
            other => other,
        },
        _ => title,
    }
}
