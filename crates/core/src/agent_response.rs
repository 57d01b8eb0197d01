//! Canonical agent response and the single decode step that produces it.
//!
//! The agent endpoint answers with one of three shapes: a JSON object
//! `{"text": ..., "media": {...}}`, the same object JSON-encoded inside a
//! JSON string, or bare text. [`decode_body`] folds all of them into one
//! [`AgentResponse`] before anything downstream looks at it.

use serde::{Deserialize, Serialize};

use crate::chat::MediaAttachment;
use crate::recommendation::RecommendationMetadata;

/// One agent reply, already normalised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub media: Option<MediaAttachment>,
    #[serde(default)]
    pub metadata: Option<RecommendationMetadata>,
}

/// Wire shapes accepted from the agent endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePayload {
    Structured(StructuredWire),
    Encoded(String),
}

/// The structured reply as sent. `text` is required so that arbitrary JSON
/// objects fall through to plain text.
#[derive(Debug, Deserialize)]
struct StructuredWire {
    text: String,
    #[serde(default)]
    media: Option<MediaAttachment>,
    #[serde(default)]
    metadata: Option<RecommendationMetadata>,
}

impl From<StructuredWire> for AgentResponse {
    fn from(wire: StructuredWire) -> Self {
        Self {
            text: wire.text,
            media: wire.media,
            metadata: wire.metadata,
        }
    }
}

impl AgentResponse {
    /// A text-only response.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_video(mut self, url: impl Into<String>) -> Self {
        self.media.get_or_insert_with(MediaAttachment::default).video_url = Some(url.into());
        self
    }

    pub fn with_audio(mut self, urls: Vec<String>) -> Self {
        self.media.get_or_insert_with(MediaAttachment::default).audio_urls = Some(urls);
        self
    }

    pub fn video_url(&self) -> Option<&str> {
        self.media.as_ref().and_then(|m| m.video_url.as_deref())
    }

    pub fn audio_urls(&self) -> &[String] {
        self.media.as_ref().map(MediaAttachment::audio_urls).unwrap_or(&[])
    }

    pub fn has_audio_candidates(&self) -> bool {
        !self.audio_urls().is_empty()
    }

    /// The agent is asking for a decision when its reply ends with `?`.
    pub fn is_question(&self) -> bool {
        self.text.trim_end().ends_with('?')
    }
}

/// Decode a raw response body into an [`AgentResponse`].
///
/// Never fails: anything that is not a recognisable structured payload is
/// treated as plain text.
pub fn decode_body(body: &str) -> AgentResponse {
    match serde_json::from_str::<WirePayload>(body) {
        Ok(WirePayload::Structured(wire)) => wire.into(),
        Ok(WirePayload::Encoded(inner)) => decode_inner(inner),
        Err(_) => AgentResponse::plain(body),
    }
}

fn decode_inner(inner: String) -> AgentResponse {
    match serde_json::from_str::<StructuredWire>(&inner) {
        Ok(wire) => wire.into(),
        Err(_) => AgentResponse::plain(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_structured_object() {
        let body = r#"{"text":"Done","media":{"video_url":"v2.mp4"}}"#;
        let response = decode_body(body);
        assert_eq!(response.text, "Done");
        assert_eq!(response.video_url(), Some("v2.mp4"));
        assert!(!response.has_audio_candidates());
    }

    #[test]
    fn decodes_json_encoded_string() {
        let body = r#""{\"text\":\"Add a voiceover?\",\"media\":{\"audio_urls\":[\"a.mp3\"]}}""#;
        let response = decode_body(body);
        assert_eq!(response.text, "Add a voiceover?");
        assert_eq!(response.audio_urls(), ["a.mp3".to_string()]);
    }

    #[test]
    fn encoded_string_that_is_not_json_becomes_text() {
        let response = decode_body(r#""just words""#);
        assert_eq!(response, AgentResponse::plain("just words"));
    }

    #[test]
    fn bare_text_becomes_plain_response() {
        let response = decode_body("ERROR: backend exploded. Please try again.");
        assert_eq!(response.text, "ERROR: backend exploded. Please try again.");
        assert!(response.media.is_none());
    }

    #[test]
    fn decodes_metadata() {
        let body = r##"{"text":"Add title?","metadata":{"text":"Hello","position":"top","color":"#fff"}}"##;
        let metadata = decode_body(body).metadata.unwrap();
        assert_eq!(metadata.text.as_deref(), Some("Hello"));
        assert_eq!(metadata.position.as_deref(), Some("top"));
        assert_eq!(metadata.color.as_deref(), Some("#fff"));
    }

    #[test]
    fn object_without_text_is_kept_verbatim() {
        let body = r#"{"message":"Your video is ready"}"#;
        let response = decode_body(body);
        assert_eq!(response.text, body);
        assert!(response.media.is_none());
    }

    #[test]
    fn encoded_object_without_text_is_kept_verbatim() {
        let response = decode_body(r#""{\"status\":\"ok\"}""#);
        assert_eq!(response.text, r#"{"status":"ok"}"#);
    }

    #[test]
    fn question_detection_ignores_trailing_whitespace() {
        assert!(AgentResponse::plain("Shall I add it?  \n").is_question());
        assert!(!AgentResponse::plain("I trimmed the intro.").is_question());
        assert!(!AgentResponse::plain("Why? Because.").is_question());
    }
}
