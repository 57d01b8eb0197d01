//! Turn classifier: decides what one agent reply means for the ledger and
//! the version timeline.
//!
//! Precedence, first match wins:
//!
//! 1. A recommendation is being applied: the reply materializes it.
//! 2. The reply carries audio candidates or ends with `?`: new PENDING
//!    recommendation linked to the reply's turn.
//! 3. The reply carries a video: the edit was auto-applied; a new version
//!    is appended and an ACCEPTED record is kept so it can be undone.
//! 4. Otherwise the reply is just a message.

use crate::agent_response::AgentResponse;
use crate::ledger::RecommendationLedger;
use crate::recommendation::{
    Recommendation, RecommendationStatus, TITLE_AUDIO_RECOMMENDATION, TITLE_EDIT_RECOMMENDATION,
    TITLE_VIDEO_APPLIED, TITLE_VIDEO_RECOMMENDATION,
};
use crate::types::{new_recommendation_id, RecommendationId};
use crate::version_timeline::VersionTimeline;

/// The decision for one reply, before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Materialize {
        recommendation_id: RecommendationId,
        video_url: Option<String>,
    },
    Propose,
    AutoApply {
        video_url: String,
    },
    Message,
}

/// What applying a reply actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Message,
    Proposed {
        recommendation_id: RecommendationId,
    },
    /// A proposal identical to an existing recommendation was dropped.
    DuplicateSuppressed,
    AutoApplied {
        recommendation_id: RecommendationId,
        video_url: String,
    },
    Materialized {
        recommendation_id: RecommendationId,
        video_url: String,
    },
    /// The reply to an apply request carried no video.
    ApplyFailed {
        recommendation_id: RecommendationId,
    },
}

impl TurnOutcome {
    /// Video that should be persisted as a session version, if any.
    pub fn snapshot_url(&self) -> Option<&str> {
        match self {
            Self::AutoApplied { video_url, .. } | Self::Materialized { video_url, .. } => {
                Some(video_url)
            }
            _ => None,
        }
    }
}

pub fn classify(response: &AgentResponse, applying: Option<&str>) -> Classification {
    if let Some(id) = applying {
        return Classification::Materialize {
            recommendation_id: id.to_string(),
            video_url: response.video_url().map(str::to_string),
        };
    }
    if response.has_audio_candidates() || response.is_question() {
        return Classification::Propose;
    }
    match response.video_url() {
        Some(url) => Classification::AutoApply {
            video_url: url.to_string(),
        },
        None => Classification::Message,
    }
}

/// Build the recommendation a reply proposes, linked to `turn_index`.
pub fn recommendation_from(response: &AgentResponse, turn_index: usize) -> Recommendation {
    let audio_urls = response.has_audio_candidates().then(|| response.audio_urls().to_vec());
    let title = if audio_urls.is_some() {
        TITLE_AUDIO_RECOMMENDATION
    } else if response.video_url().is_some() {
        TITLE_VIDEO_RECOMMENDATION
    } else {
        TITLE_EDIT_RECOMMENDATION
    };

    Recommendation {
        id: new_recommendation_id(),
        title: title.to_string(),
        description: response.text.trim().to_string(),
        status: RecommendationStatus::Pending,
        video_url: response.video_url().map(str::to_string),
        audio_urls,
        metadata: response.metadata.clone(),
        turn_index: Some(turn_index),
        acceptance_seq: None,
    }
}

/// Classify `response` (already appended as turn `turn_index`) and apply the
/// result to the ledger and timeline.
///
/// Performs at most one recommendation creation or mutation and at most one
/// version append.
pub fn apply_response(
    ledger: &mut RecommendationLedger,
    timeline: &mut VersionTimeline,
    response: &AgentResponse,
    turn_index: usize,
    applying: Option<&str>,
) -> TurnOutcome {
    match classify(response, applying) {
        Classification::Materialize {
            recommendation_id,
            video_url: Some(video_url),
        } => match ledger.complete_materialization(&recommendation_id, &video_url) {
            Ok(()) => {
                timeline.append(video_url.clone());
                tracing::info!(%recommendation_id, %video_url, "Recommendation materialized");
                TurnOutcome::Materialized {
                    recommendation_id,
                    video_url,
                }
            }
            Err(e) => {
                tracing::warn!(%recommendation_id, error = %e, "Reply to apply request ignored");
                TurnOutcome::Message
            }
        },
        Classification::Materialize {
            recommendation_id,
            video_url: None,
        } => {
            if let Err(e) = ledger.revert_processing(&recommendation_id) {
                tracing::warn!(%recommendation_id, error = %e, "Could not revert apply");
            }
            tracing::warn!(%recommendation_id, "Apply reply carried no video");
            TurnOutcome::ApplyFailed { recommendation_id }
        }
        Classification::Propose => {
            match ledger.propose(recommendation_from(response, turn_index)) {
                Some(rec) => TurnOutcome::Proposed {
                    recommendation_id: rec.id.clone(),
                },
                None => TurnOutcome::DuplicateSuppressed,
            }
        }
        Classification::AutoApply { video_url } => {
            let mut record = recommendation_from(response, turn_index);
            record.title = TITLE_VIDEO_APPLIED.to_string();
            let recommendation_id = ledger.record_applied(record).id.clone();
            timeline.append(video_url.clone());
            tracing::info!(%recommendation_id, %video_url, "Edit auto-applied");
            TurnOutcome::AutoApplied {
                recommendation_id,
                video_url,
            }
        }
        Classification::Message => TurnOutcome::Message,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn setup() -> (RecommendationLedger, VersionTimeline) {
        (RecommendationLedger::new(), VersionTimeline::new("orig.mp4"))
    }

    #[test]
    fn classify_precedence() {
        let question_with_video = AgentResponse::plain("Like this?").with_video("v.mp4");
        assert_eq!(classify(&question_with_video, None), Classification::Propose);
        assert_eq!(
            classify(&question_with_video, Some("r1")),
            Classification::Materialize {
                recommendation_id: "r1".into(),
                video_url: Some("v.mp4".into())
            }
        );
        assert_eq!(
            classify(&AgentResponse::plain("Done.").with_video("v.mp4"), None),
            Classification::AutoApply {
                video_url: "v.mp4".into()
            }
        );
        assert_eq!(
            classify(&AgentResponse::plain("Hello"), None),
            Classification::Message
        );
    }

    #[test]
    fn audio_without_question_is_still_a_proposal() {
        let response = AgentResponse::plain("Here are voices.").with_audio(vec!["a.mp3".into()]);
        assert_eq!(classify(&response, None), Classification::Propose);
    }

    #[test]
    fn audio_proposal_leaves_timeline_alone() {
        let (mut ledger, mut timeline) = setup();
        let response =
            AgentResponse::plain("Add a voiceover saying hi?").with_audio(vec!["a.mp3".into()]);
        let outcome = apply_response(&mut ledger, &mut timeline, &response, 2, None);

        assert_matches!(outcome, TurnOutcome::Proposed { .. });
        let rec = &ledger.as_slice()[0];
        assert_eq!(rec.status, RecommendationStatus::Pending);
        assert_eq!(rec.audio_urls.as_deref(), Some(&["a.mp3".to_string()][..]));
        assert_eq!(rec.title, TITLE_AUDIO_RECOMMENDATION);
        assert_eq!(rec.turn_index, Some(2));
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn statement_with_video_is_auto_applied() {
        let (mut ledger, mut timeline) = setup();
        let response = AgentResponse::plain("I trimmed the intro.").with_video("v3.mp4");
        let outcome = apply_response(&mut ledger, &mut timeline, &response, 1, None);

        assert_matches!(outcome, TurnOutcome::AutoApplied { ref video_url, .. } if video_url == "v3.mp4");
        assert_eq!(outcome.snapshot_url(), Some("v3.mp4"));
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.cursor(), 1);
        let rec = &ledger.as_slice()[0];
        assert_eq!(rec.status, RecommendationStatus::Accepted);
        assert_eq!(rec.title, TITLE_VIDEO_APPLIED);
    }

    #[test]
    fn materialization_accepts_and_appends() {
        let (mut ledger, mut timeline) = setup();
        let proposal =
            AgentResponse::plain("Add a voiceover saying hi?").with_audio(vec!["a.mp3".into()]);
        apply_response(&mut ledger, &mut timeline, &proposal, 1, None);
        let id = ledger.as_slice()[0].id.clone();
        ledger.accept(&id).unwrap();

        let reply = AgentResponse::plain("Done").with_video("v2.mp4");
        let outcome = apply_response(&mut ledger, &mut timeline, &reply, 3, Some(&id));

        assert_matches!(outcome, TurnOutcome::Materialized { .. });
        let rec = ledger.get(&id).unwrap();
        assert_eq!(rec.status, RecommendationStatus::Accepted);
        assert_eq!(rec.video_url.as_deref(), Some("v2.mp4"));
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.cursor(), 1);
        // The materializing reply does not create a second recommendation.
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn apply_reply_without_video_reverts_to_pending() {
        let (mut ledger, mut timeline) = setup();
        let proposal = AgentResponse::plain("Voice?").with_audio(vec!["a.mp3".into()]);
        apply_response(&mut ledger, &mut timeline, &proposal, 1, None);
        let id = ledger.as_slice()[0].id.clone();
        ledger.accept(&id).unwrap();

        let outcome = apply_response(
            &mut ledger,
            &mut timeline,
            &AgentResponse::plain("Something went wrong"),
            3,
            Some(&id),
        );
        assert_matches!(outcome, TurnOutcome::ApplyFailed { .. });
        assert_eq!(ledger.get(&id).unwrap().status, RecommendationStatus::Pending);
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn duplicate_proposal_is_suppressed() {
        let (mut ledger, mut timeline) = setup();
        let response = AgentResponse::plain("Voice?").with_audio(vec!["a.mp3".into()]);
        apply_response(&mut ledger, &mut timeline, &response, 1, None);
        let outcome = apply_response(&mut ledger, &mut timeline, &response, 3, None);
        assert_eq!(outcome, TurnOutcome::DuplicateSuppressed);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn plain_message_changes_nothing() {
        let (mut ledger, mut timeline) = setup();
        let outcome = apply_response(
            &mut ledger,
            &mut timeline,
            &AgentResponse::plain("Hello there."),
            1,
            None,
        );
        assert_eq!(outcome, TurnOutcome::Message);
        assert!(ledger.is_empty());
        assert_eq!(timeline.len(), 1);
    }
}
