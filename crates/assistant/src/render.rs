//! Plain-text rendering for the terminal front end.

use vidchat_core::chat::Role;
use vidchat_core::edit_queue::EditQueueSnapshot;
use vidchat_core::merger::TimelineItem;
use vidchat_core::recommendation::RecommendationStatus;
use vidchat_core::session::{format_age, is_latest_version, Session, SessionVersion};
use vidchat_core::state::EditorState;
use vidchat_core::types::Timestamp;

pub fn item(state: &EditorState, item: &TimelineItem) -> String {
    let speaker = match item.turn.role {
        Role::User => "you",
        Role::Agent => "editor",
    };
    let mut out = format!("[{speaker}] {}", item.turn.text);
    if let Some(url) = item.turn.video_url() {
        out.push_str(&format!("\n    video: {url}"));
    }
    if item.turn.is_edit_queue_success {
        out.push_str("\n    edit queue updated");
    }

    if let Some(rec) = &item.recommendation {
        out.push_str(&format!(
            "\n    +- {} [{}] id={}\n    |  {}",
            rec.title, rec.status, rec.id, rec.description
        ));
        for url in rec.audio_urls() {
            out.push_str(&format!("\n    |  audio: {url}"));
        }
        let actions = match rec.status {
            RecommendationStatus::Pending => "/accept or /reject",
            RecommendationStatus::Accepted if state.ledger().is_latest_accepted(&rec.id) => "/undo",
            RecommendationStatus::Processing => "applying...",
            _ => "",
        };
        if !actions.is_empty() {
            out.push_str(&format!("\n    +- {actions}"));
        }
    }
    out
}

/// Recommendations grouped by status, with their display titles.
pub fn recommendations(state: &EditorState) -> String {
    let ledger = state.ledger();
    let groups = [
        ("Pending", RecommendationStatus::Pending),
        ("Applying", RecommendationStatus::Processing),
        ("Accepted", RecommendationStatus::Accepted),
        ("Rejected", RecommendationStatus::Rejected),
    ];
    let mut sections = Vec::new();
    for (heading, status) in groups {
        let recs = ledger.with_status(status);
        if recs.is_empty() {
            continue;
        }
        let mut lines = vec![format!("{heading} ({})", recs.len())];
        lines.extend(recs.iter().map(|rec| {
            let undo = if ledger.is_latest_accepted(&rec.id) { "  (undo available)" } else { "" };
            format!("  {} {}: {}{undo}", rec.id, rec.title, rec.description)
        }));
        sections.push(lines.join("\n"));
    }
    if sections.is_empty() {
        return "No recommendations yet.".to_string();
    }
    sections.join("\n")
}

/// One line per version with the cursor marked.
pub fn timeline(state: &EditorState) -> String {
    let timeline = state.timeline();
    timeline
        .entries()
        .iter()
        .map(|entry| {
            let marker = if entry.index == timeline.cursor() { ">" } else { " " };
            format!(
                "{marker} {}: {}",
                state.version_label(entry.index),
                entry.video_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn edit_queue(snapshot: &EditQueueSnapshot) -> String {
    if snapshot.edits.is_empty() {
        return "No edits yet.".to_string();
    }
    let mut lines = vec![format!(
        "{} active of {} edits",
        snapshot.active_count(),
        snapshot.edits.len()
    )];
    lines.extend(snapshot.edits.iter().map(|edit| {
        let current = snapshot
            .find_latest_applied(edit.edit_type)
            .is_some_and(|latest| latest.id == edit.id);
        format!(
            "  {} [{}] {}{}",
            edit.id,
            edit.status.label(),
            edit.describe(),
            if current { " *" } else { "" }
        )
    }));
    lines.join("\n")
}

pub fn sessions(sessions: &[Session], now: Timestamp) -> String {
    if sessions.is_empty() {
        return "No sessions.".to_string();
    }
    sessions
        .iter()
        .map(|s| {
            let age = s
                .updated_at_utc()
                .map(|t| format_age(t, now))
                .unwrap_or_else(|| s.updated_at.clone());
            format!("  {}  {}", s.session_id, age)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn versions(versions: &[SessionVersion], now: Timestamp) -> String {
    if versions.is_empty() {
        return "No stored versions.".to_string();
    }
    versions
        .iter()
        .map(|v| {
            let age = v
                .created_at_utc()
                .map(|t| format_age(t, now))
                .unwrap_or_else(|| v.created_at.clone());
            let latest = if is_latest_version(v, versions) { "  (latest)" } else { "" };
            format!(
                "  v{}  {}  {}{latest}",
                v.version_number,
                age,
                v.video_url.as_deref().unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use vidchat_core::agent_response::AgentResponse;

    use super::*;

    #[test]
    fn pending_card_offers_decision() {
        let mut state = EditorState::new("orig.mp4");
        let pending = state.begin_turn("voiceover please").unwrap();
        state
            .complete_turn(
                &pending,
                AgentResponse::plain("Add a voiceover saying hi?").with_audio(vec!["a.mp3".into()]),
            )
            .unwrap();

        let merged = state.merged();
        let text = item(&state, &merged[1]);
        assert!(text.contains("Audio Recommendation [pending]"));
        assert!(text.contains("audio: a.mp3"));
        assert!(text.contains("/accept or /reject"));
    }

    #[test]
    fn recommendations_grouped_by_status() {
        let mut state = EditorState::new("orig.mp4");
        assert_eq!(recommendations(&state), "No recommendations yet.");

        let pending = state.begin_turn("voiceover please").unwrap();
        state
            .complete_turn(
                &pending,
                AgentResponse::plain("Add a voiceover saying hi?").with_audio(vec!["a.mp3".into()]),
            )
            .unwrap();
        let pending = state.begin_turn("trim the intro").unwrap();
        state
            .complete_turn(&pending, AgentResponse::plain("Trimmed.").with_video("t.mp4"))
            .unwrap();

        let text = recommendations(&state);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Pending (1)");
        assert!(lines[1].contains("Audio Recommendation"));
        assert_eq!(lines[2], "Accepted (1)");
        assert!(lines[3].contains("Video Edit Applied"));
        assert!(lines[3].ends_with("(undo available)"));
    }

    #[test]
    fn edit_queue_marks_latest_active_per_type() {
        let snapshot: EditQueueSnapshot = serde_json::from_value(serde_json::json!({
            "session_id": "s1",
            "original_video_url": "o.mp4",
            "current_video_url": "c.mp4",
            "edits": [
                {"id": "e1", "type": "filter", "params": {"filter_type": "sepia"},
                 "timestamp": "t", "status": "applied"},
                {"id": "e2", "type": "filter", "params": {"filter_type": "mono"},
                 "timestamp": "t", "status": "applied"},
                {"id": "e3", "type": "trim", "params": {"start_ms": 0, "end_ms": 1000},
                 "timestamp": "t", "status": "reverted"}
            ]
        }))
        .unwrap();
        assert_eq!(
            edit_queue(&snapshot),
            "2 active of 3 edits\n  e1 [Active] Filter: sepia\n  e2 [Active] Filter: mono *\n  e3 [Deactivated] Trim: 0.0s to 1.0s"
        );
    }

    #[test]
    fn timeline_marks_cursor() {
        let mut state = EditorState::new("orig.mp4");
        let pending = state.begin_turn("trim").unwrap();
        state
            .complete_turn(&pending, AgentResponse::plain("Trimmed.").with_video("t.mp4"))
            .unwrap();

        assert_eq!(timeline(&state), "  Original: orig.mp4\n> Current: t.mp4");
        state.step_back();
        assert_eq!(timeline(&state), "> Original: orig.mp4\n  Current: t.mp4");
    }

    #[test]
    fn versions_mark_latest() {
        let now = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        let list = vec![
            SessionVersion {
                id: 1,
                version_number: 1,
                video_url: Some("v1.mp4".into()),
                created_at: "2026-10-01T10:00:00Z".into(),
            },
            SessionVersion {
                id: 2,
                version_number: 2,
                video_url: None,
                created_at: "2026-10-01T11:30:00Z".into(),
            },
        ];
        assert_eq!(
            versions(&list, now),
            "  v1  2h ago  v1.mp4\n  v2  30m ago  -  (latest)"
        );
    }
}
