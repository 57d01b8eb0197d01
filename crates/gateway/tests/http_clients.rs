//! HTTP-level tests for the gateway clients against an in-process fake
//! backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use vidchat_core::session::NewSession;
use vidchat_gateway::{
    AgentRequest, GatewayConfig, GatewayError, Gateways, SessionFilter,
};

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

type Params = HashMap<String, String>;

/// Every request the fake backend saw, as `(route, query, body)`.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<(String, Params, Value)>>>);

impl Recorder {
    fn push(&self, route: &str, params: Params, body: Value) {
        self.0.lock().unwrap().push((route.to_string(), params, body));
    }

    fn last(&self, route: &str) -> (Params, Value) {
        let seen = self.0.lock().unwrap();
        let (_, params, body) = seen
            .iter()
            .rev()
            .find(|(r, _, _)| r == route)
            .cloned()
            .unwrap_or_else(|| panic!("no request to {route}"));
        (params, body)
    }
}

fn session_json(session_id: &str, state: Value) -> Value {
    json!({
        "pk": 7,
        "app_name": "video-editor",
        "user_id": "u1",
        "session_id": session_id,
        "video_id": "vid-1",
        "video_url": "https://cdn/original.mp4",
        "feature_id": null,
        "created_at": "2026-10-01T10:00:00Z",
        "updated_at": "2026-10-01T10:05:00",
        "state": state,
    })
}

fn router(rec: Recorder) -> Router {
    Router::new()
        .route(
            "/api/call_ai_editor_agent",
            post(|State(rec): State<Recorder>, Json(body): Json<Value>| async move {
                rec.push("agent", Params::new(), body.clone());
                match body["query"].as_str() {
                    Some("fail") => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "ERROR: agent crashed".to_string(),
                    ),
                    Some("plain") => (StatusCode::OK, "Which clip do you mean?".to_string()),
                    Some("encoded") => (
                        StatusCode::OK,
                        serde_json::to_string(
                            &json!({"text": "Done", "media": {"video_url": "https://cdn/v2.mp4"}})
                                .to_string(),
                        )
                        .unwrap(),
                    ),
                    _ => (
                        StatusCode::OK,
                        json!({
                            "text": "Add a title card?",
                            "media": {"video_url": "https://cdn/v1.mp4"},
                            "metadata": {"text": "Hello", "position": "top"}
                        })
                        .to_string(),
                    ),
                }
            }),
        )
        .route(
            "/api/sessions/create",
            post(|State(rec): State<Recorder>, Query(q): Query<Params>| async move {
                rec.push("create", q, Value::Null);
                Json(json!({"session_pk": 7, "message": "created"}))
            }),
        )
        .route(
            "/api/sessions/get",
            get(|State(rec): State<Recorder>, Query(q): Query<Params>| async move {
                let sid = q.get("session_id").cloned().unwrap_or_default();
                rec.push("get", q, Value::Null);
                if sid == "missing" {
                    return Err((StatusCode::NOT_FOUND, "Session not found"));
                }
                Ok(Json(session_json(&sid, json!({"messages": [], "recommendations": []}))))
            }),
        )
        .route(
            "/api/sessions/list",
            get(|State(rec): State<Recorder>, Query(q): Query<Params>| async move {
                rec.push("list", q, Value::Null);
                Json(json!([session_json("s1", Value::Null), session_json("s2", Value::Null)]))
            }),
        )
        .route(
            "/api/sessions/update",
            put(
                |State(rec): State<Recorder>, Query(q): Query<Params>, Json(body): Json<Value>| async move {
                    rec.push("update", q, body);
                    Json(json!({"message": "updated"}))
                },
            ),
        )
        .route(
            "/api/sessions/rename",
            put(|State(rec): State<Recorder>, Query(q): Query<Params>| async move {
                rec.push("rename", q, Value::Null);
                StatusCode::OK
            }),
        )
        .route(
            "/api/sessions/delete",
            delete(|State(rec): State<Recorder>, Query(q): Query<Params>| async move {
                rec.push("delete", q, Value::Null);
                StatusCode::NO_CONTENT
            }),
        )
        .route(
            "/api/sessions/delete-all",
            delete(|State(rec): State<Recorder>, Query(q): Query<Params>| async move {
                rec.push("delete-all", q, Value::Null);
                Json(json!({"deleted_count": 3, "message": "deleted"}))
            }),
        )
        .route(
            "/api/sessions/version",
            post(|State(rec): State<Recorder>, Query(q): Query<Params>| async move {
                rec.push("version", q, Value::Null);
                Json(json!({"version_id": 42, "message": "ok"}))
            }),
        )
        .route(
            "/api/sessions/versions",
            get(|State(rec): State<Recorder>, Query(q): Query<Params>| async move {
                rec.push("versions", q, Value::Null);
                Json(json!([
                    {"id": 2, "version_number": 2, "video_url": "https://cdn/v2.mp4", "created_at": "2026-10-01T10:02:00Z"},
                    {"id": 1, "version_number": 1, "video_url": "https://cdn/v1.mp4", "created_at": "2026-10-01T10:01:00Z"}
                ]))
            }),
        )
        .route(
            "/api/edit-queue",
            get(|State(rec): State<Recorder>, Query(q): Query<Params>| async move {
                rec.push("edit-queue", q, Value::Null);
                Json(json!({
                    "session_id": "s1",
                    "original_video_url": "https://cdn/original.mp4",
                    "current_video_url": "https://cdn/v2.mp4",
                    "edits": [
                        {"id": "e1", "type": "trim", "params": {"start_ms": 0, "end_ms": 2500},
                         "timestamp": "2026-10-01T10:01:00Z", "status": "applied"},
                        {"id": "e2", "type": "filter", "params": {"filter_type": "sepia"},
                         "timestamp": "2026-10-01T10:02:00Z", "status": "reverted"}
                    ]
                }))
            }),
        )
        .route(
            "/api/export",
            post(|State(rec): State<Recorder>, Json(body): Json<Value>| async move {
                rec.push("export", Params::new(), body);
                Json(json!({"public_url": "https://public/v2.mp4"}))
            }),
        )
        .with_state(rec)
}

/// Spawn the fake backend on an ephemeral port and build gateways for it.
async fn spawn_backend() -> (Gateways, Recorder) {
    let rec = Recorder::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(rec.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = GatewayConfig {
        api_url: format!("http://{addr}/api"),
        export_url: format!("http://{addr}/api"),
        agent_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(5),
    };
    (Gateways::from_config(&config), rec)
}

fn agent_request(query: &str) -> AgentRequest {
    AgentRequest {
        query: query.to_string(),
        feature_id: Some("f1".into()),
        user_id: "u1".into(),
        session_id: "s1".into(),
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn agent_structured_reply_is_decoded() {
    let (gw, rec) = spawn_backend().await;

    let reply = gw.agent.ask(&agent_request("make it pop")).await.unwrap();
    assert_eq!(reply.text, "Add a title card?");
    assert_eq!(reply.video_url(), Some("https://cdn/v1.mp4"));
    assert_eq!(
        reply.metadata.as_ref().and_then(|m| m.text.as_deref()),
        Some("Hello")
    );

    let (_, body) = rec.last("agent");
    assert_eq!(body["query"], "make it pop");
    assert_eq!(body["user_id"], "u1");
    assert_eq!(body["session_id"], "s1");
    assert_eq!(body["feature_id"], "f1");
}

#[tokio::test]
async fn agent_json_encoded_string_is_decoded() {
    let (gw, _) = spawn_backend().await;

    let reply = gw.agent.ask(&agent_request("encoded")).await.unwrap();
    assert_eq!(reply.text, "Done");
    assert_eq!(reply.video_url(), Some("https://cdn/v2.mp4"));
}

#[tokio::test]
async fn agent_plain_text_becomes_text_only_reply() {
    let (gw, _) = spawn_backend().await;

    let reply = gw.agent.ask(&agent_request("plain")).await.unwrap();
    assert_eq!(reply.text, "Which clip do you mean?");
    assert!(reply.video_url().is_none());
    assert!(reply.is_question());
}

#[tokio::test]
async fn agent_server_error_surfaces_status_and_body() {
    let (gw, _) = spawn_backend().await;

    let err = gw.agent.ask(&agent_request("fail")).await.unwrap_err();
    assert_matches!(err, GatewayError::Api { status: 500, ref body } if body.contains("agent crashed"));
}

// ---------------------------------------------------------------------------
// Session store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_session_sends_only_present_fields() {
    let (gw, rec) = spawn_backend().await;

    let pk = gw
        .sessions
        .create(&NewSession {
            user_id: "u1".into(),
            session_id: "s1".into(),
            video_id: Some("vid-1".into()),
            video_url: Some("https://cdn/original.mp4".into()),
            feature_id: None,
        })
        .await
        .unwrap();
    assert_eq!(pk, 7);

    let (params, _) = rec.last("create");
    assert_eq!(params["user_id"], "u1");
    assert_eq!(params["session_id"], "s1");
    assert_eq!(params["video_url"], "https://cdn/original.mp4");
    assert!(!params.contains_key("feature_id"));
}

#[tokio::test]
async fn get_session_parses_naive_timestamps() {
    let (gw, _) = spawn_backend().await;

    let session = gw.sessions.get("u1", "s1").await.unwrap();
    assert_eq!(session.pk, 7);
    assert_eq!(session.session_id, "s1");
    assert!(session.updated_at_utc().is_some());
    assert!(session.state.is_some());
}

#[tokio::test]
async fn get_missing_session_is_api_error() {
    let (gw, _) = spawn_backend().await;

    let err = gw.sessions.get("u1", "missing").await.unwrap_err();
    assert_matches!(err, GatewayError::Api { status: 404, .. });
}

#[tokio::test]
async fn list_sessions_passes_filters() {
    let (gw, rec) = spawn_backend().await;

    let filter = SessionFilter {
        video_id: Some("vid-1".into()),
        feature_id: None,
    };
    let sessions = gw.sessions.list("u1", &filter).await.unwrap();
    assert_eq!(sessions.len(), 2);

    let (params, _) = rec.last("list");
    assert_eq!(params["video_id"], "vid-1");
    assert!(!params.contains_key("feature_id"));
}

#[tokio::test]
async fn update_state_wraps_blob_in_state_field() {
    let (gw, rec) = spawn_backend().await;

    let blob = json!({"messages": [{"role": "user", "text": "hi"}], "recommendations": []});
    gw.sessions.update_state("u1", "s1", &blob).await.unwrap();

    let (params, body) = rec.last("update");
    assert_eq!(params["session_id"], "s1");
    assert_eq!(body["state"], blob);
}

#[tokio::test]
async fn rename_and_delete_send_identifiers() {
    let (gw, rec) = spawn_backend().await;

    gw.sessions.rename("u1", "s1", "Holiday cut").await.unwrap();
    let (params, _) = rec.last("rename");
    assert_eq!(params["new_name"], "Holiday cut");

    gw.sessions.delete("u1", "s1").await.unwrap();
    let (params, _) = rec.last("delete");
    assert_eq!(params["session_id"], "s1");

    assert_eq!(gw.sessions.delete_all("u1").await.unwrap(), 3);
}

#[tokio::test]
async fn versions_are_sorted_ascending() {
    let (gw, rec) = spawn_backend().await;

    let id = gw
        .sessions
        .create_version(7, Some("https://cdn/v2.mp4"))
        .await
        .unwrap();
    assert_eq!(id, 42);
    let (params, _) = rec.last("version");
    assert_eq!(params["session_pk"], "7");
    assert_eq!(params["video_url"], "https://cdn/v2.mp4");

    let versions = gw.sessions.versions(7).await.unwrap();
    let numbers: Vec<i64> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![1, 2]);
}

// ---------------------------------------------------------------------------
// Edit queue and export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn edit_queue_snapshot_is_parsed() {
    let (gw, rec) = spawn_backend().await;

    let snapshot = gw.edit_queue.fetch("u1", "s1").await.unwrap();
    assert_eq!(snapshot.edits.len(), 2);
    assert_eq!(snapshot.active_count(), 1);
    assert_eq!(snapshot.edits[0].describe(), "Trim: 0.0s to 2.5s");

    let (params, _) = rec.last("edit-queue");
    assert_eq!(params["user_id"], "u1");
}

#[tokio::test]
async fn export_returns_public_url() {
    let (gw, rec) = spawn_backend().await;

    let url = gw.export.export("https://cdn/v2.mp4").await.unwrap();
    assert_eq!(url, "https://public/v2.mp4");

    let (_, body) = rec.last("export");
    assert_eq!(body["video_url"], "https://cdn/v2.mp4");
}

#[tokio::test]
async fn unreachable_service_is_request_error() {
    let config = GatewayConfig {
        api_url: "http://127.0.0.1:1/api".into(),
        export_url: "http://127.0.0.1:1/api".into(),
        agent_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
    };
    let gw = Gateways::from_config(&config);

    let err = gw.sessions.get("u1", "s1").await.unwrap_err();
    assert_matches!(err, GatewayError::Request(_));
}
