/// Session-store primary keys are BIGSERIAL on the server side.
pub type SessionPk = i64;

/// Recommendations are identified by a UUID v4 rendered as a string so
/// persisted state blobs stay plain JSON.
pub type RecommendationId = String;

/// Edit-queue records carry server-assigned string ids.
pub type EditId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh recommendation id.
pub fn new_recommendation_id() -> RecommendationId {
    uuid::Uuid::new_v4().to_string()
}
