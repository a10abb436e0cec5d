use super::Ulid;

/// Joins an event to one of its tags.
#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize)]
pub struct EventTag {
    pub event_id: Ulid,
    pub tag_id: Ulid,
}
