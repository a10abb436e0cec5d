use super::Ulid;

/// Joins an event to a participant appearing in it.
#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize)]
pub struct EventParticipant {
    pub event_id: Ulid,
    pub participant_id: Ulid,
}
