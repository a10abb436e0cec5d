use chrono::{DateTime, Utc};

use super::Ulid;

/// A slug an event used to be published under. Old slugs are kept forever so
/// links to the event never break, and so a retired slug can never be handed
/// out to a different event.
#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize)]
pub struct EventOldSlug {
    pub slug: String,
    pub event_id: Ulid,
    pub created_at: DateTime<Utc>,
}
