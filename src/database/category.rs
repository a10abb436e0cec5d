use super::Ulid;

/// Categories globally divide events, one category per event.
#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize)]
pub struct Category {
    pub id: Ulid,
    pub name: String,
}
