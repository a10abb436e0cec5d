use chrono::{DateTime, Utc};

use super::Ulid;

#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Ulid,
    /// The email of the user, used as the lookup key in the console.
    pub email: String,
    /// Whether the account is active. Inactive users cannot authenticate.
    pub is_active: bool,
    /// Whether the user may access the management console at all.
    pub is_staff: bool,
    /// Superusers hold every capability implicitly.
    pub is_superuser: bool,
    /// The groups the user belongs to.
    pub group_ids: Vec<Ulid>,
    /// The time the user was created.
    pub created_at: DateTime<Utc>,
    /// The time the user last logged in.
    pub last_login_at: DateTime<Utc>,
}
