use chrono::{DateTime, Utc};

use super::Ulid;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Session {
    /// The unique identifier for the session, used as the bearer token.
    pub id: Ulid,
    /// Foreign key to the user table.
    pub user_id: Ulid,
    /// The time the session expires.
    pub expires_at: DateTime<Utc>,
    /// The time the session was last used.
    pub last_used_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_expired_session_is_invalid() {
        let session = Session {
            expires_at: Utc::now() + Duration::hours(1),
            ..Default::default()
        };
        assert!(session.is_valid());

        let session = Session {
            expires_at: Utc::now() - Duration::seconds(1),
            ..Default::default()
        };
        assert!(!session.is_valid());
    }
}
