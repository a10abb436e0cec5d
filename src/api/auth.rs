use std::sync::Arc;

use hyper::StatusCode;

use super::error::ApiError;
use crate::database::{Capability, Group, Session, Ulid, User};
use crate::global::GlobalState;
use crate::http::RouteError;

#[derive(thiserror::Error, Debug, Clone)]
pub enum AuthError {
    #[error("token must be ascii only")]
    HeaderToStr,
    #[error("token must be a bearer token")]
    NotBearerToken,
    /// The user is not logged in
    #[error("not logged in")]
    NotLoggedIn,
    #[error("invalid token")]
    InvalidToken,
    #[error("staff access required")]
    NotStaff,
    #[error("missing capability: {0}")]
    MissingCapability(&'static str),
    #[error("failed to fetch auth data")]
    FetchFailed,
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotStaff | Self::MissingCapability(_) => StatusCode::FORBIDDEN,
            Self::FetchFailed => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<AuthError> for RouteError<ApiError> {
    #[track_caller]
    fn from(err: AuthError) -> Self {
        let status = err.status();
        let message = err.to_string();
        (status, message, ApiError::Auth(err)).into()
    }
}

/// The authenticated caller: their session, user record and the capability
/// set unioned from their groups.
#[derive(Clone)]
pub struct AuthData {
    pub session: Session,
    pub user: User,
    pub capabilities: Capability,
}

impl AuthData {
    pub async fn from_session_id(global: &Arc<GlobalState>, session_id: Ulid) -> Result<Self, AuthError> {
        // Fetching a session counts as using it.
        let session: Session = sqlx::query_as("UPDATE sessions SET last_used_at = NOW() WHERE id = $1 RETURNING *")
            .bind(session_id)
            .fetch_optional(&global.db)
            .await
            .map_err(|_| AuthError::FetchFailed)?
            .ok_or(AuthError::InvalidToken)?;

        if !session.is_valid() {
            return Err(AuthError::InvalidToken);
        }

        Self::from_session(global, session).await
    }

    pub async fn from_session(global: &Arc<GlobalState>, session: Session) -> Result<Self, AuthError> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(session.user_id)
            .fetch_optional(&global.db)
            .await
            .map_err(|_| AuthError::FetchFailed)?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::InvalidToken);
        }

        let groups: Vec<Group> = sqlx::query_as("SELECT * FROM groups WHERE id = ANY($1)")
            .bind(&user.group_ids)
            .fetch_all(&global.db)
            .await
            .map_err(|_| AuthError::FetchFailed)?;

        let mut capabilities = groups
            .iter()
            .fold(Capability::none(), |acc, group| acc.merge(group.capabilities));

        if user.is_superuser {
            capabilities = capabilities.merge(Capability::Admin);
        }

        Ok(Self {
            session,
            user,
            capabilities,
        })
    }

    /// Staff flag first, then the capability. Returns the 403 variants the
    /// route error handler turns into responses.
    pub fn require(&self, capability: Capability) -> Result<(), AuthError> {
        if !self.user.is_staff {
            return Err(AuthError::NotStaff);
        }

        if !self.capabilities.has_capability(capability) {
            let name = capability.names().first().copied().unwrap_or("unknown");
            return Err(AuthError::MissingCapability(name));
        }

        Ok(())
    }
}
