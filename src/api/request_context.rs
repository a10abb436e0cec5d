use std::sync::Arc;

use tokio::sync::RwLock;

use super::auth::{AuthData, AuthError};
use crate::database::Capability;

#[derive(Default)]
pub struct ContextData {
    pub auth: Option<AuthData>,
}

/// Per-request state shared between the auth middleware and the handlers via
/// routerify's context extension.
#[derive(Default, Clone)]
pub struct RequestContext(Arc<RwLock<ContextData>>);

impl RequestContext {
    pub async fn set_auth(&self, data: AuthData) {
        let mut guard = self.0.write().await;
        guard.auth = Some(data);
    }

    pub async fn auth(&self) -> Option<AuthData> {
        let guard = self.0.read().await;
        guard.auth.clone()
    }

    /// The authenticated caller, rejected unless they are staff and hold the
    /// given capability.
    pub async fn require(&self, capability: Capability) -> Result<AuthData, AuthError> {
        let auth = self.auth().await.ok_or(AuthError::NotLoggedIn)?;
        auth.require(capability)?;
        Ok(auth)
    }
}
