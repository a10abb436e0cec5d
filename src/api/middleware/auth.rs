use std::sync::Arc;

use hyper::http::header;
use hyper::Body;
use routerify::prelude::RequestExt;
use routerify::Middleware;

use crate::api::auth::{AuthData, AuthError};
use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::database::Ulid;
use crate::global::GlobalState;
use crate::http::ext::RequestGlobalExt;
use crate::http::RouteError;

/// Attaches a fresh [`RequestContext`] to every request and, when an
/// `Authorization` header is present, resolves it into auth data. Requests
/// without the header pass through unauthenticated; the capability checks in
/// the handlers reject them.
pub fn auth_middleware(_: &Arc<GlobalState>) -> Middleware<Body, RouteError<ApiError>> {
    Middleware::pre(|req| async move {
        let context = RequestContext::default();
        req.set_context(context.clone());

        let Some(token) = req.headers().get(header::AUTHORIZATION) else {
            // No Authorization header
            return Ok(req);
        };

        let global = req.get_global::<GlobalState>()?;

        // Tokens start with "Bearer " followed by the session id
        let token = token
            .to_str()
            .map_err(|_| AuthError::HeaderToStr)?
            .strip_prefix("Bearer ")
            .ok_or(AuthError::NotBearerToken)?;

        let session_id = token.parse::<Ulid>().map_err(|_| AuthError::InvalidToken)?;

        let data = AuthData::from_session_id(&global, session_id).await?;

        context.set_auth(data).await;

        Ok(req)
    })
}
