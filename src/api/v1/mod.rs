use std::sync::Arc;

use hyper::{Body, Request, StatusCode};
use routerify::Router;

use super::error::{ApiError, Result};
use crate::global::GlobalState;
use crate::http::ext::{OptionExt, ResultExt};
use crate::http::RouteError;

pub mod autocomplete;
pub mod categories;
pub mod events;
pub mod groups;
pub mod health;
pub mod locations;
pub mod participants;
pub mod templates;
pub mod users;

pub fn routes(global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
    Router::builder()
        .scope("/health", health::routes(global))
        .scope("/users", users::routes(global))
        .scope("/groups", groups::routes(global))
        .scope("/participants", participants::routes(global))
        .scope("/events", events::routes(global))
        .scope("/autocomplete", autocomplete::routes(global))
        .scope("/categories", categories::routes(global))
        .scope("/templates", templates::routes(global))
        .scope("/locations", locations::routes(global))
        .build()
        .expect("failed to build router")
}

fn find_query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub(crate) fn query_param(req: &Request<Body>, name: &str) -> Option<String> {
    find_query_param(req.uri().query().unwrap_or(""), name)
}

/// Escapes LIKE wildcards so user input only ever matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    input.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub(crate) async fn parse_json_body<T: serde::de::DeserializeOwned>(req: &mut Request<Body>) -> Result<T> {
    let body = hyper::body::to_bytes(req.body_mut())
        .await
        .map_err_route((StatusCode::BAD_REQUEST, "failed to read request body"))?;

    serde_json::from_slice(&body).map_err_route((StatusCode::BAD_REQUEST, "invalid json body"))
}

pub(crate) fn param_ulid(req: &Request<Body>, name: &str) -> Result<crate::database::Ulid> {
    use routerify::prelude::RequestExt;

    req.param(name)
        .map_err_route((StatusCode::BAD_REQUEST, "missing id"))?
        .parse()
        .ok()
        .map_err_route((StatusCode::BAD_REQUEST, "invalid id"))
}

pub(crate) fn request_context(req: &Request<Body>) -> Result<super::request_context::RequestContext> {
    use routerify::prelude::RequestExt;

    req.context::<super::request_context::RequestContext>()
        .map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "missing request context"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_query_param() {
        assert_eq!(find_query_param("page=2&name=foo", "page"), Some("2".to_string()));
        assert_eq!(find_query_param("q=jo%20smith", "q"), Some("jo smith".to_string()));
        assert_eq!(find_query_param("page=", "page"), Some("".to_string()));
        assert_eq!(find_query_param("", "page"), None);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
