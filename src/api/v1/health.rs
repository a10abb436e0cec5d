use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use crate::api::error::{ApiError, Result};
use crate::global::GlobalState;
use crate::http::RouteError;
use crate::make_response;

async fn health(_: Request<Body>) -> Result<Response<Body>> {
    Ok(make_response!(
        StatusCode::OK,
        json!({
            "status": "ok"
        })
    ))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
    Router::builder()
        .get("/", health)
        .build()
        .expect("failed to build router")
}
