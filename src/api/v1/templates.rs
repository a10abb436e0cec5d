use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::{parse_json_body, request_context};
use crate::api::error::{ApiError, Result};
use crate::database::{Capability, Template, Ulid};
use crate::global::GlobalState;
use crate::http::ext::{RequestGlobalExt, ResultExt};
use crate::http::RouteError;
use crate::make_response;

async fn list(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeEvent).await?;

    let templates: Vec<Template> = sqlx::query_as("SELECT * FROM templates ORDER BY name")
        .fetch_all(&global.db)
        .await
        .map_err_route("failed to fetch templates")?;

    Ok(make_response!(
        StatusCode::OK,
        json!({ "templates": templates, "success": true })
    ))
}

#[derive(serde::Deserialize)]
struct TemplateRequest {
    name: String,
    #[serde(default)]
    content: String,
}

async fn create(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeEvent).await?;

    let body: TemplateRequest = parse_json_body(&mut req).await?;

    let name = body.name.trim();
    if name.is_empty() {
        return Ok(make_response!(
            StatusCode::BAD_REQUEST,
            json!({ "message": "Template name must not be empty", "success": false })
        ));
    }

    let template: Template =
        match sqlx::query_as("INSERT INTO templates (id, name, content) VALUES ($1, $2, $3) RETURNING *")
            .bind(Ulid::new())
            .bind(name)
            .bind(&body.content)
            .fetch_one(&global.db)
            .await
        {
            Ok(template) => template,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Ok(make_response!(
                    StatusCode::BAD_REQUEST,
                    json!({ "message": "Template name already in use", "success": false })
                ));
            }
            Err(err) => {
                return Err(
                    (StatusCode::INTERNAL_SERVER_ERROR, "failed to create template", ApiError::Database(err)).into(),
                );
            }
        };

    Ok(make_response!(
        StatusCode::CREATED,
        json!({ "template": template, "success": true })
    ))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
    Router::builder()
        .get("/", list)
        .post("/", create)
        .build()
        .expect("failed to build router")
}
