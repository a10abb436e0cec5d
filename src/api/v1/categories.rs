use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::{parse_json_body, request_context};
use crate::api::error::{ApiError, Result};
use crate::database::{Capability, Category, Ulid};
use crate::global::GlobalState;
use crate::http::ext::{RequestGlobalExt, ResultExt};
use crate::http::RouteError;
use crate::make_response;

async fn list(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeCategory).await?;

    let categories: Vec<Category> = sqlx::query_as("SELECT * FROM categories ORDER BY name")
        .fetch_all(&global.db)
        .await
        .map_err_route("failed to fetch categories")?;

    Ok(make_response!(
        StatusCode::OK,
        json!({ "categories": categories, "success": true })
    ))
}

#[derive(serde::Deserialize)]
struct CategoryRequest {
    name: String,
}

async fn create(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeCategory).await?;

    let body: CategoryRequest = parse_json_body(&mut req).await?;

    let name = body.name.trim();
    if name.is_empty() {
        return Ok(make_response!(
            StatusCode::BAD_REQUEST,
            json!({ "message": "Category name must not be empty", "success": false })
        ));
    }

    let category: Category =
        match sqlx::query_as("INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING *")
            .bind(Ulid::new())
            .bind(name)
            .fetch_one(&global.db)
            .await
        {
            Ok(category) => category,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Ok(make_response!(
                    StatusCode::BAD_REQUEST,
                    json!({ "message": "Category name already in use", "success": false })
                ));
            }
            Err(err) => {
                return Err(
                    (StatusCode::INTERNAL_SERVER_ERROR, "failed to create category", ApiError::Database(err)).into(),
                );
            }
        };

    Ok(make_response!(
        StatusCode::CREATED,
        json!({ "category": category, "success": true })
    ))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
    Router::builder()
        .get("/", list)
        .post("/", create)
        .build()
        .expect("failed to build router")
}
