use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::{parse_json_body, request_context};
use crate::api::error::{ApiError, Result};
use crate::database::{validate_timezone, Capability, Location, Ulid};
use crate::global::GlobalState;
use crate::http::ext::{RequestGlobalExt, ResultExt};
use crate::http::RouteError;
use crate::make_response;

async fn list(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeEvent).await?;

    let locations: Vec<Location> = sqlx::query_as("SELECT * FROM locations ORDER BY name")
        .fetch_all(&global.db)
        .await
        .map_err_route("failed to fetch locations")?;

    Ok(make_response!(
        StatusCode::OK,
        json!({ "locations": locations, "success": true })
    ))
}

#[derive(serde::Deserialize)]
struct LocationRequest {
    name: String,
    #[serde(default)]
    address: String,
    timezone: String,
}

async fn create(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeEvent).await?;

    let body: LocationRequest = parse_json_body(&mut req).await?;

    let name = body.name.trim();
    if name.is_empty() {
        return Ok(make_response!(
            StatusCode::BAD_REQUEST,
            json!({ "message": "Location name must not be empty", "success": false })
        ));
    }

    if !validate_timezone(&body.timezone) {
        return Ok(make_response!(
            StatusCode::BAD_REQUEST,
            json!({ "message": format!("Unknown timezone ({})", body.timezone), "success": false })
        ));
    }

    let location: Location =
        match sqlx::query_as("INSERT INTO locations (id, name, address, timezone) VALUES ($1, $2, $3, $4) RETURNING *")
            .bind(Ulid::new())
            .bind(name)
            .bind(&body.address)
            .bind(&body.timezone)
            .fetch_one(&global.db)
            .await
        {
            Ok(location) => location,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Ok(make_response!(
                    StatusCode::BAD_REQUEST,
                    json!({ "message": "Location name already in use", "success": false })
                ));
            }
            Err(err) => {
                return Err(
                    (StatusCode::INTERNAL_SERVER_ERROR, "failed to create location", ApiError::Database(err)).into(),
                );
            }
        };

    Ok(make_response!(
        StatusCode::CREATED,
        json!({ "location": location, "success": true })
    ))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
    Router::builder()
        .get("/", list)
        .post("/", create)
        .build()
        .expect("failed to build router")
}
