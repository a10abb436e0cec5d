use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::{param_ulid, parse_json_body, request_context};
use crate::api::error::{ApiError, Result};
use crate::database::{Capability, Group, Ulid};
use crate::global::GlobalState;
use crate::http::ext::{RequestGlobalExt, ResultExt};
use crate::http::RouteError;
use crate::make_response;

/// Groups carry their capabilities by name on the wire.
fn group_json(group: &Group) -> serde_json::Value {
    json!({
        "id": group.id,
        "name": group.name,
        "capabilities": group.capabilities.names(),
    })
}

fn parse_capabilities(names: &[String]) -> std::result::Result<Capability, String> {
    let mut capabilities = Capability::none();
    for name in names {
        let capability = Capability::from_name(name).ok_or_else(|| format!("Unknown capability: {}", name))?;
        capabilities = capabilities.merge(capability);
    }
    Ok(capabilities)
}

async fn list(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeGroup).await?;

    let groups: Vec<Group> = sqlx::query_as("SELECT * FROM groups ORDER BY name")
        .fetch_all(&global.db)
        .await
        .map_err_route("failed to fetch groups")?;

    Ok(make_response!(
        StatusCode::OK,
        json!({ "groups": groups.iter().map(group_json).collect::<Vec<_>>(), "success": true })
    ))
}

#[derive(serde::Deserialize)]
struct GroupRequest {
    name: String,
    #[serde(default)]
    capabilities: Vec<String>,
}

async fn create(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::AddGroup).await?;

    let body: GroupRequest = parse_json_body(&mut req).await?;

    if body.name.trim().is_empty() {
        return Ok(make_response!(
            StatusCode::BAD_REQUEST,
            json!({ "message": "Group name must not be empty", "success": false })
        ));
    }

    let capabilities = match parse_capabilities(&body.capabilities) {
        Ok(capabilities) => capabilities,
        Err(message) => {
            return Ok(make_response!(
                StatusCode::BAD_REQUEST,
                json!({ "message": message, "success": false })
            ));
        }
    };

    let group: Group =
        match sqlx::query_as("INSERT INTO groups (id, name, capabilities) VALUES ($1, $2, $3) RETURNING *")
            .bind(Ulid::new())
            .bind(body.name.trim())
            .bind(capabilities)
            .fetch_one(&global.db)
            .await
        {
            Ok(group) => group,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Ok(make_response!(
                    StatusCode::BAD_REQUEST,
                    json!({ "message": "Group name already in use", "success": false })
                ));
            }
            Err(err) => {
                return Err((StatusCode::INTERNAL_SERVER_ERROR, "failed to create group", ApiError::Database(err)).into());
            }
        };

    Ok(make_response!(
        StatusCode::CREATED,
        json!({ "group": group_json(&group), "success": true })
    ))
}

async fn edit(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeGroup).await?;

    let id = param_ulid(&req, "id")?;
    let body: GroupRequest = parse_json_body(&mut req).await?;

    if body.name.trim().is_empty() {
        return Ok(make_response!(
            StatusCode::BAD_REQUEST,
            json!({ "message": "Group name must not be empty", "success": false })
        ));
    }

    let capabilities = match parse_capabilities(&body.capabilities) {
        Ok(capabilities) => capabilities,
        Err(message) => {
            return Ok(make_response!(
                StatusCode::BAD_REQUEST,
                json!({ "message": message, "success": false })
            ));
        }
    };

    let group: Option<Group> =
        match sqlx::query_as("UPDATE groups SET name = $2, capabilities = $3 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(body.name.trim())
            .bind(capabilities)
            .fetch_optional(&global.db)
            .await
        {
            Ok(group) => group,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Ok(make_response!(
                    StatusCode::BAD_REQUEST,
                    json!({ "message": "Group name already in use", "success": false })
                ));
            }
            Err(err) => {
                return Err((StatusCode::INTERNAL_SERVER_ERROR, "failed to update group", ApiError::Database(err)).into());
            }
        };

    let Some(group) = group else {
        return Ok(make_response!(
            StatusCode::NOT_FOUND,
            json!({ "message": "Group not found", "success": false })
        ));
    };

    Ok(make_response!(
        StatusCode::OK,
        json!({ "group": group_json(&group), "success": true })
    ))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
    Router::builder()
        .get("/", list)
        .post("/", create)
        .post("/:id", edit)
        .build()
        .expect("failed to build router")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capabilities() {
        let capabilities =
            parse_capabilities(&["change_event".to_string(), "add_event".to_string()]).unwrap();
        assert!(capabilities.has_capability(Capability::ChangeEvent));
        assert!(capabilities.has_capability(Capability::AddEvent));
        assert!(!capabilities.has_capability(Capability::ChangeUser));

        assert_eq!(
            parse_capabilities(&["launch_rockets".to_string()]),
            Err("Unknown capability: launch_rockets".to_string())
        );
    }
}
