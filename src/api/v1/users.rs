use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::{param_ulid, parse_json_body, query_param, request_context};
use crate::api::error::{ApiError, Result};
use crate::database::{Capability, Ulid, User};
use crate::global::GlobalState;
use crate::http::ext::{RequestGlobalExt, ResultExt};
use crate::http::RouteError;
use crate::make_response;
use crate::pagination::Page;

async fn list(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeUser).await?;

    // Email lookup is case-insensitive exact, not a substring search.
    if let Some(email) = query_param(&req, "email").filter(|email| !email.is_empty()) {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(&email)
            .fetch_optional(&global.db)
            .await
            .map_err_route("failed to fetch user")?;

        let Some(user) = user else {
            return Ok(make_response!(
                StatusCode::BAD_REQUEST,
                json!({ "message": format!("No user found by that email ({})", email), "success": false })
            ));
        };

        return Ok(make_response!(StatusCode::OK, json!({ "users": [user], "success": true })));
    }

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&global.db)
        .await
        .map_err_route("failed to count users")?;

    let page = Page::resolve(total, global.config.events.page_size, query_param(&req, "page").as_deref());

    let users: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY email LIMIT $1 OFFSET $2")
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&global.db)
        .await
        .map_err_route("failed to fetch users")?;

    Ok(make_response!(
        StatusCode::OK,
        json!({ "users": users, "page": page, "success": true })
    ))
}

/// Duplicate submitted ids would throw the existence count off, so the set
/// is collapsed before validation and storage.
fn distinct_ids(ids: &[Ulid]) -> Vec<Ulid> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids.dedup();
    ids
}

#[derive(serde::Deserialize)]
struct EditUserRequest {
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    group_ids: Vec<Ulid>,
}

async fn edit(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeUser).await?;

    let id = param_ulid(&req, "id")?;
    let body: EditUserRequest = parse_json_body(&mut req).await?;

    let group_ids = distinct_ids(&body.group_ids);

    let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups WHERE id = ANY($1)")
        .bind(&group_ids)
        .fetch_one(&global.db)
        .await
        .map_err_route("failed to check groups")?;

    if known as usize != group_ids.len() {
        return Ok(make_response!(
            StatusCode::BAD_REQUEST,
            json!({ "message": "One or more groups do not exist", "success": false })
        ));
    }

    let user: Option<User> = sqlx::query_as(
        "UPDATE users SET is_active = $2, is_staff = $3, is_superuser = $4, group_ids = $5 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(body.is_active)
    .bind(body.is_staff)
    .bind(body.is_superuser)
    .bind(&group_ids)
    .fetch_optional(&global.db)
    .await
    .map_err_route("failed to update user")?;

    let Some(user) = user else {
        return Ok(make_response!(
            StatusCode::NOT_FOUND,
            json!({ "message": "User not found", "success": false })
        ));
    };

    Ok(make_response!(StatusCode::OK, json!({ "user": user, "success": true })))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
    Router::builder()
        .get("/", list)
        .post("/:id", edit)
        .build()
        .expect("failed to build router")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_ids_collapses_duplicates() {
        let a = Ulid::new();
        let b = Ulid::new();

        let distinct = distinct_ids(&[a, b, a, a]);
        assert_eq!(distinct.len(), 2);
        assert!(distinct.contains(&a));
        assert!(distinct.contains(&b));

        assert!(distinct_ids(&[]).is_empty());
    }
}
