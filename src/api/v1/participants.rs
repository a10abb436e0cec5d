use std::collections::HashSet;
use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::{escape_like, param_ulid, parse_json_body, query_param, request_context};
use crate::api::error::{ApiError, Result};
use crate::database::{Capability, Clearance, Participant, ParticipantRole, Ulid};
use crate::global::GlobalState;
use crate::http::ext::{RequestGlobalExt, ResultExt};
use crate::http::RouteError;
use crate::make_response;
use crate::pagination::Page;
use crate::slug::{slugify, unique_slugify, SlugError};

async fn list(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeParticipant).await?;

    let search = query_param(&req, "name").filter(|name| !name.is_empty());

    let (participants, page) = if let Some(name) = &search {
        let pattern = format!("%{}%", escape_like(name));

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM participants WHERE name ILIKE $1")
            .bind(&pattern)
            .fetch_one(&global.db)
            .await
            .map_err_route("failed to count participants")?;

        if total == 0 {
            return Ok(make_response!(
                StatusCode::BAD_REQUEST,
                json!({ "message": format!("No participants found by that search ({})", name), "success": false })
            ));
        }

        let page = Page::resolve(total, global.config.events.page_size, query_param(&req, "page").as_deref());

        let participants: Vec<Participant> =
            sqlx::query_as("SELECT * FROM participants WHERE name ILIKE $1 ORDER BY name LIMIT $2 OFFSET $3")
                .bind(&pattern)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&global.db)
                .await
                .map_err_route("failed to fetch participants")?;

        (participants, page)
    } else {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM participants")
            .fetch_one(&global.db)
            .await
            .map_err_route("failed to count participants")?;

        let page = Page::resolve(total, global.config.events.page_size, query_param(&req, "page").as_deref());

        let participants: Vec<Participant> =
            sqlx::query_as("SELECT * FROM participants ORDER BY name LIMIT $1 OFFSET $2")
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&global.db)
                .await
                .map_err_route("failed to fetch participants")?;

        (participants, page)
    };

    Ok(make_response!(
        StatusCode::OK,
        json!({ "participants": participants, "page": page, "success": true })
    ))
}

#[derive(serde::Deserialize)]
struct ParticipantRequest {
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    department: String,
    #[serde(default)]
    team: String,
    #[serde(default)]
    irc: String,
    #[serde(default)]
    topic_url: String,
    #[serde(default)]
    blog_url: String,
    #[serde(default)]
    twitter: String,
    #[serde(default)]
    role: ParticipantRole,
    #[serde(default)]
    cleared: Clearance,
}

/// Computes a slug for the participant name that no other participant holds.
async fn free_slug(
    global: &Arc<GlobalState>,
    name: &str,
    exclude: Option<Ulid>,
) -> Result<std::result::Result<String, SlugError>> {
    let base = slugify(name);
    if base.is_empty() {
        return Ok(Err(SlugError::Empty));
    }

    let taken: Vec<String> = sqlx::query_scalar(
        "SELECT slug FROM participants WHERE slug LIKE $1 AND ($2::uuid IS NULL OR id != $2)",
    )
    .bind(format!("{}%", escape_like(&base)))
    .bind(exclude)
    .fetch_all(&global.db)
    .await
    .map_err_route("failed to fetch existing slugs")?;

    Ok(unique_slugify(name, None, &taken.into_iter().collect::<HashSet<_>>()))
}

async fn create(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::AddParticipant).await?;

    let body: ParticipantRequest = parse_json_body(&mut req).await?;

    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Ok(make_response!(
            StatusCode::BAD_REQUEST,
            json!({ "message": "Participant name must not be empty", "success": false })
        ));
    }

    let slug = match free_slug(&global, &name, None).await? {
        Ok(slug) => slug,
        Err(err) => {
            return Ok(make_response!(
                StatusCode::BAD_REQUEST,
                json!({ "message": err.to_string(), "success": false })
            ));
        }
    };

    let participant: Participant = sqlx::query_as(
        "INSERT INTO participants (id, name, slug, email, department, team, irc, topic_url, blog_url, twitter, role, cleared, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW(), NOW()) RETURNING *",
    )
    .bind(Ulid::new())
    .bind(&name)
    .bind(&slug)
    .bind(&body.email)
    .bind(&body.department)
    .bind(&body.team)
    .bind(&body.irc)
    .bind(&body.topic_url)
    .bind(&body.blog_url)
    .bind(&body.twitter)
    .bind(body.role)
    .bind(body.cleared)
    .fetch_one(&global.db)
    .await
    .map_err_route("failed to create participant")?;

    Ok(make_response!(
        StatusCode::CREATED,
        json!({ "participant": participant, "success": true })
    ))
}

async fn edit(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeParticipant).await?;

    let id = param_ulid(&req, "id")?;
    let body: ParticipantRequest = parse_json_body(&mut req).await?;

    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Ok(make_response!(
            StatusCode::BAD_REQUEST,
            json!({ "message": "Participant name must not be empty", "success": false })
        ));
    }

    let existing: Option<Participant> = sqlx::query_as("SELECT * FROM participants WHERE id = $1")
        .bind(id)
        .fetch_optional(&global.db)
        .await
        .map_err_route("failed to fetch participant")?;

    let Some(existing) = existing else {
        return Ok(make_response!(
            StatusCode::NOT_FOUND,
            json!({ "message": "Participant not found", "success": false })
        ));
    };

    // A participant keeps their slug once assigned.
    let slug = match existing.slug {
        Some(slug) => slug,
        None => match free_slug(&global, &name, Some(id)).await? {
            Ok(slug) => slug,
            Err(err) => {
                return Ok(make_response!(
                    StatusCode::BAD_REQUEST,
                    json!({ "message": err.to_string(), "success": false })
                ));
            }
        },
    };

    let participant: Participant = sqlx::query_as(
        "UPDATE participants SET name = $2, slug = $3, email = $4, department = $5, team = $6, irc = $7, \
         topic_url = $8, blog_url = $9, twitter = $10, role = $11, cleared = $12, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&name)
    .bind(&slug)
    .bind(&body.email)
    .bind(&body.department)
    .bind(&body.team)
    .bind(&body.irc)
    .bind(&body.topic_url)
    .bind(&body.blog_url)
    .bind(&body.twitter)
    .bind(body.role)
    .bind(body.cleared)
    .fetch_one(&global.db)
    .await
    .map_err_route("failed to update participant")?;

    Ok(make_response!(
        StatusCode::OK,
        json!({ "participant": participant, "success": true })
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
