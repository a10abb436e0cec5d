use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::{escape_like, param_ulid, parse_json_body, query_param, request_context};
use crate::api::error::{ApiError, Result};
use crate::database::{Capability, Category, Event, EventStatus, Lifecycle, Location, Participant, Ulid};
use crate::global::GlobalState;
use crate::http::ext::{RequestGlobalExt, ResultExt};
use crate::http::RouteError;
use crate::make_response;
use crate::pagination::Page;
use crate::slug::{slugify, unique_slugify, SlugError};

fn validation_error<S: AsRef<str>>(message: S) -> Response<Body> {
    make_response!(
        StatusCode::BAD_REQUEST,
        json!({ "message": message.as_ref(), "success": false })
    )
}

/// The console dashboard: every non-archived event bucketed by lifecycle
/// stage, plus the archive paginated. With a `title` query parameter it is a
/// substring search instead.
async fn list(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeEvent).await?;

    let now = Utc::now();
    let margin = global.live_margin();

    if let Some(title) = query_param(&req, "title").filter(|title| !title.is_empty()) {
        let pattern = format!("%{}%", escape_like(&title));

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE title ILIKE $1")
            .bind(&pattern)
            .fetch_one(&global.db)
            .await
            .map_err_route("failed to count events")?;

        if total == 0 {
            return Ok(validation_error(format!("No events found by that search ({})", title)));
        }

        let page = Page::resolve(total, global.config.events.page_size, query_param(&req, "page").as_deref());

        let events: Vec<Event> =
            sqlx::query_as("SELECT * FROM events WHERE title ILIKE $1 ORDER BY start_time DESC LIMIT $2 OFFSET $3")
                .bind(&pattern)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&global.db)
                .await
                .map_err_route("failed to fetch events")?;

        let events = events
            .iter()
            .map(|event| json!({ "event": event, "lifecycle": event.lifecycle(now, margin) }))
            .collect::<Vec<_>>();

        return Ok(make_response!(
            StatusCode::OK,
            json!({ "events": events, "page": page, "success": true })
        ));
    }

    let initiated: Vec<Event> = sqlx::query_as("SELECT * FROM events WHERE status = $1 ORDER BY start_time")
        .bind(EventStatus::Initiated)
        .fetch_all(&global.db)
        .await
        .map_err_route("failed to fetch initiated events")?;

    // Everything scheduled that has not reached the archive yet.
    let unarchived: Vec<Event> = sqlx::query_as(
        "SELECT * FROM events WHERE status = $1 AND (archive_time IS NULL OR archive_time > NOW() OR start_time > NOW()) \
         ORDER BY start_time",
    )
    .bind(EventStatus::Scheduled)
    .fetch_all(&global.db)
    .await
    .map_err_route("failed to fetch scheduled events")?;

    let mut upcoming = Vec::new();
    let mut live = Vec::new();
    let mut archiving = Vec::new();
    for event in unarchived {
        match event.lifecycle(now, margin) {
            Lifecycle::Upcoming => upcoming.push(event),
            Lifecycle::Live => live.push(event),
            Lifecycle::Archiving => archiving.push(event),
            Lifecycle::Initiated | Lifecycle::Archived => {}
        }
    }

    let archived_total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM events WHERE status = $1 AND archive_time <= NOW() AND start_time <= NOW()",
    )
    .bind(EventStatus::Scheduled)
    .fetch_one(&global.db)
    .await
    .map_err_route("failed to count archived events")?;

    let page = Page::resolve(archived_total, global.config.events.page_size, query_param(&req, "page").as_deref());

    let archived: Vec<Event> = sqlx::query_as(
        "SELECT * FROM events WHERE status = $1 AND archive_time <= NOW() AND start_time <= NOW() \
         ORDER BY archive_time DESC LIMIT $2 OFFSET $3",
    )
    .bind(EventStatus::Scheduled)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&global.db)
    .await
    .map_err_route("failed to fetch archived events")?;

    Ok(make_response!(
        StatusCode::OK,
        json!({
            "initiated": initiated,
            "upcoming": upcoming,
            "live": live,
            "archiving": archiving,
            "archived": archived,
            "page": page,
            "success": true,
        })
    ))
}

#[derive(serde::Deserialize)]
struct EventRequest {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    call_info: String,
    #[serde(default)]
    additional_links: String,
    /// Naive wall-clock time, interpreted in the location's timezone when a
    /// location is given, otherwise as UTC.
    start_time: NaiveDateTime,
    #[serde(default)]
    archive_time: Option<NaiveDateTime>,
    category_id: Ulid,
    #[serde(default)]
    location_id: Option<Ulid>,
    #[serde(default)]
    template_id: Option<Ulid>,
    #[serde(default)]
    public: bool,
    #[serde(default)]
    featured: bool,
    /// Comma-separated tag names, created on demand.
    #[serde(default)]
    tags: String,
    /// Exact participant names; unknown names reject the whole submission.
    #[serde(default)]
    participants: Vec<String>,
    #[serde(default)]
    status: Option<EventStatus>,
    /// Edit only: an explicit slug to move the event to.
    #[serde(default)]
    slug: Option<String>,
}

struct ResolvedRefs {
    start_time: DateTime<Utc>,
    archive_time: Option<DateTime<Utc>>,
    participant_ids: Vec<Ulid>,
    tag_names: Vec<String>,
}

async fn resolve_refs(
    global: &Arc<GlobalState>,
    body: &EventRequest,
) -> Result<std::result::Result<ResolvedRefs, String>> {
    let category: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
        .bind(body.category_id)
        .fetch_optional(&global.db)
        .await
        .map_err_route("failed to fetch category")?;

    if category.is_none() {
        return Ok(Err("Unknown category".to_string()));
    }

    let location = match body.location_id {
        Some(location_id) => {
            let location: Option<Location> = sqlx::query_as("SELECT * FROM locations WHERE id = $1")
                .bind(location_id)
                .fetch_optional(&global.db)
                .await
                .map_err_route("failed to fetch location")?;

            match location {
                Some(location) => Some(location),
                None => return Ok(Err("Unknown location".to_string())),
            }
        }
        None => None,
    };

    if let Some(template_id) = body.template_id {
        let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM templates WHERE id = $1")
            .bind(template_id)
            .fetch_one(&global.db)
            .await
            .map_err_route("failed to check template")?;

        if known == 0 {
            return Ok(Err("Unknown template".to_string()));
        }
    }

    let resolve_time = |naive: NaiveDateTime| match &location {
        Some(location) => location.resolve_local(naive).ok_or_else(|| {
            format!("{} is not a valid wall-clock time in {}", naive, location.timezone)
        }),
        None => Ok(Utc.from_utc_datetime(&naive)),
    };

    let start_time = match resolve_time(body.start_time) {
        Ok(start_time) => start_time,
        Err(message) => return Ok(Err(message)),
    };

    let archive_time = match body.archive_time.map(resolve_time).transpose() {
        Ok(archive_time) => archive_time,
        Err(message) => return Ok(Err(message)),
    };

    let mut participant_ids = Vec::new();
    for name in &body.participants {
        let participant: Option<Participant> = sqlx::query_as("SELECT * FROM participants WHERE name = $1")
            .bind(name)
            .fetch_optional(&global.db)
            .await
            .map_err_route("failed to fetch participant")?;

        match participant {
            Some(participant) => participant_ids.push(participant.id),
            None => return Ok(Err(format!("No participant by the name \"{}\"", name))),
        }
    }

    Ok(Ok(ResolvedRefs {
        start_time,
        archive_time,
        participant_ids,
        tag_names: crate::database::parse_tag_names(&body.tags),
    }))
}

/// Computes an event slug no live event and no retired slug holds. Collisions
/// are disambiguated with the start date before falling back to numeric
/// suffixes.
async fn free_event_slug(
    global: &Arc<GlobalState>,
    title: &str,
    start_time: DateTime<Utc>,
    exclude: Option<Ulid>,
) -> Result<std::result::Result<String, SlugError>> {
    let base = slugify(title);
    if base.is_empty() {
        return Ok(Err(SlugError::Empty));
    }

    let pattern = format!("{}%", escape_like(&base));

    let taken: Vec<String> = sqlx::query_scalar(
        "SELECT slug FROM events WHERE slug LIKE $1 AND ($2::uuid IS NULL OR id != $2) \
         UNION SELECT slug FROM event_old_slugs WHERE slug LIKE $1",
    )
    .bind(&pattern)
    .bind(exclude)
    .fetch_all(&global.db)
    .await
    .map_err_route("failed to fetch existing slugs")?;

    let discriminator = start_time.format("%Y%m%d").to_string();

    Ok(unique_slugify(title, Some(&discriminator), &taken.into_iter().collect::<HashSet<_>>()))
}

async fn slug_taken(global: &Arc<GlobalState>, slug: &str, exclude: Ulid) -> Result<bool> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM events WHERE slug = $1 AND id != $2 \
         UNION SELECT 1 FROM event_old_slugs WHERE slug = $1 AND event_id != $2)",
    )
    .bind(slug)
    .bind(exclude)
    .fetch_one(&global.db)
    .await
    .map_err_route("failed to check slug")
}

async fn attach_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event_id: Ulid,
    names: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM event_tags WHERE event_id = $1")
        .bind(event_id)
        .execute(&mut **tx)
        .await
        .map_err_route("failed to clear event tags")?;

    for name in names {
        // Get-or-create by name. The no-op update makes RETURNING work for
        // the existing row.
        let tag_id: Ulid = sqlx::query_scalar(
            "INSERT INTO tags (id, name) VALUES ($1, $2) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
        )
        .bind(Ulid::new())
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .map_err_route("failed to upsert tag")?;

        sqlx::query("INSERT INTO event_tags (event_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(event_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await
            .map_err_route("failed to attach tag")?;
    }

    Ok(())
}

async fn attach_participants(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event_id: Ulid,
    participant_ids: &[Ulid],
) -> Result<()> {
    sqlx::query("DELETE FROM event_participants WHERE event_id = $1")
        .bind(event_id)
        .execute(&mut **tx)
        .await
        .map_err_route("failed to clear event participants")?;

    for participant_id in participant_ids {
        sqlx::query(
            "INSERT INTO event_participants (event_id, participant_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(participant_id)
        .execute(&mut **tx)
        .await
        .map_err_route("failed to attach participant")?;
    }

    Ok(())
}

async fn create(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::AddEvent).await?;

    let body: EventRequest = parse_json_body(&mut req).await?;

    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Ok(validation_error("Event title must not be empty"));
    }

    let refs = match resolve_refs(&global, &body).await? {
        Ok(refs) => refs,
        Err(message) => return Ok(validation_error(message)),
    };

    let slug = match free_event_slug(&global, &title, refs.start_time, None).await? {
        Ok(slug) => slug,
        Err(err) => return Ok(validation_error(err.to_string())),
    };

    let status = body.status.unwrap_or(EventStatus::Initiated);

    let mut tx = global.db.begin().await.map_err_route("failed to begin transaction")?;

    let event: Event = match sqlx::query_as(
        "INSERT INTO events (id, title, slug, status, start_time, archive_time, description, call_info, \
         additional_links, category_id, location_id, template_id, public, featured, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW(), NOW()) RETURNING *",
    )
    .bind(Ulid::new())
    .bind(&title)
    .bind(&slug)
    .bind(status)
    .bind(refs.start_time)
    .bind(refs.archive_time)
    .bind(&body.description)
    .bind(&body.call_info)
    .bind(&body.additional_links)
    .bind(body.category_id)
    .bind(body.location_id)
    .bind(body.template_id)
    .bind(body.public)
    .bind(body.featured)
    .fetch_one(&mut *tx)
    .await
    {
        Ok(event) => event,
        // A concurrent submission can win the slug between computation and
        // insert; the unique index catches it.
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Ok(validation_error("Slug already in use, try again"));
        }
        Err(err) => {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "failed to create event", ApiError::Database(err)).into());
        }
    };

    attach_tags(&mut tx, event.id, &refs.tag_names).await?;
    attach_participants(&mut tx, event.id, &refs.participant_ids).await?;

    tx.commit().await.map_err_route("failed to commit transaction")?;

    Ok(make_response!(StatusCode::CREATED, json!({ "event": event, "success": true })))
}

async fn edit(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::ChangeEvent).await?;

    let id = param_ulid(&req, "id")?;
    let body: EventRequest = parse_json_body(&mut req).await?;

    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Ok(validation_error("Event title must not be empty"));
    }

    let existing: Option<Event> = sqlx::query_as("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(&global.db)
        .await
        .map_err_route("failed to fetch event")?;

    let Some(existing) = existing else {
        return Ok(make_response!(
            StatusCode::NOT_FOUND,
            json!({ "message": "Event not found", "success": false })
        ));
    };

    let refs = match resolve_refs(&global, &body).await? {
        Ok(refs) => refs,
        Err(message) => return Ok(validation_error(message)),
    };

    let slug = match &body.slug {
        Some(requested) => {
            let wanted = slugify(requested);
            if wanted.is_empty() {
                return Ok(validation_error("Requested slug is empty"));
            }

            if existing.slug.as_deref() != Some(&wanted) && slug_taken(&global, &wanted, id).await? {
                return Ok(validation_error(format!("Slug \"{}\" already in use", wanted)));
            }

            wanted
        }
        None => match &existing.slug {
            Some(slug) => slug.clone(),
            None => match free_event_slug(&global, &title, refs.start_time, Some(id)).await? {
                Ok(slug) => slug,
                Err(err) => return Ok(validation_error(err.to_string())),
            },
        },
    };

    let status = body.status.unwrap_or(existing.status);

    let mut tx = global.db.begin().await.map_err_route("failed to begin transaction")?;

    let event: Event = match sqlx::query_as(
        "UPDATE events SET title = $2, slug = $3, status = $4, start_time = $5, archive_time = $6, \
         description = $7, call_info = $8, additional_links = $9, category_id = $10, location_id = $11, \
         template_id = $12, public = $13, featured = $14, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&title)
    .bind(&slug)
    .bind(status)
    .bind(refs.start_time)
    .bind(refs.archive_time)
    .bind(&body.description)
    .bind(&body.call_info)
    .bind(&body.additional_links)
    .bind(body.category_id)
    .bind(body.location_id)
    .bind(body.template_id)
    .bind(body.public)
    .bind(body.featured)
    .fetch_one(&mut *tx)
    .await
    {
        Ok(event) => event,
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Ok(validation_error("Slug already in use, try again"));
        }
        Err(err) => {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "failed to update event", ApiError::Database(err)).into());
        }
    };

    // A slug change retires the previous slug so stale links keep resolving.
    if let Some(old_slug) = &existing.slug {
        if old_slug != &slug {
            sqlx::query("INSERT INTO event_old_slugs (slug, event_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(old_slug)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err_route("failed to record old slug")?;
        }
    }

    attach_tags(&mut tx, event.id, &refs.tag_names).await?;
    attach_participants(&mut tx, event.id, &refs.participant_ids).await?;

    tx.commit().await.map_err_route("failed to commit transaction")?;

    Ok(make_response!(StatusCode::OK, json!({ "event": event, "success": true })))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
    Router::builder()
        .get("/", list)
        .post("/", create)
        .post("/:id", edit)
        .build()
        .expect("failed to build router")
}
