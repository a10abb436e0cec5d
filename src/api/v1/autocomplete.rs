use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::{escape_like, query_param, request_context};
use crate::api::error::{ApiError, Result};
use crate::database::Capability;
use crate::global::GlobalState;
use crate::http::ext::{RequestGlobalExt, ResultExt};
use crate::http::RouteError;
use crate::make_response;

const MAX_SUGGESTIONS: usize = 5;

/// Suggestions for the tag widget: the raw query first (so a new tag can
/// always be created), then existing tags the query is a prefix of.
fn tag_suggestions(query: &str, candidates: &[String]) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let mut suggestions = vec![query.to_string()];
    suggestions.extend(
        candidates
            .iter()
            .filter(|name| {
                name.get(..query.len())
                    .map_or(false, |prefix| prefix.eq_ignore_ascii_case(query))
                    && !name.eq_ignore_ascii_case(query)
            })
            .take(MAX_SUGGESTIONS)
            .cloned(),
    );

    suggestions
}

/// Matches when the first whitespace-delimited token of the query prefixes
/// the candidate name at a word boundary, case-insensitively. A boundary is
/// the start of the name or any position following a non-alphanumeric
/// character, so "jo" finds "Mary-Jo Smith" but not "Banjo Player".
fn participant_matches(query: &str, name: &str) -> bool {
    let Some(token) = query.split_whitespace().next() else {
        return false;
    };

    let prefix_at = |start: usize| {
        name.get(start..start + token.len())
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case(token))
    };

    prefix_at(0)
        || name
            .char_indices()
            .filter(|(_, c)| !c.is_alphanumeric())
            .any(|(idx, c)| prefix_at(idx + c.len_utf8()))
}

fn participant_suggestions(query: &str, candidates: &[String]) -> Vec<String> {
    candidates
        .iter()
        .filter(|name| participant_matches(query, name))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

fn suggestion_response(suggestions: Vec<String>) -> Response<Body> {
    let entries = suggestions
        .iter()
        .map(|name| json!({ "id": name, "text": name }))
        .collect::<Vec<_>>();

    make_response!(StatusCode::OK, json!({ "results": entries, "success": true }))
}

async fn tags(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::AddEvent).await?;

    let query = query_param(&req, "q").unwrap_or_default();
    if query.trim().is_empty() {
        return Ok(suggestion_response(Vec::new()));
    }

    // The exact match is excluded here so it cannot eat one of the five
    // suggestion slots; the query itself is always the first entry anyway.
    let candidates: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM tags WHERE name ILIKE $1 AND lower(name) != lower($2) ORDER BY name LIMIT $3",
    )
    .bind(format!("{}%", escape_like(query.trim())))
    .bind(query.trim())
    .bind(MAX_SUGGESTIONS as i64)
    .fetch_all(&global.db)
    .await
    .map_err_route("failed to fetch tags")?;

    Ok(suggestion_response(tag_suggestions(&query, &candidates)))
}

async fn participants(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global::<GlobalState>()?;
    let context = request_context(&req)?;
    context.require(Capability::AddEvent).await?;

    let query = query_param(&req, "q").unwrap_or_default();
    let Some(token) = query.split_whitespace().next() else {
        return Ok(suggestion_response(Vec::new()));
    };

    // Substring fetch over-selects; the word-boundary filter happens here.
    let candidates: Vec<String> = sqlx::query_scalar("SELECT name FROM participants WHERE name ILIKE $1 ORDER BY name")
        .bind(format!("%{}%", escape_like(token)))
        .fetch_all(&global.db)
        .await
        .map_err_route("failed to fetch participants")?;

    Ok(suggestion_response(participant_suggestions(&query, &candidates)))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
    Router::builder()
        .get("/tags", tags)
        .get("/participants", participants)
        .build()
        .expect("failed to build router")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tag_query_always_first() {
        let suggestions = tag_suggestions("moz", &names(&["mozilla", "firefox"]));
        assert_eq!(suggestions, vec!["moz", "mozilla"]);
    }

    #[test]
    fn test_tag_exact_match_not_duplicated() {
        let suggestions = tag_suggestions("rust", &names(&["rust", "rustc"]));
        assert_eq!(suggestions, vec!["rust", "rustc"]);
    }

    #[test]
    fn test_tag_exact_match_does_not_eat_a_slot() {
        // Five distinct tags besides the exact match still all fit.
        let candidates = names(&["rust-async", "rust-belt", "rust-lang", "rust-sec", "rust-wasm"]);
        let suggestions = tag_suggestions("rust", &candidates);
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS + 1);
        assert_eq!(suggestions[0], "rust");
    }

    #[test]
    fn test_tag_prefix_is_case_insensitive() {
        let suggestions = tag_suggestions("MOZ", &names(&["mozilla"]));
        assert_eq!(suggestions, vec!["MOZ", "mozilla"]);
    }

    #[test]
    fn test_tag_empty_query() {
        assert!(tag_suggestions("  ", &names(&["mozilla"])).is_empty());
    }

    #[test]
    fn test_participant_word_boundary() {
        assert!(participant_matches("jo smith", "John Smith"));
        assert!(!participant_matches("jo smith", "Anjolina Smith"));
        assert!(participant_matches("smith", "John Smith"));
    }

    #[test]
    fn test_participant_boundary_is_not_just_whitespace() {
        // Hyphens and other punctuation start a new word too.
        assert!(participant_matches("jo smith", "Mary-Jo Smith"));
        assert!(participant_matches("neil", "Lukas O'Neil"));
        assert!(!participant_matches("jo", "Banjo Player"));
    }

    #[test]
    fn test_participant_suggestions_capped() {
        let candidates = names(&["Jo A", "Jo B", "Jo C", "Jo D", "Jo E", "Jo F"]);
        assert_eq!(participant_suggestions("jo", &candidates).len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn test_participant_empty_query() {
        assert!(participant_suggestions("   ", &names(&["John Smith"])).is_empty());
    }
}
