//! Handlers for the HTTP channel.
//!
//! Every error body is `{"error": string}`. Caller identity comes from an
//! `Authorization: Bearer` header, an `access_token` field, or an explicit
//! `user_id`, in that order.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

use super::AppState;
use crate::router::RouteError;
use crate::search::SearchResult;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(super) struct ChatRequest {
    message: String,
    access_token: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct CallerParams {
    access_token: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchRequest {
    query: String,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "error": msg.to_string() }))).into_response()
}

fn route_error(e: RouteError) -> Response {
    let status = match e {
        RouteError::EmptyMessage => StatusCode::BAD_REQUEST,
        RouteError::Completion(_) => StatusCode::BAD_GATEWAY,
        RouteError::CompletionNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        RouteError::Internal(_) => {
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
        }
    };
    json_error(status, e)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn caller(state: &AppState, headers: &HeaderMap, token: Option<&str>, user_id: Option<&str>) -> String {
    let token = bearer(headers).or(token);
    state.identity.resolve(token, user_id).await
}

fn search_body(query: &str, results: Option<Vec<SearchResult>>) -> serde_json::Value {
    let results = results.unwrap_or_default();
    json!({ "query": query, "count": results.len(), "results": results })
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /
pub(super) async fn health(State(state): State<AppState>) -> Response {
    let router = &state.router;
    let body = json!({
        "service": &*state.service_name,
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "llm_configured": router.llm().is_some(),
        "knowledge_records": router.knowledge().len(),
        "active_conversations": router.conversations().active_count(),
        "web_fetches": router.web().network_fetches(),
        "search_backend": router.search().backend().name(),
        "rate_limit_per_minute": state.rate_limit_per_minute,
        "started_at": state.started_at.to_rfc3339(),
    });
    (StatusCode::OK, Json(body)).into_response()
}

/// POST /chat
pub(super) async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return json_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let user_id = caller(&state, &headers, req.access_token.as_deref(), req.user_id.as_deref()).await;

    let span = info_span!("turn", turn_id = %Uuid::new_v4(), user_id = %user_id);
    match state.router.handle(&user_id, &req.message).instrument(span).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => {
            warn!(%user_id, error = %e, "chat turn failed");
            route_error(e)
        }
    }
}

/// GET /conversation/context
pub(super) async fn conversation_context(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallerParams>,
) -> Response {
    let user_id = caller(&state, &headers, params.access_token.as_deref(), params.user_id.as_deref()).await;
    let snapshot = state.router.conversations().snapshot(&user_id);
    (StatusCode::OK, Json(snapshot)).into_response()
}

/// POST /conversation/clear: the body is optional.
pub(super) async fn conversation_clear(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        CallerParams::default()
    } else {
        match serde_json::from_slice::<CallerParams>(&body) {
            Ok(params) => params,
            Err(e) => return json_error(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}")),
        }
    };
    let user_id = caller(&state, &headers, params.access_token.as_deref(), params.user_id.as_deref()).await;
    let cleared = state.router.conversations().clear(&user_id);
    (StatusCode::OK, Json(json!({ "user_id": user_id, "cleared": cleared }))).into_response()
}

fn search_query(body: Result<Json<SearchRequest>, JsonRejection>) -> Result<String, Response> {
    let Json(req) = body.map_err(|rejection| json_error(StatusCode::BAD_REQUEST, rejection.body_text()))?;
    let query = req.query.trim();
    if query.is_empty() {
        return Err(json_error(StatusCode::BAD_REQUEST, "query must not be empty"));
    }
    Ok(query.to_string())
}

/// POST /search
pub(super) async fn search(State(state): State<AppState>, body: Result<Json<SearchRequest>, JsonRejection>) -> Response {
    let query = match search_query(body) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let results = state.router.search().smart_search(&query).await;
    (StatusCode::OK, Json(search_body(&query, results))).into_response()
}

/// POST /search/general
pub(super) async fn search_general(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let query = match search_query(body) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let results = state.router.search().general_search(&query).await;
    (StatusCode::OK, Json(search_body(&query, results))).into_response()
}

/// POST /search/knowledge: company-scoped results plus the knowledge
/// store's answer when the query names someone it knows.
pub(super) async fn search_knowledge(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let query = match search_query(body) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let router = &state.router;
    let knowledge_answer = router
        .knowledge()
        .find_entity_answer(&query, router.policy())
        .map(|hit| hit.record.answer.clone());
    let results = router.search().knowledge_search(&query).await;

    let mut body = search_body(&query, results);
    body["knowledge_answer"] = json!(knowledge_answer);
    (StatusCode::OK, Json(body)).into_response()
}

/// GET /sources
pub(super) async fn sources(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(json!({ "sources": state.router.company_urls() }))).into_response()
}
