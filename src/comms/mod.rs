//! Axum HTTP channel: the public surface of the assistant.
//!
//! ## URL layout
//!
//! ```text
//! GET  /                      health metadata
//! POST /chat                  one conversational turn
//! GET  /conversation/context  caller's conversation snapshot
//! POST /conversation/clear    drop the caller's conversation
//! POST /search                smart-scoped web search
//! POST /search/general        forced general search
//! POST /search/knowledge      forced company search + knowledge answer
//! GET  /sources               configured company URLs
//! ```
//!
//! The [`CancellationToken`] passed to [`serve`] is wired to axum's graceful
//! shutdown.

mod api;

use std::any::Any;
use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::AppError;
use crate::identity::IdentityResolver;
use crate::router::Router;

// ── Shared request state ──────────────────────────────────────────────────────

/// Injected into every handler via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub identity: Arc<IdentityResolver>,
    pub service_name: Arc<str>,
    pub rate_limit_per_minute: u32,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(router: Router, identity: IdentityResolver, config: &Config) -> Self {
        Self {
            router: Arc::new(router),
            identity: Arc::new(identity),
            service_name: Arc::from(config.service_name.as_str()),
            rate_limit_per_minute: config.http.rate_limit_per_minute,
            started_at: Utc::now(),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/",                     get(api::health))
        .route("/chat",                 post(api::chat))
        .route("/conversation/context", get(api::conversation_context))
        .route("/conversation/clear",   post(api::conversation_clear))
        .route("/search",               post(api::search))
        .route("/search/general",       post(api::search_general))
        .route("/search/knowledge",     post(api::search_knowledge))
        .route("/sources",              get(api::sources))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("request handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "internal server error" }))).into_response()
}

// ── Server loop ───────────────────────────────────────────────────────────────

pub async fn serve(bind_addr: &str, state: AppState, shutdown: CancellationToken) -> Result<(), AppError> {
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "http channel listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("server error: {e}")))?;

    info!("http channel shut down");
    Ok(())
}
