//! Webhook HTTP server built on axum.
//!
//! The webhook handler only authenticates and parses; reading work is handed
//! to the relay in the background, so the platform is acknowledged at once.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use relay_commands::{CommandParser, CommandRelay, Update};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Header carrying the secret registered with the platform.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Body of `GET /`.
pub const HOMEPAGE: &str = "Welcome to tairot agent homepage!";

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Relay receiving parsed commands.
    pub relay: CommandRelay,
    /// Recognizes reading commands in updates.
    pub parser: Arc<CommandParser>,
    /// Expected value of [`SECRET_HEADER`].
    pub secret: Arc<str>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("relay", &self.relay)
            .field("parser", &self.parser)
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl AppState {
    /// Creates handler state.
    pub fn new(relay: CommandRelay, parser: CommandParser, secret: impl Into<Arc<str>>) -> Self {
        Self {
            relay,
            parser: Arc::new(parser),
            secret: secret.into(),
        }
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|token| token == &*self.secret)
    }
}

/// Builds the router: homepage, health check and the webhook route.
pub fn router(webhook_path: &str, state: AppState) -> Router {
    Router::new()
        .route("/", get(homepage))
        .route("/health", get(health))
        .route(webhook_path, post(receive_update))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn homepage() -> &'static str {
    HOMEPAGE
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn receive_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.is_authorized(&headers) {
        warn!("Rejected webhook call with a missing or wrong secret token");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => match state.parser.parse(&update) {
            Some(request) => state.relay.dispatch(request),
            None => debug!(update_id = update.update_id, "Update carries no reading command"),
        },
        Err(e) => warn!("Ignoring malformed update: {}", e),
    }

    Json(json!({ "status": "ok" })).into_response()
}
