// src/api/http/mod.rs
// HTTP router composition

mod auth;
mod chatbot;
mod documents;
mod folders;
mod health;
mod projects;
mod users;

use axum::{Router, extract::DefaultBodyLimit, http::HeaderValue};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::server::ServerConfig;
use crate::state::AppState;

/// Headroom for multipart framing on top of the file size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the full application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.storage.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let cors = cors_layer(&state.config.server);

    let api_router = Router::new()
        .merge(users::routes())
        .merge(folders::routes())
        .merge(documents::routes())
        .merge(chatbot::routes());

    Router::new()
        .merge(health::routes())
        .merge(projects::routes())
        .nest("/auth", auth::routes())
        .nest("/api", api_router)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}
