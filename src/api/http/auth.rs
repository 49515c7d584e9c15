// src/api/http/auth.rs

use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::auth::{CurrentUser, JwtAuthResponse, LoginRequest, TokenRefreshRequest};
use crate::state::AppState;

/// Nested under /auth
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .route("/logout", post(logout_handler))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<JwtAuthResponse>> {
    Ok(Json(state.auth_service.login(req).await?))
}

async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<TokenRefreshRequest>,
) -> ApiResult<Json<JwtAuthResponse>> {
    Ok(Json(state.auth_service.refresh(req).await?))
}

async fn logout_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Json<Value> {
    state.auth_service.logout(&user);
    Json(json!({ "message": "Logged out successfully" }))
}
