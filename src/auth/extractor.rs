// src/auth/extractor.rs
// Bearer-token authentication for handlers

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::models::Principal;
use crate::api::error::ApiError;
use crate::state::AppState;

/// The authenticated caller. Handlers that take this reject requests
/// without a valid access token with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let token = bearer_token(header).ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let principal = state
            .auth_service
            .authenticate(token)
            .await
            .map_err(ApiError::from)?;

        Ok(CurrentUser(principal))
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
