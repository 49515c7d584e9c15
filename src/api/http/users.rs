// src/api/http/users.rs

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::auth::CurrentUser;
use crate::page::{Page, PageParams};
use crate::state::AppState;
use crate::users::{
    CreateUserRequest, EmailCheckParams, Role, UpdateUserRequest, UserResponse, UserSearchParams,
};

/// Nested under /api
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/search", get(search_users))
        .route("/users/check-email", get(check_email))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/roles", get(list_roles))
        .route("/roles/{id}", get(get_role))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<UserResponse>>> {
    Ok(Json(state.user_service.list(&user, &params).await?))
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<UserSearchParams>,
) -> ApiResult<Json<Page<UserResponse>>> {
    let page = PageParams {
        page: params.page,
        size: params.size,
    };
    Ok(Json(state.user_service.search(&user, &params.query, &page).await?))
}

async fn check_email(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    ApiQuery(params): ApiQuery<EmailCheckParams>,
) -> ApiResult<Json<bool>> {
    Ok(Json(state.user_service.email_exists(&params.email).await?))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let created = state.user_service.create(&user, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(state.user_service.get(&user, id).await?))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(state.user_service.update(&user, id, req).await?))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.user_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_roles(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Role>>> {
    Ok(Json(state.user_service.roles(&user).await?))
}

async fn get_role(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Role>> {
    Ok(Json(state.user_service.role(&user, id).await?))
}
