// src/api/http/projects.rs
// Project CRUD and membership management

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::auth::CurrentUser;
use crate::page::Page;
use crate::project::{
    AddMemberRequest, CreateProjectRequest, ProjectListParams, ProjectMember, ProjectSummary,
    UpdateMemberRequest, UpdateProjectRequest,
};
use crate::state::AppState;
use crate::users::UserSummary;

/// Mounted at the root (`/projects`)
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route(
            "/projects/{id}/members",
            get(list_members).post(add_member),
        )
        .route("/projects/{id}/members/available", get(available_users))
        .route(
            "/projects/{id}/members/{user_id}",
            put(update_member).delete(remove_member),
        )
}

async fn list_projects(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<ProjectListParams>,
) -> ApiResult<Json<Page<ProjectSummary>>> {
    Ok(Json(state.project_service.list(&user, params).await?))
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectSummary>)> {
    let project = state.project_service.create(&user, req).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProjectSummary>> {
    Ok(Json(state.project_service.get(&user, id).await?))
}

async fn update_project(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectSummary>> {
    Ok(Json(state.project_service.update(&user, id, req).await?))
}

async fn delete_project(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.project_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_members(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<ProjectMember>>> {
    Ok(Json(state.project_service.members(&user, project_id).await?))
}

async fn add_member(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
    ApiJson(req): ApiJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<ProjectMember>)> {
    let member = state.project_service.add_member(&user, project_id, req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn update_member(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path((project_id, user_id)): Path<(i64, i64)>,
    ApiJson(req): ApiJson<UpdateMemberRequest>,
) -> ApiResult<Json<ProjectMember>> {
    Ok(Json(
        state
            .project_service
            .update_member(&user, project_id, user_id, req)
            .await?,
    ))
}

async fn remove_member(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path((project_id, user_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    state
        .project_service
        .remove_member(&user, project_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn available_users(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.project_service.available_users(&user, project_id).await?))
}
