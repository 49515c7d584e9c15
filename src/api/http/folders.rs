// src/api/http/folders.rs

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::auth::CurrentUser;
use crate::folder::{CreateFolderRequest, FolderResponse};
use crate::state::AppState;

/// Nested under /api
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects/{project_id}/folders", get(root_folders))
        .route("/folders", post(create_folder))
        .route("/folders/{id}", get(get_folder).delete(delete_folder))
        .route("/folders/{id}/subfolders", get(subfolders))
        .route("/folders/{id}/path", get(folder_path))
}

async fn root_folders(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<FolderResponse>>> {
    Ok(Json(state.folder_service.root_folders(&user, project_id).await?))
}

async fn subfolders(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<FolderResponse>>> {
    Ok(Json(state.folder_service.subfolders(&user, id).await?))
}

async fn get_folder(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<FolderResponse>> {
    Ok(Json(state.folder_service.get(&user, id).await?))
}

async fn folder_path(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<FolderResponse>>> {
    Ok(Json(state.folder_service.path(&user, id).await?))
}

async fn create_folder(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateFolderRequest>,
) -> ApiResult<(StatusCode, Json<FolderResponse>)> {
    let folder = state.folder_service.create(&user, req).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

async fn delete_folder(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.folder_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
