// src/api/http/documents.rs
// Multipart uploads, version history and downloads

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, State, multipart::Field},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::api::error::{ApiError, ApiResult};
use crate::auth::CurrentUser;
use crate::document::{DocumentResponse, NewDocument, UploadedFile, VersionResponse};
use crate::state::AppState;

/// Nested under /api
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects/{project_id}/documents", get(project_documents))
        .route("/projects/{project_id}/reindex", post(reindex_project))
        .route("/folders/{id}/documents", get(folder_documents))
        .route("/documents", post(upload_document))
        .route("/documents/{id}", get(get_document).delete(delete_document))
        .route("/documents/{id}/versions", get(list_versions).post(add_version))
        .route("/documents/{id}/download", get(download_document))
}

async fn project_documents(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<DocumentResponse>>> {
    Ok(Json(state.document_service.project_documents(&user, project_id).await?))
}

async fn folder_documents(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(folder_id): Path<i64>,
) -> ApiResult<Json<Vec<DocumentResponse>>> {
    Ok(Json(state.document_service.folder_documents(&user, folder_id).await?))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<DocumentResponse>> {
    Ok(Json(state.document_service.get(&user, id).await?))
}

async fn upload_document(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<DocumentResponse>)> {
    let mut upload = NewDocument {
        name: String::new(),
        project_id: None,
        folder_id: None,
        file: None,
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => upload.name = field.text().await?,
            "projectId" => upload.project_id = parse_id("projectId", &field.text().await?)?,
            "folderId" => upload.folder_id = parse_id("folderId", &field.text().await?)?,
            "file" => upload.file = Some(read_file(field).await?),
            _ => {}
        }
    }

    let document = state.document_service.upload(&user, upload).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn add_version(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<DocumentResponse>)> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            file = Some(read_file(field).await?);
        }
    }

    let document = state.document_service.add_version(&user, id, file).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn list_versions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<VersionResponse>>> {
    Ok(Json(state.document_service.versions(&user, id).await?))
}

async fn download_document(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let file = state.document_service.download(&user, id).await?;

    let content_type = HeaderValue::from_str(&file.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    let body = Body::from_stream(ReaderStream::new(file.file));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(file.size)),
        ],
        body,
    )
        .into_response())
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.document_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reindex_project(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let reindexed = state.indexer.reindex_project(&user, project_id).await?;
    Ok(Json(json!({ "reindexed": reindexed })))
}

async fn read_file(field: Field<'_>) -> ApiResult<UploadedFile> {
    let filename = field.file_name().unwrap_or("file").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;

    Ok(UploadedFile {
        filename,
        content_type,
        bytes: bytes.to_vec(),
    })
}

/// Blank form values count as absent
fn parse_id(field: &str, value: &str) -> ApiResult<Option<i64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("Invalid {}: {}", field, value)))
}
