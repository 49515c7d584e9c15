// src/api/http/chatbot.rs

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::auth::CurrentUser;
use crate::chatbot::{
    ChatAnswer, DocumentQuestionRequest, HistoryMessage, HistoryParams, QuestionRequest,
};
use crate::state::AppState;

/// Nested under /api
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects/{project_id}/chat", post(ask_project))
        .route("/projects/{project_id}/chat/document", post(ask_document))
        .route("/projects/{project_id}/chat/history", get(project_history))
        .route("/chat", post(ask_global))
        .route("/chat/history", get(global_history))
}

async fn ask_project(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
    ApiJson(req): ApiJson<QuestionRequest>,
) -> ApiResult<Json<ChatAnswer>> {
    Ok(Json(
        state
            .chatbot_service
            .ask_project(&user, project_id, &req.question)
            .await?,
    ))
}

async fn ask_document(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
    ApiJson(req): ApiJson<DocumentQuestionRequest>,
) -> ApiResult<Json<ChatAnswer>> {
    Ok(Json(
        state
            .chatbot_service
            .ask_document(&user, project_id, &req.document_name, &req.question)
            .await?,
    ))
}

async fn project_history(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> ApiResult<Json<Vec<HistoryMessage>>> {
    Ok(Json(
        state
            .chatbot_service
            .project_history(&user, project_id, params.limit)
            .await?,
    ))
}

async fn ask_global(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<QuestionRequest>,
) -> ApiResult<Json<ChatAnswer>> {
    Ok(Json(state.chatbot_service.ask_global(&user, &req.question).await?))
}

async fn global_history(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> ApiResult<Json<Vec<HistoryMessage>>> {
    Ok(Json(state.chatbot_service.global_history(&user, params.limit).await?))
}
