//! Knowledge-base routes.

use std::sync::Arc;

use application::{
    CreateKnowledgeBase, DeleteKnowledgeBase, KnowledgeBaseDto, MergeKnowledgeBases,
    MergeResultDto, UpdateKnowledgeBase,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::UnitOfWork;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateKnowledgeBaseRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateKnowledgeBaseRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub source_id: String,
    pub target_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetParams {
    #[serde(default)]
    pub include_documents: bool,
}

/// POST /api/v1/knowledge
pub async fn create<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Json(req): Json<CreateKnowledgeBaseRequest>,
) -> Result<(StatusCode, Json<KnowledgeBaseDto>), ApiError> {
    let dto = state
        .create_kb
        .handle(CreateKnowledgeBase {
            name: req.name,
            description: req.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

/// GET /api/v1/knowledge
pub async fn list<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
) -> Result<Json<Vec<KnowledgeBaseDto>>, ApiError> {
    Ok(Json(state.list_kbs.handle().await?))
}

/// GET /api/v1/knowledge/{id}
pub async fn get<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<String>,
    Query(params): Query<GetParams>,
) -> Result<Json<KnowledgeBaseDto>, ApiError> {
    Ok(Json(
        state.get_kb.handle(&id, params.include_documents).await?,
    ))
}

/// PUT /api/v1/knowledge/{id}
pub async fn update<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateKnowledgeBaseRequest>,
) -> Result<Json<KnowledgeBaseDto>, ApiError> {
    let dto = state
        .update_kb
        .handle(UpdateKnowledgeBase {
            id,
            name: req.name,
            description: req.description,
        })
        .await?;
    Ok(Json(dto))
}

/// DELETE /api/v1/knowledge/{id}
pub async fn delete<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.delete_kb.handle(DeleteKnowledgeBase { id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/knowledge/merge
pub async fn merge<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeResultDto>, ApiError> {
    let result = state
        .merge
        .handle(MergeKnowledgeBases {
            source_id: req.source_id,
            target_id: req.target_id,
        })
        .await?;
    Ok(Json(result))
}
