//! Document routes.

use std::sync::Arc;

use application::{AddDocument, DocumentDto, RemoveDocument};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::UnitOfWork;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AddDocumentRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Comma-separated list of tags.
    pub tags: String,
}

/// POST /api/v1/knowledge/{id}/documents
pub async fn add<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<String>,
    Json(req): Json<AddDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentDto>), ApiError> {
    let dto = state
        .add_document
        .handle(AddDocument {
            knowledge_base_id: id,
            title: req.title,
            content: req.content,
            tags: req.tags,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

/// GET /api/v1/knowledge/{id}/documents
pub async fn list<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DocumentDto>>, ApiError> {
    Ok(Json(state.list_documents.handle(&id).await?))
}

/// DELETE /api/v1/knowledge/{id}/documents/{doc_id}
pub async fn remove<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path((id, doc_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .remove_document
        .handle(RemoveDocument {
            knowledge_base_id: id,
            document_id: doc_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/documents/search?tags=a,b
pub async fn search<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<DocumentDto>>, ApiError> {
    let tags: Vec<String> = params
        .tags
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();
    Ok(Json(state.search_documents.handle(&tags).await?))
}
