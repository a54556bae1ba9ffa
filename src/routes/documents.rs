//! Document API endpoints
//!
//! - `POST   /load`     load (or re-serve) a document into the cache
//! - `GET    /`         list cached documents
//! - `DELETE /`         clear the cache
//! - `POST   /unload`   drop one document
//! - `GET    /content`  extracted text
//! - `GET    /search`   substring or fuzzy search
//! - `GET    /analyze`  text statistics
//! - `GET    /info`     metadata without caching
//!
//! Documents are addressed by file path (`?path=` or a JSON `path` field).

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::document::{DocumentAnalysis, DocumentInfo, DocumentSummary, SearchResults};
use crate::error::{AppError, Result};
use crate::service::{ClearOutcome, ExtractedContent, LoadOutcome, UnloadOutcome};
use crate::state::AppState;

/// Maximum search results to prevent memory exhaustion
const MAX_SEARCH_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub path: String,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PathRequest {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: String,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub path: String,
    pub term: String,
    pub fuzzy: Option<bool>,
    pub max_results: Option<usize>,
}

/// Response for document list
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total: usize,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents).delete(clear_documents))
        .route("/load", post(load_document))
        .route("/unload", post(unload_document))
        .route("/content", get(get_content))
        .route("/search", get(search_document))
        .route("/analyze", get(analyze_document))
        .route("/info", get(get_info))
}

fn require_path(path: &str) -> Result<&str> {
    let path = path.trim();
    if path.is_empty() {
        return Err(AppError::BadRequest("path must not be empty".to_string()));
    }
    Ok(path)
}

async fn load_document(
    State(state): State<AppState>,
    Json(request): Json<LoadRequest>,
) -> Result<Json<LoadOutcome>> {
    let path = require_path(&request.path)?;
    tracing::debug!("Load requested for {}", path);
    let outcome = state.service().load(path, request.password).await?;
    Ok(Json(outcome))
}

async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let documents = state.service().get_loaded_documents();
    Json(DocumentListResponse {
        total: documents.len(),
        documents,
    })
}

async fn clear_documents(State(state): State<AppState>) -> Json<ClearOutcome> {
    Json(state.service().clear_all())
}

async fn unload_document(
    State(state): State<AppState>,
    Json(request): Json<PathRequest>,
) -> Result<Json<UnloadOutcome>> {
    let path = require_path(&request.path)?;
    Ok(Json(state.service().unload(path)?))
}

async fn get_content(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ExtractedContent>> {
    let path = require_path(&query.path)?;
    Ok(Json(state.service().extract_content(path)?))
}

async fn search_document(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>> {
    let path = require_path(&query.path)?;
    if query.term.trim().is_empty() {
        return Err(AppError::BadRequest("term must not be empty".to_string()));
    }
    let max_results = query.max_results.map(|n| n.clamp(1, MAX_SEARCH_LIMIT));

    let results = state
        .service()
        .search(path, &query.term, query.fuzzy, max_results)?;
    Ok(Json(results))
}

async fn analyze_document(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<DocumentAnalysis>> {
    let path = require_path(&query.path)?;
    Ok(Json(state.service().analyze(path)?))
}

async fn get_info(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<DocumentInfo>> {
    let path = require_path(&query.path)?;
    Ok(Json(state.service().document_info(path, query.password).await?))
}
