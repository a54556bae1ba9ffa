//! Password registration endpoints
//!
//! Passwords are accepted but never echoed back or logged; responses only
//! carry registration counts.

use std::collections::HashMap;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::password::RegistrationCounts;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExactRequest {
    pub path: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PatternRequest {
    pub pattern: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub passwords: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub root_dir: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub registered: usize,
    pub requested: usize,
    pub totals: RegistrationCounts,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/exact", post(register_exact))
        .route("/pattern", post(register_pattern))
        .route("/bulk", post(bulk_register))
        .route("/detect", post(auto_detect))
}

fn response(state: &AppState, registered: usize, requested: usize) -> Json<RegistrationResponse> {
    Json(RegistrationResponse {
        registered,
        requested,
        totals: state.service().passwords().registration_counts(),
    })
}

async fn register_exact(
    State(state): State<AppState>,
    Json(request): Json<ExactRequest>,
) -> Result<Json<RegistrationResponse>> {
    if request.path.trim().is_empty() {
        return Err(AppError::BadRequest("path must not be empty".to_string()));
    }
    state
        .service()
        .passwords()
        .register_exact(request.path.trim(), request.password);
    Ok(response(&state, 1, 1))
}

async fn register_pattern(
    State(state): State<AppState>,
    Json(request): Json<PatternRequest>,
) -> Result<Json<RegistrationResponse>> {
    state
        .service()
        .passwords()
        .register_pattern(&request.pattern, request.password)?;
    Ok(response(&state, 1, 1))
}

async fn bulk_register(
    State(state): State<AppState>,
    Json(request): Json<BulkRequest>,
) -> Json<RegistrationResponse> {
    let requested = request.passwords.len();
    let registered = state.service().passwords().bulk_register(request.passwords);
    response(&state, registered, requested)
}

async fn auto_detect(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<RegistrationResponse>> {
    let root = std::path::Path::new(request.root_dir.trim());
    if !root.is_dir() {
        return Err(AppError::BadRequest(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    // Directory walks can be slow on large trees
    let service_state = state.clone();
    let root_owned = root.to_path_buf();
    let detected = tokio::task::spawn_blocking(move || {
        service_state.service().passwords().auto_detect(&root_owned)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?;

    Ok(response(&state, detected, detected))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{json, send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_register_exact_and_pattern() {
        let app = test_app();

        let (status, body) = send(
            &app,
            json("POST", "/api/v1/passwords/exact", json!({ "path": "/a/b.pdf", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["exact"], 1);
        assert!(body.get("password").is_none());

        let (status, body) = send(
            &app,
            json("POST", "/api/v1/passwords/pattern", json!({ "pattern": "**/*.xlsx", "password": "y" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["patterns"], 1);
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_bad_request() {
        let app = test_app();
        let (status, body) = send(
            &app,
            json("POST", "/api/v1/passwords/pattern", json!({ "pattern": "/a/[b", "password": "y" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_pattern");
    }

    #[tokio::test]
    async fn test_bulk_counts_partial_success() {
        let app = test_app();
        let (status, body) = send(
            &app,
            json(
                "POST",
                "/api/v1/passwords/bulk",
                json!({ "passwords": { "/a.pdf": "1", "/b/[x": "2", "/c/*.docx": "3" } }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["registered"], 2);
        assert_eq!(body["requested"], 3);
    }

    #[tokio::test]
    async fn test_detect_sidecars() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".password"), "s3cret").unwrap();
        let app = test_app();

        let (status, body) = send(
            &app,
            json(
                "POST",
                "/api/v1/passwords/detect",
                json!({ "root_dir": dir.path().to_string_lossy() }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["registered"], 1);

        let (status, _) = send(
            &app,
            json("POST", "/api/v1/passwords/detect", json!({ "root_dir": "/no/such/dir" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
