//! Health and status endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::service::ServiceStatus;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Cache statistics, supported formats and password registration counts
pub async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(state.service().status())
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{get, send, test_app};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, body) = send(&app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_status_reports_configuration() {
        let app = test_app();
        let (status, body) = send(&app, get("/api/v1/status")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cache"]["documentCount"], 0);
        assert_eq!(body["cache"]["maxDocuments"], 50);
        assert_eq!(body["loadTimeoutSecs"], 30);
        assert!(body["supportedExtensions"]
            .as_array()
            .unwrap()
            .iter()
            .any(|ext| ext == "xlsx"));
    }
}
