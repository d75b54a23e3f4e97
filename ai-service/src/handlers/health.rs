use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness endpoint. Never touches the AI provider.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "ai-service"
        })),
    )
}
