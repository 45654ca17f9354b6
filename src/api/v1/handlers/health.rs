/*
 * Responsibility
 * - GET /health (疎通用)
 * - admission / auth の外に置く (bucket を消費しない)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
