use crate::services::gallery;
use crate::services::upload::PhotoError;
use crate::web::extractors::AdminAccess;
use crate::web::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use std::sync::Arc;

fn not_found(msg: &str) -> Response {
    let body = serde_json::json!({
        "error": "Not Found",
        "message": msg,
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "Internal server error"})),
    )
        .into_response()
}

/// GET /api/list
pub async fn list(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    match gallery::list_photos(state.catalog()) {
        Ok(photos) => {
            let base_url = state.base_url(&headers);
            Json(gallery::listing(photos, &base_url)).into_response()
        }
        Err(e) => {
            tracing::error!("API list error: {}", e);
            internal_error()
        }
    }
}

/// GET /api/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Response {
    match gallery::stats(state.catalog()) {
        Ok(stats) => Json(serde_json::json!({
            "total_photos": stats.count,
            "total_bytes": stats.total_bytes,
            "status": "active",
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("API stats error: {}", e);
            internal_error()
        }
    }
}

/// DELETE /api/photos/:filename
pub async fn delete_photo(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(filename): Path<String>,
) -> Response {
    let store = state.store.clone();
    let result = tokio::task::spawn_blocking(move || store.delete(&filename)).await;

    match result {
        Ok(Ok(_)) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(PhotoError::NotFound(name))) => not_found(&format!("Photo '{}' not found", name)),
        Ok(Err(e)) => {
            tracing::error!("API delete error: {}", e);
            internal_error()
        }
        Err(e) => {
            tracing::error!("API delete task failed: {}", e);
            internal_error()
        }
    }
}
