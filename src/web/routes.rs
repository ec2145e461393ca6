use super::handlers;
use super::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;

pub fn public_routes(max_request_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::public::index))
        .route(
            "/upload",
            get(handlers::public::upload_form)
                .post(handlers::public::upload)
                .layer(DefaultBodyLimit::max(max_request_bytes)),
        )
        .route("/uploads/:filename", get(handlers::public::serve_original))
        .route("/thumbs/:filename", get(handlers::public::serve_thumbnail))
        .route("/qr.png", get(handlers::public::qr_png))
        .route("/static/*path", get(handlers::public::static_asset))
        .route("/favicon.ico", get(handlers::public::favicon))
        .route("/healthz", get(handlers::public::healthz))
}

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/list", get(handlers::api::list))
        .route("/api/stats", get(handlers::api::stats))
        .route("/api/photos/:filename", delete(handlers::api::delete_photo))
}

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new().route("/admin/delete", post(handlers::admin::delete))
}
