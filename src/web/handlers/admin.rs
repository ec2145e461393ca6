use crate::services::upload::PhotoError;
use crate::web::error::AppResult;
use crate::web::flash::Flash;
use crate::web::state::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub admin_code: String,
    pub filename: String,
}

/// POST /admin/delete, submitted from the gallery's admin view.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<DeleteForm>,
) -> AppResult<Response> {
    if let Err(e) = state.gate.check_admin(Some(&form.admin_code)) {
        tracing::warn!("Admin delete denied: {}", e);
        return Ok(crate::web::extractors::forbidden(e));
    }

    let store = state.store.clone();
    let filename = form.filename.clone();
    let result = tokio::task::spawn_blocking(move || store.delete(&filename)).await?;

    let flash = match result {
        Ok(photo) => Flash::success(format!("Deleted '{}'.", photo.original_name)),
        Err(PhotoError::NotFound(_)) => Flash::error("Photo not found; it may already be deleted."),
        Err(e) => return Err(e.into()),
    };

    let jar = state.flash.set(jar, flash);
    Ok((jar, Redirect::to(&gallery_location(&form.admin_code))).into_response())
}

fn gallery_location(admin_code: &str) -> String {
    if admin_code.is_empty() {
        return "/".to_string();
    }
    let encoded: String = url::form_urlencoded::byte_serialize(admin_code.as_bytes()).collect();
    format!("/?admin={}", encoded)
}
