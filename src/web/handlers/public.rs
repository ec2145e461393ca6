use crate::services::access::{AccessError, AccessGate};
use crate::services::storage::{self, StorageError};
use crate::services::upload::IncomingFile;
use crate::services::{gallery, qr};
use crate::web::error::AppResult;
use crate::web::extractors::WantsJson;
use crate::web::flash::Flash;
use crate::web::state::AppState;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum_extra::extract::CookieJar;
use rust_embed::RustEmbed;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tera::Context;

#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

fn page_context(state: &AppState, headers: &HeaderMap, flash: Option<Flash>) -> Context {
    let config = &state.config;
    let mut ctx = Context::new();
    ctx.insert("site", &config.site.title);
    ctx.insert("base_url", &state.base_url(headers));
    ctx.insert("max_upload_mb", &config.upload.max_upload_size_mb);
    ctx.insert(
        "allowed_extensions",
        state.store.validator().allowed_extensions(),
    );
    ctx.insert("version", env!("CARGO_PKG_VERSION"));
    if let Some(flash) = flash {
        ctx.insert("flash", &flash);
    }
    ctx
}

#[derive(Deserialize)]
pub struct GalleryQuery {
    pub admin: Option<String>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GalleryQuery>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<Response> {
    let (jar, flash) = state.flash.take(jar);
    let photos = gallery::list_photos(state.catalog())?;
    let stats = gallery::stats(state.catalog())?;

    let mut ctx = page_context(&state, &headers, flash);
    ctx.insert("photos", &photos);
    ctx.insert("stats", &stats);
    if let Some(code) = query.admin.as_deref() {
        if state.gate.check_admin(Some(code)).is_ok() {
            ctx.insert("admin_code", code);
        }
    }

    let html = state.templates.render("index.html", &ctx)?;
    Ok((jar, Html(html)).into_response())
}

pub async fn upload_form(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<Response> {
    let (jar, flash) = state.flash.take(jar);
    let mut ctx = page_context(&state, &headers, flash);
    ctx.insert("upload_code_required", &state.gate.upload_required());
    ctx.insert("accept", &state.store.validator().accept_attribute());

    let html = state.templates.render("upload.html", &ctx)?;
    Ok((jar, Html(html)).into_response())
}

/// Fields of one multipart submission. Files are only buffered up to the
/// per-file limit; larger ones are drained and kept as size-only entries.
struct UploadForm {
    files: Vec<IncomingFile>,
    uploader_name: Option<String>,
}

enum FormError {
    Multipart(MultipartError),
    Denied(AccessError),
}

impl From<MultipartError> for FormError {
    fn from(e: MultipartError) -> Self {
        FormError::Multipart(e)
    }
}

/// The upload code is checked as soon as it is read. When a code is
/// required it must precede the first file, so a refused request stops
/// before any file data is buffered.
async fn read_upload_form(
    mut multipart: Multipart,
    gate: &AccessGate,
    max_bytes: u64,
) -> Result<UploadForm, FormError> {
    let mut form = UploadForm {
        files: Vec::new(),
        uploader_name: None,
    };
    let mut code_accepted = !gate.upload_required();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("files") | Some("file") => {
                if !code_accepted {
                    return Err(FormError::Denied(AccessError::Missing));
                }
                let original_name = field.file_name().unwrap_or_default().to_string();
                if original_name.is_empty() {
                    // Browsers send an empty part when nothing was chosen.
                    continue;
                }
                form.files.push(read_file(field, original_name, max_bytes).await?);
            }
            Some("name") => form.uploader_name = Some(field.text().await?),
            Some("code") => {
                let code = field.text().await?;
                gate.check_upload(Some(&code)).map_err(FormError::Denied)?;
                code_accepted = true;
            }
            _ => {}
        }
    }

    if !code_accepted {
        return Err(FormError::Denied(AccessError::Missing));
    }
    Ok(form)
}

async fn read_file(mut field: Field<'_>, original_name: String, max_bytes: u64) -> Result<IncomingFile, MultipartError> {
    let mut data = Vec::new();
    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        size += chunk.len() as u64;
        if size <= max_bytes {
            data.extend_from_slice(&chunk);
        } else if !data.is_empty() {
            data = Vec::new();
        }
    }

    if size > max_bytes {
        Ok(IncomingFile::oversized(original_name, size))
    } else {
        Ok(IncomingFile::new(original_name, data))
    }
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    WantsJson(wants_json): WantsJson,
    jar: CookieJar,
    multipart: Multipart,
) -> AppResult<Response> {
    let max_bytes = state.store.validator().max_bytes();
    let form = match read_upload_form(multipart, &state.gate, max_bytes).await {
        Ok(form) => form,
        Err(FormError::Denied(e)) => {
            tracing::warn!("Upload rejected: {}", e);
            return Ok(upload_denied(&state, jar, e, wants_json));
        }
        Err(FormError::Multipart(e)) => {
            tracing::warn!("Malformed upload request: {}", e);
            return Ok((e.status(), e.body_text()).into_response());
        }
    };

    if form.files.is_empty() {
        if wants_json {
            let body = serde_json::json!({ "error": "No files selected" });
            return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
        }
        let jar = state.flash.set(jar, Flash::error("No files selected."));
        return Ok((jar, Redirect::to("/upload")).into_response());
    }

    let store = state.store.clone();
    let UploadForm {
        files,
        uploader_name,
    } = form;
    let report = tokio::task::spawn_blocking(move || {
        store.save_batch(files, uploader_name.as_deref())
    })
    .await?;

    tracing::info!(
        "Upload finished: {} saved, {} rejected",
        report.saved.len(),
        report.rejected.len()
    );

    if wants_json {
        return Ok(Json(report).into_response());
    }

    let flash = if report.saved.is_empty() {
        Flash::error(report.summary())
    } else {
        Flash::success(report.summary())
    };
    let jar = state.flash.set(jar, flash);
    Ok((jar, Redirect::to("/")).into_response())
}

fn upload_denied(state: &AppState, jar: CookieJar, error: AccessError, wants_json: bool) -> Response {
    if wants_json {
        return crate::web::extractors::forbidden(error);
    }
    let message = match error {
        AccessError::Missing => "Please enter the upload code.",
        AccessError::Incorrect => "Wrong code.",
    };
    let jar = state.flash.set(jar, Flash::error(message));
    (jar, Redirect::to("/upload")).into_response()
}

pub async fn serve_original(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let path = state.store.paths().original_path(&filename);
    serve_file(path, state.store.paths().upload_dir()).await
}

pub async fn serve_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let path = state.store.paths().thumbnail_path(&filename);
    serve_file(path, state.store.paths().thumb_dir()).await
}

async fn serve_file(path: Result<PathBuf, StorageError>, root: &std::path::Path) -> AppResult<Response> {
    // Invalid names never reach the filesystem.
    let Ok(file_path) = path else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let Some(canonical_file) = storage::resolve_within(root, &file_path) else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let content = match tokio::fs::read(&canonical_file).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(StatusCode::NOT_FOUND.into_response())
        }
        Err(e) => return Err(e.into()),
    };
    let mime = mime_guess::from_path(&file_path).first_or_octet_stream();

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        content,
    )
        .into_response())
}

pub async fn qr_png(State(state): State<Arc<AppState>>, headers: HeaderMap) -> AppResult<Response> {
    let target = qr::upload_url(&state.base_url(&headers));
    let png = qr::render_png(&target)?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        png,
    )
        .into_response())
}

pub async fn static_asset(Path(path): Path<String>) -> Response {
    match StaticAssets::get(&path) {
        Some(file) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.to_string())],
                file.data.into_owned(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
