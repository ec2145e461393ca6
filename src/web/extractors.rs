use crate::services::access::AccessError;
use crate::web::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub const ADMIN_CODE_HEADER: &str = "x-admin-code";

/// Admin access proven by the `X-Admin-Code` header or the `admin` query
/// parameter. Rejects with 403 when the gate denies it.
pub struct AdminAccess;

impl FromRequestParts<Arc<AppState>> for AdminAccess {
    type Rejection = Response;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let supplied = admin_code_from_parts(parts);
        let verdict = state.gate.check_admin(supplied.as_deref());
        Box::pin(async move {
            verdict.map(|()| AdminAccess).map_err(|e| {
                tracing::warn!("Admin request denied: {}", e);
                forbidden(e)
            })
        })
    }
}

/// Whether the request asks for JSON rather than an HTML page.
pub struct WantsJson(pub bool);

impl<S> FromRequestParts<S> for WantsJson
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let wants_json = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);
        Box::pin(async move { Ok(WantsJson(wants_json)) })
    }
}

fn admin_code_from_parts(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(ADMIN_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    from_header.or_else(|| {
        let query = parts.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "admin")
            .map(|(_, value)| value.into_owned())
    })
}

pub fn forbidden(error: AccessError) -> Response {
    let body = serde_json::json!({
        "error": "Forbidden",
        "message": error.to_string(),
    });
    (StatusCode::FORBIDDEN, Json(body)).into_response()
}
