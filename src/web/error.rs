use crate::services::upload::PhotoError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.0.downcast_ref::<PhotoError>() {
            Some(PhotoError::NotFound(_)) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            Some(e) if e.is_client_error() => {
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            _ => {
                tracing::error!("Application error: {:?}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
