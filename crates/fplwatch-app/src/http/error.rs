// HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use fplwatch_core::FplError;

use super::dto::ErrorBody;

#[derive(Debug)]
pub enum AppError {
    /// Invalid path, query or body input.
    BadRequest(String),
    /// The upstream failed; `message` is what the client sees.
    Upstream {
        message: &'static str,
        source: FplError,
    },
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest(msg) => msg,
            AppError::Upstream { message, source } => {
                error!("{message}: {source}");
                message.to_string()
            }
            AppError::Internal(msg) => {
                error!("internal error: {msg}");
                msg
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// Attach the client-facing message for a route to an upstream failure.
pub trait UpstreamContext<T> {
    fn or_upstream(self, message: &'static str) -> Result<T, AppError>;
}

impl<T> UpstreamContext<T> for Result<T, FplError> {
    fn or_upstream(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|source| AppError::Upstream { message, source })
    }
}
