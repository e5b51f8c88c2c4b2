//! Error-to-HTTP response conversion.
//!
//! Bodies are deliberately generic for lookups: a 404 never says whether the
//! name was invalid or the file missing, and never contains a path.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for [`cs_core::Error`].
#[derive(Debug)]
pub struct AppError {
    inner: cs_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: cs_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

impl From<cs_core::Error> for AppError {
    fn from(e: cs_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let (code, message) = match &self.inner {
            cs_core::Error::NotFound { entity, .. } => ("not_found", format!("{entity} not found")),
            cs_core::Error::Config(_) => ("config_error", "server misconfigured".to_string()),
            cs_core::Error::Internal(_) => ("internal_error", "internal error".to_string()),
        };

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                request_id = self.request_id.as_deref().unwrap_or("-"),
                error = %self.inner,
                "Server error in handler"
            );
        } else {
            tracing::debug!(
                status = %status,
                request_id = self.request_id.as_deref().unwrap_or("-"),
                error = %self.inner,
                "Request rejected"
            );
        }

        let body = json!({
            "error": message,
            "code": code,
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
