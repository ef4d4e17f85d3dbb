use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// JSON error body returned by every service: `{"kind": "...", "message": "..."}`.
///
/// Services keep their own error enums and render through this so clients see one shape.
#[derive(Debug, Clone, ::serde::Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn with_status(self, status: StatusCode) -> Response {
        (status, axum::Json(self)).into_response()
    }
}
