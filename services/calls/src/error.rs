use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use carecall_core::error::ErrorBody;

use crate::domain::time::ResolveTimeError;
use crate::domain::types::GatewayError;

/// Calls service error variants.
///
/// Messages of the string-carrying variants are shown to the caller verbatim, so they
/// should say what to fix (e.g. which env var is missing).
#[derive(Debug, thiserror::Error)]
pub enum CallsServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Provider(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("patient not found")]
    PatientNotFound,
    #[error("schedule not found")]
    ScheduleNotFound,
    #[error("call log not found")]
    CallLogNotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl CallsServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::PatientNotFound => "PATIENT_NOT_FOUND",
            Self::ScheduleNotFound => "SCHEDULE_NOT_FOUND",
            Self::CallLogNotFound => "CALL_LOG_NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::PatientNotFound | Self::ScheduleNotFound | Self::CallLogNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ResolveTimeError> for CallsServiceError {
    fn from(e: ResolveTimeError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<GatewayError> for CallsServiceError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Configuration(_) => Self::Configuration(e.to_string()),
            GatewayError::InvalidNumber(_) => Self::Validation(e.to_string()),
            GatewayError::Rejected { .. } | GatewayError::Unreachable(_) | GatewayError::Timeout(_) => {
                Self::Provider(e.to_string())
            }
        }
    }
}

impl IntoResponse for CallsServiceError {
    fn into_response(self) -> Response {
        // 4xx/5xx from providers are already logged where they happen; only the anyhow
        // chain of internal failures needs recording here.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        ErrorBody::new(self.kind(), self.to_string()).with_status(self.status())
    }
}
