//! Gateway-injected identity headers extractor.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

use carecall_domain::id::DoctorId;

pub const DOCTOR_ID_HEADER: &str = "x-carecall-doctor-id";
pub const ROLE_HEADER: &str = "x-carecall-role";

/// What the caller is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    /// Sees only their own patients.
    Doctor,
    /// Sees every patient and may run diagnostics (manual sweep, test calls).
    Operator,
}

impl CallerRole {
    fn from_header(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Doctor),
            1 => Some(Self::Operator),
            _ => None,
        }
    }
}

/// Caller identity injected by the gateway via `x-carecall-doctor-id` and `x-carecall-role`.
///
/// Returns 401 if either header is absent or malformed.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub doctor_id: DoctorId,
    pub role: CallerRole,
}

impl CallerIdentity {
    pub fn is_operator(&self) -> bool {
        self.role == CallerRole::Operator
    }

    /// Whether this caller may act on data owned by `owner`.
    pub fn can_access(&self, owner: DoctorId) -> bool {
        self.is_operator() || self.doctor_id == owner
    }
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // Header values are read synchronously so the returned future borrows nothing from `parts`.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let doctor_id = parts
            .headers
            .get(DOCTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<Uuid>().ok());

        let role = parts
            .headers
            .get(ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u8>().ok())
            .and_then(CallerRole::from_header);

        async move {
            let doctor_id = doctor_id.ok_or(StatusCode::UNAUTHORIZED)?;
            let role = role.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self {
                doctor_id: DoctorId(doctor_id),
                role,
            })
        }
    }
}
