use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carecall_auth_types::identity::CallerIdentity;
use carecall_domain::id::{PatientId, ScheduleId};
use carecall_domain::pagination::PageRequest;

use crate::domain::types::{CallSchedule, LocalizedVariants, ScheduleStatus};
use crate::error::CallsServiceError;
use crate::state::AppState;
use crate::usecase::schedule::{
    CancelScheduleUseCase, CreateScheduleInput, CreateScheduleUseCase, GetScheduleUseCase,
    ListSchedulesUseCase,
};
use crate::usecase::time::TimeInput;

// ── Request / response types ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateScheduleRequest {
    pub patient_id: Option<Uuid>,
    /// ISO timestamp; takes precedence over `time_text`.
    pub scheduled_at: Option<String>,
    /// Free text such as "tomorrow 9 am".
    pub time_text: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Pick the time input from the two optional request fields.
pub(crate) fn time_input(
    scheduled_at: Option<String>,
    time_text: Option<String>,
) -> Result<TimeInput, CallsServiceError> {
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    match (non_blank(scheduled_at), non_blank(time_text)) {
        (Some(at), _) => Ok(TimeInput::Explicit(at)),
        (None, Some(text)) => Ok(TimeInput::Phrase(text)),
        (None, None) => Err(CallsServiceError::Validation(
            "scheduled_at or time_text is required".to_owned(),
        )),
    }
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    pub id: ScheduleId,
    pub patient_id: PatientId,
    pub doctor_id: Uuid,
    #[serde(serialize_with = "carecall_core::serde::to_rfc3339_ms")]
    pub scheduled_at: chrono::DateTime<Utc>,
    pub time_label: String,
    pub message: String,
    pub source_language: String,
    pub localized_variants: LocalizedVariants,
    pub status: ScheduleStatus,
    pub provider_call_id: Option<String>,
    #[serde(serialize_with = "carecall_core::serde::to_rfc3339_ms_opt")]
    pub completed_at: Option<chrono::DateTime<Utc>>,
    pub error_message: Option<String>,
    #[serde(serialize_with = "carecall_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<Utc>,
    #[serde(serialize_with = "carecall_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<CallSchedule> for ScheduleResponse {
    fn from(s: CallSchedule) -> Self {
        Self {
            id: s.id,
            patient_id: s.patient_id,
            doctor_id: s.doctor_id.0,
            scheduled_at: s.scheduled_at,
            time_label: s.time_label,
            message: s.message,
            source_language: s.source_language,
            localized_variants: s.localized_variants,
            status: s.status,
            provider_call_id: s.provider_call_id,
            completed_at: s.completed_at,
            error_message: s.error_message,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ScheduleListQuery {
    pub patient_id: Option<Uuid>,
    pub status: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

// ── POST /schedules ──────────────────────────────────────────────────────────

pub async fn create_schedule(
    identity: CallerIdentity,
    State(state): State<AppState>,
    Json(body): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), CallsServiceError> {
    let patient_id = body
        .patient_id
        .ok_or_else(|| CallsServiceError::Validation("patient_id is required".to_owned()))?;
    let time = time_input(body.scheduled_at, body.time_text)?;

    let usecase = CreateScheduleUseCase {
        schedules: state.schedule_repo(),
        patients: state.patient_directory(),
        resolver: state.time_resolver(),
        localizer: state.localizer(),
        default_country_code: state.config.default_country_code.clone(),
    };
    let schedule = usecase
        .execute(
            &identity,
            CreateScheduleInput {
                patient_id: PatientId(patient_id),
                time,
                message: body.message,
            },
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(schedule.into())))
}

// ── GET /schedules ───────────────────────────────────────────────────────────

pub async fn list_schedules(
    identity: CallerIdentity,
    State(state): State<AppState>,
    Query(query): Query<ScheduleListQuery>,
) -> Result<Json<Vec<ScheduleResponse>>, CallsServiceError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ScheduleStatus>)
        .transpose()
        .map_err(CallsServiceError::Validation)?;
    let page = PageRequest::new(query.per_page, query.page);

    let usecase = ListSchedulesUseCase {
        schedules: state.schedule_repo(),
    };
    let schedules = usecase
        .execute(&identity, query.patient_id.map(PatientId), status, page)
        .await?;
    Ok(Json(schedules.into_iter().map(Into::into).collect()))
}

// ── GET /schedules/{id} ──────────────────────────────────────────────────────

pub async fn get_schedule(
    identity: CallerIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleResponse>, CallsServiceError> {
    let usecase = GetScheduleUseCase {
        schedules: state.schedule_repo(),
    };
    let schedule = usecase.execute(&identity, ScheduleId(id)).await?;
    Ok(Json(schedule.into()))
}

// ── POST /schedules/{id}/cancel ──────────────────────────────────────────────

pub async fn cancel_schedule(
    identity: CallerIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleResponse>, CallsServiceError> {
    let usecase = CancelScheduleUseCase {
        schedules: state.schedule_repo(),
    };
    let schedule = usecase
        .execute(&identity, ScheduleId(id), Utc::now())
        .await?;
    Ok(Json(schedule.into()))
}
