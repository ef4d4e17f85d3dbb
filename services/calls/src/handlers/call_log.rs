use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carecall_auth_types::identity::CallerIdentity;
use carecall_domain::id::{CallLogId, PatientId, ScheduleId};
use carecall_domain::pagination::PageRequest;

use crate::domain::types::{CallLog, CallLogStatus, CallPurpose};
use crate::error::CallsServiceError;
use crate::state::AppState;
use crate::usecase::call_log::{GetCallLogUseCase, ListCallLogsUseCase};

#[derive(Serialize)]
pub struct CallLogResponse {
    pub id: CallLogId,
    pub provider_call_id: String,
    pub schedule_id: Option<ScheduleId>,
    pub patient_id: Option<PatientId>,
    pub purpose: CallPurpose,
    pub patient_name: String,
    pub phone: String,
    pub status: CallLogStatus,
    #[serde(serialize_with = "carecall_core::serde::to_rfc3339_ms_opt")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "carecall_core::serde::to_rfc3339_ms_opt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "carecall_core::serde::to_rfc3339_ms_opt")]
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i32>,
    pub ended_reason: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub recording_url: Option<String>,
    #[serde(serialize_with = "carecall_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<CallLog> for CallLogResponse {
    fn from(log: CallLog) -> Self {
        Self {
            id: log.id,
            provider_call_id: log.provider_call_id,
            schedule_id: log.schedule_id,
            patient_id: log.patient_id,
            purpose: log.purpose,
            patient_name: log.patient_name,
            phone: log.phone,
            status: log.status,
            scheduled_at: log.scheduled_at,
            started_at: log.started_at,
            ended_at: log.ended_at,
            duration_seconds: log.duration_seconds,
            ended_reason: log.ended_reason,
            transcript: log.transcript,
            summary: log.summary,
            recording_url: log.recording_url,
            created_at: log.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CallLogListQuery {
    pub patient_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

// ── GET /call-logs ───────────────────────────────────────────────────────────

pub async fn list_call_logs(
    identity: CallerIdentity,
    State(state): State<AppState>,
    Query(query): Query<CallLogListQuery>,
) -> Result<Json<Vec<CallLogResponse>>, CallsServiceError> {
    let usecase = ListCallLogsUseCase {
        call_logs: state.call_log_repo(),
    };
    let logs = usecase
        .execute(
            &identity,
            query.patient_id.map(PatientId),
            query.schedule_id.map(ScheduleId),
            PageRequest::new(query.per_page, query.page),
        )
        .await?;
    Ok(Json(logs.into_iter().map(Into::into).collect()))
}

// ── GET /call-logs/{id} ──────────────────────────────────────────────────────

pub async fn get_call_log(
    identity: CallerIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CallLogResponse>, CallsServiceError> {
    let usecase = GetCallLogUseCase {
        call_logs: state.call_log_repo(),
    };
    let log = usecase.execute(&identity, CallLogId(id)).await?;
    Ok(Json(log.into()))
}
