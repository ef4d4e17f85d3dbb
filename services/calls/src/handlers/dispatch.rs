use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;

use carecall_auth_types::identity::CallerIdentity;

use crate::error::CallsServiceError;
use crate::state::AppState;
use crate::usecase::dispatch::DispatchReport;
use crate::usecase::reminder::ReminderReport;

#[derive(Serialize)]
pub struct SweepResponse {
    pub schedules: DispatchReport,
    pub reminders: ReminderReport,
}

// ── POST /dispatch/run ───────────────────────────────────────────────────────

/// Run one dispatch sweep and one reminder sweep immediately. Operators only.
pub async fn run_dispatch(
    identity: CallerIdentity,
    State(state): State<AppState>,
) -> Result<Json<SweepResponse>, CallsServiceError> {
    if !identity.is_operator() {
        return Err(CallsServiceError::Forbidden);
    }

    let now = Utc::now();
    let schedules = state.dispatch_usecase().execute(now).await?;
    let reminders = state.reminder_usecase().execute(now).await?;
    tracing::info!(
        doctor_id = %identity.doctor_id,
        placed = schedules.placed,
        reminders_sent = reminders.sent,
        "manual sweep finished"
    );
    Ok(Json(SweepResponse {
        schedules,
        reminders,
    }))
}
