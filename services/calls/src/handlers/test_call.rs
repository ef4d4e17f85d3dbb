use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use carecall_auth_types::identity::CallerIdentity;
use carecall_domain::id::CallLogId;

use crate::error::CallsServiceError;
use crate::state::AppState;
use crate::usecase::test_call::{PlaceTestCallInput, PlaceTestCallUseCase};

fn default_record_log() -> bool {
    true
}

#[derive(Deserialize)]
pub struct TestCallRequest {
    pub phone: String,
    #[serde(default)]
    pub patient_name: String,
    pub message: String,
    #[serde(default = "default_record_log")]
    pub record_log: bool,
}

#[derive(Serialize)]
pub struct TestCallResponse {
    pub provider_call_id: String,
    pub phone: String,
    pub call_log_id: Option<CallLogId>,
}

// ── POST /calls/test ─────────────────────────────────────────────────────────

pub async fn place_test_call(
    identity: CallerIdentity,
    State(state): State<AppState>,
    Json(body): Json<TestCallRequest>,
) -> Result<(StatusCode, Json<TestCallResponse>), CallsServiceError> {
    if !identity.is_operator() {
        return Err(CallsServiceError::Forbidden);
    }

    let usecase = PlaceTestCallUseCase {
        call_logs: state.call_log_repo(),
        gateway: state.voice.clone(),
        source_language: state.config.localizer.source_language.clone(),
        default_country_code: state.config.default_country_code.clone(),
        call_timeout: state.config.dispatcher.call_timeout,
    };
    let result = usecase
        .execute(
            PlaceTestCallInput {
                phone: body.phone,
                patient_name: body.patient_name,
                message: body.message,
                record_log: body.record_log,
            },
            Utc::now(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TestCallResponse {
            provider_call_id: result.provider_call_id,
            phone: result.phone.as_str().to_owned(),
            call_log_id: result.call_log_id,
        }),
    ))
}
