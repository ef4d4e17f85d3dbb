use axum::{Json, extract::State};
use chrono::Utc;
use serde::Deserialize;

use carecall_auth_types::identity::CallerIdentity;

use crate::domain::types::{LocalizedVariants, ResolvedTime};
use crate::error::CallsServiceError;
use crate::handlers::schedule::time_input;
use crate::state::AppState;
use crate::usecase::preview::{PreviewTimeUseCase, PreviewTranslationUseCase};

#[derive(Deserialize)]
pub struct PreviewTimeRequest {
    pub scheduled_at: Option<String>,
    pub time_text: Option<String>,
}

#[derive(Deserialize)]
pub struct PreviewTranslationRequest {
    #[serde(default)]
    pub message: String,
}

// ── POST /preview/time ───────────────────────────────────────────────────────

pub async fn preview_time(
    _identity: CallerIdentity,
    State(state): State<AppState>,
    Json(body): Json<PreviewTimeRequest>,
) -> Result<Json<ResolvedTime>, CallsServiceError> {
    let input = time_input(body.scheduled_at, body.time_text)?;
    let usecase = PreviewTimeUseCase {
        resolver: state.time_resolver(),
    };
    Ok(Json(usecase.execute(input, Utc::now()).await?))
}

// ── POST /preview/translation ────────────────────────────────────────────────

pub async fn preview_translation(
    _identity: CallerIdentity,
    State(state): State<AppState>,
    Json(body): Json<PreviewTranslationRequest>,
) -> Result<Json<LocalizedVariants>, CallsServiceError> {
    let usecase = PreviewTranslationUseCase {
        localizer: state.localizer(),
    };
    Ok(Json(usecase.execute(&body.message).await?))
}
