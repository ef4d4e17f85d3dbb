use chrono::{DateTime, Utc};

use carecall_auth_types::identity::CallerIdentity;
use carecall_domain::id::{PatientId, ScheduleId};
use carecall_domain::pagination::PageRequest;
use carecall_domain::phone::PhoneNumber;

use crate::domain::repository::{LanguageModel, PatientDirectory, ScheduleRepository};
use crate::domain::types::{CallSchedule, ScheduleFilter, ScheduleStatus};
use crate::error::CallsServiceError;
use crate::usecase::localize::MessageLocalizer;
use crate::usecase::time::{TimeInput, TimeResolver};

// ── CreateSchedule ───────────────────────────────────────────────────────────

pub struct CreateScheduleInput {
    pub patient_id: PatientId,
    pub time: TimeInput,
    pub message: String,
}

pub struct CreateScheduleUseCase<S: ScheduleRepository, P: PatientDirectory, L: LanguageModel> {
    pub schedules: S,
    pub patients: P,
    pub resolver: TimeResolver<L>,
    pub localizer: MessageLocalizer<L>,
    pub default_country_code: String,
}

impl<S, P, L> CreateScheduleUseCase<S, P, L>
where
    S: ScheduleRepository,
    P: PatientDirectory,
    L: LanguageModel,
{
    pub async fn execute(
        &self,
        caller: &CallerIdentity,
        input: CreateScheduleInput,
        now: DateTime<Utc>,
    ) -> Result<CallSchedule, CallsServiceError> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(CallsServiceError::Validation(
                "message must not be empty".to_owned(),
            ));
        }

        let patient = self
            .patients
            .find_contact(input.patient_id)
            .await?
            .filter(|p| caller.can_access(p.doctor_id))
            .ok_or(CallsServiceError::PatientNotFound)?;

        let phone = patient.phone_on_file().ok_or_else(|| {
            CallsServiceError::Validation("patient has no phone number on file".to_owned())
        })?;
        PhoneNumber::normalize(phone, &self.default_country_code).map_err(|e| {
            CallsServiceError::Validation(format!("patient phone number is invalid: {e}"))
        })?;

        let resolved = self.resolver.resolve(&input.time, now).await?;
        let localized_variants = self.localizer.localize(message).await;

        let schedule = CallSchedule {
            id: ScheduleId::generate(),
            patient_id: patient.id,
            doctor_id: patient.doctor_id,
            scheduled_at: resolved.at,
            time_label: resolved.label,
            message: message.to_owned(),
            source_language: self.localizer.config.source_language.clone(),
            localized_variants,
            status: ScheduleStatus::Pending,
            claimed_at: None,
            provider_call_id: None,
            completed_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        self.schedules.create(&schedule).await?;

        tracing::info!(
            schedule_id = %schedule.id,
            patient_id = %schedule.patient_id,
            scheduled_at = %schedule.scheduled_at,
            "call scheduled"
        );
        Ok(schedule)
    }
}

// ── CancelSchedule ───────────────────────────────────────────────────────────

pub struct CancelScheduleUseCase<S: ScheduleRepository> {
    pub schedules: S,
}

impl<S: ScheduleRepository> CancelScheduleUseCase<S> {
    /// Cancel a pending schedule. Loses to a dispatcher that claimed it first.
    pub async fn execute(
        &self,
        caller: &CallerIdentity,
        id: ScheduleId,
        now: DateTime<Utc>,
    ) -> Result<CallSchedule, CallsServiceError> {
        let schedule = find_owned(&self.schedules, caller, id).await?;
        ensure_cancellable(&schedule)?;

        if !self.schedules.cancel(id, now).await? {
            // Someone else moved it first; report what they did.
            let current = self
                .schedules
                .find_by_id(id)
                .await?
                .ok_or(CallsServiceError::ScheduleNotFound)?;
            ensure_cancellable(&current)?;
            return Err(CallsServiceError::InvalidState(
                "schedule changed while cancelling".to_owned(),
            ));
        }

        tracing::info!(schedule_id = %id, "schedule cancelled");
        self.schedules
            .find_by_id(id)
            .await?
            .ok_or(CallsServiceError::ScheduleNotFound)
    }
}

fn ensure_cancellable(schedule: &CallSchedule) -> Result<(), CallsServiceError> {
    if schedule.status != ScheduleStatus::Pending {
        return Err(CallsServiceError::InvalidState(format!(
            "schedule is already {}",
            schedule.status
        )));
    }
    if schedule.is_claimed() {
        return Err(CallsServiceError::InvalidState(
            "schedule is being dispatched".to_owned(),
        ));
    }
    Ok(())
}

// ── GetSchedule ──────────────────────────────────────────────────────────────

pub struct GetScheduleUseCase<S: ScheduleRepository> {
    pub schedules: S,
}

impl<S: ScheduleRepository> GetScheduleUseCase<S> {
    pub async fn execute(
        &self,
        caller: &CallerIdentity,
        id: ScheduleId,
    ) -> Result<CallSchedule, CallsServiceError> {
        find_owned(&self.schedules, caller, id).await
    }
}

async fn find_owned<S: ScheduleRepository>(
    schedules: &S,
    caller: &CallerIdentity,
    id: ScheduleId,
) -> Result<CallSchedule, CallsServiceError> {
    schedules
        .find_by_id(id)
        .await?
        .filter(|s| caller.can_access(s.doctor_id))
        .ok_or(CallsServiceError::ScheduleNotFound)
}

// ── ListSchedules ────────────────────────────────────────────────────────────

pub struct ListSchedulesUseCase<S: ScheduleRepository> {
    pub schedules: S,
}

impl<S: ScheduleRepository> ListSchedulesUseCase<S> {
    pub async fn execute(
        &self,
        caller: &CallerIdentity,
        patient_id: Option<PatientId>,
        status: Option<ScheduleStatus>,
        page: PageRequest,
    ) -> Result<Vec<CallSchedule>, CallsServiceError> {
        let filter = ScheduleFilter {
            doctor_id: (!caller.is_operator()).then_some(caller.doctor_id),
            patient_id,
            status,
        };
        self.schedules.list(&filter, page.clamped()).await
    }
}
