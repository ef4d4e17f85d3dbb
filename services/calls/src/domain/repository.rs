#![allow(async_fn_in_trait)]

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use carecall_domain::id::{CallLogId, PatientId, ScheduleId};
use carecall_domain::pagination::PageRequest;

use crate::domain::types::{
    CallLog, CallLogFilter, CallOutcome, CallRequest, CallSchedule, GatewayError, LlmError,
    PatientContact, PlacedCall, Prescription, ReminderSend, ScheduleFilter,
};
use crate::error::CallsServiceError;

/// Repository for call schedules.
///
/// Every transition out of `pending` is a single conditional update; the `bool` results
/// report whether this caller's update landed.
pub trait ScheduleRepository: Send + Sync {
    async fn create(&self, schedule: &CallSchedule) -> Result<(), CallsServiceError>;

    async fn find_by_id(&self, id: ScheduleId) -> Result<Option<CallSchedule>, CallsServiceError>;

    /// Ordered by `scheduled_at` ascending.
    async fn list(
        &self,
        filter: &ScheduleFilter,
        page: PageRequest,
    ) -> Result<Vec<CallSchedule>, CallsServiceError>;

    /// Pending, unclaimed schedules due at or before `now`, oldest first.
    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<CallSchedule>, CallsServiceError>;

    /// Claim a due schedule for dispatch. Only one concurrent caller wins.
    async fn claim(
        &self,
        id: ScheduleId,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, CallsServiceError>;

    /// `pending → completed`, only for the holder of `token`.
    async fn complete(
        &self,
        id: ScheduleId,
        token: Uuid,
        provider_call_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, CallsServiceError>;

    /// `pending → failed`, only for the holder of `token`.
    async fn fail(
        &self,
        id: ScheduleId,
        token: Uuid,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, CallsServiceError>;

    /// `pending → cancelled`, only while no dispatcher holds the schedule.
    async fn cancel(&self, id: ScheduleId, now: DateTime<Utc>) -> Result<bool, CallsServiceError>;

    /// Fail schedules claimed before `claimed_before` that never finished. Returns how many.
    async fn fail_stale_claims(
        &self,
        claimed_before: DateTime<Utc>,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, CallsServiceError>;
}

/// Repository for call logs.
pub trait CallLogRepository: Send + Sync {
    async fn create(&self, log: &CallLog) -> Result<(), CallsServiceError>;

    async fn find_by_id(&self, id: CallLogId) -> Result<Option<CallLog>, CallsServiceError>;

    async fn find_by_provider_call_id(
        &self,
        provider_call_id: &str,
    ) -> Result<Option<CallLog>, CallsServiceError>;

    /// Newest first.
    async fn list(
        &self,
        filter: &CallLogFilter,
        page: PageRequest,
    ) -> Result<Vec<CallLog>, CallsServiceError>;

    /// Set `started_at` if it is still empty.
    async fn mark_started(
        &self,
        provider_call_id: &str,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, CallsServiceError>;

    /// Write terminal fields unless they already equal `outcome`. Returns `true` if the row changed.
    async fn record_outcome(
        &self,
        provider_call_id: &str,
        outcome: &CallOutcome,
        now: DateTime<Utc>,
    ) -> Result<bool, CallsServiceError>;

    async fn set_summary(
        &self,
        id: CallLogId,
        summary: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CallsServiceError>;
}

/// Read access to patient contact details (owned by the patient CRUD surface).
pub trait PatientDirectory: Send + Sync {
    async fn find_contact(
        &self,
        id: PatientId,
    ) -> Result<Option<PatientContact>, CallsServiceError>;
}

pub trait PrescriptionRepository: Send + Sync {
    /// Active prescriptions whose course covers `date`.
    async fn list_active_on(&self, date: NaiveDate)
    -> Result<Vec<Prescription>, CallsServiceError>;
}

/// Repository for medication reminder sends.
pub trait ReminderSendRepository: Send + Sync {
    /// Insert the claim row. Returns `false` if this prescription/slot/day was already claimed.
    async fn claim(&self, send: &ReminderSend, now: DateTime<Utc>)
    -> Result<bool, CallsServiceError>;

    async fn mark_sent(
        &self,
        id: Uuid,
        provider_call_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CallsServiceError>;

    async fn mark_failed(
        &self,
        id: Uuid,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CallsServiceError>;
}

/// Port to the voice-AI telephony provider.
///
/// Expected provider failures come back as `GatewayError`, never as panics.
pub trait VoiceGateway: Send + Sync {
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, GatewayError>;
}

/// Port to a chat-completions language model.
pub trait LanguageModel: Send + Sync {
    /// One system + user exchange; returns the assistant's text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}
