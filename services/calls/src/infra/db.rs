use anyhow::{Context as _, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Value,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use carecall_calls_schema::{call_logs, call_schedules, patients, prescriptions, reminder_sends};
use carecall_domain::id::{CallLogId, DoctorId, PatientId, PrescriptionId, ScheduleId};
use carecall_domain::pagination::PageRequest;

use crate::domain::repository::{
    CallLogRepository, PatientDirectory, PrescriptionRepository, ReminderSendRepository,
    ScheduleRepository,
};
use crate::domain::types::{
    CallLog, CallLogFilter, CallLogStatus, CallOutcome, CallPurpose, CallSchedule,
    PatientContact, Prescription, ReminderSend, ScheduleFilter, ScheduleStatus,
};
use crate::error::CallsServiceError;

// ── Schedule repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbScheduleRepository {
    pub db: DatabaseConnection,
}

impl ScheduleRepository for DbScheduleRepository {
    async fn create(&self, schedule: &CallSchedule) -> Result<(), CallsServiceError> {
        let localized_variants = serde_json::to_value(&schedule.localized_variants)
            .context("encode localized variants")?;
        call_schedules::ActiveModel {
            id: Set(schedule.id.0),
            patient_id: Set(schedule.patient_id.0),
            doctor_id: Set(schedule.doctor_id.0),
            scheduled_at: Set(schedule.scheduled_at),
            time_label: Set(schedule.time_label.clone()),
            message: Set(schedule.message.clone()),
            source_language: Set(schedule.source_language.clone()),
            localized_variants: Set(localized_variants),
            status: Set(schedule.status.as_str().to_owned()),
            claimed_at: Set(schedule.claimed_at),
            claim_token: Set(None),
            provider_call_id: Set(schedule.provider_call_id.clone()),
            completed_at: Set(schedule.completed_at),
            error_message: Set(schedule.error_message.clone()),
            created_at: Set(schedule.created_at),
            updated_at: Set(schedule.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create call schedule")?;
        Ok(())
    }

    async fn find_by_id(&self, id: ScheduleId) -> Result<Option<CallSchedule>, CallsServiceError> {
        let model = call_schedules::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find call schedule by id")?;
        model.map(schedule_from_model).transpose()
    }

    async fn list(
        &self,
        filter: &ScheduleFilter,
        page: PageRequest,
    ) -> Result<Vec<CallSchedule>, CallsServiceError> {
        let mut query = call_schedules::Entity::find();
        if let Some(doctor_id) = filter.doctor_id {
            query = query.filter(call_schedules::Column::DoctorId.eq(doctor_id.0));
        }
        if let Some(patient_id) = filter.patient_id {
            query = query.filter(call_schedules::Column::PatientId.eq(patient_id.0));
        }
        if let Some(status) = filter.status {
            query = query.filter(call_schedules::Column::Status.eq(status.as_str()));
        }
        let models = query
            .order_by_asc(call_schedules::Column::ScheduledAt)
            .order_by_asc(call_schedules::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list call schedules")?;
        models.into_iter().map(schedule_from_model).collect()
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<CallSchedule>, CallsServiceError> {
        let models = call_schedules::Entity::find()
            .filter(call_schedules::Column::Status.eq(ScheduleStatus::Pending.as_str()))
            .filter(call_schedules::Column::ClaimedAt.is_null())
            .filter(call_schedules::Column::ScheduledAt.lte(now))
            .order_by_asc(call_schedules::Column::ScheduledAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("list due call schedules")?;
        models.into_iter().map(schedule_from_model).collect()
    }

    async fn claim(
        &self,
        id: ScheduleId,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, CallsServiceError> {
        let result = call_schedules::Entity::update_many()
            .col_expr(call_schedules::Column::ClaimedAt, Expr::value(now))
            .col_expr(call_schedules::Column::ClaimToken, Expr::value(token))
            .col_expr(call_schedules::Column::UpdatedAt, Expr::value(now))
            .filter(call_schedules::Column::Id.eq(id.0))
            .filter(call_schedules::Column::Status.eq(ScheduleStatus::Pending.as_str()))
            .filter(call_schedules::Column::ClaimedAt.is_null())
            .filter(call_schedules::Column::ScheduledAt.lte(now))
            .exec(&self.db)
            .await
            .context("claim call schedule")?;
        Ok(result.rows_affected > 0)
    }

    async fn complete(
        &self,
        id: ScheduleId,
        token: Uuid,
        provider_call_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, CallsServiceError> {
        let result = call_schedules::Entity::update_many()
            .col_expr(
                call_schedules::Column::Status,
                Expr::value(ScheduleStatus::Completed.as_str()),
            )
            .col_expr(call_schedules::Column::ProviderCallId, Expr::value(provider_call_id))
            .col_expr(call_schedules::Column::CompletedAt, Expr::value(now))
            .col_expr(call_schedules::Column::UpdatedAt, Expr::value(now))
            .filter(call_schedules::Column::Id.eq(id.0))
            .filter(call_schedules::Column::Status.eq(ScheduleStatus::Pending.as_str()))
            .filter(call_schedules::Column::ClaimToken.eq(token))
            .exec(&self.db)
            .await
            .context("complete call schedule")?;
        Ok(result.rows_affected > 0)
    }

    async fn fail(
        &self,
        id: ScheduleId,
        token: Uuid,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, CallsServiceError> {
        let result = call_schedules::Entity::update_many()
            .col_expr(
                call_schedules::Column::Status,
                Expr::value(ScheduleStatus::Failed.as_str()),
            )
            .col_expr(call_schedules::Column::ErrorMessage, Expr::value(error_message))
            .col_expr(call_schedules::Column::CompletedAt, Expr::value(now))
            .col_expr(call_schedules::Column::UpdatedAt, Expr::value(now))
            .filter(call_schedules::Column::Id.eq(id.0))
            .filter(call_schedules::Column::Status.eq(ScheduleStatus::Pending.as_str()))
            .filter(call_schedules::Column::ClaimToken.eq(token))
            .exec(&self.db)
            .await
            .context("fail call schedule")?;
        Ok(result.rows_affected > 0)
    }

    async fn cancel(&self, id: ScheduleId, now: DateTime<Utc>) -> Result<bool, CallsServiceError> {
        let result = call_schedules::Entity::update_many()
            .col_expr(
                call_schedules::Column::Status,
                Expr::value(ScheduleStatus::Cancelled.as_str()),
            )
            .col_expr(call_schedules::Column::CompletedAt, Expr::value(now))
            .col_expr(call_schedules::Column::UpdatedAt, Expr::value(now))
            .filter(call_schedules::Column::Id.eq(id.0))
            .filter(call_schedules::Column::Status.eq(ScheduleStatus::Pending.as_str()))
            .filter(call_schedules::Column::ClaimedAt.is_null())
            .exec(&self.db)
            .await
            .context("cancel call schedule")?;
        Ok(result.rows_affected > 0)
    }

    async fn fail_stale_claims(
        &self,
        claimed_before: DateTime<Utc>,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, CallsServiceError> {
        let result = call_schedules::Entity::update_many()
            .col_expr(
                call_schedules::Column::Status,
                Expr::value(ScheduleStatus::Failed.as_str()),
            )
            .col_expr(call_schedules::Column::ErrorMessage, Expr::value(error_message))
            .col_expr(call_schedules::Column::CompletedAt, Expr::value(now))
            .col_expr(call_schedules::Column::UpdatedAt, Expr::value(now))
            .filter(call_schedules::Column::Status.eq(ScheduleStatus::Pending.as_str()))
            .filter(call_schedules::Column::ClaimedAt.lt(claimed_before))
            .exec(&self.db)
            .await
            .context("fail stale schedule claims")?;
        Ok(result.rows_affected)
    }
}

fn schedule_from_model(model: call_schedules::Model) -> Result<CallSchedule, CallsServiceError> {
    let status = model
        .status
        .parse::<ScheduleStatus>()
        .map_err(|e| anyhow!(e))
        .context("decode schedule status")?;
    let localized_variants = serde_json::from_value(model.localized_variants)
        .context("decode localized variants")?;
    Ok(CallSchedule {
        id: ScheduleId(model.id),
        patient_id: PatientId(model.patient_id),
        doctor_id: DoctorId(model.doctor_id),
        scheduled_at: model.scheduled_at,
        time_label: model.time_label,
        message: model.message,
        source_language: model.source_language,
        localized_variants,
        status,
        claimed_at: model.claimed_at,
        provider_call_id: model.provider_call_id,
        completed_at: model.completed_at,
        error_message: model.error_message,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Call log repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCallLogRepository {
    pub db: DatabaseConnection,
}

impl CallLogRepository for DbCallLogRepository {
    async fn create(&self, log: &CallLog) -> Result<(), CallsServiceError> {
        call_logs::ActiveModel {
            id: Set(log.id.0),
            provider_call_id: Set(log.provider_call_id.clone()),
            schedule_id: Set(log.schedule_id.map(|id| id.0)),
            patient_id: Set(log.patient_id.map(|id| id.0)),
            doctor_id: Set(log.doctor_id.map(|id| id.0)),
            purpose: Set(log.purpose.as_str().to_owned()),
            patient_name: Set(log.patient_name.clone()),
            phone: Set(log.phone.clone()),
            scheduled_at: Set(log.scheduled_at),
            started_at: Set(log.started_at),
            ended_at: Set(log.ended_at),
            duration_seconds: Set(log.duration_seconds),
            ended_reason: Set(log.ended_reason.clone()),
            transcript: Set(log.transcript.clone()),
            summary: Set(log.summary.clone()),
            recording_url: Set(log.recording_url.clone()),
            status: Set(log.status.as_str().to_owned()),
            created_at: Set(log.created_at),
            updated_at: Set(log.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create call log")?;
        Ok(())
    }

    async fn find_by_id(&self, id: CallLogId) -> Result<Option<CallLog>, CallsServiceError> {
        let model = call_logs::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find call log by id")?;
        model.map(call_log_from_model).transpose()
    }

    async fn find_by_provider_call_id(
        &self,
        provider_call_id: &str,
    ) -> Result<Option<CallLog>, CallsServiceError> {
        let model = call_logs::Entity::find()
            .filter(call_logs::Column::ProviderCallId.eq(provider_call_id))
            .one(&self.db)
            .await
            .context("find call log by provider call id")?;
        model.map(call_log_from_model).transpose()
    }

    async fn list(
        &self,
        filter: &CallLogFilter,
        page: PageRequest,
    ) -> Result<Vec<CallLog>, CallsServiceError> {
        let mut query = call_logs::Entity::find();
        if let Some(doctor_id) = filter.doctor_id {
            query = query.filter(call_logs::Column::DoctorId.eq(doctor_id.0));
        }
        if let Some(patient_id) = filter.patient_id {
            query = query.filter(call_logs::Column::PatientId.eq(patient_id.0));
        }
        if let Some(schedule_id) = filter.schedule_id {
            query = query.filter(call_logs::Column::ScheduleId.eq(schedule_id.0));
        }
        let models = query
            .order_by_desc(call_logs::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list call logs")?;
        models.into_iter().map(call_log_from_model).collect()
    }

    async fn mark_started(
        &self,
        provider_call_id: &str,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, CallsServiceError> {
        let result = call_logs::Entity::update_many()
            .col_expr(call_logs::Column::StartedAt, Expr::value(started_at))
            .col_expr(call_logs::Column::UpdatedAt, Expr::value(now))
            .filter(call_logs::Column::ProviderCallId.eq(provider_call_id))
            .filter(call_logs::Column::StartedAt.is_null())
            .exec(&self.db)
            .await
            .context("mark call started")?;
        Ok(result.rows_affected > 0)
    }

    async fn record_outcome(
        &self,
        provider_call_id: &str,
        outcome: &CallOutcome,
        now: DateTime<Utc>,
    ) -> Result<bool, CallsServiceError> {
        // Row-wise IS DISTINCT FROM treats NULLs as equal, so a replay matches nothing.
        let incoming: Vec<Value> = vec![
            outcome.status.as_str().into(),
            outcome.ended_reason.clone().into(),
            outcome.transcript.clone().into(),
            outcome.recording_url.clone().into(),
            outcome.ended_at.into(),
            outcome.duration_seconds.into(),
        ];
        let result = call_logs::Entity::update_many()
            .col_expr(call_logs::Column::Status, Expr::value(outcome.status.as_str()))
            .col_expr(call_logs::Column::EndedReason, Expr::value(outcome.ended_reason.clone()))
            .col_expr(call_logs::Column::Transcript, Expr::value(outcome.transcript.clone()))
            .col_expr(call_logs::Column::RecordingUrl, Expr::value(outcome.recording_url.clone()))
            .col_expr(call_logs::Column::EndedAt, Expr::value(outcome.ended_at))
            .col_expr(call_logs::Column::DurationSeconds, Expr::value(outcome.duration_seconds))
            .col_expr(
                call_logs::Column::StartedAt,
                Expr::cust_with_values("COALESCE(?, started_at)", [outcome.started_at]),
            )
            .col_expr(call_logs::Column::UpdatedAt, Expr::value(now))
            .filter(call_logs::Column::ProviderCallId.eq(provider_call_id))
            .filter(Expr::cust_with_values(
                "(status, ended_reason, transcript, recording_url, ended_at, duration_seconds) \
                 IS DISTINCT FROM (?, ?, ?, ?, ?, ?)",
                incoming,
            ))
            .exec(&self.db)
            .await
            .context("record call outcome")?;
        Ok(result.rows_affected > 0)
    }

    async fn set_summary(
        &self,
        id: CallLogId,
        summary: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CallsServiceError> {
        call_logs::Entity::update_many()
            .col_expr(call_logs::Column::Summary, Expr::value(summary))
            .col_expr(call_logs::Column::UpdatedAt, Expr::value(now))
            .filter(call_logs::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .context("set call summary")?;
        Ok(())
    }
}

fn call_log_from_model(model: call_logs::Model) -> Result<CallLog, CallsServiceError> {
    let purpose = model
        .purpose
        .parse::<CallPurpose>()
        .map_err(|e| anyhow!(e))
        .context("decode call purpose")?;
    let status = model
        .status
        .parse::<CallLogStatus>()
        .map_err(|e| anyhow!(e))
        .context("decode call log status")?;
    Ok(CallLog {
        id: CallLogId(model.id),
        provider_call_id: model.provider_call_id,
        schedule_id: model.schedule_id.map(ScheduleId),
        patient_id: model.patient_id.map(PatientId),
        doctor_id: model.doctor_id.map(DoctorId),
        purpose,
        patient_name: model.patient_name,
        phone: model.phone,
        scheduled_at: model.scheduled_at,
        started_at: model.started_at,
        ended_at: model.ended_at,
        duration_seconds: model.duration_seconds,
        ended_reason: model.ended_reason,
        transcript: model.transcript,
        summary: model.summary,
        recording_url: model.recording_url,
        status,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Patient directory ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPatientDirectory {
    pub db: DatabaseConnection,
}

impl PatientDirectory for DbPatientDirectory {
    async fn find_contact(
        &self,
        id: PatientId,
    ) -> Result<Option<PatientContact>, CallsServiceError> {
        let model = patients::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find patient by id")?;
        Ok(model.map(|p| PatientContact {
            id: PatientId(p.id),
            doctor_id: DoctorId(p.doctor_id),
            name: p.name,
            phone: p.phone,
            preferred_language: p.preferred_language,
        }))
    }
}

// ── Prescription repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPrescriptionRepository {
    pub db: DatabaseConnection,
}

impl PrescriptionRepository for DbPrescriptionRepository {
    async fn list_active_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Prescription>, CallsServiceError> {
        let models = prescriptions::Entity::find()
            .filter(prescriptions::Column::IsActive.eq(true))
            .filter(prescriptions::Column::StartDate.lte(date))
            .filter(
                Condition::any()
                    .add(prescriptions::Column::EndDate.is_null())
                    .add(prescriptions::Column::EndDate.gte(date)),
            )
            .all(&self.db)
            .await
            .context("list active prescriptions")?;
        Ok(models
            .into_iter()
            .map(|rx| Prescription {
                id: PrescriptionId(rx.id),
                patient_id: PatientId(rx.patient_id),
                doctor_id: DoctorId(rx.doctor_id),
                medication_name: rx.medication_name,
                dosage: rx.dosage,
                morning: rx.morning,
                afternoon: rx.afternoon,
                evening: rx.evening,
                start_date: rx.start_date,
                end_date: rx.end_date,
                is_active: rx.is_active,
            })
            .collect())
    }
}

// ── Reminder send repository ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbReminderSendRepository {
    pub db: DatabaseConnection,
}

impl ReminderSendRepository for DbReminderSendRepository {
    async fn claim(&self, send: &ReminderSend, now: DateTime<Utc>) -> Result<bool, CallsServiceError> {
        let row = reminder_sends::ActiveModel {
            id: Set(send.id),
            prescription_id: Set(send.prescription_id.0),
            patient_id: Set(send.patient_id.0),
            slot: Set(send.slot.as_str().to_owned()),
            reminder_date: Set(send.reminder_date),
            status: Set("pending".to_owned()),
            provider_call_id: Set(None),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = reminder_sends::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    reminder_sends::Column::PrescriptionId,
                    reminder_sends::Column::Slot,
                    reminder_sends::Column::ReminderDate,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("claim reminder send")?;
        Ok(inserted > 0)
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        provider_call_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CallsServiceError> {
        reminder_sends::Entity::update_many()
            .col_expr(reminder_sends::Column::Status, Expr::value("sent"))
            .col_expr(reminder_sends::Column::ProviderCallId, Expr::value(provider_call_id))
            .col_expr(reminder_sends::Column::UpdatedAt, Expr::value(now))
            .filter(reminder_sends::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("mark reminder sent")?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CallsServiceError> {
        reminder_sends::Entity::update_many()
            .col_expr(reminder_sends::Column::Status, Expr::value("failed"))
            .col_expr(reminder_sends::Column::ErrorMessage, Expr::value(error_message))
            .col_expr(reminder_sends::Column::UpdatedAt, Expr::value(now))
            .filter(reminder_sends::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("mark reminder failed")?;
        Ok(())
    }
}
