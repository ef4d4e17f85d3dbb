use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::{StreamExt as _, stream};
use serde::Serialize;
use uuid::Uuid;

use carecall_domain::phone::PhoneNumber;

use crate::config::DispatcherConfig;
use crate::domain::repository::{
    CallLogRepository, PatientDirectory, ScheduleRepository, VoiceGateway,
};
use crate::domain::types::{
    CallLog, CallPurpose, CallRequest, CallSchedule, GatewayError, PlacedCall,
};
use crate::error::CallsServiceError;

const INTERRUPTED_MESSAGE: &str =
    "dispatch was interrupted before completion; the call may or may not have been placed, reschedule if needed";

/// Place a call, bounded by `timeout`.
pub(crate) async fn place_with_timeout<G: VoiceGateway>(
    gateway: &G,
    request: &CallRequest,
    timeout: Duration,
) -> Result<PlacedCall, GatewayError> {
    match tokio::time::timeout(timeout, gateway.place_call(request)).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(timeout.as_secs())),
    }
}

/// Counts from one sweep over due schedules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Due schedules picked up.
    pub due: usize,
    /// Calls the provider accepted.
    pub placed: usize,
    /// Schedules marked failed.
    pub failed: usize,
    /// Schedules another dispatcher claimed first.
    pub skipped: usize,
    /// Schedules left for the lease reaper after a store error.
    pub errored: usize,
    /// Stale claims failed as interrupted before this sweep.
    pub interrupted: u64,
}

enum DispatchOutcome {
    Placed,
    Failed,
    Skipped,
    Errored,
}

// ── DispatchDueSchedules ─────────────────────────────────────────────────────

/// One dispatcher sweep: claim each due schedule, originate its call, record the result.
///
/// The claim is the mutual exclusion, so any number of sweeps (in this process or others)
/// may run at once without a schedule being called twice. Nothing is retried.
pub struct DispatchDueSchedulesUseCase<S, C, P, G>
where
    S: ScheduleRepository,
    C: CallLogRepository,
    P: PatientDirectory,
    G: VoiceGateway,
{
    pub schedules: S,
    pub call_logs: C,
    pub patients: P,
    pub gateway: G,
    pub config: DispatcherConfig,
    pub default_country_code: String,
}

impl<S, C, P, G> DispatchDueSchedulesUseCase<S, C, P, G>
where
    S: ScheduleRepository,
    C: CallLogRepository,
    P: PatientDirectory,
    G: VoiceGateway,
{
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<DispatchReport, CallsServiceError> {
        let lease = TimeDelta::from_std(self.config.claim_lease).unwrap_or(TimeDelta::minutes(10));
        let interrupted = self
            .schedules
            .fail_stale_claims(now - lease, INTERRUPTED_MESSAGE, now)
            .await?;
        if interrupted > 0 {
            tracing::warn!(count = interrupted, "failed schedules with interrupted dispatch");
        }

        let due = self.schedules.list_due(now, self.config.batch_size).await?;
        let mut report = DispatchReport {
            due: due.len(),
            interrupted,
            ..Default::default()
        };
        if due.is_empty() {
            return Ok(report);
        }

        let outcomes: Vec<DispatchOutcome> = stream::iter(due)
            .map(|schedule| self.dispatch_one(schedule, now))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;
        for outcome in outcomes {
            match outcome {
                DispatchOutcome::Placed => report.placed += 1,
                DispatchOutcome::Failed => report.failed += 1,
                DispatchOutcome::Skipped => report.skipped += 1,
                DispatchOutcome::Errored => report.errored += 1,
            }
        }

        tracing::info!(
            due = report.due,
            placed = report.placed,
            failed = report.failed,
            skipped = report.skipped,
            errored = report.errored,
            "dispatch sweep finished"
        );
        Ok(report)
    }

    async fn dispatch_one(&self, schedule: CallSchedule, now: DateTime<Utc>) -> DispatchOutcome {
        let token = Uuid::new_v4();
        match self.schedules.claim(schedule.id, token, now).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(schedule_id = %schedule.id, "schedule already claimed");
                return DispatchOutcome::Skipped;
            }
            Err(e) => {
                tracing::warn!(schedule_id = %schedule.id, error = ?e, "claim failed");
                return DispatchOutcome::Errored;
            }
        }

        match self.originate(&schedule).await {
            Ok((request, placed)) => {
                let log = CallLog::initiated(
                    placed.provider_call_id.clone(),
                    &request,
                    Some(schedule.scheduled_at),
                    now,
                );
                if let Err(e) = self.call_logs.create(&log).await {
                    tracing::error!(
                        schedule_id = %schedule.id,
                        provider_call_id = %placed.provider_call_id,
                        error = ?e,
                        "call placed but call log not stored"
                    );
                }
                match self
                    .schedules
                    .complete(schedule.id, token, &placed.provider_call_id, now)
                    .await
                {
                    Ok(true) => {
                        tracing::info!(
                            schedule_id = %schedule.id,
                            patient_id = %schedule.patient_id,
                            provider_call_id = %placed.provider_call_id,
                            "scheduled call placed"
                        );
                        DispatchOutcome::Placed
                    }
                    Ok(false) => {
                        tracing::warn!(
                            schedule_id = %schedule.id,
                            provider_call_id = %placed.provider_call_id,
                            "call placed after claim was reaped"
                        );
                        DispatchOutcome::Placed
                    }
                    Err(e) => {
                        tracing::error!(
                            schedule_id = %schedule.id,
                            provider_call_id = %placed.provider_call_id,
                            error = ?e,
                            "call placed but schedule not completed"
                        );
                        DispatchOutcome::Errored
                    }
                }
            }
            Err(message) => {
                tracing::warn!(
                    schedule_id = %schedule.id,
                    patient_id = %schedule.patient_id,
                    error = %message,
                    "scheduled call failed"
                );
                match self.schedules.fail(schedule.id, token, &message, now).await {
                    Ok(_) => DispatchOutcome::Failed,
                    Err(e) => {
                        tracing::error!(schedule_id = %schedule.id, error = ?e, "could not mark schedule failed");
                        DispatchOutcome::Errored
                    }
                }
            }
        }
    }

    /// The error string is stored on the schedule, so it must say what to fix.
    async fn originate(
        &self,
        schedule: &CallSchedule,
    ) -> Result<(CallRequest, PlacedCall), String> {
        let patient = match self.patients.find_contact(schedule.patient_id).await {
            Ok(Some(patient)) => patient,
            Ok(None) => return Err("patient record no longer exists".to_owned()),
            Err(e) => {
                tracing::warn!(schedule_id = %schedule.id, error = ?e, "patient lookup failed");
                return Err("could not load patient record".to_owned());
            }
        };
        let raw_phone = patient
            .phone_on_file()
            .ok_or_else(|| "patient has no phone number on file".to_owned())?;
        let phone = PhoneNumber::normalize(raw_phone, &self.default_country_code)
            .map_err(|e| GatewayError::InvalidNumber(e.to_string()).to_string())?;

        let request = CallRequest {
            phone,
            patient_name: patient.name,
            message: schedule.message.clone(),
            localized_variants: schedule.localized_variants.clone(),
            preferred_language: patient.preferred_language,
            purpose: CallPurpose::Scheduled,
            schedule_id: Some(schedule.id),
            patient_id: Some(schedule.patient_id),
            doctor_id: Some(schedule.doctor_id),
        };
        let placed = place_with_timeout(&self.gateway, &request, self.config.call_timeout)
            .await
            .map_err(|e| e.to_string())?;
        Ok((request, placed))
    }
}
