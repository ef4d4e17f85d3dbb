use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use futures::{StreamExt as _, stream};
use serde::Serialize;
use uuid::Uuid;

use carecall_domain::phone::PhoneNumber;

use crate::domain::repository::{
    CallLogRepository, LanguageModel, PatientDirectory, PrescriptionRepository,
    ReminderSendRepository, VoiceGateway,
};
use crate::domain::types::{
    CallLog, CallPurpose, CallRequest, PatientContact, Prescription, ReminderSend, ReminderSlot,
};
use crate::error::CallsServiceError;
use crate::usecase::dispatch::place_with_timeout;
use crate::usecase::localize::MessageLocalizer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub slot: Option<ReminderSlot>,
    /// Prescriptions that take a dose in the current slot.
    pub eligible: usize,
    pub sent: usize,
    pub failed: usize,
    /// Already claimed for this slot today.
    pub already_sent: usize,
}

enum ReminderOutcome {
    Sent,
    Failed,
    AlreadySent,
}

// ── SendMedicationReminders ──────────────────────────────────────────────────

/// Medication reminder sweep: at most one call per prescription, slot and clinic day.
///
/// One patient's failure never stops the others. Reminder text is localized the same way
/// as scheduled messages.
pub struct SendMedicationRemindersUseCase<R, K, C, P, G, L>
where
    R: PrescriptionRepository,
    K: ReminderSendRepository,
    C: CallLogRepository,
    P: PatientDirectory,
    G: VoiceGateway,
    L: LanguageModel,
{
    pub prescriptions: R,
    pub sends: K,
    pub call_logs: C,
    pub patients: P,
    pub gateway: G,
    pub localizer: MessageLocalizer<L>,
    pub zone: Tz,
    pub default_country_code: String,
    pub concurrency: usize,
    pub call_timeout: Duration,
}

impl<R, K, C, P, G, L> SendMedicationRemindersUseCase<R, K, C, P, G, L>
where
    R: PrescriptionRepository,
    K: ReminderSendRepository,
    C: CallLogRepository,
    P: PatientDirectory,
    G: VoiceGateway,
    L: LanguageModel,
{
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<ReminderReport, CallsServiceError> {
        let local = now.with_timezone(&self.zone);
        let Some(slot) = ReminderSlot::for_time(local.time()) else {
            return Ok(ReminderReport::default());
        };
        let date = local.date_naive();

        let eligible: Vec<Prescription> = self
            .prescriptions
            .list_active_on(date)
            .await?
            .into_iter()
            .filter(|rx| rx.covers(date) && rx.takes_in(slot))
            .collect();

        let mut report = ReminderReport {
            slot: Some(slot),
            eligible: eligible.len(),
            ..Default::default()
        };

        let outcomes: Vec<ReminderOutcome> = stream::iter(eligible)
            .map(|rx| self.remind(rx, slot, date, now))
            .buffer_unordered(self.concurrency.max(1))
            .collect()
            .await;
        for outcome in outcomes {
            match outcome {
                ReminderOutcome::Sent => report.sent += 1,
                ReminderOutcome::Failed => report.failed += 1,
                ReminderOutcome::AlreadySent => report.already_sent += 1,
            }
        }

        if report.sent + report.failed > 0 {
            tracing::info!(
                slot = slot.as_str(),
                sent = report.sent,
                failed = report.failed,
                "medication reminders sent"
            );
        }
        Ok(report)
    }

    async fn remind(
        &self,
        rx: Prescription,
        slot: ReminderSlot,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> ReminderOutcome {
        let send = ReminderSend {
            id: Uuid::now_v7(),
            prescription_id: rx.id,
            patient_id: rx.patient_id,
            slot,
            reminder_date: date,
        };
        match self.sends.claim(&send, now).await {
            Ok(true) => {}
            Ok(false) => return ReminderOutcome::AlreadySent,
            Err(e) => {
                tracing::warn!(patient_id = %rx.patient_id, prescription_id = %rx.id, error = ?e, "reminder claim failed");
                return ReminderOutcome::Failed;
            }
        }

        match self.place(&rx).await {
            Ok((request, provider_call_id)) => {
                let log = CallLog::initiated(provider_call_id.clone(), &request, None, now);
                if let Err(e) = self.call_logs.create(&log).await {
                    tracing::error!(provider_call_id = %provider_call_id, error = ?e, "reminder placed but call log not stored");
                }
                if let Err(e) = self.sends.mark_sent(send.id, &provider_call_id, now).await {
                    tracing::error!(provider_call_id = %provider_call_id, error = ?e, "could not mark reminder sent");
                }
                ReminderOutcome::Sent
            }
            Err(message) => {
                tracing::warn!(
                    patient_id = %rx.patient_id,
                    prescription_id = %rx.id,
                    slot = slot.as_str(),
                    error = %message,
                    "medication reminder failed"
                );
                if let Err(e) = self.sends.mark_failed(send.id, &message, now).await {
                    tracing::error!(patient_id = %rx.patient_id, error = ?e, "could not mark reminder failed");
                }
                ReminderOutcome::Failed
            }
        }
    }

    async fn place(&self, rx: &Prescription) -> Result<(CallRequest, String), String> {
        let patient: PatientContact = match self.patients.find_contact(rx.patient_id).await {
            Ok(Some(patient)) => patient,
            Ok(None) => return Err("patient record no longer exists".to_owned()),
            Err(_) => return Err("could not load patient record".to_owned()),
        };
        let raw_phone = patient
            .phone_on_file()
            .ok_or_else(|| "patient has no phone number on file".to_owned())?;
        let phone = PhoneNumber::normalize(raw_phone, &self.default_country_code)
            .map_err(|e| format!("invalid phone number: {e}"))?;

        let message = reminder_message(rx);
        let localized_variants = self.localizer.localize(&message).await;

        let request = CallRequest {
            phone,
            patient_name: patient.name,
            message,
            localized_variants,
            preferred_language: patient.preferred_language,
            purpose: CallPurpose::Reminder,
            schedule_id: None,
            patient_id: Some(rx.patient_id),
            doctor_id: Some(rx.doctor_id),
        };
        let placed = place_with_timeout(&self.gateway, &request, self.call_timeout)
            .await
            .map_err(|e| e.to_string())?;
        Ok((request, placed.provider_call_id))
    }
}

fn reminder_message(rx: &Prescription) -> String {
    let dosage = rx.dosage.trim();
    if dosage.is_empty() {
        format!("This is a reminder to take your {} now.", rx.medication_name)
    } else {
        format!(
            "This is a reminder to take your {}, {dosage}, now.",
            rx.medication_name
        )
    }
}
