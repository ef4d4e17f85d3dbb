use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike as _, Utc};
use serde::{Deserialize, Serialize};

use carecall_domain::id::{CallLogId, DoctorId, PatientId, PrescriptionId, ScheduleId};
use carecall_domain::phone::PhoneNumber;

/// Message text keyed by language code. Always contains the source language.
pub type LocalizedVariants = BTreeMap<String, String>;

// ── Schedules ────────────────────────────────────────────────────────────────

/// Lifecycle of a call schedule. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown schedule status {other:?}")),
        }
    }
}

/// A persisted request to call a patient at a future instant.
#[derive(Debug, Clone)]
pub struct CallSchedule {
    pub id: ScheduleId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub scheduled_at: DateTime<Utc>,
    /// Human-readable form of `scheduled_at` shown back to the doctor.
    pub time_label: String,
    pub message: String,
    pub source_language: String,
    pub localized_variants: LocalizedVariants,
    pub status: ScheduleStatus,
    /// Set while a dispatcher holds the schedule.
    pub claimed_at: Option<DateTime<Utc>>,
    pub provider_call_id: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallSchedule {
    pub fn is_claimed(&self) -> bool {
        self.claimed_at.is_some()
    }
}

/// Listing filter. `doctor_id = None` means every doctor (operator view).
#[derive(Debug, Clone, Default)]
pub struct ScheduleFilter {
    pub doctor_id: Option<DoctorId>,
    pub patient_id: Option<PatientId>,
    pub status: Option<ScheduleStatus>,
}

// ── Call logs ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallLogStatus {
    #[serde(rename = "initiated")]
    Initiated,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "no-answer")]
    NoAnswer,
}

impl CallLogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::NoAnswer => "no-answer",
        }
    }

    /// Classify a provider end reason into the terminal status it implies.
    pub fn from_ended_reason(reason: Option<&str>) -> Self {
        let Some(reason) = reason.map(|r| r.trim().to_ascii_lowercase()) else {
            return Self::Completed;
        };
        match reason.as_str() {
            "customer-did-not-answer" | "customer-busy" | "voicemail" | "no-answer" => {
                Self::NoAnswer
            }
            r if r.contains("error") || r.contains("failed") => Self::Failed,
            _ => Self::Completed,
        }
    }
}

impl FromStr for CallLogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(Self::Initiated),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "no-answer" => Ok(Self::NoAnswer),
            other => Err(format!("unknown call log status {other:?}")),
        }
    }
}

/// Why a call was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPurpose {
    Scheduled,
    Reminder,
    Test,
}

impl CallPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Reminder => "reminder",
            Self::Test => "test",
        }
    }
}

impl FromStr for CallPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "reminder" => Ok(Self::Reminder),
            "test" => Ok(Self::Test),
            other => Err(format!("unknown call purpose {other:?}")),
        }
    }
}

/// One call actually placed through the voice provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CallLog {
    pub id: CallLogId,
    pub provider_call_id: String,
    pub schedule_id: Option<ScheduleId>,
    pub patient_id: Option<PatientId>,
    pub doctor_id: Option<DoctorId>,
    pub purpose: CallPurpose,
    /// Snapshot at dial time.
    pub patient_name: String,
    /// Snapshot at dial time, normalized.
    pub phone: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i32>,
    pub ended_reason: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub recording_url: Option<String>,
    pub status: CallLogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallLog {
    /// A fresh `initiated` log for a call the provider just accepted.
    pub fn initiated(
        provider_call_id: String,
        request: &CallRequest,
        scheduled_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CallLogId::generate(),
            provider_call_id,
            schedule_id: request.schedule_id,
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            purpose: request.purpose,
            patient_name: request.patient_name.clone(),
            phone: request.phone.as_str().to_owned(),
            scheduled_at,
            started_at: None,
            ended_at: None,
            duration_seconds: None,
            ended_reason: None,
            transcript: None,
            summary: None,
            recording_url: None,
            status: CallLogStatus::Initiated,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the stored terminal fields already equal `outcome`.
    pub fn matches_outcome(&self, outcome: &CallOutcome) -> bool {
        self.status == outcome.status
            && self.ended_reason == outcome.ended_reason
            && self.transcript == outcome.transcript
            && self.recording_url == outcome.recording_url
            && self.ended_at == outcome.ended_at
            && self.duration_seconds == outcome.duration_seconds
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallLogFilter {
    pub doctor_id: Option<DoctorId>,
    pub patient_id: Option<PatientId>,
    pub schedule_id: Option<ScheduleId>,
}

// ── Patients & prescriptions ─────────────────────────────────────────────────

/// The slice of a patient record needed to dial them.
#[derive(Debug, Clone)]
pub struct PatientContact {
    pub id: PatientId,
    pub doctor_id: DoctorId,
    pub name: String,
    pub phone: Option<String>,
    pub preferred_language: Option<String>,
}

impl PatientContact {
    /// Phone on file, or `None` when absent or blank.
    pub fn phone_on_file(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Prescription {
    pub id: PrescriptionId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub medication_name: String,
    pub dosage: String,
    pub morning: bool,
    pub afternoon: bool,
    pub evening: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl Prescription {
    /// Whether the course covers `date` (end date inclusive).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.is_active && self.start_date <= date && self.end_date.is_none_or(|end| date <= end)
    }

    pub fn takes_in(&self, slot: ReminderSlot) -> bool {
        match slot {
            ReminderSlot::Morning => self.morning,
            ReminderSlot::Afternoon => self.afternoon,
            ReminderSlot::Evening => self.evening,
        }
    }
}

/// Daily medication reminder windows, in clinic time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderSlot {
    /// 08:00–11:59
    Morning,
    /// 14:00–16:59
    Afternoon,
    /// 20:00–22:59
    Evening,
}

impl ReminderSlot {
    /// The slot whose window contains `time`, if any.
    pub fn for_time(time: NaiveTime) -> Option<Self> {
        match time.hour() {
            8..=11 => Some(Self::Morning),
            14..=16 => Some(Self::Afternoon),
            20..=22 => Some(Self::Evening),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

/// A once-per-slot-per-day reminder claim.
#[derive(Debug, Clone)]
pub struct ReminderSend {
    pub id: uuid::Uuid,
    pub prescription_id: PrescriptionId,
    pub patient_id: PatientId,
    pub slot: ReminderSlot,
    pub reminder_date: NaiveDate,
}

// ── Voice gateway ────────────────────────────────────────────────────────────

/// Everything the voice provider needs to place one call.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub phone: PhoneNumber,
    pub patient_name: String,
    pub message: String,
    pub localized_variants: LocalizedVariants,
    pub preferred_language: Option<String>,
    pub purpose: CallPurpose,
    pub schedule_id: Option<ScheduleId>,
    pub patient_id: Option<PatientId>,
    pub doctor_id: Option<DoctorId>,
}

/// Provider acknowledgement of an originated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCall {
    pub provider_call_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// A required credential or id is missing; carries the env var to set.
    #[error("voice provider is not configured: set {0}")]
    Configuration(String),
    #[error("invalid phone number: {0}")]
    InvalidNumber(String),
    #[error("voice provider rejected the call (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("voice provider unreachable: {0}")]
    Unreachable(String),
    #[error("voice provider did not respond within {0}s")]
    Timeout(u64),
}

// ── Outcome events ───────────────────────────────────────────────────────────

/// Provider lifecycle event, already decoded from the webhook payload.
#[derive(Debug, Clone)]
pub enum CallEvent {
    Started {
        provider_call_id: String,
        started_at: Option<DateTime<Utc>>,
    },
    Ended {
        provider_call_id: String,
        report: EndOfCallReport,
    },
}

impl CallEvent {
    pub fn provider_call_id(&self) -> &str {
        match self {
            Self::Started {
                provider_call_id, ..
            }
            | Self::Ended {
                provider_call_id, ..
            } => provider_call_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EndOfCallReport {
    pub ended_reason: Option<String>,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
}

/// Terminal fields written to a call log when the call ends.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub status: CallLogStatus,
    pub ended_reason: Option<String>,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i32>,
}

impl CallOutcome {
    pub fn from_report(report: EndOfCallReport) -> Self {
        let duration_seconds = match (report.duration_seconds, report.started_at, report.ended_at) {
            (Some(secs), _, _) if secs.is_finite() && secs >= 0.0 => Some(secs.round() as i32),
            (_, Some(start), Some(end)) if end >= start => {
                i32::try_from((end - start).num_seconds()).ok()
            }
            _ => None,
        };
        let transcript = report.transcript.filter(|t| !t.trim().is_empty());
        Self {
            status: CallLogStatus::from_ended_reason(report.ended_reason.as_deref()),
            ended_reason: report.ended_reason,
            transcript,
            recording_url: report.recording_url,
            started_at: report.started_at,
            ended_at: report.ended_at,
            duration_seconds,
        }
    }
}

/// Result of applying an outcome event.
#[derive(Debug, Clone)]
pub enum OutcomeUpdate {
    /// Terminal fields changed; the log needs a fresh summary.
    Updated(CallLog),
    /// Replay of what is already stored, or a start event after the fact.
    Unchanged(CallLog),
    /// No call log carries this provider call id.
    UnknownCall,
}

// ── Time ─────────────────────────────────────────────────────────────────────

/// A concrete future instant plus the label shown back to the doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTime {
    pub at: DateTime<Utc>,
    pub label: String,
}

// ── Language model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("language model not configured")]
    NotConfigured,
    #[error("language model unreachable: {0}")]
    Unreachable(String),
    #[error("language model rejected the request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("language model returned an empty response")]
    EmptyResponse,
}
