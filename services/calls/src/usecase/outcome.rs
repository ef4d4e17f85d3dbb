use chrono::{DateTime, Utc};

use carecall_domain::id::CallLogId;

use crate::domain::repository::{CallLogRepository, LanguageModel};
use crate::domain::types::{CallEvent, CallLogStatus, CallOutcome, OutcomeUpdate};
use crate::error::CallsServiceError;
use crate::usecase::summarize::CallSummarizer;

// ── RecordCallOutcome ────────────────────────────────────────────────────────

/// Applies provider lifecycle events to call logs.
///
/// Replays of a stored terminal event change nothing and report `Unchanged`, so only the
/// first delivery triggers a summary.
pub struct RecordCallOutcomeUseCase<C: CallLogRepository> {
    pub call_logs: C,
}

impl<C: CallLogRepository> RecordCallOutcomeUseCase<C> {
    pub async fn execute(
        &self,
        event: CallEvent,
        now: DateTime<Utc>,
    ) -> Result<OutcomeUpdate, CallsServiceError> {
        let provider_call_id = event.provider_call_id().to_owned();
        if self
            .call_logs
            .find_by_provider_call_id(&provider_call_id)
            .await?
            .is_none()
        {
            tracing::warn!(provider_call_id = %provider_call_id, "outcome event for unknown call");
            return Ok(OutcomeUpdate::UnknownCall);
        }

        let changed = match event {
            CallEvent::Started { started_at, .. } => {
                self.call_logs
                    .mark_started(&provider_call_id, started_at.unwrap_or(now), now)
                    .await?
            }
            CallEvent::Ended { report, .. } => {
                let outcome = CallOutcome::from_report(report);
                self.call_logs
                    .record_outcome(&provider_call_id, &outcome, now)
                    .await?
            }
        };

        let log = self
            .call_logs
            .find_by_provider_call_id(&provider_call_id)
            .await?
            .ok_or(CallsServiceError::CallLogNotFound)?;

        // Only a changed terminal state needs a (new) summary.
        if changed && log.status != CallLogStatus::Initiated {
            tracing::info!(
                provider_call_id = %provider_call_id,
                status = log.status.as_str(),
                "call outcome recorded"
            );
            Ok(OutcomeUpdate::Updated(log))
        } else {
            Ok(OutcomeUpdate::Unchanged(log))
        }
    }
}

// ── SummarizeCall ────────────────────────────────────────────────────────────

pub struct SummarizeCallUseCase<C: CallLogRepository, L: LanguageModel> {
    pub call_logs: C,
    pub summarizer: CallSummarizer<L>,
}

impl<C: CallLogRepository, L: LanguageModel> SummarizeCallUseCase<C, L> {
    /// Summarize the stored transcript and attach it to the log.
    pub async fn execute(&self, id: CallLogId, now: DateTime<Utc>) -> Result<String, CallsServiceError> {
        let log = self
            .call_logs
            .find_by_id(id)
            .await?
            .ok_or(CallsServiceError::CallLogNotFound)?;
        let summary = self
            .summarizer
            .summarize(&log.patient_name, log.transcript.as_deref())
            .await;
        self.call_logs.set_summary(id, &summary, now).await?;
        Ok(summary)
    }
}

// ── IngestCallEvent ──────────────────────────────────────────────────────────

/// Records a provider event and summarizes the log when that event finished the call.
///
/// A replayed end-of-call report is `Unchanged`, so the model is asked once per outcome.
pub struct IngestCallEventUseCase<C: CallLogRepository, L: LanguageModel> {
    pub outcomes: RecordCallOutcomeUseCase<C>,
    pub summaries: SummarizeCallUseCase<C, L>,
}

#[derive(Debug)]
pub struct IngestedEvent {
    pub update: OutcomeUpdate,
    /// Set when this delivery produced a new summary.
    pub summary: Option<String>,
}

impl<C: CallLogRepository, L: LanguageModel> IngestCallEventUseCase<C, L> {
    pub async fn execute(
        &self,
        event: CallEvent,
        now: DateTime<Utc>,
    ) -> Result<IngestedEvent, CallsServiceError> {
        let ended = matches!(event, CallEvent::Ended { .. });
        let update = self.outcomes.execute(event, now).await?;

        let summary = match &update {
            OutcomeUpdate::Updated(log) if ended => {
                match self.summaries.execute(log.id, now).await {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        tracing::warn!(call_log_id = %log.id, error = %e, "call summary failed");
                        None
                    }
                }
            }
            _ => None,
        };
        Ok(IngestedEvent { update, summary })
    }
}
