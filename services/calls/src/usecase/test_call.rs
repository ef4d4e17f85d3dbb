use std::time::Duration;

use chrono::{DateTime, Utc};

use carecall_domain::id::CallLogId;
use carecall_domain::phone::PhoneNumber;

use crate::domain::repository::{CallLogRepository, VoiceGateway};
use crate::domain::types::{CallLog, CallPurpose, CallRequest, GatewayError, LocalizedVariants};
use crate::error::CallsServiceError;
use crate::usecase::dispatch::place_with_timeout;

pub struct PlaceTestCallInput {
    pub phone: String,
    pub patient_name: String,
    pub message: String,
    /// Store a call log so the outcome webhook has somewhere to land.
    pub record_log: bool,
}

#[derive(Debug)]
pub struct TestCallResult {
    pub provider_call_id: String,
    pub phone: PhoneNumber,
    pub call_log_id: Option<CallLogId>,
}

// ── PlaceTestCall ────────────────────────────────────────────────────────────

/// Originate a call right away, bypassing the schedule store. Provider errors go straight
/// back to the caller.
pub struct PlaceTestCallUseCase<C: CallLogRepository, G: VoiceGateway> {
    pub call_logs: C,
    pub gateway: G,
    pub source_language: String,
    pub default_country_code: String,
    pub call_timeout: Duration,
}

impl<C: CallLogRepository, G: VoiceGateway> PlaceTestCallUseCase<C, G> {
    pub async fn execute(
        &self,
        input: PlaceTestCallInput,
        now: DateTime<Utc>,
    ) -> Result<TestCallResult, CallsServiceError> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(CallsServiceError::Validation(
                "message must not be empty".to_owned(),
            ));
        }
        let phone = PhoneNumber::normalize(&input.phone, &self.default_country_code)
            .map_err(|e| GatewayError::InvalidNumber(e.to_string()))?;

        let mut localized_variants = LocalizedVariants::new();
        localized_variants.insert(self.source_language.clone(), message.to_owned());
        let patient_name = match input.patient_name.trim() {
            "" => "Test patient".to_owned(),
            name => name.to_owned(),
        };
        let request = CallRequest {
            phone: phone.clone(),
            patient_name,
            message: message.to_owned(),
            localized_variants,
            preferred_language: None,
            purpose: CallPurpose::Test,
            schedule_id: None,
            patient_id: None,
            doctor_id: None,
        };

        let placed = place_with_timeout(&self.gateway, &request, self.call_timeout)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "test call failed"))?;

        let call_log_id = if input.record_log {
            let log = CallLog::initiated(placed.provider_call_id.clone(), &request, None, now);
            self.call_logs.create(&log).await?;
            Some(log.id)
        } else {
            None
        };

        tracing::info!(provider_call_id = %placed.provider_call_id, "test call placed");
        Ok(TestCallResult {
            provider_call_id: placed.provider_call_id,
            phone,
            call_log_id,
        })
    }
}
