use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::config::VoiceProviderConfig;
use crate::domain::repository::VoiceGateway;
use crate::domain::types::{CallRequest, GatewayError, PlacedCall};
use crate::infra::llm::truncate;

/// Outbound calls through a Vapi-style assistant API (`POST {base}/call`).
#[derive(Clone)]
pub struct VapiGateway {
    pub http: reqwest::Client,
    pub config: VoiceProviderConfig,
}

impl VapiGateway {
    pub fn new(config: VoiceProviderConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }
}

#[derive(Deserialize)]
struct CreatedCall {
    id: Option<String>,
}

fn require<'a>(value: &'a Option<String>, env_var: &str) -> Result<&'a str, GatewayError> {
    value
        .as_deref()
        .ok_or_else(|| GatewayError::Configuration(env_var.to_owned()))
}

/// Request body for `POST /call`. The assistant reads `message` (and the per-language
/// `message_<code>` variants) from its variable values.
pub fn call_body(request: &CallRequest, assistant_id: &str, phone_number_id: &str) -> Value {
    let mut variables = Map::new();
    variables.insert("patientName".into(), json!(request.patient_name));
    variables.insert("message".into(), json!(request.message));
    for (code, text) in &request.localized_variants {
        variables.insert(format!("message_{code}"), json!(text));
    }
    if let Some(lang) = &request.preferred_language {
        variables.insert("preferredLanguage".into(), json!(lang));
    }

    json!({
        "assistantId": assistant_id,
        "phoneNumberId": phone_number_id,
        "customer": {
            "number": request.phone.as_str(),
            "name": request.patient_name,
        },
        "assistantOverrides": {
            "variableValues": variables,
        },
        "metadata": {
            "purpose": request.purpose.as_str(),
            "scheduleId": request.schedule_id.map(|id| id.to_string()),
            "patientId": request.patient_id.map(|id| id.to_string()),
        },
    })
}

impl VoiceGateway for VapiGateway {
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, GatewayError> {
        let api_key = require(&self.config.api_key, "VAPI_API_KEY")?;
        let assistant_id = require(&self.config.assistant_id, "VAPI_ASSISTANT_ID")?;
        let phone_number_id = require(&self.config.phone_number_id, "VAPI_PHONE_NUMBER_ID")?;

        let url = format!("{}/call", self.config.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&call_body(request, assistant_id, phone_number_id))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.config.request_timeout.as_secs())
                } else {
                    GatewayError::Unreachable(e.to_string())
                }
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        let created: CreatedCall = serde_json::from_str(&body).map_err(|_| GatewayError::Rejected {
            status: status.as_u16(),
            body: truncate(&body, 500),
        })?;
        match created.id.filter(|id| !id.is_empty()) {
            Some(provider_call_id) => Ok(PlacedCall { provider_call_id }),
            None => Err(GatewayError::Rejected {
                status: status.as_u16(),
                body: "response carried no call id".to_owned(),
            }),
        }
    }
}
