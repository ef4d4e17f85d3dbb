use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::domain::types::{CallEvent, EndOfCallReport};
use crate::error::CallsServiceError;
use crate::state::AppState;

pub const WEBHOOK_SECRET_HEADER: &str = "x-vapi-secret";

fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// Map a provider webhook payload to a call event. Events this service does not act on
/// (transcript chunks, tool calls, other status updates) decode to `None`.
pub fn decode_event(payload: &Value) -> Option<CallEvent> {
    let message = &payload["message"];
    let provider_call_id = text(&message["call"]["id"])?;

    match message["type"].as_str()? {
        "status-update" if message["status"].as_str() == Some("in-progress") => {
            Some(CallEvent::Started {
                provider_call_id,
                started_at: timestamp(&message["timestamp"])
                    .or_else(|| timestamp(&message["call"]["startedAt"])),
            })
        }
        "end-of-call-report" => {
            let artifact = &message["artifact"];
            Some(CallEvent::Ended {
                provider_call_id,
                report: EndOfCallReport {
                    ended_reason: text(&message["endedReason"]),
                    transcript: text(&artifact["transcript"])
                        .or_else(|| text(&message["transcript"])),
                    recording_url: text(&artifact["recordingUrl"])
                        .or_else(|| text(&message["recordingUrl"])),
                    started_at: timestamp(&message["startedAt"]),
                    ended_at: timestamp(&message["endedAt"]),
                    duration_seconds: message["durationSeconds"].as_f64(),
                },
            })
        }
        _ => None,
    }
}

/// Compare the shared secret header with the configured one. No configured secret means
/// every delivery is accepted.
pub fn verify_secret(expected: Option<&str>, headers: &HeaderMap) -> Result<(), CallsServiceError> {
    let Some(secret) = expected else {
        return Ok(());
    };
    let presented = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if presented != Some(secret) {
        return Err(CallsServiceError::Unauthorized);
    }
    Ok(())
}

// ── POST /webhooks/voice ─────────────────────────────────────────────────────

/// Always acknowledges a correctly authenticated delivery, whatever it contains, so the
/// provider does not retry.
pub async fn receive_voice_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, CallsServiceError> {
    verify_secret(state.config.voice.webhook_secret.as_deref(), &headers)?;

    let ack = Json(json!({ "received": true }));
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable voice event");
            return Ok(ack);
        }
    };
    let Some(event) = decode_event(&payload) else {
        tracing::debug!(
            event_type = payload["message"]["type"].as_str().unwrap_or("unknown"),
            "ignoring voice event"
        );
        return Ok(ack);
    };

    let usecase = state.ingest_call_event_usecase();
    tokio::spawn(async move {
        if let Err(e) = usecase.execute(event, Utc::now()).await {
            tracing::error!(error = %e, "failed to record call outcome");
        }
    });
    Ok(ack)
}
