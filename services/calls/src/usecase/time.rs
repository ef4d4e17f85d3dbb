use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::domain::repository::LanguageModel;
use crate::domain::time::{ResolveTimeError, describe, ensure_future, parse_explicit, parse_phrase};
use crate::domain::types::{LlmError, ResolvedTime};

/// What the caller sent: an absolute instant or a phrase such as "tomorrow 9 am".
#[derive(Debug, Clone)]
pub enum TimeInput {
    Explicit(String),
    Phrase(String),
}

/// Turns explicit instants and free-text phrases into a future, minute-precision instant.
///
/// Phrases outside the built-in grammar go to the language model. Nothing ever defaults
/// to "now".
pub struct TimeResolver<L: LanguageModel> {
    pub llm: L,
    pub zone: Tz,
}

impl<L: LanguageModel> TimeResolver<L> {
    pub async fn resolve(
        &self,
        input: &TimeInput,
        now: DateTime<Utc>,
    ) -> Result<ResolvedTime, ResolveTimeError> {
        let (at, label) = match input {
            TimeInput::Explicit(raw) => {
                let at = parse_explicit(raw, self.zone)
                    .ok_or_else(|| ResolveTimeError::InvalidDate(raw.clone()))??;
                (at, None)
            }
            TimeInput::Phrase(raw) => {
                if raw.trim().is_empty() {
                    return Err(ResolveTimeError::Unparseable(raw.clone()));
                }
                match parse_phrase(raw, now, self.zone) {
                    Some(at) => (at?, None),
                    None => self.ask_model(raw, now).await?,
                }
            }
        };

        let at = ensure_future(at, now, self.zone)?;
        let label = label
            .filter(|l: &String| !l.trim().is_empty())
            .unwrap_or_else(|| describe(at, now, self.zone));
        Ok(ResolvedTime { at, label })
    }

    async fn ask_model(
        &self,
        phrase: &str,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, Option<String>), ResolveTimeError> {
        let system = time_prompt(now, self.zone);
        let reply = match self.llm.complete(&system, phrase.trim()).await {
            Ok(reply) => reply,
            Err(LlmError::NotConfigured) => {
                return Err(ResolveTimeError::ModelUnavailable(
                    "set LLM_API_KEY".to_owned(),
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "time phrase parse request failed");
                return Err(ResolveTimeError::ModelUnavailable(e.to_string()));
            }
        };

        let parsed: ModelTimeReply = serde_json::from_str(strip_code_fence(&reply))
            .map_err(|_| ResolveTimeError::Unparseable(phrase.to_owned()))?;
        if parsed.error.is_some() {
            return Err(ResolveTimeError::Unparseable(phrase.to_owned()));
        }
        let raw = parsed
            .datetime
            .ok_or_else(|| ResolveTimeError::Unparseable(phrase.to_owned()))?;
        let at = parse_explicit(&raw, self.zone)
            .ok_or_else(|| ResolveTimeError::InvalidDate(raw.clone()))??;
        Ok((at, parsed.label))
    }
}

#[derive(Deserialize)]
struct ModelTimeReply {
    datetime: Option<String>,
    label: Option<String>,
    error: Option<String>,
}

fn time_prompt(now: DateTime<Utc>, zone: Tz) -> String {
    let local = now.with_timezone(&zone);
    format!(
        "You convert a spoken or typed time into a calendar time.\n\
         Current local date and time: {} ({}), timezone {}.\n\
         Reply with JSON only, no prose:\n\
         {{\"datetime\": \"YYYY-MM-DDTHH:MM\", \"label\": \"short human label\"}}\n\
         If the input is ambiguous or not a time, reply {{\"error\": \"reason\"}}.\n\
         Never guess and never return the current time for unclear input.\n\
         Examples, assuming it is 2026-03-10 10:00:\n\
         \"today 6:35 pm\" -> {{\"datetime\": \"2026-03-10T18:35\", \"label\": \"Today, 6:35 PM\"}}\n\
         \"tomorrow 9 am\" -> {{\"datetime\": \"2026-03-11T09:00\", \"label\": \"Tomorrow, 9:00 AM\"}}\n\
         \"day after tomorrow at 7:15pm\" -> {{\"datetime\": \"2026-03-12T19:15\", \"label\": \"Thu 12 Mar, 7:15 PM\"}}\n\
         \"sometime soon\" -> {{\"error\": \"no specific time\"}}",
        local.format("%Y-%m-%d %H:%M"),
        local.format("%A"),
        zone.name(),
    )
}

/// Models like to wrap JSON in Markdown fences.
pub(crate) fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
