use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context as _, anyhow, bail};
use chrono_tz::Tz;

/// Calls service configuration loaded from environment variables.
///
/// Built once at startup; each component receives its own slice at construction.
#[derive(Debug, Clone)]
pub struct CallsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3120). Env var: `CALLS_PORT`.
    pub calls_port: u16,
    /// Zone in which time phrases and reminder slots are read. Env var: `CLINIC_TIMEZONE`.
    pub clinic_timezone: Tz,
    /// Prepended to bare national phone numbers (default "91"). Env var: `DEFAULT_COUNTRY_CODE`.
    pub default_country_code: String,
    pub voice: VoiceProviderConfig,
    pub llm: LlmConfig,
    pub localizer: LocalizerConfig,
    pub dispatcher: DispatcherConfig,
}

/// Voice provider credentials. Absent values surface as configuration errors at call time.
#[derive(Debug, Clone)]
pub struct VoiceProviderConfig {
    pub api_key: Option<String>,
    pub assistant_id: Option<String>,
    pub phone_number_id: Option<String>,
    pub base_url: String,
    /// Shared secret expected in `x-vapi-secret` on webhook calls.
    pub webhook_secret: Option<String>,
    pub request_timeout: Duration,
}

/// OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LocalizerConfig {
    /// Language doctors author messages in.
    pub source_language: String,
    /// Languages every message is translated into, best effort.
    pub target_languages: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub tick: Duration,
    /// Most due schedules picked up by one sweep.
    pub batch_size: u64,
    /// Calls originated in parallel within a sweep.
    pub concurrency: usize,
    /// Upper bound on one origination request.
    pub call_timeout: Duration,
    /// Claims older than this are failed as interrupted.
    pub claim_lease: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(30),
            batch_size: 50,
            concurrency: 4,
            call_timeout: Duration::from_secs(20),
            claim_lease: Duration::from_secs(600),
        }
    }
}

impl CallsConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let external_timeout = Duration::from_secs(parse_or(&var, "EXTERNAL_CALL_TIMEOUT_SECS", 20)?);

        let clinic_timezone = match var("CLINIC_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow!("invalid CLINIC_TIMEZONE {name:?}: {e}"))?,
            None => chrono_tz::Asia::Kolkata,
        };

        let source_language = var("SOURCE_LANGUAGE")
            .unwrap_or_else(|| "en".to_owned())
            .to_lowercase();
        let target_languages = var("TARGET_LANGUAGES")
            .unwrap_or_else(|| "hi,te".to_owned())
            .split(',')
            .map(|code| code.trim().to_lowercase())
            .filter(|code| !code.is_empty() && *code != source_language)
            .collect();

        let concurrency: usize = parse_or(&var, "DISPATCH_CONCURRENCY", 4)?;

        // The lease has to outlive any origination still in flight.
        let claim_lease = Duration::from_secs(parse_or(&var, "CLAIM_LEASE_SECS", 600)?);
        if claim_lease <= external_timeout.saturating_mul(2) {
            bail!(
                "CLAIM_LEASE_SECS ({}s) must be more than twice EXTERNAL_CALL_TIMEOUT_SECS ({}s)",
                claim_lease.as_secs(),
                external_timeout.as_secs()
            );
        }

        Ok(Self {
            database_url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            calls_port: parse_or(&var, "CALLS_PORT", 3120)?,
            clinic_timezone,
            default_country_code: var("DEFAULT_COUNTRY_CODE")
                .map(|cc| cc.trim_start_matches('+').to_owned())
                .unwrap_or_else(|| "91".to_owned()),
            voice: VoiceProviderConfig {
                api_key: var("VAPI_API_KEY"),
                assistant_id: var("VAPI_ASSISTANT_ID"),
                phone_number_id: var("VAPI_PHONE_NUMBER_ID"),
                base_url: var("VAPI_BASE_URL").unwrap_or_else(|| "https://api.vapi.ai".to_owned()),
                webhook_secret: var("VAPI_WEBHOOK_SECRET"),
                request_timeout: external_timeout,
            },
            llm: LlmConfig {
                api_key: var("LLM_API_KEY"),
                base_url: var("LLM_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_owned()),
                model: var("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_owned()),
                request_timeout: external_timeout,
            },
            localizer: LocalizerConfig {
                source_language,
                target_languages,
            },
            dispatcher: DispatcherConfig {
                tick: Duration::from_secs(parse_or::<u64>(&var, "DISPATCH_TICK_SECS", 30)?.max(1)),
                batch_size: parse_or(&var, "DISPATCH_BATCH_SIZE", 50)?,
                concurrency: concurrency.max(1),
                call_timeout: external_timeout,
                claim_lease,
            },
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("invalid {key} {raw:?}: {e}")),
        None => Ok(default),
    }
}
