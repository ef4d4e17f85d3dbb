use std::collections::HashMap;

use carecall_domain::language::{find_language, is_native_script};

use crate::config::LocalizerConfig;
use crate::domain::repository::LanguageModel;
use crate::domain::types::LocalizedVariants;
use crate::usecase::time::strip_code_fence;

/// Produces the message variants the voice assistant reads from.
///
/// Best effort: the result always holds the source text under the source language, and
/// every target slot falls back to the source text when translation fails or comes back
/// transliterated.
pub struct MessageLocalizer<L: LanguageModel> {
    pub llm: L,
    pub config: LocalizerConfig,
}

impl<L: LanguageModel> MessageLocalizer<L> {
    pub async fn localize(&self, message: &str) -> LocalizedVariants {
        let source = self.config.source_language.as_str();
        let targets: Vec<&str> = self
            .config
            .target_languages
            .iter()
            .map(String::as_str)
            .filter(|code| *code != source)
            .collect();

        let mut variants = LocalizedVariants::new();
        variants.insert(source.to_owned(), message.to_owned());
        if targets.is_empty() {
            return variants;
        }

        let translations = match self.translate(message, source, &targets).await {
            Ok(translations) => translations,
            Err(reason) => {
                tracing::warn!(reason = %reason, "translation unavailable, using original text");
                HashMap::new()
            }
        };

        for code in targets {
            let text = match translations.get(code).map(|t| t.trim()) {
                Some(t) if !t.is_empty() && is_native_script(code, t) => t.to_owned(),
                Some(t) if !t.is_empty() => {
                    tracing::warn!(language = code, "translation not in native script, using original text");
                    message.to_owned()
                }
                _ => message.to_owned(),
            };
            variants.insert(code.to_owned(), text);
        }
        variants
    }

    async fn translate(
        &self,
        message: &str,
        source: &str,
        targets: &[&str],
    ) -> Result<HashMap<String, String>, String> {
        let system = translation_prompt(source, targets);
        let reply = self
            .llm
            .complete(&system, message)
            .await
            .map_err(|e| e.to_string())?;
        let map: HashMap<String, serde_json::Value> =
            serde_json::from_str(strip_code_fence(&reply)).map_err(|e| format!("malformed reply: {e}"))?;
        Ok(map
            .into_iter()
            .filter_map(|(code, value)| match value {
                serde_json::Value::String(text) => Some((code.to_lowercase(), text)),
                _ => None,
            })
            .collect())
    }
}

fn language_label(code: &str) -> String {
    match find_language(code) {
        Some(lang) => format!("{} ({})", lang.name, lang.code),
        None => code.to_owned(),
    }
}

fn translation_prompt(source: &str, targets: &[&str]) -> String {
    let wanted = targets
        .iter()
        .map(|code| language_label(code))
        .collect::<Vec<_>>()
        .join(", ");
    let keys = targets
        .iter()
        .map(|code| format!("\"{code}\": \"...\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Translate the doctor's message, written in {}, for a phone call to a patient.\n\
         Target languages: {wanted}.\n\
         Write each translation in the language's native script, never transliterated \
         into Latin letters. Keep medicine names and numbers as written.\n\
         Reply with JSON only: {{{keys}}}",
        language_label(source),
    )
}
