use chrono::{DateTime, Utc};

use crate::domain::repository::LanguageModel;
use crate::domain::types::{LocalizedVariants, ResolvedTime};
use crate::error::CallsServiceError;
use crate::usecase::localize::MessageLocalizer;
use crate::usecase::time::{TimeInput, TimeResolver};

// ── PreviewTime ──────────────────────────────────────────────────────────────

/// Read-only: what a time input would resolve to, without creating anything.
pub struct PreviewTimeUseCase<L: LanguageModel> {
    pub resolver: TimeResolver<L>,
}

impl<L: LanguageModel> PreviewTimeUseCase<L> {
    pub async fn execute(
        &self,
        input: TimeInput,
        now: DateTime<Utc>,
    ) -> Result<ResolvedTime, CallsServiceError> {
        Ok(self.resolver.resolve(&input, now).await?)
    }
}

// ── PreviewTranslation ───────────────────────────────────────────────────────

pub struct PreviewTranslationUseCase<L: LanguageModel> {
    pub localizer: MessageLocalizer<L>,
}

impl<L: LanguageModel> PreviewTranslationUseCase<L> {
    pub async fn execute(&self, message: &str) -> Result<LocalizedVariants, CallsServiceError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CallsServiceError::Validation(
                "message must not be empty".to_owned(),
            ));
        }
        Ok(self.localizer.localize(message).await)
    }
}
