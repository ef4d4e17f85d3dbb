use crate::domain::repository::LanguageModel;
use crate::domain::types::LlmError;

const SYSTEM_PROMPT: &str = "You summarize phone calls between a clinic's voice assistant \
and a patient for the treating doctor. Write 2 to 4 plain sentences in English: whether the \
patient was reached, what they reported about symptoms and medication, and anything the \
doctor should follow up on. Do not invent details that are not in the transcript.";

/// Clinician-facing call summaries. Never fails; returns a labeled placeholder instead.
pub struct CallSummarizer<L: LanguageModel> {
    pub llm: L,
}

impl<L: LanguageModel> CallSummarizer<L> {
    pub async fn summarize(&self, patient_name: &str, transcript: Option<&str>) -> String {
        let Some(transcript) = transcript.map(str::trim).filter(|t| !t.is_empty()) else {
            return placeholder("transcript empty");
        };
        let prompt = format!("Patient: {patient_name}\n\nTranscript:\n{transcript}");
        match self.llm.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(summary) if !summary.trim().is_empty() => summary.trim().to_owned(),
            Ok(_) => placeholder(&LlmError::EmptyResponse.to_string()),
            Err(e) => {
                if e != LlmError::NotConfigured {
                    tracing::warn!(error = %e, "call summary failed");
                }
                placeholder(&e.to_string())
            }
        }
    }
}

fn placeholder(reason: &str) -> String {
    format!("[summary unavailable: {reason}]")
}
