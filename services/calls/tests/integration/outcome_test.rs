use carecall_calls::domain::types::{
    CallEvent, CallLog, CallLogStatus, CallPurpose, CallRequest, EndOfCallReport,
    LocalizedVariants, OutcomeUpdate,
};
use carecall_calls::handlers::webhook::decode_event;
use carecall_calls::usecase::outcome::{
    IngestCallEventUseCase, RecordCallOutcomeUseCase, SummarizeCallUseCase,
};
use carecall_calls::usecase::summarize::CallSummarizer;
use carecall_domain::id::{DoctorId, PatientId, ScheduleId};
use carecall_domain::phone::PhoneNumber;

use crate::helpers::{MockCallLogRepo, MockLlm, ist};

fn initiated_log(provider_call_id: &str) -> CallLog {
    let request = CallRequest {
        phone: PhoneNumber::normalize("9876543210", "91").unwrap(),
        patient_name: "Asha Rao".to_owned(),
        message: "Please take your evening dose.".to_owned(),
        localized_variants: LocalizedVariants::new(),
        preferred_language: None,
        purpose: CallPurpose::Scheduled,
        schedule_id: Some(ScheduleId::generate()),
        patient_id: Some(PatientId::generate()),
        doctor_id: Some(DoctorId::generate()),
    };
    CallLog::initiated(
        provider_call_id.to_owned(),
        &request,
        Some(ist("2026-10-18 18:00:00")),
        ist("2026-10-18 18:00:05"),
    )
}

fn ended(provider_call_id: &str, reason: &str, transcript: Option<&str>) -> CallEvent {
    CallEvent::Ended {
        provider_call_id: provider_call_id.to_owned(),
        report: EndOfCallReport {
            ended_reason: Some(reason.to_owned()),
            transcript: transcript.map(str::to_owned),
            recording_url: Some("https://cdn.example.test/call-1.wav".to_owned()),
            started_at: Some(ist("2026-10-18 18:00:10")),
            ended_at: Some(ist("2026-10-18 18:01:40")),
            duration_seconds: Some(90.2),
        },
    }
}

// ── RecordCallOutcomeUseCase ─────────────────────────────────────────────────

#[tokio::test]
async fn should_discard_event_for_unknown_call() {
    let call_logs = MockCallLogRepo::empty();
    let usecase = RecordCallOutcomeUseCase {
        call_logs: call_logs.clone(),
    };

    let result = usecase
        .execute(
            ended("call-404", "customer-ended-call", Some("User: hi")),
            ist("2026-10-18 18:02:00"),
        )
        .await
        .unwrap();

    assert!(
        matches!(result, OutcomeUpdate::UnknownCall),
        "expected UnknownCall, got {result:?}"
    );
    assert!(call_logs.logs_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_record_terminal_outcome() {
    let call_logs = MockCallLogRepo::new(vec![initiated_log("call-1")]);
    let usecase = RecordCallOutcomeUseCase {
        call_logs: call_logs.clone(),
    };

    let result = usecase
        .execute(
            ended("call-1", "customer-ended-call", Some("AI: Hello\nUser: I took it.")),
            ist("2026-10-18 18:02:00"),
        )
        .await
        .unwrap();

    let OutcomeUpdate::Updated(log) = result else {
        panic!("expected Updated, got {result:?}");
    };
    assert_eq!(log.status, CallLogStatus::Completed);
    assert_eq!(log.duration_seconds, Some(90));
    assert_eq!(log.transcript.as_deref(), Some("AI: Hello\nUser: I took it."));
    assert_eq!(log.started_at, Some(ist("2026-10-18 18:00:10")));
}

#[tokio::test]
async fn should_classify_unanswered_call() {
    let call_logs = MockCallLogRepo::new(vec![initiated_log("call-1")]);
    let usecase = RecordCallOutcomeUseCase {
        call_logs: call_logs.clone(),
    };

    usecase
        .execute(
            ended("call-1", "customer-did-not-answer", None),
            ist("2026-10-18 18:02:00"),
        )
        .await
        .unwrap();

    let logs = call_logs.logs_handle();
    let logs = logs.lock().unwrap();
    assert_eq!(logs[0].status, CallLogStatus::NoAnswer);
    assert_eq!(logs[0].transcript, None);
}

#[tokio::test]
async fn should_treat_replayed_outcome_as_unchanged() {
    let call_logs = MockCallLogRepo::new(vec![initiated_log("call-1")]);
    let usecase = RecordCallOutcomeUseCase {
        call_logs: call_logs.clone(),
    };
    let event = ended("call-1", "customer-ended-call", Some("User: fine"));

    let first = usecase
        .execute(event.clone(), ist("2026-10-18 18:02:00"))
        .await
        .unwrap();
    let after_first = call_logs.logs_handle().lock().unwrap()[0].clone();
    let second = usecase
        .execute(event, ist("2026-10-18 18:05:00"))
        .await
        .unwrap();
    let after_second = call_logs.logs_handle().lock().unwrap()[0].clone();

    assert!(matches!(first, OutcomeUpdate::Updated(_)), "got {first:?}");
    assert!(matches!(second, OutcomeUpdate::Unchanged(_)), "got {second:?}");
    assert_eq!(after_second.updated_at, after_first.updated_at);
    assert_eq!(after_second.status, after_first.status);
    assert_eq!(call_logs.logs_handle().lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_mark_started_without_finishing_the_log() {
    let call_logs = MockCallLogRepo::new(vec![initiated_log("call-1")]);
    let usecase = RecordCallOutcomeUseCase {
        call_logs: call_logs.clone(),
    };

    let result = usecase
        .execute(
            CallEvent::Started {
                provider_call_id: "call-1".to_owned(),
                started_at: Some(ist("2026-10-18 18:00:08")),
            },
            ist("2026-10-18 18:00:09"),
        )
        .await
        .unwrap();

    let OutcomeUpdate::Unchanged(log) = result else {
        panic!("expected Unchanged, got {result:?}");
    };
    assert_eq!(log.status, CallLogStatus::Initiated);
    assert_eq!(log.started_at, Some(ist("2026-10-18 18:00:08")));
}

// ── SummarizeCallUseCase ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_store_summary_for_transcript() {
    let mut log = initiated_log("call-1");
    log.transcript = Some("AI: Did you take it?\nUser: Yes, after dinner.".to_owned());
    let id = log.id;
    let call_logs = MockCallLogRepo::new(vec![log]);
    let llm = MockLlm::replying("Patient reached and confirmed the evening dose.");
    let usecase = SummarizeCallUseCase {
        call_logs: call_logs.clone(),
        summarizer: CallSummarizer { llm: llm.clone() },
    };

    let summary = usecase.execute(id, ist("2026-10-18 18:03:00")).await.unwrap();

    assert_eq!(summary, "Patient reached and confirmed the evening dose.");
    assert_eq!(
        call_logs.logs_handle().lock().unwrap()[0].summary.as_deref(),
        Some("Patient reached and confirmed the evening dose.")
    );
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn should_store_placeholder_when_transcript_is_empty() {
    let log = initiated_log("call-1");
    let id = log.id;
    let call_logs = MockCallLogRepo::new(vec![log]);
    let llm = MockLlm::replying("unused");
    let usecase = SummarizeCallUseCase {
        call_logs: call_logs.clone(),
        summarizer: CallSummarizer { llm: llm.clone() },
    };

    let summary = usecase.execute(id, ist("2026-10-18 18:03:00")).await.unwrap();

    assert_eq!(summary, "[summary unavailable: transcript empty]");
    assert_eq!(llm.call_count(), 0);
}

// ── IngestCallEventUseCase ───────────────────────────────────────────────────

fn ingest_usecase(
    call_logs: &MockCallLogRepo,
    llm: &MockLlm,
) -> IngestCallEventUseCase<MockCallLogRepo, MockLlm> {
    IngestCallEventUseCase {
        outcomes: RecordCallOutcomeUseCase {
            call_logs: call_logs.clone(),
        },
        summaries: SummarizeCallUseCase {
            call_logs: call_logs.clone(),
            summarizer: CallSummarizer { llm: llm.clone() },
        },
    }
}

fn end_of_call_payload(provider_call_id: &str) -> serde_json::Value {
    serde_json::json!({
        "message": {
            "type": "end-of-call-report",
            "endedReason": "customer-ended-call",
            "startedAt": "2026-10-18T12:30:10.000Z",
            "endedAt": "2026-10-18T12:31:40.000Z",
            "durationSeconds": 90.2,
            "artifact": {
                "transcript": "AI: Did you take it?\nUser: Yes.",
                "recordingUrl": "https://cdn.example.test/call-1.wav"
            },
            "call": { "id": provider_call_id }
        }
    })
}

#[tokio::test]
async fn should_summarize_once_when_report_is_delivered_twice() {
    let call_logs = MockCallLogRepo::new(vec![initiated_log("call-1")]);
    let llm = MockLlm::replying("Patient confirmed the evening dose.");
    let usecase = ingest_usecase(&call_logs, &llm);
    let payload = end_of_call_payload("call-1");

    let first = usecase
        .execute(decode_event(&payload).unwrap(), ist("2026-10-18 18:02:00"))
        .await
        .unwrap();
    let after_first = call_logs.logs_handle().lock().unwrap()[0].clone();
    let second = usecase
        .execute(decode_event(&payload).unwrap(), ist("2026-10-18 18:07:00"))
        .await
        .unwrap();
    let after_second = call_logs.logs_handle().lock().unwrap()[0].clone();

    assert!(matches!(first.update, OutcomeUpdate::Updated(_)), "got {first:?}");
    assert_eq!(first.summary.as_deref(), Some("Patient confirmed the evening dose."));
    assert!(matches!(second.update, OutcomeUpdate::Unchanged(_)), "got {second:?}");
    assert_eq!(second.summary, None);
    assert_eq!(llm.call_count(), 1);
    assert_eq!(after_second, after_first);
    assert_eq!(
        after_second.summary.as_deref(),
        Some("Patient confirmed the evening dose.")
    );
}

#[tokio::test]
async fn should_not_summarize_started_or_unknown_calls() {
    let call_logs = MockCallLogRepo::new(vec![initiated_log("call-1")]);
    let llm = MockLlm::replying("unused");
    let usecase = ingest_usecase(&call_logs, &llm);

    let started = usecase
        .execute(
            CallEvent::Started {
                provider_call_id: "call-1".to_owned(),
                started_at: Some(ist("2026-10-18 18:00:08")),
            },
            ist("2026-10-18 18:00:09"),
        )
        .await
        .unwrap();
    let unknown = usecase
        .execute(
            decode_event(&end_of_call_payload("call-404")).unwrap(),
            ist("2026-10-18 18:02:00"),
        )
        .await
        .unwrap();

    assert!(matches!(started.update, OutcomeUpdate::Unchanged(_)));
    assert!(matches!(unknown.update, OutcomeUpdate::UnknownCall));
    assert_eq!(started.summary, None);
    assert_eq!(unknown.summary, None);
    assert_eq!(llm.call_count(), 0);
}
