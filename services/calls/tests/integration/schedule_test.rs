use carecall_calls::domain::types::{LlmError, ScheduleStatus};
use carecall_calls::error::CallsServiceError;
use carecall_calls::usecase::localize::MessageLocalizer;
use carecall_calls::usecase::schedule::{
    CancelScheduleUseCase, CreateScheduleInput, CreateScheduleUseCase, GetScheduleUseCase,
    ListSchedulesUseCase,
};
use carecall_calls::usecase::time::{TimeInput, TimeResolver};
use carecall_domain::id::{DoctorId, PatientId};
use carecall_domain::pagination::PageRequest;

use crate::helpers::{
    IST, MockLlm, MockPatientDirectory, MockScheduleRepo, doctor, ist, localizer_config,
    operator, pending_schedule, test_patient,
};

fn create_usecase(
    schedules: &MockScheduleRepo,
    patients: Vec<carecall_calls::domain::types::PatientContact>,
    llm: MockLlm,
) -> CreateScheduleUseCase<MockScheduleRepo, MockPatientDirectory, MockLlm> {
    CreateScheduleUseCase {
        schedules: schedules.clone(),
        patients: MockPatientDirectory::new(patients),
        resolver: TimeResolver {
            llm: llm.clone(),
            zone: IST,
        },
        localizer: MessageLocalizer {
            llm,
            config: localizer_config(),
        },
        default_country_code: "91".to_owned(),
    }
}

fn input(patient_id: PatientId, time: TimeInput) -> CreateScheduleInput {
    CreateScheduleInput {
        patient_id,
        time,
        message: "Please take your evening dose.".to_owned(),
    }
}

// ── CreateScheduleUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_pending_schedule_with_localized_variants() {
    let doctor_id = DoctorId::generate();
    let patient = test_patient(doctor_id, Some("98765 43210"));
    let schedules = MockScheduleRepo::empty();
    let llm = MockLlm::replying(r#"{"hi": "कृपया शाम की खुराक लें।", "te": "దయచేసి సాయంత్రం మోతాదు తీసుకోండి."}"#);
    let usecase = create_usecase(&schedules, vec![patient.clone()], llm);

    let now = ist("2026-10-18 09:00:00");
    let schedule = usecase
        .execute(
            &doctor(doctor_id),
            input(patient.id, TimeInput::Phrase("today 6 pm".to_owned())),
            now,
        )
        .await
        .unwrap();

    assert_eq!(schedule.status, ScheduleStatus::Pending);
    assert_eq!(schedule.scheduled_at, ist("2026-10-18 18:00:00"));
    assert_eq!(schedule.time_label, "Today, 6:00 PM");
    assert_eq!(schedule.doctor_id, doctor_id);
    assert_eq!(
        schedule.localized_variants.get("en").map(String::as_str),
        Some("Please take your evening dose.")
    );
    assert_eq!(
        schedule.localized_variants.get("hi").map(String::as_str),
        Some("कृपया शाम की खुराक लें।")
    );
    assert_eq!(schedules.all().len(), 1);
}

#[tokio::test]
async fn should_accept_time_one_minute_ahead() {
    let doctor_id = DoctorId::generate();
    let patient = test_patient(doctor_id, Some("9876543210"));
    let schedules = MockScheduleRepo::empty();
    let usecase = create_usecase(&schedules, vec![patient.clone()], MockLlm::replying("{}"));

    let result = usecase
        .execute(
            &doctor(doctor_id),
            input(patient.id, TimeInput::Phrase("today 11:59pm".to_owned())),
            ist("2026-10-18 23:58:00"),
        )
        .await;

    let schedule = result.unwrap();
    assert_eq!(schedule.scheduled_at, ist("2026-10-18 23:59:00"));
}

#[tokio::test]
async fn should_reject_time_in_current_minute() {
    let doctor_id = DoctorId::generate();
    let patient = test_patient(doctor_id, Some("9876543210"));
    let schedules = MockScheduleRepo::empty();
    let usecase = create_usecase(&schedules, vec![patient.clone()], MockLlm::replying("{}"));

    let result = usecase
        .execute(
            &doctor(doctor_id),
            input(patient.id, TimeInput::Phrase("today 11:59pm".to_owned())),
            ist("2026-10-18 23:59:00"),
        )
        .await;

    assert!(
        matches!(result, Err(CallsServiceError::Validation(_))),
        "expected Validation, got {result:?}"
    );
    assert!(schedules.all().is_empty());
}

#[tokio::test]
async fn should_store_original_text_when_translator_is_down() {
    let doctor_id = DoctorId::generate();
    let patient = test_patient(doctor_id, Some("9876543210"));
    let schedules = MockScheduleRepo::empty();
    let llm = MockLlm::failing(LlmError::Unreachable("connection refused".to_owned()));
    let usecase = create_usecase(&schedules, vec![patient.clone()], llm);

    let schedule = usecase
        .execute(
            &doctor(doctor_id),
            input(patient.id, TimeInput::Explicit("2026-10-19T09:00".to_owned())),
            ist("2026-10-18 09:00:00"),
        )
        .await
        .unwrap();

    assert_eq!(schedule.localized_variants.len(), 3);
    assert!(
        schedule
            .localized_variants
            .values()
            .all(|text| text == "Please take your evening dose.")
    );
}

#[tokio::test]
async fn should_reject_unparseable_phrase_without_storing() {
    let doctor_id = DoctorId::generate();
    let patient = test_patient(doctor_id, Some("9876543210"));
    let schedules = MockScheduleRepo::empty();
    let llm = MockLlm::replying(r#"{"error": "no specific time"}"#);
    let usecase = create_usecase(&schedules, vec![patient.clone()], llm.clone());

    let result = usecase
        .execute(
            &doctor(doctor_id),
            input(patient.id, TimeInput::Phrase("sometime soon".to_owned())),
            ist("2026-10-18 09:00:00"),
        )
        .await;

    assert!(
        matches!(result, Err(CallsServiceError::Validation(_))),
        "expected Validation, got {result:?}"
    );
    assert_eq!(llm.call_count(), 1);
    assert!(schedules.all().is_empty());
}

#[tokio::test]
async fn should_reject_patient_without_phone() {
    let doctor_id = DoctorId::generate();
    let patient = test_patient(doctor_id, None);
    let schedules = MockScheduleRepo::empty();
    let usecase = create_usecase(&schedules, vec![patient.clone()], MockLlm::replying("{}"));

    let result = usecase
        .execute(
            &doctor(doctor_id),
            input(patient.id, TimeInput::Phrase("tomorrow 9 am".to_owned())),
            ist("2026-10-18 09:00:00"),
        )
        .await;

    match result {
        Err(CallsServiceError::Validation(message)) => {
            assert_eq!(message, "patient has no phone number on file")
        }
        other => panic!("expected Validation, got {other:?}"),
    }
    assert!(schedules.all().is_empty());
}

#[tokio::test]
async fn should_hide_other_doctors_patients() {
    let patient = test_patient(DoctorId::generate(), Some("9876543210"));
    let schedules = MockScheduleRepo::empty();
    let usecase = create_usecase(&schedules, vec![patient.clone()], MockLlm::replying("{}"));

    let result = usecase
        .execute(
            &doctor(DoctorId::generate()),
            input(patient.id, TimeInput::Phrase("tomorrow 9 am".to_owned())),
            ist("2026-10-18 09:00:00"),
        )
        .await;

    assert!(
        matches!(result, Err(CallsServiceError::PatientNotFound)),
        "expected PatientNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_empty_message() {
    let doctor_id = DoctorId::generate();
    let patient = test_patient(doctor_id, Some("9876543210"));
    let schedules = MockScheduleRepo::empty();
    let usecase = create_usecase(&schedules, vec![patient.clone()], MockLlm::replying("{}"));

    let result = usecase
        .execute(
            &doctor(doctor_id),
            CreateScheduleInput {
                patient_id: patient.id,
                time: TimeInput::Phrase("tomorrow 9 am".to_owned()),
                message: "   ".to_owned(),
            },
            ist("2026-10-18 09:00:00"),
        )
        .await;

    assert!(
        matches!(result, Err(CallsServiceError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}

// ── CancelScheduleUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_cancel_pending_schedule() {
    let doctor_id = DoctorId::generate();
    let patient = test_patient(doctor_id, Some("9876543210"));
    let schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    let usecase = CancelScheduleUseCase {
        schedules: schedules.clone(),
    };

    let cancelled = usecase
        .execute(&doctor(doctor_id), schedule.id, ist("2026-10-18 10:00:00"))
        .await
        .unwrap();

    assert_eq!(cancelled.status, ScheduleStatus::Cancelled);
    let stored = schedules.get(schedule.id);
    assert_eq!(stored.status, ScheduleStatus::Cancelled);
    assert_eq!(stored.completed_at, Some(ist("2026-10-18 10:00:00")));
}

#[tokio::test]
async fn should_not_cancel_terminal_schedule() {
    let doctor_id = DoctorId::generate();
    let patient = test_patient(doctor_id, Some("9876543210"));
    let mut schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    schedule.status = ScheduleStatus::Completed;
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    let usecase = CancelScheduleUseCase {
        schedules: schedules.clone(),
    };

    let result = usecase
        .execute(&doctor(doctor_id), schedule.id, ist("2026-10-18 19:00:00"))
        .await;

    match result {
        Err(CallsServiceError::InvalidState(message)) => {
            assert_eq!(message, "schedule is already completed")
        }
        other => panic!("expected InvalidState, got {other:?}"),
    }
    assert_eq!(schedules.get(schedule.id).status, ScheduleStatus::Completed);
}

#[tokio::test]
async fn should_not_cancel_schedule_of_another_doctor() {
    let patient = test_patient(DoctorId::generate(), Some("9876543210"));
    let schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    let usecase = CancelScheduleUseCase {
        schedules: schedules.clone(),
    };

    let result = usecase
        .execute(
            &doctor(DoctorId::generate()),
            schedule.id,
            ist("2026-10-18 10:00:00"),
        )
        .await;

    assert!(
        matches!(result, Err(CallsServiceError::ScheduleNotFound)),
        "expected ScheduleNotFound, got {result:?}"
    );
    assert_eq!(schedules.get(schedule.id).status, ScheduleStatus::Pending);
}

// ── Get / List ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_let_operator_read_any_schedule() {
    let patient = test_patient(DoctorId::generate(), Some("9876543210"));
    let schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let usecase = GetScheduleUseCase {
        schedules: MockScheduleRepo::new(vec![schedule.clone()]),
    };

    let found = usecase.execute(&operator(), schedule.id).await.unwrap();
    assert_eq!(found.id, schedule.id);
}

#[tokio::test]
async fn should_list_only_callers_schedules_in_time_order() {
    let doctor_id = DoctorId::generate();
    let mine = test_patient(doctor_id, Some("9876543210"));
    let theirs = test_patient(DoctorId::generate(), Some("9876500000"));
    let later = pending_schedule(&mine, ist("2026-10-19 09:00:00"));
    let sooner = pending_schedule(&mine, ist("2026-10-18 18:00:00"));
    let other = pending_schedule(&theirs, ist("2026-10-18 12:00:00"));
    let usecase = ListSchedulesUseCase {
        schedules: MockScheduleRepo::new(vec![later.clone(), other.clone(), sooner.clone()]),
    };

    let listed = usecase
        .execute(&doctor(doctor_id), None, None, PageRequest::default())
        .await
        .unwrap();
    let ids: Vec<_> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);

    let everything = usecase
        .execute(&operator(), None, Some(ScheduleStatus::Pending), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(everything.len(), 3);
}
