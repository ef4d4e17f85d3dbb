use carecall_calls::domain::types::{CallLogStatus, CallPurpose, GatewayError};
use carecall_calls::error::CallsServiceError;
use carecall_calls::usecase::call_log::{GetCallLogUseCase, ListCallLogsUseCase};
use carecall_calls::usecase::test_call::{PlaceTestCallInput, PlaceTestCallUseCase};
use carecall_domain::id::DoctorId;
use carecall_domain::pagination::PageRequest;

use crate::helpers::{MockCallLogRepo, MockGateway, doctor, ist, operator};

fn usecase(
    call_logs: &MockCallLogRepo,
    gateway: &MockGateway,
) -> PlaceTestCallUseCase<MockCallLogRepo, MockGateway> {
    PlaceTestCallUseCase {
        call_logs: call_logs.clone(),
        gateway: gateway.clone(),
        source_language: "en".to_owned(),
        default_country_code: "91".to_owned(),
        call_timeout: std::time::Duration::from_secs(20),
    }
}

fn input(phone: &str, record_log: bool) -> PlaceTestCallInput {
    PlaceTestCallInput {
        phone: phone.to_owned(),
        patient_name: String::new(),
        message: "This is a test call from the clinic.".to_owned(),
        record_log,
    }
}

// ── PlaceTestCallUseCase ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_place_test_call_and_record_log() {
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();

    let result = usecase(&call_logs, &gateway)
        .execute(input("098765 43210", true), ist("2026-10-18 10:00:00"))
        .await
        .unwrap();

    assert_eq!(result.provider_call_id, "call-1");
    assert_eq!(result.phone.as_str(), "+919876543210");
    let logs = call_logs.logs_handle();
    let logs = logs.lock().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(Some(logs[0].id), result.call_log_id);
    assert_eq!(logs[0].purpose, CallPurpose::Test);
    assert_eq!(logs[0].status, CallLogStatus::Initiated);
    assert_eq!(logs[0].patient_name, "Test patient");
}

#[tokio::test]
async fn should_skip_log_when_not_requested() {
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();

    let result = usecase(&call_logs, &gateway)
        .execute(input("+14155550123", false), ist("2026-10-18 10:00:00"))
        .await
        .unwrap();

    assert_eq!(result.call_log_id, None);
    assert!(call_logs.logs_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_malformed_number_before_dialing() {
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();

    let result = usecase(&call_logs, &gateway)
        .execute(input("call me maybe", true), ist("2026-10-18 10:00:00"))
        .await;

    assert!(
        matches!(result, Err(CallsServiceError::Validation(_))),
        "expected Validation, got {result:?}"
    );
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn should_surface_missing_provider_setting() {
    let call_logs = MockCallLogRepo::empty();
    let gateway =
        MockGateway::failing(GatewayError::Configuration("VAPI_PHONE_NUMBER_ID".to_owned()));

    let result = usecase(&call_logs, &gateway)
        .execute(input("9876543210", true), ist("2026-10-18 10:00:00"))
        .await;

    match result {
        Err(err @ CallsServiceError::Configuration(_)) => {
            assert!(err.to_string().contains("VAPI_PHONE_NUMBER_ID"))
        }
        other => panic!("expected Configuration, got {other:?}"),
    }
    assert!(call_logs.logs_handle().lock().unwrap().is_empty());
}

// ── Call log access ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_hide_unowned_test_call_logs_from_doctors() {
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();
    let placed = usecase(&call_logs, &gateway)
        .execute(input("9876543210", true), ist("2026-10-18 10:00:00"))
        .await
        .unwrap();
    let id = placed.call_log_id.unwrap();

    let get = GetCallLogUseCase {
        call_logs: call_logs.clone(),
    };
    let as_doctor = get.execute(&doctor(DoctorId::generate()), id).await;
    assert!(
        matches!(as_doctor, Err(CallsServiceError::CallLogNotFound)),
        "expected CallLogNotFound, got {as_doctor:?}"
    );
    assert!(get.execute(&operator(), id).await.is_ok());

    let list = ListCallLogsUseCase {
        call_logs: call_logs.clone(),
    };
    let visible = list
        .execute(&doctor(DoctorId::generate()), None, None, PageRequest::default())
        .await
        .unwrap();
    assert!(visible.is_empty());
}
