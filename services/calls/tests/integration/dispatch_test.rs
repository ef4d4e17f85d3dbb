use std::time::Duration;

use futures::future::join_all;

use carecall_calls::domain::types::{CallLogStatus, CallPurpose, GatewayError, ScheduleStatus};
use carecall_calls::error::CallsServiceError;
use carecall_calls::usecase::schedule::CancelScheduleUseCase;
use carecall_domain::id::DoctorId;

use crate::helpers::{
    MockCallLogRepo, MockGateway, MockScheduleRepo, dispatch_usecase, doctor, ist,
    pending_schedule, test_patient,
};

#[tokio::test]
async fn should_do_nothing_when_nothing_is_due() {
    let patient = test_patient(DoctorId::generate(), Some("9876543210"));
    let future = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![future.clone()]);
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();
    let usecase = dispatch_usecase(&schedules, &call_logs, vec![patient], &gateway);

    let report = usecase.execute(ist("2026-10-18 17:59:00")).await.unwrap();

    assert_eq!(report.due, 0);
    assert_eq!(gateway.call_count(), 0);
    assert_eq!(schedules.get(future.id).status, ScheduleStatus::Pending);
    assert!(call_logs.logs_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_place_due_call_and_complete_schedule() {
    let patient = test_patient(DoctorId::generate(), Some("9876543210"));
    let schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();
    let usecase = dispatch_usecase(&schedules, &call_logs, vec![patient.clone()], &gateway);

    let now = ist("2026-10-18 18:00:20");
    let report = usecase.execute(now).await.unwrap();

    assert_eq!((report.due, report.placed, report.failed), (1, 1, 0));
    let stored = schedules.get(schedule.id);
    assert_eq!(stored.status, ScheduleStatus::Completed);
    assert_eq!(stored.provider_call_id.as_deref(), Some("call-1"));
    assert_eq!(stored.completed_at, Some(now));

    let requests = gateway.requests_handle();
    let requests = requests.lock().unwrap();
    assert_eq!(requests[0].phone.as_str(), "+919876543210");
    assert_eq!(requests[0].preferred_language.as_deref(), Some("hi"));
    assert_eq!(requests[0].localized_variants, schedule.localized_variants);

    let logs = call_logs.logs_handle();
    let logs = logs.lock().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].provider_call_id, "call-1");
    assert_eq!(logs[0].schedule_id, Some(schedule.id));
    assert_eq!(logs[0].patient_name, patient.name);
    assert_eq!(logs[0].purpose, CallPurpose::Scheduled);
    assert_eq!(logs[0].status, CallLogStatus::Initiated);
}

#[tokio::test]
async fn should_fail_schedule_when_patient_has_no_phone() {
    let patient = test_patient(DoctorId::generate(), Some("   "));
    let schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();
    let usecase = dispatch_usecase(&schedules, &call_logs, vec![patient], &gateway);

    let report = usecase.execute(ist("2026-10-18 18:00:00")).await.unwrap();

    assert_eq!(report.failed, 1);
    let stored = schedules.get(schedule.id);
    assert_eq!(stored.status, ScheduleStatus::Failed);
    assert_eq!(
        stored.error_message.as_deref(),
        Some("patient has no phone number on file")
    );
    assert_eq!(stored.completed_at, Some(ist("2026-10-18 18:00:00")));
    assert_eq!(gateway.call_count(), 0);
    assert!(call_logs.logs_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_store_configuration_error_naming_the_setting() {
    let patient = test_patient(DoctorId::generate(), Some("9876543210"));
    let schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::failing(GatewayError::Configuration("VAPI_API_KEY".to_owned()));
    let usecase = dispatch_usecase(&schedules, &call_logs, vec![patient], &gateway);

    usecase.execute(ist("2026-10-18 18:01:00")).await.unwrap();

    let stored = schedules.get(schedule.id);
    assert_eq!(stored.status, ScheduleStatus::Failed);
    assert_eq!(
        stored.error_message.as_deref(),
        Some("voice provider is not configured: set VAPI_API_KEY")
    );
    assert!(call_logs.logs_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_isolate_one_patients_failure_from_the_others() {
    let doctor_id = DoctorId::generate();
    let reachable = test_patient(doctor_id, Some("9876543210"));
    let rejected = test_patient(doctor_id, Some("9876500000"));
    let first = pending_schedule(&rejected, ist("2026-10-18 17:59:00"));
    let second = pending_schedule(&reachable, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![first.clone(), second.clone()]);
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::failing_for(
        "+919876500000",
        GatewayError::Rejected {
            status: 400,
            body: "number is on a do-not-call list".to_owned(),
        },
    );
    let usecase = dispatch_usecase(&schedules, &call_logs, vec![reachable, rejected], &gateway);

    let report = usecase.execute(ist("2026-10-18 18:05:00")).await.unwrap();

    assert_eq!((report.placed, report.failed), (1, 1));
    assert_eq!(schedules.get(first.id).status, ScheduleStatus::Failed);
    assert_eq!(schedules.get(second.id).status, ScheduleStatus::Completed);
    assert_eq!(call_logs.logs_handle().lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn should_fail_schedule_when_provider_times_out() {
    let patient = test_patient(DoctorId::generate(), Some("9876543210"));
    let schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway {
        delay: Some(Duration::from_secs(60)),
        ..MockGateway::accepting()
    };
    let usecase = dispatch_usecase(&schedules, &call_logs, vec![patient], &gateway);

    usecase.execute(ist("2026-10-18 18:00:00")).await.unwrap();

    let stored = schedules.get(schedule.id);
    assert_eq!(stored.status, ScheduleStatus::Failed);
    assert_eq!(
        stored.error_message.as_deref(),
        Some("voice provider did not respond within 20s")
    );
}

#[tokio::test]
async fn should_place_exactly_one_call_across_concurrent_sweeps() {
    let patient = test_patient(DoctorId::generate(), Some("9876543210"));
    let schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();
    let sweeps: Vec<_> = (0..4)
        .map(|_| dispatch_usecase(&schedules, &call_logs, vec![patient.clone()], &gateway))
        .collect();

    let now = ist("2026-10-18 18:00:30");
    let reports = join_all(sweeps.iter().map(|usecase| usecase.execute(now))).await;

    let placed: usize = reports.iter().map(|r| r.as_ref().unwrap().placed).sum();
    assert_eq!(placed, 1);
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(call_logs.logs_handle().lock().unwrap().len(), 1);
    assert_eq!(schedules.get(schedule.id).status, ScheduleStatus::Completed);
}

#[tokio::test]
async fn should_reject_cancel_while_dispatch_holds_the_schedule() {
    let doctor_id = DoctorId::generate();
    let patient = test_patient(doctor_id, Some("9876543210"));
    let schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();
    let dispatch = dispatch_usecase(&schedules, &call_logs, vec![patient], &gateway);
    let cancel = CancelScheduleUseCase {
        schedules: schedules.clone(),
    };

    let now = ist("2026-10-18 18:00:00");
    let caller = doctor(doctor_id);
    // The dispatch future claims the schedule and parks inside the gateway before the
    // cancel future is first polled.
    let (report, cancelled) = tokio::join!(
        dispatch.execute(now),
        cancel.execute(&caller, schedule.id, now)
    );

    assert_eq!(report.unwrap().placed, 1);
    match cancelled {
        Err(CallsServiceError::InvalidState(message)) => {
            assert_eq!(message, "schedule is being dispatched")
        }
        other => panic!("expected InvalidState, got {other:?}"),
    }
    assert_eq!(schedules.get(schedule.id).status, ScheduleStatus::Completed);
    assert_eq!(gateway.call_count(), 1);
}

#[tokio::test]
async fn should_not_dispatch_cancelled_schedule() {
    let patient = test_patient(DoctorId::generate(), Some("9876543210"));
    let mut schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    schedule.status = ScheduleStatus::Cancelled;
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();
    let usecase = dispatch_usecase(&schedules, &call_logs, vec![patient], &gateway);

    let report = usecase.execute(ist("2026-10-18 19:00:00")).await.unwrap();

    assert_eq!(report.due, 0);
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn should_fail_stale_claims_without_redialing() {
    let patient = test_patient(DoctorId::generate(), Some("9876543210"));
    let schedule = pending_schedule(&patient, ist("2026-10-18 18:00:00"));
    let schedules = MockScheduleRepo::new(vec![schedule.clone()]);
    schedules.force_claim(schedule.id, ist("2026-10-18 18:00:00"));
    let call_logs = MockCallLogRepo::empty();
    let gateway = MockGateway::accepting();
    let usecase = dispatch_usecase(&schedules, &call_logs, vec![patient], &gateway);

    // Inside the lease the claim is left alone.
    let report = usecase.execute(ist("2026-10-18 18:05:00")).await.unwrap();
    assert_eq!(report.interrupted, 0);
    assert_eq!(schedules.get(schedule.id).status, ScheduleStatus::Pending);

    let report = usecase.execute(ist("2026-10-18 18:11:00")).await.unwrap();
    assert_eq!(report.interrupted, 1);
    let stored = schedules.get(schedule.id);
    assert_eq!(stored.status, ScheduleStatus::Failed);
    assert!(
        stored
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("interrupted"))
    );
    assert_eq!(stored.completed_at, Some(ist("2026-10-18 18:11:00")));
    assert_eq!(gateway.call_count(), 0);
}
