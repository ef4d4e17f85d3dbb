use carecall_auth_types::identity::CallerIdentity;
use carecall_domain::id::{CallLogId, PatientId, ScheduleId};
use carecall_domain::pagination::PageRequest;

use crate::domain::repository::CallLogRepository;
use crate::domain::types::{CallLog, CallLogFilter};
use crate::error::CallsServiceError;

// ── GetCallLog ───────────────────────────────────────────────────────────────

pub struct GetCallLogUseCase<C: CallLogRepository> {
    pub call_logs: C,
}

impl<C: CallLogRepository> GetCallLogUseCase<C> {
    /// Test calls belong to no doctor and are visible to operators only.
    pub async fn execute(
        &self,
        caller: &CallerIdentity,
        id: CallLogId,
    ) -> Result<CallLog, CallsServiceError> {
        self.call_logs
            .find_by_id(id)
            .await?
            .filter(|log| match log.doctor_id {
                Some(owner) => caller.can_access(owner),
                None => caller.is_operator(),
            })
            .ok_or(CallsServiceError::CallLogNotFound)
    }
}

// ── ListCallLogs ─────────────────────────────────────────────────────────────

pub struct ListCallLogsUseCase<C: CallLogRepository> {
    pub call_logs: C,
}

impl<C: CallLogRepository> ListCallLogsUseCase<C> {
    pub async fn execute(
        &self,
        caller: &CallerIdentity,
        patient_id: Option<PatientId>,
        schedule_id: Option<ScheduleId>,
        page: PageRequest,
    ) -> Result<Vec<CallLog>, CallsServiceError> {
        let filter = CallLogFilter {
            doctor_id: (!caller.is_operator()).then_some(caller.doctor_id),
            patient_id,
            schedule_id,
        };
        self.call_logs.list(&filter, page.clamped()).await
    }
}
