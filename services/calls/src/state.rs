use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::CallsConfig;
use crate::infra::db::{
    DbCallLogRepository, DbPatientDirectory, DbPrescriptionRepository, DbReminderSendRepository,
    DbScheduleRepository,
};
use crate::infra::llm::OpenAiCompatibleClient;
use crate::infra::vapi::VapiGateway;
use crate::usecase::dispatch::DispatchDueSchedulesUseCase;
use crate::usecase::localize::MessageLocalizer;
use crate::usecase::outcome::{
    IngestCallEventUseCase, RecordCallOutcomeUseCase, SummarizeCallUseCase,
};
use crate::usecase::reminder::SendMedicationRemindersUseCase;
use crate::usecase::summarize::CallSummarizer;
use crate::usecase::time::TimeResolver;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<CallsConfig>,
    pub llm: OpenAiCompatibleClient,
    pub voice: VapiGateway,
}

impl AppState {
    pub fn schedule_repo(&self) -> DbScheduleRepository {
        DbScheduleRepository {
            db: self.db.clone(),
        }
    }

    pub fn call_log_repo(&self) -> DbCallLogRepository {
        DbCallLogRepository {
            db: self.db.clone(),
        }
    }

    pub fn patient_directory(&self) -> DbPatientDirectory {
        DbPatientDirectory {
            db: self.db.clone(),
        }
    }

    pub fn prescription_repo(&self) -> DbPrescriptionRepository {
        DbPrescriptionRepository {
            db: self.db.clone(),
        }
    }

    pub fn reminder_send_repo(&self) -> DbReminderSendRepository {
        DbReminderSendRepository {
            db: self.db.clone(),
        }
    }

    pub fn time_resolver(&self) -> TimeResolver<OpenAiCompatibleClient> {
        TimeResolver {
            llm: self.llm.clone(),
            zone: self.config.clinic_timezone,
        }
    }

    pub fn localizer(&self) -> MessageLocalizer<OpenAiCompatibleClient> {
        MessageLocalizer {
            llm: self.llm.clone(),
            config: self.config.localizer.clone(),
        }
    }

    pub fn summarizer(&self) -> CallSummarizer<OpenAiCompatibleClient> {
        CallSummarizer {
            llm: self.llm.clone(),
        }
    }

    pub fn dispatch_usecase(
        &self,
    ) -> DispatchDueSchedulesUseCase<
        DbScheduleRepository,
        DbCallLogRepository,
        DbPatientDirectory,
        VapiGateway,
    > {
        DispatchDueSchedulesUseCase {
            schedules: self.schedule_repo(),
            call_logs: self.call_log_repo(),
            patients: self.patient_directory(),
            gateway: self.voice.clone(),
            config: self.config.dispatcher.clone(),
            default_country_code: self.config.default_country_code.clone(),
        }
    }

    pub fn reminder_usecase(
        &self,
    ) -> SendMedicationRemindersUseCase<
        DbPrescriptionRepository,
        DbReminderSendRepository,
        DbCallLogRepository,
        DbPatientDirectory,
        VapiGateway,
        OpenAiCompatibleClient,
    > {
        SendMedicationRemindersUseCase {
            prescriptions: self.prescription_repo(),
            sends: self.reminder_send_repo(),
            call_logs: self.call_log_repo(),
            patients: self.patient_directory(),
            gateway: self.voice.clone(),
            localizer: self.localizer(),
            zone: self.config.clinic_timezone,
            default_country_code: self.config.default_country_code.clone(),
            concurrency: self.config.dispatcher.concurrency,
            call_timeout: self.config.dispatcher.call_timeout,
        }
    }

    pub fn ingest_call_event_usecase(
        &self,
    ) -> IngestCallEventUseCase<DbCallLogRepository, OpenAiCompatibleClient> {
        IngestCallEventUseCase {
            outcomes: RecordCallOutcomeUseCase {
                call_logs: self.call_log_repo(),
            },
            summaries: SummarizeCallUseCase {
                call_logs: self.call_log_repo(),
                summarizer: self.summarizer(),
            },
        }
    }
}
