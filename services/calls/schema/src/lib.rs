//! sea-orm entities for the calls service.

pub mod call_logs;
pub mod call_schedules;
pub mod patients;
pub mod prescriptions;
pub mod reminder_sends;
