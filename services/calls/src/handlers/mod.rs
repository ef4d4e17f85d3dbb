pub mod call_log;
pub mod dispatch;
pub mod preview;
pub mod schedule;
pub mod test_call;
pub mod webhook;
