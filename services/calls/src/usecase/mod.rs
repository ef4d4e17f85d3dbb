pub mod call_log;
pub mod dispatch;
pub mod localize;
pub mod outcome;
pub mod preview;
pub mod reminder;
pub mod schedule;
pub mod summarize;
pub mod test_call;
pub mod time;
