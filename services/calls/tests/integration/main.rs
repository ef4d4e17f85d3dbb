
mod dispatch_test;
mod outcome_test;
mod schedule_test;
mod test_call_test;
