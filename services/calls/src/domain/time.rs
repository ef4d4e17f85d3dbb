//! Deterministic time handling: explicit instants, the short phrase grammar, and the
//! future-instant check every resolved time has to pass.

use chrono::{
    DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone as _, Timelike as _, Utc,
};
use chrono_tz::Tz;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveTimeError {
    #[error("could not understand time {0:?}; try \"tomorrow 9 am\" or an ISO timestamp")]
    Unparseable(String),
    #[error("{0:?} is not a valid date and time")]
    InvalidDate(String),
    #[error("resolved time {} is not in the future", wall_clock(.resolved, .zone))]
    NotInFuture { resolved: DateTime<Utc>, zone: Tz },
    #[error("time phrases need the language model ({0}); send an explicit timestamp instead")]
    ModelUnavailable(String),
}

fn wall_clock(at: &DateTime<Utc>, zone: &Tz) -> String {
    at.with_timezone(zone).format("%Y-%m-%d %H:%M %Z").to_string()
}

/// Drop seconds and sub-seconds.
pub fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

/// Truncate to the minute, then require the result to be strictly after `now`.
pub fn ensure_future(
    at: DateTime<Utc>,
    now: DateTime<Utc>,
    zone: Tz,
) -> Result<DateTime<Utc>, ResolveTimeError> {
    let at = truncate_to_minute(at);
    if at <= now {
        return Err(ResolveTimeError::NotInFuture { resolved: at, zone });
    }
    Ok(at)
}

/// Interpret a wall-clock time in `zone`. Nonexistent local times (DST gaps) are invalid.
pub fn localize(naive: NaiveDateTime, zone: Tz) -> Result<DateTime<Utc>, ResolveTimeError> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| ResolveTimeError::InvalidDate(naive.to_string()))
}

/// Parse an explicit instant: RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS]` in `zone`.
///
/// Returns `None` when the input has neither shape.
pub fn parse_explicit(input: &str, zone: Tz) -> Option<Result<DateTime<Utc>, ResolveTimeError>> {
    let input = input.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(Ok(at.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| localize(naive, zone))
}

/// Resolve the phrases we can read without a model:
/// `today|tonight|tomorrow [at] H[:MM][ am|pm]` and `in N minutes|hours`.
///
/// Returns `None` when the phrase is outside this grammar.
pub fn parse_phrase(
    phrase: &str,
    now: DateTime<Utc>,
    zone: Tz,
) -> Option<Result<DateTime<Utc>, ResolveTimeError>> {
    let normalized = phrase.trim().to_lowercase();
    let words: Vec<&str> = normalized.split_whitespace().collect();

    match words.as_slice() {
        ["in", amount, unit] => {
            let offset = parse_offset(amount, unit)?;
            Some(
                offset
                    .and_then(|offset| now.checked_add_signed(offset))
                    .ok_or_else(|| ResolveTimeError::InvalidDate(phrase.trim().to_owned())),
            )
        }
        [day, rest @ ..] => {
            let day_offset = match *day {
                "today" | "tonight" => 0,
                "tomorrow" => 1,
                _ => return None,
            };
            let rest = match rest {
                ["at", rest @ ..] => rest,
                rest => rest,
            };
            let time = parse_clock(&rest.concat(), *day == "tonight")?;
            let date: NaiveDate = now.with_timezone(&zone).date_naive() + Duration::days(day_offset);
            Some(localize(date.and_time(time), zone))
        }
        [] => None,
    }
}

/// `None` outside the grammar; `Some(None)` for an amount no duration can hold.
fn parse_offset(amount: &str, unit: &str) -> Option<Option<Duration>> {
    let n: i64 = amount.parse().ok()?;
    match unit {
        "minute" | "minutes" | "min" | "mins" => Some(Duration::try_minutes(n)),
        "hour" | "hours" | "hr" | "hrs" => Some(Duration::try_hours(n)),
        _ => None,
    }
}

/// `6`, `18:30`, `6:35pm`, `9am`. Without a meridiem the hour is 24-hour, except that
/// `tonight` moves morning hours into the evening.
fn parse_clock(text: &str, evening: bool) -> Option<NaiveTime> {
    let text = text.replace('.', "");
    let (clock, meridiem) = if let Some(clock) = text.strip_suffix("am") {
        (clock, Some(false))
    } else if let Some(clock) = text.strip_suffix("pm") {
        (clock, Some(true))
    } else {
        (text.as_str(), None)
    };

    let (hour, minute) = match clock.split_once(':') {
        Some((h, m)) if m.len() == 2 => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        Some(_) => return None,
        None => (clock.parse::<u32>().ok()?, 0),
    };
    if minute > 59 {
        return None;
    }

    let hour = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        None if evening && (1..12).contains(&hour) => hour + 12,
        None if hour <= 23 => hour,
        None => return None,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Label shown back to the doctor: `Today, 6:35 PM`, `Tomorrow, 9:00 AM`, or a full date.
pub fn describe(at: DateTime<Utc>, now: DateTime<Utc>, zone: Tz) -> String {
    let local = at.with_timezone(&zone);
    let today = now.with_timezone(&zone).date_naive();
    let clock = local.format("%-I:%M %p");
    match (local.date_naive() - today).num_days() {
        0 => format!("Today, {clock}"),
        1 => format!("Tomorrow, {clock}"),
        _ => format!("{}, {clock}", local.format("%a %-d %b %Y")),
    }
}
