// libs/doctor-cell/src/services/schedule.rs
//
// Pure admissibility check of a candidate timestamp against a doctor's
// recurring weekly schedule. No store access, no clock reads.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

use crate::models::ScheduleSlot;

/// Fallback window bounds used when a slot's time string is missing or
/// unparseable: "00:00" and "23:59".
const OPEN_START_MINUTES: u32 = 0;
const OPEN_END_MINUTES: u32 = 23 * 60 + 59;

/// Map chrono's weekday onto the schedule convention (0 = Sunday).
pub fn day_of_week(weekday: Weekday) -> i32 {
    match weekday {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Lenient "HH:mm" parse. Malformed input degrades to `default` rather than
/// erroring; legacy schedule rows contain free-form strings.
fn clock_minutes(raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };

    let mut parts = raw.splitn(2, ':');
    let (Some(hours), Some(minutes)) = (parts.next(), parts.next()) else {
        return default;
    };

    match (hours.trim().parse::<u32>(), minutes.trim().parse::<u32>()) {
        (Ok(h), Ok(m)) if h < 24 && m < 60 => h * 60 + m,
        _ => default,
    }
}

/// Whether `candidate` falls inside the doctor's published weekly schedule.
///
/// An empty schedule admits everything. Otherwise the candidate's minute of
/// day must fall in `[start, end)` of at least one slot on the same weekday;
/// the end boundary is exclusive, so a Monday 18:00-20:00 slot admits 19:59
/// but not 20:00. The candidate is evaluated on its own wall-clock fields
/// with no timezone conversion.
pub fn is_within_schedule(candidate: NaiveDateTime, schedule: &[ScheduleSlot]) -> bool {
    if schedule.is_empty() {
        return true;
    }

    let day = day_of_week(candidate.weekday());
    let minute_of_day = candidate.hour() * 60 + candidate.minute();

    schedule
        .iter()
        .filter(|slot| slot.day_of_week == day)
        .any(|slot| {
            let start = clock_minutes(slot.start_time.as_deref(), OPEN_START_MINUTES);
            let end = clock_minutes(slot.end_time.as_deref(), OPEN_END_MINUTES);
            minute_of_day >= start && minute_of_day < end
        })
}
