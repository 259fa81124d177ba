//! Wall-clock arithmetic for the background sampler.

use chrono::{DateTime, TimeDelta, TimeZone, Timelike};
use std::time::Duration;

pub const INTERVAL_MINUTES: u32 = 15;

/// Time left until the next multiple of `interval_minutes` past midnight.
/// Exactly on a boundary, that is a whole interval.
pub fn until_next_boundary<T: Timelike>(now: &T, interval_minutes: u32) -> Duration {
    let interval = u64::from(interval_minutes.max(1)) * 60;
    let elapsed = u64::from(now.num_seconds_from_midnight()) % interval;
    let nanos = u64::from(now.nanosecond().min(999_999_999));
    Duration::from_secs(interval - elapsed) - Duration::from_nanos(nanos)
}

/// The grid point `until_next_boundary` leads to. Callers that sleep should
/// label their work with this instant rather than re-read the clock on
/// waking, since the wall clock may have been slewed meanwhile.
pub fn next_boundary<Tz: TimeZone>(now: &DateTime<Tz>, interval_minutes: u32) -> DateTime<Tz> {
    let wait = until_next_boundary(now, interval_minutes);
    // A wait is at most one interval, far inside `i64` nanoseconds.
    now.clone() + TimeDelta::nanoseconds(wait.as_nanos() as i64)
}

/// `HH:MM` of the grid point at or before `now`.
pub fn bucket_label<T: Timelike>(now: &T, interval_minutes: u32) -> String {
    let interval = interval_minutes.max(1);
    let minute = now.minute() - now.minute() % interval;
    format!("{:02}:{:02}", now.hour(), minute)
}

/// True during the first interval of the day.
pub fn in_midnight_window<T: Timelike>(now: &T, interval_minutes: u32) -> bool {
    now.hour() == 0 && now.minute() < interval_minutes
}
