//! timeutil — shared timestamp arithmetic (UTC only).
//!
//! Contains:
//! - floor_minute/floor_hour/floor_day/floor_month: truncation to boundaries.
//! - round_minute(): round-half-up at minute granularity.
//! - months_back(): calendar-aware month stepping.
//!
//! All helpers are pure arithmetic on `DateTime<Utc>`; no Option juggling
//! since UTC has no ambiguous local times.

use chrono::{DateTime, Datelike, Duration, Months, Timelike, Utc};

/// Truncate to the start of the minute.
#[inline]
pub fn floor_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t - Duration::nanoseconds(i64::from(t.nanosecond())) - Duration::seconds(i64::from(t.second()))
}

/// Truncate to the top of the hour.
#[inline]
pub fn floor_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    floor_minute(t) - Duration::minutes(i64::from(t.minute()))
}

/// Truncate to midnight.
#[inline]
pub fn floor_day(t: DateTime<Utc>) -> DateTime<Utc> {
    floor_hour(t) - Duration::hours(i64::from(t.hour()))
}

/// Truncate to midnight of the first day of the month.
#[inline]
pub fn floor_month(t: DateTime<Utc>) -> DateTime<Utc> {
    floor_day(t) - Duration::days(i64::from(t.day()) - 1)
}

/// Round to the nearest minute: add 30 seconds, then truncate. Compensates
/// for the few seconds of latency between capturing "now" and the snapshot
/// timestamp reported by the storage service.
#[inline]
pub fn round_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    floor_minute(t + Duration::seconds(30))
}

/// Step back a whole number of calendar months. Saturates at the minimum
/// representable instant instead of failing.
#[inline]
pub fn months_back(t: DateTime<Utc>, n: u32) -> DateTime<Utc> {
    t.checked_sub_months(Months::new(n))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
