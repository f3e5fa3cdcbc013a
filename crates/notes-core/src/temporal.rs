//! # Temporal Helpers
//!
//! All note timestamps are UTC with microsecond precision, the resolution
//! Postgres `timestamptz` stores. Truncating at creation keeps in-memory
//! and persisted values byte-for-byte identical, which the cursor codec
//! relies on.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};

/// Current UTC time truncated to microseconds.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A timestamp strictly later than `previous`.
///
/// Returns the current time when the clock has moved past `previous`,
/// otherwise `previous + 1µs`. Used for `updated_at` so every successful
/// mutation advances it, even on coarse or skewed clocks.
pub fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let current = now();
    if current > previous {
        current
    } else {
        previous + Duration::microseconds(1)
    }
}

/// RFC 3339 with exactly six fractional digits and a `Z` suffix.
pub fn to_canonical_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
