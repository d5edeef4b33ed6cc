//! Time-window primitives: wall-clock parsing, day boundaries, containment.
//!
//! Every function takes the tenant timezone explicitly. A "day" is always the
//! local calendar day in that timezone, and instants are `DateTime<Utc>`.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::{resolve_local, DstPolicy};

/// A closed time window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Inclusive-start, inclusive-end containment.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// True when the half-open span `[start, end)` lies entirely in this window.
    pub fn covers_span(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start <= start && end <= self.end
    }

    /// True when the half-open span `[start, end)` shares at least one instant
    /// with this window.
    pub fn overlaps_span(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start <= self.end && self.start < end
    }
}

/// Parse an `"HH:mm"` wall-clock string into a time of day.
///
/// Accepts one- or two-digit hours (`"9:00"`, `"09:00"`). Anything else,
/// including empty strings and seconds, is rejected.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)
}

/// Interpret `"HH:mm"` on `date` in `tz`.
///
/// Returns `None` for malformed input. Callers treat `None` as "no window".
pub fn parse_wall_clock(s: &str, date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let time = parse_time_of_day(s)?;
    resolve_local(tz, date.and_time(time), DstPolicy::WallClock)
}

/// First instant of the local day `date`.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    // ShiftForward always resolves; the epoch fallback is unreachable for
    // real tz data.
    resolve_local(tz, midnight, DstPolicy::ShiftForward).unwrap_or_else(|| midnight.and_utc())
}

/// Last instant (millisecond precision) of the local day `date`.
pub fn end_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    match date.succ_opt() {
        Some(next) => start_of_day(next, tz) - Duration::milliseconds(1),
        None => start_of_day(date, tz) + Duration::days(1) - Duration::milliseconds(1),
    }
}

/// `[start_of_day(date), end_of_day(date)]`.
pub fn day_range(date: NaiveDate, tz: Tz) -> Window {
    Window::new(start_of_day(date, tz), end_of_day(date, tz))
}

/// Local calendar date of an instant.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Every local calendar day touched by `window`, in ascending order.
///
/// Empty when `window.start > window.end`.
pub fn each_day(window: &Window, tz: Tz) -> Vec<NaiveDate> {
    if window.start > window.end {
        return Vec::new();
    }
    let last = local_date(window.end, tz);
    local_date(window.start, tz)
        .iter_days()
        .take_while(|d| *d <= last)
        .collect()
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> crate::error::Result<Tz> {
    name.parse()
        .map_err(|_| crate::error::RosterError::InvalidTimezone(name.to_string()))
}
