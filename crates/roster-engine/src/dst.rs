//! DST transition policies for wall-clock times.
//!
//! A local time such as `02:30` may not exist (spring-forward gap) or may
//! exist twice (fall-back fold) in a given timezone. [`resolve_local`] turns
//! a naive local datetime into a UTC instant according to a [`DstPolicy`].

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Policy for handling wall-clock times that fall during DST transitions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DstPolicy {
    /// Times in the DST gap do not resolve (e.g., 2:30 AM during spring forward)
    Skip,
    /// Shift to the first valid local time after the gap
    ShiftForward,
    /// Keep the offset in effect before the transition
    #[default]
    WallClock,
}

/// Largest gap we probe forward over when shifting. Real-world gaps are at
/// most two hours.
const MAX_GAP_MINUTES: i64 = 180;

/// Resolve a naive local datetime in `tz` to a UTC instant.
///
/// Ambiguous times (the fold) always resolve to the earlier instant.
pub fn resolve_local(tz: Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => match policy {
            DstPolicy::Skip => None,
            DstPolicy::ShiftForward => (1..=MAX_GAP_MINUTES).find_map(|m| {
                tz.from_local_datetime(&(local + Duration::minutes(m)))
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
            DstPolicy::WallClock => {
                // Offset in effect just before the gap opened.
                let before = tz
                    .from_local_datetime(&(local - Duration::minutes(MAX_GAP_MINUTES)))
                    .earliest()?;
                let offset = i64::from(before.offset().fix().local_minus_utc());
                Some(Utc.from_utc_datetime(&(local - Duration::seconds(offset))))
            }
        },
    }
}
