//! Bookable slot generation for one employee on one date.
//!
//! A slot `[t, t + step)` is offered when it lies wholly inside the business
//! hours and the shift window, and overlaps no unavailability block. With
//! hours and shift 09:00-17:00 and a 30-minute step the last slot is 16:30.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::clock::day_range;
use crate::error::{Result, RosterError};
use crate::hours::{hours_for_date, HoursConstraint};
use crate::model::{BusinessHours, Employee, Unavailability};
use crate::shift::{resolve_shift, ShiftDay};

pub const DEFAULT_STEP_MINUTES: u32 = 30;

/// Slot start times on `date`, ascending.
///
/// `shift` is `None` when the employee has no entry for the weekday, which
/// yields no slots, as does a day off or a work day without a window.
pub fn generate_slots(
    date: NaiveDate,
    hours: HoursConstraint,
    shift: Option<ShiftDay>,
    unavailabilities: &[Unavailability],
    step_minutes: u32,
    tz: Tz,
) -> Result<Vec<DateTime<Utc>>> {
    if step_minutes == 0 {
        return Err(RosterError::Validation(
            "slot step must be at least one minute".to_string(),
        ));
    }
    let Some(shift_window) = shift.and_then(|s| s.working_window()) else {
        return Ok(Vec::new());
    };
    let hours_window = match hours {
        HoursConstraint::Closed => return Ok(Vec::new()),
        HoursConstraint::Open(window) => Some(window),
        HoursConstraint::Unconstrained => None,
    };

    let step = Duration::minutes(i64::from(step_minutes));
    let day = day_range(date, tz);
    let mut slots = Vec::new();
    let mut cursor = day.start;
    while cursor <= day.end {
        let slot_end = cursor + step;
        let in_hours = hours_window.is_none_or(|w| w.covers_span(cursor, slot_end));
        let in_shift = shift_window.covers_span(cursor, slot_end);
        let blocked = unavailabilities
            .iter()
            .any(|u| u.window().overlaps_span(cursor, slot_end));
        if in_hours && in_shift && !blocked {
            slots.push(cursor);
        }
        cursor = slot_end;
    }

    debug!(%date, count = slots.len(), step_minutes, "generated slots");
    Ok(slots)
}

/// Slots for `employee` on `date`, resolving hours and shift from
/// configuration.
pub fn slots_for_employee(
    business_hours: &[BusinessHours],
    employee: &Employee,
    date: NaiveDate,
    step_minutes: u32,
    tz: Tz,
) -> Result<Vec<DateTime<Utc>>> {
    generate_slots(
        date,
        hours_for_date(business_hours, date, tz),
        resolve_shift(&employee.shifts, date, tz),
        &employee.unavailabilities,
        step_minutes,
        tz,
    )
}
