//! Business operating hours per weekday.

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;

use crate::clock::{parse_time_of_day, parse_wall_clock, Window};
use crate::error::{Result, RosterError};
use crate::model::{weekday_index, BusinessHours};

/// What the business hours say about one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoursConstraint {
    /// Marked closed; nothing is bookable.
    Closed,
    /// Open within this window.
    Open(Window),
    /// No record for the weekday, or open/close not both set.
    Unconstrained,
}

/// Resolve the business hours that apply on `date`.
pub fn hours_for_date(hours: &[BusinessHours], date: NaiveDate, tz: Tz) -> HoursConstraint {
    let weekday = weekday_index(date);
    let Some(record) = hours.iter().find(|h| h.day_of_week == weekday) else {
        return HoursConstraint::Unconstrained;
    };
    if record.is_closed {
        return HoursConstraint::Closed;
    }
    let open = record
        .time_open
        .as_deref()
        .and_then(|s| parse_wall_clock(s, date, tz));
    let close = record
        .time_close
        .as_deref()
        .and_then(|s| parse_wall_clock(s, date, tz));
    match (open, close) {
        (Some(start), Some(end)) => HoursConstraint::Open(Window::new(start, end)),
        _ => HoursConstraint::Unconstrained,
    }
}

/// Check a business-hours week before it is saved.
///
/// At most one record per weekday; days must be in `[0, 6]`; an open day with
/// both times set must close after it opens.
pub fn validate_business_week(hours: &[BusinessHours]) -> Result<()> {
    let mut seen = [false; 7];
    for record in hours {
        let day = usize::from(record.day_of_week);
        if day > 6 {
            return Err(RosterError::Validation(format!(
                "day of week {} is out of range 0-6",
                record.day_of_week
            )));
        }
        if seen[day] {
            return Err(RosterError::Validation(format!(
                "duplicate business hours for day {}",
                day
            )));
        }
        seen[day] = true;

        if record.is_closed {
            continue;
        }
        let open = record.time_open.as_deref().map(parse_time_of_day);
        let close = record.time_close.as_deref().map(parse_time_of_day);
        match (open, close) {
            (Some(None), _) | (_, Some(None)) => {
                return Err(RosterError::Validation(format!(
                    "business hours for day {} must use HH:mm",
                    day
                )));
            }
            (Some(Some(o)), Some(Some(c))) if c <= o => {
                return Err(RosterError::Validation(format!(
                    "business hours for day {} close before they open",
                    day
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// First day (Sunday) of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(weekday_index(date)))
}

/// Dates of the Sunday-started week containing `date` on which the business
/// is not marked closed.
pub fn open_days(date: NaiveDate, hours: &[BusinessHours]) -> Vec<NaiveDate> {
    start_of_week(date)
        .iter_days()
        .take(7)
        .filter(|d| {
            let weekday = weekday_index(*d);
            !hours
                .iter()
                .any(|h| h.day_of_week == weekday && h.is_closed)
        })
        .collect()
}
