//! Shift resolution: an employee's weekly pattern applied to a concrete date.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::{parse_time_of_day, parse_wall_clock, Window};
use crate::error::{Result, RosterError};
use crate::model::{weekday_index, Employee, Shift, ShiftId};
use crate::scope::TenantScope;

/// The shift that applies on one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShiftDay {
    pub is_day_off: bool,
    /// Working window. `None` on a day off, and on a work day whose times do
    /// not parse.
    pub window: Option<Window>,
}

impl ShiftDay {
    /// The window to book against, if the employee works this day.
    pub fn working_window(&self) -> Option<Window> {
        if self.is_day_off {
            None
        } else {
            self.window
        }
    }
}

/// Resolve the shift for `date` from a weekly table.
///
/// Returns `None` when no entry exists for the weekday. A work-day entry with
/// missing or malformed times resolves to a day with no window.
pub fn resolve_shift(shifts: &[Shift], date: NaiveDate, tz: Tz) -> Option<ShiftDay> {
    let weekday = weekday_index(date);
    let shift = shifts.iter().find(|s| s.day == weekday)?;
    if shift.day_off {
        return Some(ShiftDay {
            is_day_off: true,
            window: None,
        });
    }

    let start = shift
        .start_time
        .as_deref()
        .and_then(|s| parse_wall_clock(s, date, tz));
    let end = shift
        .end_time
        .as_deref()
        .and_then(|s| parse_wall_clock(s, date, tz));
    let window = match (start, end) {
        (Some(start), Some(end)) => Some(Window::new(start, end)),
        _ => {
            warn!(day = weekday, %date, "work day shift without parseable start/end");
            None
        }
    };
    Some(ShiftDay {
        is_day_off: false,
        window,
    })
}

/// Check a submitted weekly table before it is saved.
///
/// Work days must have parseable start and end times, and end after start.
/// Each weekday appears at most once.
pub fn validate_shifts(shifts: &[Shift]) -> Result<()> {
    let mut seen = [false; 7];
    for shift in shifts {
        let day = usize::from(shift.day);
        if day > 6 {
            return Err(RosterError::Validation(format!(
                "shift day {} is out of range 0-6",
                shift.day
            )));
        }
        if seen[day] {
            return Err(RosterError::Validation(format!(
                "duplicate shift for day {}",
                day
            )));
        }
        seen[day] = true;

        if shift.day_off {
            continue;
        }
        let start = shift.start_time.as_deref().and_then(parse_time_of_day);
        let end = shift.end_time.as_deref().and_then(parse_time_of_day);
        match (start, end) {
            (Some(start), Some(end)) if end > start => {}
            (Some(_), Some(_)) => {
                return Err(RosterError::Validation(format!(
                    "shift for day {} must end after it starts",
                    day
                )));
            }
            _ => {
                return Err(RosterError::Validation(
                    "Work days must have shift start and end time".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Writes needed to persist a submitted weekly table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShiftPlan {
    /// Existing rows to patch, carrying their stored ids.
    pub patch: Vec<Shift>,
    /// New rows to insert.
    pub insert: Vec<Shift>,
    /// Unclaimed stored rows whose weekday a submitted row now occupies.
    pub delete: Vec<ShiftId>,
}

/// Plan how a submitted table replaces `employee`'s stored one.
///
/// Submitted rows carrying an id claim that stored row first. Rows without an
/// id then fall back to an unclaimed stored row on the same weekday. Matched
/// rows are patched and the rest inserted. A stored row left unclaimed on a
/// weekday the submission covers is deleted, so each weekday keeps one row.
///
/// A submitted id that is not among the employee's stored rows is not found,
/// as is an employee outside `scope`.
pub fn plan_shift_save(
    scope: &TenantScope,
    employee: &Employee,
    submitted: &[Shift],
) -> Result<ShiftPlan> {
    scope.authorize_employee(employee)?;
    validate_shifts(submitted)?;

    let existing = &employee.shifts;
    let mut claimed = vec![false; existing.len()];
    let mut targets: Vec<Option<usize>> = vec![None; submitted.len()];

    for (target, shift) in targets.iter_mut().zip(submitted) {
        let Some(id) = &shift.id else { continue };
        let i = existing
            .iter()
            .position(|s| s.id.as_ref() == Some(id))
            .ok_or_else(|| RosterError::NotFound(format!("shift {}", id)))?;
        if claimed[i] {
            return Err(RosterError::Validation(format!(
                "shift {} submitted more than once",
                id
            )));
        }
        claimed[i] = true;
        *target = Some(i);
    }

    for (target, shift) in targets.iter_mut().zip(submitted) {
        if shift.id.is_some() {
            continue;
        }
        let free = (0..existing.len())
            .find(|&i| !claimed[i] && existing[i].id.is_some() && existing[i].day == shift.day);
        if let Some(i) = free {
            claimed[i] = true;
            *target = Some(i);
        }
    }

    let mut plan = ShiftPlan::default();
    for (target, shift) in targets.iter().zip(submitted) {
        match target {
            Some(i) => plan.patch.push(Shift {
                id: existing[*i].id.clone(),
                ..shift.clone()
            }),
            None => plan.insert.push(Shift {
                id: None,
                ..shift.clone()
            }),
        }
    }
    plan.delete = existing
        .iter()
        .zip(&claimed)
        .filter(|(stored, taken)| !**taken && submitted.iter().any(|s| s.day == stored.day))
        .filter_map(|(stored, _)| stored.id.clone())
        .collect();

    debug!(
        employee = %employee.id,
        patched = plan.patch.len(),
        inserted = plan.insert.len(),
        deleted = plan.delete.len(),
        "planned shift save"
    );
    Ok(plan)
}
