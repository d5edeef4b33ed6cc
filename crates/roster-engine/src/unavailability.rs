//! Unavailability merge engine.
//!
//! Keeps an employee's unavailability blocks pairwise disjoint at day level.
//! An edit never touches storage: [`apply_unavailability`] reads a snapshot of
//! the employee's records and returns a [`MergePlan`] of upserts and deletions.
//! The caller performs the writes only after the whole plan has been computed,
//! so a failed edit can be retried from a fresh snapshot as a unit.
//!
//! Two blocks overlap when they share at least one local calendar day.
//! Adjacent blocks (one ends the day before the other starts) stay separate.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{end_of_day, local_date, start_of_day, Window};
use crate::error::{Result, RosterError};
use crate::model::{Employee, EmployeeId, RecordId, Unavailability};
use crate::scope::TenantScope;

/// An inclusive range of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DayRange {
    pub fn new(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        if first > last {
            return Err(RosterError::InvalidRange {
                start: first.to_string(),
                end: last.to_string(),
            });
        }
        Ok(Self { first, last })
    }

    /// Days touched by `window` in `tz`.
    pub fn from_window(window: &Window, tz: Tz) -> Result<Self> {
        if window.start > window.end {
            return Err(RosterError::InvalidRange {
                start: window.start.to_rfc3339(),
                end: window.end.to_rfc3339(),
            });
        }
        Ok(Self {
            first: local_date(window.start, tz),
            last: local_date(window.end, tz),
        })
    }

    /// `[start_of_day(first), end_of_day(last)]`.
    pub fn to_window(&self, tz: Tz) -> Window {
        Window::new(start_of_day(self.first, tz), end_of_day(self.last, tz))
    }

    pub fn overlaps(&self, other: &DayRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    pub fn union(&self, other: &DayRange) -> DayRange {
        DayRange {
            first: self.first.min(other.first),
            last: self.last.max(other.last),
        }
    }

    fn of_record(record: &Unavailability, tz: Tz) -> Option<DayRange> {
        DayRange::from_window(&record.window(), tz).ok()
    }
}

/// A request to mark an employee unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailabilityEdit {
    /// Set when an existing block is being resized (drag of one edge).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UnavailabilityEdit {
    /// A new block over whole local days.
    pub fn days(range: DayRange, tz: Tz, reason: Option<&str>) -> Self {
        let window = range.to_window(tz);
        Self {
            record_id: None,
            start_date: window.start,
            end_date: window.end,
            reason: reason.map(str::to_string),
        }
    }

    pub fn window(&self) -> Window {
        Window::new(self.start_date, self.end_date)
    }
}

/// A record to insert (`id == None`) or patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRecord {
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub employee_id: EmployeeId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The writes that realise one edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePlan {
    pub upsert: Vec<PlannedRecord>,
    pub delete: Vec<RecordId>,
}

impl MergePlan {
    pub fn is_empty(&self) -> bool {
        self.upsert.is_empty() && self.delete.is_empty()
    }
}

/// Compute the merge plan for an edit against a snapshot of stored records.
///
/// The candidate range is normalized to whole local days. Every stored block
/// of the employee that shares a day with it is merged into one block spanning
/// the union. The survivor is the first overlapping block in snapshot order;
/// the others are deleted. Without overlaps a new block is inserted.
///
/// When `edit.record_id` is set the named block is the survivor. It is taken
/// out of the snapshot, its new range becomes the candidate, and neighbours it
/// now overlaps are merged into it.
///
/// The new reason wins when given; otherwise the survivor keeps its own.
pub fn apply_unavailability(
    scope: &TenantScope,
    employee: &Employee,
    edit: &UnavailabilityEdit,
    existing: &[Unavailability],
    tz: Tz,
) -> Result<MergePlan> {
    scope.authorize_employee(employee)?;
    let candidate = DayRange::from_window(&edit.window(), tz)?;

    let foreign = existing
        .iter()
        .filter(|r| r.employee_id != employee.id)
        .count();
    if foreign > 0 {
        warn!(employee = %employee.id, foreign, "ignoring records of other employees");
    }

    let resized = match &edit.record_id {
        Some(id) => Some(scope.owned_record(&employee.id, id, existing)?),
        None => None,
    };

    let overlaps: Vec<(&Unavailability, DayRange)> = existing
        .iter()
        .filter(|r| r.employee_id == employee.id)
        .filter(|r| resized.is_none_or(|d| d.id != r.id))
        .filter_map(|r| DayRange::of_record(r, tz).map(|range| (r, range)))
        .filter(|(_, range)| range.overlaps(&candidate))
        .collect();

    let merged = overlaps
        .iter()
        .fold(candidate, |acc, (_, range)| acc.union(range))
        .to_window(tz);

    let (survivor, absorbed) = match resized {
        Some(record) => (Some(record), &overlaps[..]),
        None => match overlaps.split_first() {
            Some(((first, _), rest)) => (Some(*first), rest),
            None => (None, &overlaps[..]),
        },
    };

    let upsert = PlannedRecord {
        id: survivor.map(|r| r.id.clone()),
        employee_id: employee.id.clone(),
        start_date: merged.start,
        end_date: merged.end,
        reason: edit
            .reason
            .clone()
            .or_else(|| survivor.and_then(|r| r.reason.clone())),
    };
    let plan = MergePlan {
        upsert: vec![upsert],
        delete: absorbed.iter().map(|(r, _)| r.id.clone()).collect(),
    };

    debug!(
        employee = %employee.id,
        overlaps = overlaps.len(),
        deletions = plan.delete.len(),
        start = %merged.start,
        end = %merged.end,
        "computed unavailability merge plan"
    );
    Ok(plan)
}

/// The range a form should pre-fill when the user selects `candidate`: the
/// union with every block of `employee_id` it touches. Nothing is written.
pub fn preview_merge(
    employee_id: &EmployeeId,
    candidate: &Window,
    existing: &[Unavailability],
    tz: Tz,
) -> Result<Window> {
    let candidate = DayRange::from_window(candidate, tz)?;
    Ok(existing
        .iter()
        .filter(|r| &r.employee_id == employee_id)
        .filter_map(|r| DayRange::of_record(r, tz))
        .filter(|range| range.overlaps(&candidate))
        .fold(candidate, |acc, range| acc.union(&range))
        .to_window(tz))
}

/// Authorize the deletion of one block and return the id to delete.
pub fn delete_unavailability(
    scope: &TenantScope,
    employee: &Employee,
    record_id: &RecordId,
    existing: &[Unavailability],
) -> Result<RecordId> {
    scope.authorize_employee(employee)?;
    let record = scope.owned_record(&employee.id, record_id, existing)?;
    Ok(record.id.clone())
}

/// Reject ranges that start on a day before `today`.
pub fn ensure_not_past(range: &Window, today: NaiveDate, tz: Tz) -> Result<()> {
    if local_date(range.start, tz) < today {
        return Err(RosterError::Validation(
            "Day cannot be in the past".to_string(),
        ));
    }
    Ok(())
}

/// Records selected by an optional window.
///
/// With both bounds the record must start inside `[from, to]`; with only
/// `from` it must start at or after it; with only `to` it must end at or
/// before it.
pub fn unavailabilities_in_window<'a>(
    records: &'a [Unavailability],
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Vec<&'a Unavailability> {
    records
        .iter()
        .filter(|r| match (from, to) {
            (Some(from), Some(to)) => from <= r.start_date && r.start_date <= to,
            (Some(from), None) => from <= r.start_date,
            (None, Some(to)) => r.end_date <= to,
            (None, None) => true,
        })
        .collect()
}

/// Which end of a block a calendar day sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragEdge {
    Head,
    Tail,
}

/// The draggable edge at `day`, if `day` is the first or last day of `record`.
/// A one-day block reports `Head`.
pub fn edge_of(day: NaiveDate, record: &Unavailability, tz: Tz) -> Option<DragEdge> {
    let range = DayRange::of_record(record, tz)?;
    if day == range.first {
        Some(DragEdge::Head)
    } else if day == range.last {
        Some(DragEdge::Tail)
    } else {
        None
    }
}

/// Build the edit for dragging one edge of `record` onto `drop_day`.
///
/// The edit keeps the record id, so [`apply_unavailability`] patches the same
/// block and merges any neighbours it now reaches.
pub fn resize_by_drag(
    record: &Unavailability,
    edge: DragEdge,
    drop_day: NaiveDate,
    tz: Tz,
) -> Result<UnavailabilityEdit> {
    let current = DayRange::from_window(&record.window(), tz)?;
    let resized = match edge {
        DragEdge::Head => DayRange::new(drop_day, current.last)?,
        DragEdge::Tail => DayRange::new(current.first, drop_day)?,
    };
    let window = resized.to_window(tz);
    Ok(UnavailabilityEdit {
        record_id: Some(record.id.clone()),
        start_date: window.start,
        end_date: window.end,
        reason: None,
    })
}

/// Apply a plan to an in-memory snapshot. Inserted records get ids from
/// `new_id`.
pub fn apply_plan(
    records: &[Unavailability],
    plan: &MergePlan,
    mut new_id: impl FnMut() -> RecordId,
) -> Vec<Unavailability> {
    let mut out: Vec<Unavailability> = records
        .iter()
        .filter(|r| !plan.delete.contains(&r.id))
        .cloned()
        .collect();

    for planned in &plan.upsert {
        let position = planned
            .id
            .as_ref()
            .and_then(|id| out.iter().position(|r| &r.id == id));
        match position {
            Some(i) => {
                let record = &mut out[i];
                record.start_date = planned.start_date;
                record.end_date = planned.end_date;
                record.reason = planned.reason.clone();
            }
            None => out.push(Unavailability {
                id: planned.id.clone().unwrap_or_else(&mut new_id),
                employee_id: planned.employee_id.clone(),
                start_date: planned.start_date,
                end_date: planned.end_date,
                reason: planned.reason.clone(),
            }),
        }
    }
    out
}

/// Verify that no two blocks of the same employee share a day.
pub fn ensure_disjoint(records: &[Unavailability], tz: Tz) -> Result<()> {
    let mut ranges: Vec<(&Unavailability, DayRange)> = records
        .iter()
        .filter_map(|r| DayRange::of_record(r, tz).map(|range| (r, range)))
        .collect();
    ranges.sort_by(|(a, ra), (b, rb)| {
        a.employee_id
            .cmp(&b.employee_id)
            .then(ra.first.cmp(&rb.first))
    });

    for pair in ranges.windows(2) {
        let (a, ra) = &pair[0];
        let (b, rb) = &pair[1];
        if a.employee_id == b.employee_id && ra.overlaps(rb) {
            return Err(RosterError::Validation(format!(
                "unavailability {} overlaps {}",
                a.id, b.id
            )));
        }
    }
    Ok(())
}
