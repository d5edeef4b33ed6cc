//! Booking eligibility: which employees can take a booking at a given time.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::local_date;
use crate::model::{Employee, EmployeeId, Position, Service, ServiceId};
use crate::scope::TenantScope;
use crate::shift::resolve_shift;

/// Whether `employee` is free at `at`.
///
/// Unavailable if any unavailability block contains `at`. Otherwise the shift
/// for the weekday decides: no shift entry is permissive, a day off or a work
/// day without a parseable window is not, and a working window must contain
/// `at` (both ends inclusive).
///
/// A day off carries no times yet still blocks booking; only an absent entry
/// is open.
pub fn is_available_at(employee: &Employee, at: DateTime<Utc>, tz: Tz) -> bool {
    if employee
        .unavailabilities
        .iter()
        .any(|u| u.window().contains(at))
    {
        return false;
    }
    match resolve_shift(&employee.shifts, local_date(at, tz), tz) {
        None => true,
        Some(day) => day.working_window().is_some_and(|w| w.contains(at)),
    }
}

/// Services offered under a position.
///
/// Falls back to the whole catalog when there is no position or none of its
/// linked services exist.
pub fn services_for_position<'a>(
    position: Option<&Position>,
    catalog: &'a [Service],
) -> Vec<&'a Service> {
    let linked: Vec<&Service> = position
        .map(|p| {
            p.service_ids
                .iter()
                .filter_map(|id| catalog.iter().find(|s| &s.id == id))
                .collect()
        })
        .unwrap_or_default();
    if linked.is_empty() {
        catalog.iter().collect()
    } else {
        linked
    }
}

/// Services `employee` can perform, through their position.
pub fn services_for_employee<'a>(
    employee: &Employee,
    positions: &[Position],
    catalog: &'a [Service],
) -> Vec<&'a Service> {
    let position = employee
        .position_id
        .as_ref()
        .and_then(|id| positions.iter().find(|p| &p.id == id));
    services_for_position(position, catalog)
}

/// Filter a roster to the employees bookable at `at`.
///
/// Keeps employees of the scope's business that are flagged bookable, are
/// available per [`is_available_at`], and, when `service` is given, offer it.
/// Roster order is preserved.
pub fn eligible_employees<'a>(
    scope: &TenantScope,
    roster: &'a [Employee],
    at: DateTime<Utc>,
    service: Option<&ServiceId>,
    positions: &[Position],
    catalog: &[Service],
    tz: Tz,
) -> Vec<&'a Employee> {
    let eligible: Vec<&Employee> = roster
        .iter()
        .filter(|e| {
            if e.business_id != scope.business_id {
                warn!(employee = %e.id, "skipping employee outside tenant scope");
                return false;
            }
            true
        })
        .filter(|e| e.is_bookable)
        .filter(|e| is_available_at(e, at, tz))
        .filter(|e| match service {
            Some(id) => services_for_employee(e, positions, catalog)
                .iter()
                .any(|s| &s.id == id),
            None => true,
        })
        .collect();

    debug!(%at, roster = roster.len(), eligible = eligible.len(), "filtered roster");
    eligible
}

/// One employee the widget can offer, with the services they perform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOption {
    pub employee_id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub services: Vec<Service>,
}

/// Eligible employees at `at`, each with their service list.
pub fn booking_options(
    scope: &TenantScope,
    roster: &[Employee],
    at: DateTime<Utc>,
    service: Option<&ServiceId>,
    positions: &[Position],
    catalog: &[Service],
    tz: Tz,
) -> Vec<BookingOption> {
    eligible_employees(scope, roster, at, service, positions, catalog, tz)
        .into_iter()
        .map(|e| BookingOption {
            employee_id: e.id.clone(),
            first_name: e.first_name.clone(),
            last_name: e.last_name.clone(),
            services: services_for_employee(e, positions, catalog)
                .into_iter()
                .cloned()
                .collect(),
        })
        .collect()
}
