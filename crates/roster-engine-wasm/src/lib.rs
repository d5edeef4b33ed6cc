//! WASM bindings for roster-engine.
//!
//! Exposes slot generation, booking eligibility, shift saves and the
//! unavailability merge engine (including drag-resize) to the booking widget
//! and admin calendar via `wasm-bindgen`. All complex types are passed as JSON
//! strings using the same camelCase shapes the engine's model types serialize
//! to.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p roster-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/roster_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use roster_engine::model::{
    BusinessHours, Employee, EmployeeId, Position, RecordId, Service, ServiceId, Shift,
    Unavailability,
};
use roster_engine::unavailability::{self, edge_of, preview_merge, UnavailabilityEdit};
use roster_engine::{hours, shift, Window};
use roster_engine::{RosterError, TenantScope};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WindowDto {
    start_date: String,
    end_date: String,
}

impl From<&Window> for WindowDto {
    fn from(w: &Window) -> Self {
        Self {
            start_date: w.start.to_rfc3339(),
            end_date: w.end.to_rfc3339(),
        }
    }
}

/// Range passed from JavaScript for a merge preview.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeInput {
    start_date: String,
    end_date: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn engine_err(e: RosterError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn from_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid {} JSON: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn parse_tz(name: &str) -> Result<Tz, JsValue> {
    roster_engine::parse_timezone(name).map_err(engine_err)
}

fn parse_date(s: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid date '{}': {}", s, e)))
}

/// Parse an RFC 3339 instant, or a naive `YYYY-MM-DDTHH:MM:SS` wall-clock
/// time in `tz`.
fn parse_instant(s: &str, tz: Tz) -> Result<DateTime<Utc>, JsValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let local = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| JsValue::from_str(&format!("Invalid datetime '{}': {}", s, e)))?;
    roster_engine::dst::resolve_local(tz, local, roster_engine::dst::DstPolicy::Skip)
        .ok_or_else(|| JsValue::from_str(&format!("'{}' does not exist in {}", s, tz)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Bookable slot start times for one employee on one local date.
///
/// Returns a JSON array of RFC 3339 strings in the tenant timezone.
///
/// # Arguments
/// - `business_hours_json` -- JSON array of business hours entries
/// - `employee_json` -- Employee with `shifts` and `unavailabilities` inline
/// - `date` -- Local date (`YYYY-MM-DD`)
/// - `step_minutes` -- Slot length; defaults to 30
/// - `timezone` -- IANA timezone of the tenant
#[wasm_bindgen(js_name = "generateSlots")]
pub fn generate_slots(
    business_hours_json: &str,
    employee_json: &str,
    date: &str,
    step_minutes: Option<u32>,
    timezone: &str,
) -> Result<String, JsValue> {
    let hours: Vec<BusinessHours> = from_json(business_hours_json, "business hours")?;
    let employee: Employee = from_json(employee_json, "employee")?;
    let date = parse_date(date)?;
    let tz = parse_tz(timezone)?;
    let step = step_minutes.unwrap_or(roster_engine::DEFAULT_STEP_MINUTES);

    let slots = roster_engine::slots_for_employee(&hours, &employee, date, step, tz)
        .map_err(engine_err)?;
    let rendered: Vec<String> = slots
        .iter()
        .map(|s| s.with_timezone(&tz).to_rfc3339())
        .collect();
    to_json(&rendered)
}

/// Employees bookable at `at`, each with the services they perform.
///
/// `at` is an RFC 3339 instant or a local wall-clock time. With `service_id`
/// set, only employees offering that service are returned.
#[wasm_bindgen(js_name = "bookingOptions")]
pub fn booking_options(
    business_id: &str,
    roster_json: &str,
    at: &str,
    service_id: Option<String>,
    positions_json: &str,
    services_json: &str,
    timezone: &str,
) -> Result<String, JsValue> {
    let roster: Vec<Employee> = from_json(roster_json, "roster")?;
    let positions: Vec<Position> = from_json(positions_json, "positions")?;
    let catalog: Vec<Service> = from_json(services_json, "services")?;
    let tz = parse_tz(timezone)?;
    let at = parse_instant(at, tz)?;
    let service = service_id.map(ServiceId::new);

    let options = roster_engine::booking_options(
        &TenantScope::new(business_id),
        &roster,
        at,
        service.as_ref(),
        &positions,
        &catalog,
        tz,
    );
    to_json(&options)
}

/// Plan the writes that apply one unavailability edit.
///
/// `edit_json` is `{recordId?, startDate, endDate, reason?}`; `existing_json`
/// is the employee's stored records. Returns `{upsert, delete}`.
#[wasm_bindgen(js_name = "planUnavailability")]
pub fn plan_unavailability(
    business_id: &str,
    employee_json: &str,
    edit_json: &str,
    existing_json: &str,
    timezone: &str,
) -> Result<String, JsValue> {
    let employee: Employee = from_json(employee_json, "employee")?;
    let edit: UnavailabilityEdit = from_json(edit_json, "edit")?;
    let existing: Vec<Unavailability> = from_json(existing_json, "unavailabilities")?;
    let tz = parse_tz(timezone)?;

    let plan = roster_engine::apply_unavailability(
        &TenantScope::new(business_id),
        &employee,
        &edit,
        &existing,
        tz,
    )
    .map_err(engine_err)?;
    to_json(&plan)
}

/// The range a drag selection would occupy once merged, for highlighting.
#[wasm_bindgen(js_name = "previewMerge")]
pub fn preview_merge_range(
    employee_id: &str,
    range_json: &str,
    existing_json: &str,
    timezone: &str,
) -> Result<String, JsValue> {
    let range: RangeInput = from_json(range_json, "range")?;
    let existing: Vec<Unavailability> = from_json(existing_json, "unavailabilities")?;
    let tz = parse_tz(timezone)?;
    let candidate = Window::new(
        parse_instant(&range.start_date, tz)?,
        parse_instant(&range.end_date, tz)?,
    );

    let merged = preview_merge(&EmployeeId::new(employee_id), &candidate, &existing, tz)
        .map_err(engine_err)?;
    to_json(&WindowDto::from(&merged))
}

/// Plan a drag of one edge of a stored block onto another day.
///
/// `grab_day` must be the first or last day of `record_id`; the resized block
/// goes through the merge engine, absorbing any neighbour it now reaches.
/// Returns `{upsert, delete}`.
#[wasm_bindgen(js_name = "resizeByDrag")]
pub fn resize_by_drag(
    business_id: &str,
    employee_json: &str,
    record_id: &str,
    grab_day: &str,
    drop_day: &str,
    existing_json: &str,
    timezone: &str,
) -> Result<String, JsValue> {
    let employee: Employee = from_json(employee_json, "employee")?;
    let existing: Vec<Unavailability> = from_json(existing_json, "unavailabilities")?;
    let tz = parse_tz(timezone)?;
    let scope = TenantScope::new(business_id);

    let record = scope
        .owned_record(&employee.id, &RecordId::new(record_id), &existing)
        .map_err(engine_err)?;
    let edge = edge_of(parse_date(grab_day)?, record, tz).ok_or_else(|| {
        JsValue::from_str(&format!("{} is not an edge of {}", grab_day, record_id))
    })?;
    let edit = unavailability::resize_by_drag(record, edge, parse_date(drop_day)?, tz)
        .map_err(engine_err)?;

    let plan = roster_engine::apply_unavailability(&scope, &employee, &edit, &existing, tz)
        .map_err(engine_err)?;
    to_json(&plan)
}

/// Records whose range falls in an optional `[from, to]` window.
///
/// Bounds are RFC 3339 instants or local wall-clock times; pass only `from`
/// for the upcoming list.
#[wasm_bindgen(js_name = "unavailabilitiesInWindow")]
pub fn unavailabilities_in_window(
    records_json: &str,
    from: Option<String>,
    to: Option<String>,
    timezone: &str,
) -> Result<String, JsValue> {
    let records: Vec<Unavailability> = from_json(records_json, "unavailabilities")?;
    let tz = parse_tz(timezone)?;
    let from = from.map(|s| parse_instant(&s, tz)).transpose()?;
    let to = to.map(|s| parse_instant(&s, tz)).transpose()?;
    to_json(&unavailability::unavailabilities_in_window(&records, from, to))
}

/// Validate a submitted weekly shift pattern and plan its save against the
/// employee's stored shifts.
///
/// Returns `{patch, insert, delete}`.
#[wasm_bindgen(js_name = "planShiftSave")]
pub fn plan_shift_save(
    business_id: &str,
    employee_json: &str,
    submitted_json: &str,
) -> Result<String, JsValue> {
    let employee: Employee = from_json(employee_json, "employee")?;
    let submitted: Vec<Shift> = from_json(submitted_json, "shifts")?;
    let plan = shift::plan_shift_save(&TenantScope::new(business_id), &employee, &submitted)
        .map_err(engine_err)?;
    to_json(&plan)
}

/// Days of the week (Sunday first) containing `date` on which the business
/// is open. Returns a JSON array of `YYYY-MM-DD` strings.
#[wasm_bindgen(js_name = "openDays")]
pub fn open_days(date: &str, business_hours_json: &str) -> Result<String, JsValue> {
    let hours: Vec<BusinessHours> = from_json(business_hours_json, "business hours")?;
    let days: Vec<String> = hours::open_days(parse_date(date)?, &hours)
        .iter()
        .map(|d| d.to_string())
        .collect();
    to_json(&days)
}
