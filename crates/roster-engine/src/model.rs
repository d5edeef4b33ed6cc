//! Tenant configuration records consumed by the engine.
//!
//! These mirror the documents the CRUD layer stores. Field names serialize in
//! camelCase to match the settings surface and the booking widget.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Window;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

id_type!(
    /// Tenant key.
    BusinessId
);
id_type!(EmployeeId);
id_type!(
    /// Identifier of a stored unavailability record.
    RecordId
);
id_type!(ShiftId);
id_type!(ServiceId);
id_type!(PositionId);

/// Weekday index with 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Opening hours of a business for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHours {
    pub day_of_week: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_open: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_close: Option<String>,
    #[serde(default)]
    pub is_closed: bool,
}

/// One weekday of an employee's weekly shift pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ShiftId>,
    pub day: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_of_breaks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_duration_in_minutes: Option<u32>,
    #[serde(default)]
    pub day_off: bool,
}

impl Shift {
    /// A working day from `start` to `end`.
    pub fn working(day: u8, start: &str, end: &str) -> Self {
        Self {
            id: None,
            day,
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            duration_in_minutes: None,
            num_of_breaks: None,
            break_duration_in_minutes: None,
            day_off: false,
        }
    }

    pub fn day_off(day: u8) -> Self {
        Self {
            id: None,
            day,
            start_time: None,
            end_time: None,
            duration_in_minutes: None,
            num_of_breaks: None,
            break_duration_in_minutes: None,
            day_off: true,
        }
    }
}

/// A stored day-level unavailability block of one employee.
///
/// `start_date` is the start of the first local day and `end_date` the end of
/// the last local day; both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unavailability {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub employee_id: EmployeeId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Unavailability {
    pub fn window(&self) -> Window {
        Window::new(self.start_date, self.end_date)
    }
}

/// A roster entry, carrying its shifts and unavailabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: EmployeeId,
    pub business_id: BusinessId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<PositionId>,
    #[serde(default = "default_bookable")]
    pub is_bookable: bool,
    #[serde(default)]
    pub shifts: Vec<Shift>,
    #[serde(default)]
    pub unavailabilities: Vec<Unavailability>,
}

fn default_bookable() -> bool {
    true
}

impl Employee {
    pub fn new(id: impl Into<String>, business_id: impl Into<String>) -> Self {
        Self {
            id: EmployeeId::new(id),
            business_id: BusinessId::new(business_id),
            first_name: String::new(),
            last_name: String::new(),
            position_id: None,
            is_bookable: true,
            shifts: Vec::new(),
            unavailabilities: Vec::new(),
        }
    }

    /// The shift configured for a weekday, matched on `day` rather than on
    /// position in the list.
    pub fn shift_for(&self, weekday: u8) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.day == weekday)
    }
}

/// A bookable service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "_id")]
    pub id: ServiceId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub duration_in_minutes: u32,
}

/// A position (role) and the services linked to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(rename = "_id")]
    pub id: PositionId,
    pub name: String,
    #[serde(default)]
    pub service_ids: Vec<ServiceId>,
}
