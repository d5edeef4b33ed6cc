//! Tenant snapshot: the JSON document the CLI reads and, with `--write`,
//! rewrites.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use roster_engine::model::{
    BusinessHours, BusinessId, Employee, EmployeeId, Position, Service, Unavailability,
};
use roster_engine::parse_timezone;
use roster_engine::TenantScope;
use serde::{Deserialize, Serialize};
use std::io::{self, Read};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSnapshot {
    pub business_id: BusinessId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub business_hours: Vec<BusinessHours>,
    /// Employees with their shifts inline.
    #[serde(default)]
    pub employees: Vec<Employee>,
    /// Unavailability records of all employees.
    #[serde(default)]
    pub unavailabilities: Vec<Unavailability>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub positions: Vec<Position>,
}

impl TenantSnapshot {
    /// Read from `path`, or from stdin when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let raw = match path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read snapshot: {}", path))?,
            None => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read snapshot from stdin")?;
                buf
            }
        };
        serde_json::from_str(&raw).context("Failed to parse tenant snapshot JSON")
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write snapshot: {}", path))
    }

    pub fn scope(&self) -> TenantScope {
        TenantScope {
            business_id: self.business_id.clone(),
        }
    }

    /// Timezone precedence: explicit override, then the snapshot, then UTC.
    pub fn timezone(&self, override_tz: Option<&str>) -> Result<Tz> {
        let name = override_tz.or(self.timezone.as_deref()).unwrap_or("UTC");
        parse_timezone(name).with_context(|| format!("Unknown timezone '{}'", name))
    }

    /// Employees with their unavailability records attached.
    pub fn roster(&self) -> Vec<Employee> {
        self.employees
            .iter()
            .map(|e| {
                let mut e = e.clone();
                e.unavailabilities.extend(
                    self.unavailabilities
                        .iter()
                        .filter(|u| u.employee_id == e.id)
                        .cloned(),
                );
                e
            })
            .collect()
    }

    /// One employee with unavailabilities attached.
    pub fn employee(&self, id: &str) -> Result<Employee> {
        let id = EmployeeId::new(id);
        self.roster()
            .into_iter()
            .find(|e| e.id == id)
            .with_context(|| format!("Employee not found: {}", id))
    }
}
