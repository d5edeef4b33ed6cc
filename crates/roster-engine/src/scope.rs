//! Explicit tenant context.
//!
//! Every mutating operation takes a [`TenantScope`] instead of resolving the
//! current business from ambient session state. Records outside the scope are
//! reported as not found, never as forbidden.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, RosterError};
use crate::model::{BusinessId, Employee, EmployeeId, RecordId, Unavailability};

/// The business on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantScope {
    pub business_id: BusinessId,
}

impl TenantScope {
    pub fn new(business_id: impl Into<String>) -> Self {
        Self {
            business_id: BusinessId::new(business_id),
        }
    }

    /// Reject employees of other tenants.
    pub fn authorize_employee(&self, employee: &Employee) -> Result<()> {
        if employee.business_id != self.business_id {
            warn!(
                employee = %employee.id,
                "employee outside tenant scope"
            );
            return Err(RosterError::NotFound(format!("employee {}", employee.id)));
        }
        Ok(())
    }

    /// Look up an unavailability record that must belong to `employee_id`.
    pub fn owned_record<'a>(
        &self,
        employee_id: &EmployeeId,
        record_id: &RecordId,
        records: &'a [Unavailability],
    ) -> Result<&'a Unavailability> {
        records
            .iter()
            .find(|r| &r.id == record_id && &r.employee_id == employee_id)
            .ok_or_else(|| RosterError::NotFound(format!("unavailability {}", record_id)))
    }
}
