//! Storage seam for unavailability records.
//!
//! The engine never talks to the document database directly. A store only has
//! to list an employee's records and perform single-record writes;
//! [`edit_unavailability`] runs the read-plan-write cycle on top of it.

use chrono_tz::Tz;
use tracing::debug;

use crate::error::{Result, RosterError};
use crate::model::{Employee, EmployeeId, RecordId, Unavailability};
use crate::scope::TenantScope;
use crate::unavailability::{apply_unavailability, MergePlan, PlannedRecord, UnavailabilityEdit};

/// Tenant-scoped persistence for unavailability records.
pub trait UnavailabilityStore {
    /// All records of one employee, in creation order.
    fn list(&self, employee_id: &EmployeeId) -> Result<Vec<Unavailability>>;

    /// Insert a new record and return its id.
    fn insert(&mut self, record: &PlannedRecord) -> Result<RecordId>;

    /// Overwrite range and reason of an existing record.
    fn patch(&mut self, id: &RecordId, record: &PlannedRecord) -> Result<()>;

    fn delete(&mut self, id: &RecordId) -> Result<()>;
}

/// Perform the writes of a plan: upserts first, then deletions.
///
/// Returns the ids of the upserted records.
pub fn commit<S: UnavailabilityStore + ?Sized>(
    store: &mut S,
    plan: &MergePlan,
) -> Result<Vec<RecordId>> {
    let mut ids = Vec::with_capacity(plan.upsert.len());
    for record in &plan.upsert {
        let id = match &record.id {
            Some(id) => {
                store.patch(id, record)?;
                id.clone()
            }
            None => store.insert(record)?,
        };
        ids.push(id);
    }
    for id in &plan.delete {
        store.delete(id)?;
    }
    debug!(
        upserted = ids.len(),
        deleted = plan.delete.len(),
        "committed merge plan"
    );
    Ok(ids)
}

/// Read the employee's records, compute the merge plan, then write it.
///
/// Nothing is written unless the plan computes cleanly.
pub fn edit_unavailability<S: UnavailabilityStore + ?Sized>(
    store: &mut S,
    scope: &TenantScope,
    employee: &Employee,
    edit: &UnavailabilityEdit,
    tz: Tz,
) -> Result<MergePlan> {
    scope.authorize_employee(employee)?;
    let snapshot = store.list(&employee.id)?;
    let plan = apply_unavailability(scope, employee, edit, &snapshot, tz)?;
    commit(store, &plan)?;
    Ok(plan)
}

/// In-memory store, used by the CLI and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<Unavailability>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new(records: Vec<Unavailability>) -> Self {
        Self {
            records,
            next_id: 1,
        }
    }

    pub fn records(&self) -> &[Unavailability] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Unavailability> {
        self.records
    }

    fn fresh_id(&mut self) -> RecordId {
        loop {
            let id = RecordId::new(format!("ua-{}", self.next_id));
            self.next_id += 1;
            if !self.records.iter().any(|r| r.id == id) {
                return id;
            }
        }
    }

    fn position(&self, id: &RecordId) -> Result<usize> {
        self.records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| RosterError::Store(format!("no record {}", id)))
    }
}

impl UnavailabilityStore for MemoryStore {
    fn list(&self, employee_id: &EmployeeId) -> Result<Vec<Unavailability>> {
        Ok(self
            .records
            .iter()
            .filter(|r| &r.employee_id == employee_id)
            .cloned()
            .collect())
    }

    fn insert(&mut self, record: &PlannedRecord) -> Result<RecordId> {
        let id = self.fresh_id();
        self.records.push(Unavailability {
            id: id.clone(),
            employee_id: record.employee_id.clone(),
            start_date: record.start_date,
            end_date: record.end_date,
            reason: record.reason.clone(),
        });
        Ok(id)
    }

    fn patch(&mut self, id: &RecordId, record: &PlannedRecord) -> Result<()> {
        let i = self.position(id)?;
        let stored = &mut self.records[i];
        stored.start_date = record.start_date;
        stored.end_date = record.end_date;
        stored.reason = record.reason.clone();
        Ok(())
    }

    fn delete(&mut self, id: &RecordId) -> Result<()> {
        let i = self.position(id)?;
        self.records.remove(i);
        Ok(())
    }
}
