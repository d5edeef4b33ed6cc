//! Error types for roster-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RosterError {
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown record, or a record owned by another tenant or employee.
    /// Both cases share this variant so cross-tenant existence never leaks.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, RosterError>;
