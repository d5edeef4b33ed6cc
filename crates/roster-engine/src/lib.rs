//! # roster-engine
//!
//! Employee availability resolution for appointment booking.
//!
//! Given a business's weekly opening hours, an employee's weekly shift pattern
//! and their day-level unavailability blocks, the engine decides which time
//! slots can be booked, which employees can take a booking at a given time,
//! and how an edit to the unavailability blocks is merged so that no two
//! blocks of one employee ever share a day.
//!
//! All functions are pure and synchronous over already-fetched data. The
//! tenant timezone and tenant scope are always explicit parameters.
//!
//! ## Modules
//!
//! - [`clock`]: `"HH:mm"` parsing, day boundaries, window containment
//! - [`dst`]: DST gap/fold policies for wall-clock times
//! - [`model`]: Business hours, shifts, unavailabilities, employees, services
//! - [`scope`]: Explicit tenant context and ownership checks
//! - [`hours`]: Business hours for a date; week validation
//! - [`shift`]: Shift resolution, validation and save plans
//! - [`unavailability`]: Unavailability merge engine
//! - [`store`]: Storage seam and the read-plan-write cycle
//! - [`slots`]: Bookable slot generation
//! - [`eligibility`]: Booking eligibility filter and service lists
//! - [`error`]: Error types

pub mod clock;
pub mod dst;
pub mod eligibility;
pub mod error;
pub mod hours;
pub mod model;
pub mod scope;
pub mod shift;
pub mod slots;
pub mod store;
pub mod unavailability;

pub use clock::{day_range, parse_timezone, parse_wall_clock, Window};
pub use eligibility::{booking_options, eligible_employees, services_for_position, BookingOption};
pub use error::RosterError;
pub use scope::TenantScope;
pub use shift::{resolve_shift, ShiftDay};
pub use slots::{generate_slots, slots_for_employee, DEFAULT_STEP_MINUTES};
pub use unavailability::{apply_unavailability, MergePlan, PlannedRecord, UnavailabilityEdit};
