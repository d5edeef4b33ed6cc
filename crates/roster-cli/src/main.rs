//! `roster` CLI: query bookable slots and plan unavailability edits against
//! a tenant snapshot from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Bookable slots for one employee on one day
//! roster -d tenant.json slots --employee emp-1 --date 2024-06-10
//!
//! # Employees bookable at a local time, optionally for a service
//! roster -d tenant.json eligible --at 2024-06-10T10:00 --service cut
//!
//! # Plan marking an employee unavailable; --write applies it to the file
//! roster -d tenant.json unavailable --employee emp-1 --from 2024-06-11 --to 2024-06-15 --write
//!
//! # Drag the last day of a block from the 15th to the 18th
//! roster -d tenant.json drag --employee emp-1 --record ua-1 --grab 2024-06-15 --drop 2024-06-18
//!
//! # Validate hours, shifts and unavailability blocks
//! roster -d tenant.json check
//!
//! # Snapshot from stdin, timezone from the environment
//! ROSTER_TZ=Europe/Helsinki roster week --date 2024-06-12 < tenant.json
//! ```

mod snapshot;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use roster_engine::dst::{resolve_local, DstPolicy};
use roster_engine::model::{RecordId, ServiceId};
use roster_engine::unavailability::{
    delete_unavailability, edge_of, ensure_disjoint, ensure_not_past, resize_by_drag,
    unavailabilities_in_window, DayRange, MergePlan, UnavailabilityEdit,
};
use roster_engine::day_range;
use roster_engine::{hours, shift, slots, store};
use serde::Serialize;
use snapshot::TenantSnapshot;
use store::MemoryStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "Employee availability: bookable slots, eligibility and unavailability merging"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Tenant snapshot JSON (reads from stdin if omitted)
    #[arg(short, long, global = true, env = "ROSTER_DATA")]
    data: Option<String>,

    /// IANA timezone for wall-clock times (defaults to the snapshot's, then UTC)
    #[arg(long, global = true, env = "ROSTER_TZ")]
    timezone: Option<String>,

    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List bookable slot start times for an employee on a date
    Slots {
        #[arg(short, long)]
        employee: String,
        /// Local date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Slot length in minutes
        #[arg(long, default_value_t = slots::DEFAULT_STEP_MINUTES)]
        step: u32,
    },
    /// List employees bookable at a given time, with their services
    Eligible {
        /// RFC 3339 instant or local YYYY-MM-DDTHH:MM
        #[arg(long)]
        at: String,
        /// Only employees offering this service
        #[arg(long)]
        service: Option<String>,
    },
    /// Plan (and optionally apply) marking an employee unavailable
    Unavailable {
        #[arg(short, long)]
        employee: String,
        /// First local day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last local day (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        #[arg(long)]
        reason: Option<String>,
        /// Resize this existing record instead of adding a new one
        #[arg(long)]
        record: Option<String>,
        /// Reject ranges starting before this day
        #[arg(long)]
        today: Option<NaiveDate>,
        /// Apply the plan to the snapshot file
        #[arg(long, requires = "data")]
        write: bool,
    },
    /// Drag the first or last day of a block onto another day
    Drag {
        #[arg(short, long)]
        employee: String,
        #[arg(long)]
        record: String,
        /// The block's first or last day, which is being dragged
        #[arg(long)]
        grab: NaiveDate,
        /// Day the edge is dropped on
        #[arg(long)]
        drop: NaiveDate,
        /// Apply the plan to the snapshot file
        #[arg(long, requires = "data")]
        write: bool,
    },
    /// List an employee's unavailability blocks, optionally within days
    List {
        #[arg(short, long)]
        employee: String,
        /// Only blocks starting on or after this day
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Only blocks starting by this day (or, alone, ending by it)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Remove one unavailability record
    Clear {
        #[arg(short, long)]
        employee: String,
        #[arg(long)]
        record: String,
        /// Apply the deletion to the snapshot file
        #[arg(long, requires = "data")]
        write: bool,
    },
    /// Days of the week containing a date on which the business is open
    Week {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Validate business hours, shifts and unavailability blocks
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let snapshot = TenantSnapshot::load(cli.data.as_deref())?;
    let tz = snapshot.timezone(cli.timezone.as_deref())?;

    match cli.command {
        Commands::Slots {
            employee,
            date,
            step,
        } => {
            let employee = snapshot.employee(&employee)?;
            let found =
                slots::slots_for_employee(&snapshot.business_hours, &employee, date, step, tz)
                    .context("Failed to generate slots")?;
            let rendered: Vec<String> = found
                .iter()
                .map(|s| s.with_timezone(&tz).to_rfc3339())
                .collect();
            print_json(&rendered)?;
        }
        Commands::Eligible { at, service } => {
            let at = parse_instant(&at, tz)?;
            let service = service.map(ServiceId::new);
            let roster = snapshot.roster();
            let options = roster_engine::booking_options(
                &snapshot.scope(),
                &roster,
                at,
                service.as_ref(),
                &snapshot.positions,
                &snapshot.services,
                tz,
            );
            print_json(&options)?;
        }
        Commands::Unavailable {
            employee,
            from,
            to,
            reason,
            record,
            today,
            write,
        } => {
            let employee = snapshot.employee(&employee)?;
            let range = DayRange::new(from, to)?;
            let mut edit = UnavailabilityEdit::days(range, tz, reason.as_deref());
            edit.record_id = record.map(RecordId::new);
            if let Some(today) = today {
                ensure_not_past(&edit.window(), today, tz)?;
            }

            let mut memory = MemoryStore::new(snapshot.unavailabilities.clone());
            let plan =
                store::edit_unavailability(&mut memory, &snapshot.scope(), &employee, &edit, tz)
                    .context("Failed to plan unavailability")?;
            print_json(&plan)?;

            if write {
                persist(snapshot, memory.into_records(), cli.data.as_deref())?;
            }
        }
        Commands::Drag {
            employee,
            record,
            grab,
            drop,
            write,
        } => {
            let employee = snapshot.employee(&employee)?;
            let record = snapshot.scope().owned_record(
                &employee.id,
                &RecordId::new(record),
                &snapshot.unavailabilities,
            )?;
            let Some(edge) = edge_of(grab, record, tz) else {
                bail!("{} is not the first or last day of {}", grab, record.id);
            };
            let edit = resize_by_drag(record, edge, drop, tz)?;

            let mut memory = MemoryStore::new(snapshot.unavailabilities.clone());
            let plan =
                store::edit_unavailability(&mut memory, &snapshot.scope(), &employee, &edit, tz)
                    .context("Failed to plan resize")?;
            print_json(&plan)?;

            if write {
                persist(snapshot, memory.into_records(), cli.data.as_deref())?;
            }
        }
        Commands::List { employee, from, to } => {
            let employee = snapshot.employee(&employee)?;
            let from = from.map(|d| day_range(d, tz).start);
            let to = to.map(|d| day_range(d, tz).end);
            print_json(&unavailabilities_in_window(&employee.unavailabilities, from, to))?;
        }
        Commands::Clear {
            employee,
            record,
            write,
        } => {
            let employee = snapshot.employee(&employee)?;
            let id = delete_unavailability(
                &snapshot.scope(),
                &employee,
                &RecordId::new(record),
                &snapshot.unavailabilities,
            )?;
            let plan = MergePlan {
                upsert: Vec::new(),
                delete: vec![id],
            };
            print_json(&plan)?;

            if write {
                let mut memory = MemoryStore::new(snapshot.unavailabilities.clone());
                store::commit(&mut memory, &plan).context("Failed to delete record")?;
                persist(snapshot, memory.into_records(), cli.data.as_deref())?;
            }
        }
        Commands::Week { date } => {
            let days: Vec<String> = hours::open_days(date, &snapshot.business_hours)
                .iter()
                .map(|d| d.to_string())
                .collect();
            print_json(&days)?;
        }
        Commands::Check => {
            check(&snapshot, tz)?;
            println!("ok");
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Accept an RFC 3339 instant, or a local `YYYY-MM-DDTHH:MM` in `tz`.
fn parse_instant(s: &str, tz: Tz) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let local = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .with_context(|| format!("Invalid time '{}'. Expected YYYY-MM-DDTHH:MM", s))?;
    resolve_local(tz, local, DstPolicy::Skip)
        .with_context(|| format!("'{}' does not exist in {}", s, tz))
}

fn check(snapshot: &TenantSnapshot, tz: Tz) -> Result<()> {
    hours::validate_business_week(&snapshot.business_hours)
        .context("Invalid business hours")?;
    for employee in &snapshot.employees {
        if employee.business_id != snapshot.business_id {
            bail!("Employee {} belongs to another business", employee.id);
        }
        shift::validate_shifts(&employee.shifts)
            .with_context(|| format!("Invalid shifts for employee {}", employee.id))?;
    }
    ensure_disjoint(&snapshot.unavailabilities, tz).context("Invalid unavailability records")?;
    Ok(())
}

fn persist(
    mut snapshot: TenantSnapshot,
    records: Vec<roster_engine::model::Unavailability>,
    path: Option<&str>,
) -> Result<()> {
    let Some(path) = path else {
        bail!("--write needs --data");
    };
    snapshot.unavailabilities = records;
    snapshot.save(path)?;
    info!(path, "snapshot updated");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
