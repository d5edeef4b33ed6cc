//! Tests for the unavailability merge engine.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use roster_engine::clock::{day_range, Window};
use roster_engine::error::RosterError;
use roster_engine::model::{Employee, EmployeeId, RecordId, Unavailability};
use roster_engine::scope::TenantScope;
use roster_engine::unavailability::{
    apply_plan, apply_unavailability, delete_unavailability, edge_of, ensure_disjoint,
    ensure_not_past, preview_merge, resize_by_drag, unavailabilities_in_window, DayRange,
    DragEdge, MergePlan, UnavailabilityEdit,
};

const TZ: Tz = chrono_tz::UTC;

// ── Helpers ─────────────────────────────────────────────────────────────────

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn start(s: &str) -> DateTime<Utc> {
    day_range(day(s), TZ).start
}

fn end(s: &str) -> DateTime<Utc> {
    day_range(day(s), TZ).end
}

fn block(id: &str, first: &str, last: &str) -> Unavailability {
    Unavailability {
        id: RecordId::new(id),
        employee_id: EmployeeId::new("emp-1"),
        start_date: start(first),
        end_date: end(last),
        reason: None,
    }
}

fn edit(first: &str, last: &str) -> UnavailabilityEdit {
    UnavailabilityEdit::days(DayRange::new(day(first), day(last)).unwrap(), TZ, None)
}

fn scope() -> TenantScope {
    TenantScope::new("biz-1")
}

fn employee() -> Employee {
    Employee::new("emp-1", "biz-1")
}

fn plan(edit: &UnavailabilityEdit, existing: &[Unavailability]) -> MergePlan {
    apply_unavailability(&scope(), &employee(), edit, existing, TZ).expect("plan should compute")
}

// ── Insert / merge ──────────────────────────────────────────────────────────

#[test]
fn no_overlap_inserts_candidate_range() {
    let existing = vec![block("a", "2024-06-01", "2024-06-03")];
    let result = plan(&edit("2024-06-10", "2024-06-12"), &existing);

    assert_eq!(result.upsert.len(), 1);
    let upsert = &result.upsert[0];
    assert_eq!(upsert.id, None);
    assert_eq!(upsert.employee_id, EmployeeId::new("emp-1"));
    assert_eq!(upsert.start_date, start("2024-06-10"));
    assert_eq!(upsert.end_date, end("2024-06-12"));
    assert!(result.delete.is_empty());
}

#[test]
fn candidate_is_normalized_to_whole_days() {
    let partial = UnavailabilityEdit {
        record_id: None,
        start_date: Utc.with_ymd_and_hms(2024, 6, 10, 13, 45, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2024, 6, 11, 8, 0, 0).unwrap(),
        reason: None,
    };
    let result = plan(&partial, &[]);

    assert_eq!(result.upsert[0].start_date, start("2024-06-10"));
    assert_eq!(result.upsert[0].end_date, end("2024-06-11"));
}

#[test]
fn single_overlap_extends_existing_record() {
    // Existing [06-10, 06-12], candidate [06-11, 06-15].
    let existing = vec![block("a", "2024-06-10", "2024-06-12")];
    let result = plan(&edit("2024-06-11", "2024-06-15"), &existing);

    assert_eq!(result.upsert.len(), 1);
    assert_eq!(result.upsert[0].id, Some(RecordId::new("a")));
    assert_eq!(result.upsert[0].start_date, start("2024-06-10"));
    assert_eq!(result.upsert[0].end_date, end("2024-06-15"));
    assert!(result.delete.is_empty());
}

#[test]
fn bridging_candidate_merges_two_records() {
    // Existing [06-01, 06-03] and [06-08, 06-10], candidate [06-02, 06-09].
    let existing = vec![
        block("a", "2024-06-01", "2024-06-03"),
        block("b", "2024-06-08", "2024-06-10"),
    ];
    let result = plan(&edit("2024-06-02", "2024-06-09"), &existing);

    assert_eq!(result.upsert.len(), 1);
    assert_eq!(result.upsert[0].id, Some(RecordId::new("a")));
    assert_eq!(result.upsert[0].start_date, start("2024-06-01"));
    assert_eq!(result.upsert[0].end_date, end("2024-06-10"));
    assert_eq!(result.delete, vec![RecordId::new("b")]);
}

#[test]
fn candidate_swallowing_records_deletes_all_but_survivor() {
    let existing = vec![
        block("a", "2024-06-03", "2024-06-04"),
        block("b", "2024-06-06", "2024-06-06"),
        block("c", "2024-06-08", "2024-06-09"),
    ];
    let result = plan(&edit("2024-06-01", "2024-06-30"), &existing);

    assert_eq!(result.upsert[0].id, Some(RecordId::new("a")));
    assert_eq!(result.upsert[0].start_date, start("2024-06-01"));
    assert_eq!(result.upsert[0].end_date, end("2024-06-30"));
    assert_eq!(result.delete, vec![RecordId::new("b"), RecordId::new("c")]);
}

#[test]
fn contained_candidate_is_a_no_op_upsert() {
    let existing = vec![block("a", "2024-06-10", "2024-06-20")];
    let result = plan(&edit("2024-06-12", "2024-06-14"), &existing);

    assert_eq!(result.upsert.len(), 1);
    assert_eq!(result.upsert[0].id, Some(RecordId::new("a")));
    assert_eq!(result.upsert[0].start_date, existing[0].start_date);
    assert_eq!(result.upsert[0].end_date, existing[0].end_date);
    assert!(result.delete.is_empty());
}

#[test]
fn adjacent_days_are_not_merged() {
    let existing = vec![block("a", "2024-06-01", "2024-06-03")];
    let result = plan(&edit("2024-06-04", "2024-06-05"), &existing);

    assert_eq!(result.upsert[0].id, None);
    assert_eq!(result.upsert[0].start_date, start("2024-06-04"));
}

#[test]
fn other_employees_records_are_ignored() {
    let mut theirs = block("x", "2024-06-01", "2024-06-30");
    theirs.employee_id = EmployeeId::new("emp-2");

    let result = plan(&edit("2024-06-10", "2024-06-11"), &[theirs]);
    assert_eq!(result.upsert[0].id, None);
    assert!(result.delete.is_empty());
}

#[test]
fn same_inputs_give_same_plan() {
    let existing = vec![
        block("a", "2024-06-01", "2024-06-03"),
        block("b", "2024-06-08", "2024-06-10"),
    ];
    let candidate = edit("2024-06-02", "2024-06-09");
    assert_eq!(plan(&candidate, &existing), plan(&candidate, &existing));
}

// ── Reasons ─────────────────────────────────────────────────────────────────

#[test]
fn new_reason_replaces_survivor_reason() {
    let mut a = block("a", "2024-06-10", "2024-06-12");
    a.reason = Some("dentist".to_string());
    let mut candidate = edit("2024-06-12", "2024-06-13");
    candidate.reason = Some("vacation".to_string());

    let result = plan(&candidate, &[a]);
    assert_eq!(result.upsert[0].reason.as_deref(), Some("vacation"));
}

#[test]
fn survivor_keeps_reason_when_none_given() {
    let mut a = block("a", "2024-06-10", "2024-06-12");
    a.reason = Some("dentist".to_string());

    let result = plan(&edit("2024-06-12", "2024-06-13"), &[a]);
    assert_eq!(result.upsert[0].reason.as_deref(), Some("dentist"));
}

// ── Validation and authorization ────────────────────────────────────────────

#[test]
fn reversed_range_is_rejected() {
    let reversed = UnavailabilityEdit {
        record_id: None,
        start_date: start("2024-06-12"),
        end_date: start("2024-06-10"),
        reason: None,
    };
    let err = apply_unavailability(&scope(), &employee(), &reversed, &[], TZ).unwrap_err();
    assert!(matches!(err, RosterError::InvalidRange { .. }));
}

#[test]
fn employee_of_another_tenant_is_not_found() {
    let stranger = Employee::new("emp-1", "biz-2");
    let err = apply_unavailability(&scope(), &stranger, &edit("2024-06-10", "2024-06-11"), &[], TZ)
        .unwrap_err();
    assert!(matches!(err, RosterError::NotFound(_)));
}

#[test]
fn day_range_constructor_rejects_reversed_days() {
    assert!(matches!(
        DayRange::new(day("2024-06-12"), day("2024-06-10")),
        Err(RosterError::InvalidRange { .. })
    ));
}

// ── Drag resize ─────────────────────────────────────────────────────────────

#[test]
fn drag_resize_without_new_overlap_patches_only_that_record() {
    let existing = vec![
        block("a", "2024-06-01", "2024-06-03"),
        block("b", "2024-06-10", "2024-06-12"),
    ];
    let drag = resize_by_drag(&existing[0], DragEdge::Tail, day("2024-06-05"), TZ).unwrap();
    let result = plan(&drag, &existing);

    assert_eq!(result.upsert.len(), 1);
    assert_eq!(result.upsert[0].id, Some(RecordId::new("a")));
    assert_eq!(result.upsert[0].start_date, start("2024-06-01"));
    assert_eq!(result.upsert[0].end_date, end("2024-06-05"));
    assert!(result.delete.is_empty());
}

#[test]
fn drag_resize_into_neighbour_merges_it() {
    let existing = vec![
        block("a", "2024-06-01", "2024-06-03"),
        block("b", "2024-06-10", "2024-06-12"),
    ];
    let drag = resize_by_drag(&existing[0], DragEdge::Tail, day("2024-06-11"), TZ).unwrap();
    let result = plan(&drag, &existing);

    // The dragged record survives, the neighbour is absorbed.
    assert_eq!(result.upsert[0].id, Some(RecordId::new("a")));
    assert_eq!(result.upsert[0].start_date, start("2024-06-01"));
    assert_eq!(result.upsert[0].end_date, end("2024-06-12"));
    assert_eq!(result.delete, vec![RecordId::new("b")]);
}

#[test]
fn drag_can_shrink_a_block() {
    let existing = vec![block("a", "2024-06-01", "2024-06-10")];
    let drag = resize_by_drag(&existing[0], DragEdge::Head, day("2024-06-04"), TZ).unwrap();
    let result = plan(&drag, &existing);

    assert_eq!(result.upsert[0].id, Some(RecordId::new("a")));
    assert_eq!(result.upsert[0].start_date, start("2024-06-04"));
    assert_eq!(result.upsert[0].end_date, end("2024-06-10"));
}

#[test]
fn drag_past_the_other_edge_is_rejected() {
    let a = block("a", "2024-06-05", "2024-06-08");
    let err = resize_by_drag(&a, DragEdge::Head, day("2024-06-09"), TZ).unwrap_err();
    assert!(matches!(err, RosterError::InvalidRange { .. }));
}

#[test]
fn resizing_unknown_record_is_not_found() {
    let mut drag = edit("2024-06-01", "2024-06-02");
    drag.record_id = Some(RecordId::new("missing"));
    let err = apply_unavailability(&scope(), &employee(), &drag, &[], TZ).unwrap_err();
    assert!(matches!(err, RosterError::NotFound(_)));
}

#[test]
fn resizing_another_employees_record_is_not_found() {
    let mut theirs = block("x", "2024-06-01", "2024-06-02");
    theirs.employee_id = EmployeeId::new("emp-2");
    let mut drag = edit("2024-06-01", "2024-06-05");
    drag.record_id = Some(RecordId::new("x"));

    let err = apply_unavailability(&scope(), &employee(), &drag, &[theirs], TZ).unwrap_err();
    assert!(matches!(err, RosterError::NotFound(_)));
}

#[test]
fn edges_are_detected_on_first_and_last_day() {
    let a = block("a", "2024-06-05", "2024-06-08");
    assert_eq!(edge_of(day("2024-06-05"), &a, TZ), Some(DragEdge::Head));
    assert_eq!(edge_of(day("2024-06-08"), &a, TZ), Some(DragEdge::Tail));
    assert_eq!(edge_of(day("2024-06-06"), &a, TZ), None);

    let single = block("s", "2024-06-05", "2024-06-05");
    assert_eq!(edge_of(day("2024-06-05"), &single, TZ), Some(DragEdge::Head));
}

// ── Preview, delete, queries ────────────────────────────────────────────────

#[test]
fn preview_returns_union_without_planning_writes() {
    let existing = vec![
        block("a", "2024-06-01", "2024-06-03"),
        block("b", "2024-06-08", "2024-06-10"),
    ];
    let candidate = Window::new(start("2024-06-03"), end("2024-06-05"));
    let preview = preview_merge(&EmployeeId::new("emp-1"), &candidate, &existing, TZ).unwrap();

    assert_eq!(preview.start, start("2024-06-01"));
    assert_eq!(preview.end, end("2024-06-05"));
}

#[test]
fn delete_requires_ownership() {
    let existing = vec![block("a", "2024-06-01", "2024-06-03")];

    let id = delete_unavailability(&scope(), &employee(), &RecordId::new("a"), &existing).unwrap();
    assert_eq!(id, RecordId::new("a"));

    let other = Employee::new("emp-2", "biz-1");
    assert!(matches!(
        delete_unavailability(&scope(), &other, &RecordId::new("a"), &existing),
        Err(RosterError::NotFound(_))
    ));
}

#[test]
fn past_start_day_is_rejected() {
    let range = Window::new(start("2024-06-09"), end("2024-06-12"));
    let err = ensure_not_past(&range, day("2024-06-10"), TZ).unwrap_err();
    assert_eq!(err, RosterError::Validation("Day cannot be in the past".to_string()));

    let today = Window::new(start("2024-06-10"), end("2024-06-12"));
    assert!(ensure_not_past(&today, day("2024-06-10"), TZ).is_ok());
}

#[test]
fn window_query_follows_bound_rules() {
    let records = vec![
        block("a", "2024-06-01", "2024-06-03"),
        block("b", "2024-06-08", "2024-06-10"),
        block("c", "2024-06-20", "2024-06-25"),
    ];
    let ids = |found: Vec<&Unavailability>| -> Vec<String> {
        found.iter().map(|r| r.id.to_string()).collect()
    };

    let both = unavailabilities_in_window(&records, Some(start("2024-06-02")), Some(end("2024-06-20")));
    assert_eq!(ids(both), vec!["b", "c"]);

    let from = unavailabilities_in_window(&records, Some(start("2024-06-08")), None);
    assert_eq!(ids(from), vec!["b", "c"]);

    let to = unavailabilities_in_window(&records, None, Some(end("2024-06-10")));
    assert_eq!(ids(to), vec!["a", "b"]);

    assert_eq!(unavailabilities_in_window(&records, None, None).len(), 3);
}

// ── Applying plans ──────────────────────────────────────────────────────────

#[test]
fn applied_plan_leaves_disjoint_records() {
    let existing = vec![
        block("a", "2024-06-01", "2024-06-03"),
        block("b", "2024-06-08", "2024-06-10"),
    ];
    let result = plan(&edit("2024-06-02", "2024-06-09"), &existing);

    let mut counter = 0;
    let after = apply_plan(&existing, &result, || {
        counter += 1;
        RecordId::new(format!("new-{}", counter))
    });

    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, RecordId::new("a"));
    assert_eq!(after[0].end_date, end("2024-06-10"));
    assert!(ensure_disjoint(&after, TZ).is_ok());
    assert_eq!(counter, 0);
}

#[test]
fn applied_insert_gets_fresh_id() {
    let result = plan(&edit("2024-06-02", "2024-06-03"), &[]);
    let after = apply_plan(&[], &result, || RecordId::new("fresh"));
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, RecordId::new("fresh"));
}

#[test]
fn overlapping_snapshot_fails_disjointness_check() {
    let records = vec![
        block("a", "2024-06-01", "2024-06-05"),
        block("b", "2024-06-05", "2024-06-07"),
    ];
    assert!(matches!(
        ensure_disjoint(&records, TZ),
        Err(RosterError::Validation(msg)) if msg.contains("overlaps")
    ));

    // Same days for different employees are fine.
    let mut theirs = records[1].clone();
    theirs.employee_id = EmployeeId::new("emp-2");
    assert!(ensure_disjoint(&[records[0].clone(), theirs], TZ).is_ok());
}
