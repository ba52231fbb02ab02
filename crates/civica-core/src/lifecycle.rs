//! The report lifecycle state machine.
//!
//! Edges:
//!   submitted → acknowledged → assigned → in_progress → resolved → closed
//!   any non-terminal → rejected
//!   resolved | rejected → acknowledged   (admin reopen)
//!
//! Every hop is one explicit call; there are no background transitions and
//! no multi-hop jumps. The `assigned` edge is reserved for the assignment
//! engine and rejected here.

use crate::auth::{self, Principal};
use crate::config::SlaConfig;
use crate::error::{CivicError, Result};
use crate::events::{DomainEvent, EventSink};
use crate::report::{Report, StatusEvent};
use crate::role::{Capability, Role};
use crate::types::Status;
use crate::worker;
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

// ---------------------------------------------------------------------------
// Edge table
// ---------------------------------------------------------------------------

/// Whether `(from, to)` is a defined edge of the state machine.
pub fn edge_allowed(from: Status, to: Status) -> bool {
    use Status::*;
    matches!(
        (from, to),
        (Submitted, Acknowledged)
            | (Submitted, Assigned)
            | (Acknowledged, Assigned)
            | (Assigned, InProgress)
            | (InProgress, Resolved)
            | (Resolved, Closed)
            | (Submitted, Rejected)
            | (Acknowledged, Rejected)
            | (Assigned, Rejected)
            | (InProgress, Rejected)
            | (Resolved, Acknowledged)
            | (Rejected, Acknowledged)
    )
}

fn invalid(from: Status, to: Status, reason: &str) -> CivicError {
    CivicError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Actor gates
// ---------------------------------------------------------------------------

fn require_admin(report: &Report, actor: &Principal, capability: Capability) -> Result<()> {
    if !actor.role.is_admin() {
        return Err(CivicError::Forbidden {
            role: actor.role.to_string(),
            capability: capability.to_string(),
        });
    }
    auth::require_capability(actor, capability, &report.scope)
}

/// The assigned worker, or a scope-matched field admin.
fn require_field_actor(report: &Report, actor: &Principal) -> Result<()> {
    match actor.role {
        Role::FieldAdmin => auth::require_capability(actor, Capability::UpdateStatus, &report.scope),
        Role::Worker => {
            if report.assigned_to.as_deref() != Some(actor.id.as_str()) {
                return Err(CivicError::Forbidden {
                    role: actor.role.to_string(),
                    capability: Capability::UpdateStatus.to_string(),
                });
            }
            auth::require_capability(actor, Capability::UpdateStatus, &report.scope)
        }
        _ => Err(CivicError::Forbidden {
            role: actor.role.to_string(),
            capability: Capability::UpdateStatus.to_string(),
        }),
    }
}

fn check_actor(report: &Report, target: Status, actor: &Principal) -> Result<()> {
    use Status::*;
    match (report.status, target) {
        (Submitted, Acknowledged) => require_admin(report, actor, Capability::UpdateStatus),
        (Assigned, InProgress) | (InProgress, Resolved) => require_field_actor(report, actor),
        (_, Rejected) => require_admin(report, actor, Capability::UpdateStatus),
        (Resolved, Closed) => require_admin(report, actor, Capability::CloseReport),
        (Resolved, Acknowledged) | (Rejected, Acknowledged) => {
            require_admin(report, actor, Capability::ReopenReport)
        }
        // Unreachable once edge_allowed has passed; assigned is engine-only.
        _ => Err(invalid(report.status, target, "no actor may take this edge")),
    }
}

// ---------------------------------------------------------------------------
// Pure in-memory application
// ---------------------------------------------------------------------------

/// Validate and apply one transition to an in-memory report.
///
/// Performs every check in order (edge, actor, note, evidence) and only then
/// mutates; on error the report is untouched. Persistence and the optimistic
/// commit live in [`transition`].
pub fn apply(
    report: &mut Report,
    target: Status,
    actor: &Principal,
    now: DateTime<Utc>,
    note: Option<String>,
    evidence: Vec<String>,
) -> Result<()> {
    let from = report.status;

    if target == from {
        return Err(invalid(from, target, "report is already in this status"));
    }
    if target == Status::Assigned {
        return Err(invalid(
            from,
            target,
            "assignment goes through the assignment engine",
        ));
    }
    if !edge_allowed(from, target) {
        return Err(invalid(from, target, "no such edge"));
    }

    check_actor(report, target, actor)?;

    if target == Status::Rejected && note.as_deref().map_or(true, |n| n.trim().is_empty()) {
        return Err(invalid(from, target, "rejection requires a reason note"));
    }
    if target == Status::Resolved && evidence.is_empty() {
        return Err(CivicError::MissingEvidence);
    }

    record_hop(report, target, actor, now, note, evidence);
    Ok(())
}

/// The engine-only `assigned` edge. Callers have already verified the
/// assign capability and bound a worker.
pub(crate) fn apply_assigned(report: &mut Report, actor: &Principal, now: DateTime<Utc>) {
    record_hop(report, Status::Assigned, actor, now, None, Vec::new());
}

fn record_hop(
    report: &mut Report,
    target: Status,
    actor: &Principal,
    now: DateTime<Utc>,
    note: Option<String>,
    evidence: Vec<String>,
) {
    let from = report.status;
    report.status = target;
    report.updated_at = now;
    report.history.push(StatusEvent {
        from,
        to: target,
        actor: actor.id.clone(),
        at: now,
        note,
        evidence,
    });

    // Rejection and reopen drop the binding so the assignee invariant
    // holds; the audit trail keeps the last-known worker.
    if !target.requires_assignee() {
        report.assigned_to = None;
        report.assigned_at = None;
    }
}

// ---------------------------------------------------------------------------
// Guarded, persisted transition
// ---------------------------------------------------------------------------

/// Load, validate, apply, and commit one transition.
///
/// The commit uses the optimistic version check: if another writer got in
/// between load and save, the call fails `StaleState` and the stored report
/// is left exactly as that writer wrote it.
pub fn transition(
    root: &Path,
    report_id: &str,
    target: Status,
    actor: &Principal,
    note: Option<String>,
    evidence: Vec<String>,
    sink: &mut dyn EventSink,
) -> Result<Report> {
    let mut report = Report::load(root, report_id)?;
    let expected_version = report.version;
    let from = report.status;
    let bound_worker = report.assigned_to.clone();
    let now = Utc::now();

    apply(&mut report, target, actor, now, note, evidence)?;
    report.save_versioned(root, expected_version)?;

    // A report leaving the active pipeline frees its worker for ranking.
    // The count only feeds ranking and the transition is already committed,
    // so a registry failure here does not fail the call.
    if matches!(target, Status::Resolved | Status::Rejected) {
        if let Some(employee_id) = &bound_worker {
            let _ = worker::adjust_open_assignments(root, employee_id, -1);
        }
    }

    sink.emit(DomainEvent::StatusChanged {
        report_id: report.id.clone(),
        from,
        to: target,
        actor: actor.id.clone(),
        at: now,
    });

    Ok(report)
}

// ---------------------------------------------------------------------------
// Derived queries
// ---------------------------------------------------------------------------

/// True when a report has sat in submitted/acknowledged past its category's
/// SLA window. Pure; escalation policy is an adapter concern.
pub fn is_overdue(report: &Report, now: DateTime<Utc>, sla: &SlaConfig) -> bool {
    if !matches!(report.status, Status::Submitted | Status::Acknowledged) {
        return false;
    }
    let window = Duration::hours(i64::from(sla.hours_for(&report.category)));
    now - report.created_at > window
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Scope;
    use crate::events::MemorySink;
    use crate::report::NewReport;
    use crate::types::Priority;
    use tempfile::TempDir;

    fn draft(scope: &str) -> NewReport {
        NewReport {
            title: "Overflowing bin".to_string(),
            description: "Bin at the park entrance".to_string(),
            category: "sanitation".to_string(),
            priority: Priority::Medium,
            location: "Riverside Park".to_string(),
            reporter: "citizen-3".to_string(),
            scope: Scope::new(scope),
        }
    }

    fn head(scope: &str) -> Principal {
        Principal::new("head-1", Role::DepartmentHead, scope)
    }

    fn field_admin(scope: &str) -> Principal {
        Principal::new("fa-1", Role::FieldAdmin, scope)
    }

    fn worker_principal(id: &str, scope: &str) -> Principal {
        Principal::new(id, Role::Worker, scope)
    }

    /// In-memory report already bound to `emp-7`, in the given status.
    fn bound_report(status: Status) -> Report {
        let mut report = Report::new(draft("sanitation"));
        report.status = status;
        if status.requires_assignee() {
            report.assigned_to = Some("emp-7".to_string());
            report.assigned_at = Some(Utc::now());
        }
        report
    }

    #[test]
    fn edge_table_matches_design() {
        use Status::*;
        assert!(edge_allowed(Submitted, Acknowledged));
        assert!(edge_allowed(Acknowledged, Assigned));
        assert!(edge_allowed(Assigned, InProgress));
        assert!(edge_allowed(InProgress, Resolved));
        assert!(edge_allowed(Resolved, Closed));
        assert!(edge_allowed(Resolved, Acknowledged));
        assert!(edge_allowed(Rejected, Acknowledged));

        assert!(!edge_allowed(Submitted, InProgress));
        assert!(!edge_allowed(Submitted, Resolved));
        assert!(!edge_allowed(Acknowledged, Resolved));
        assert!(!edge_allowed(Closed, Acknowledged));
        assert!(!edge_allowed(Resolved, Rejected));
        assert!(!edge_allowed(Closed, Rejected));
    }

    #[test]
    fn acknowledge_by_scoped_department_head() {
        let mut report = Report::new(draft("sanitation"));
        apply(
            &mut report,
            Status::Acknowledged,
            &head("sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(report.status, Status::Acknowledged);
        assert_eq!(report.history.len(), 1);
        assert_eq!(report.history[0].from, Status::Submitted);
    }

    #[test]
    fn acknowledge_out_of_scope_fails() {
        // Scenario D: valid edge, wrong scope.
        let mut report = Report::new(draft("roads"));
        let err = apply(
            &mut report,
            Status::Acknowledged,
            &head("sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::ScopeMismatch { .. }));
        assert_eq!(report.status, Status::Submitted);
        assert!(report.history.is_empty());
    }

    #[test]
    fn acknowledge_by_worker_forbidden() {
        let mut report = Report::new(draft("sanitation"));
        let err = apply(
            &mut report,
            Status::Acknowledged,
            &worker_principal("emp-7", "sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::Forbidden { .. }));
    }

    #[test]
    fn higher_tier_acknowledges_across_scopes() {
        let mut report = Report::new(draft("roads"));
        let admin = Principal::new("ma-1", Role::MunicipalityAdmin, "city-hall");
        apply(
            &mut report,
            Status::Acknowledged,
            &admin,
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(report.status, Status::Acknowledged);
    }

    #[test]
    fn no_op_transition_is_invalid() {
        let mut report = Report::new(draft("sanitation"));
        let err = apply(
            &mut report,
            Status::Submitted,
            &head("sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::InvalidTransition { .. }));
        assert!(report.history.is_empty());
    }

    #[test]
    fn skipping_states_is_invalid() {
        let mut report = Report::new(draft("sanitation"));
        let err = apply(
            &mut report,
            Status::Resolved,
            &head("sanitation"),
            Utc::now(),
            None,
            vec!["photo-1".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::InvalidTransition { .. }));
    }

    #[test]
    fn assigned_edge_rejected_outside_engine() {
        let mut report = Report::new(draft("sanitation"));
        report.status = Status::Acknowledged;
        let err = apply(
            &mut report,
            Status::Assigned,
            &head("sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::InvalidTransition { .. }));
    }

    #[test]
    fn assigned_worker_starts_work() {
        let mut report = bound_report(Status::Assigned);
        apply(
            &mut report,
            Status::InProgress,
            &worker_principal("emp-7", "sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(report.status, Status::InProgress);
        assert_eq!(report.assigned_to.as_deref(), Some("emp-7"));
    }

    #[test]
    fn unassigned_worker_cannot_start_work() {
        let mut report = bound_report(Status::Assigned);
        let err = apply(
            &mut report,
            Status::InProgress,
            &worker_principal("emp-99", "sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::Forbidden { .. }));
    }

    #[test]
    fn field_admin_can_start_work_in_scope() {
        let mut report = bound_report(Status::Assigned);
        apply(
            &mut report,
            Status::InProgress,
            &field_admin("sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(report.status, Status::InProgress);
    }

    #[test]
    fn resolve_requires_evidence() {
        let mut report = bound_report(Status::InProgress);
        let err = apply(
            &mut report,
            Status::Resolved,
            &worker_principal("emp-7", "sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::MissingEvidence));
        assert_eq!(report.status, Status::InProgress);
        assert!(report.history.is_empty());
    }

    #[test]
    fn resolve_with_evidence_keeps_binding() {
        let mut report = bound_report(Status::InProgress);
        apply(
            &mut report,
            Status::Resolved,
            &worker_principal("emp-7", "sanitation"),
            Utc::now(),
            Some("replaced the bin".to_string()),
            vec!["photo-after-1".to_string()],
        )
        .unwrap();
        assert_eq!(report.status, Status::Resolved);
        assert_eq!(report.assigned_to.as_deref(), Some("emp-7"));
        assert_eq!(report.history[0].evidence, vec!["photo-after-1"]);
        assert!(report.assignment_consistent());
    }

    #[test]
    fn reject_requires_reason_note() {
        let mut report = Report::new(draft("sanitation"));
        let err = apply(
            &mut report,
            Status::Rejected,
            &head("sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::InvalidTransition { .. }));

        apply(
            &mut report,
            Status::Rejected,
            &head("sanitation"),
            Utc::now(),
            Some("duplicate of rpt-0".to_string()),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(report.status, Status::Rejected);
    }

    #[test]
    fn reject_clears_binding() {
        let mut report = bound_report(Status::InProgress);
        apply(
            &mut report,
            Status::Rejected,
            &head("sanitation"),
            Utc::now(),
            Some("not a municipal asset".to_string()),
            Vec::new(),
        )
        .unwrap();
        assert!(report.assigned_to.is_none());
        assert!(report.assignment_consistent());
    }

    #[test]
    fn close_from_resolved_only() {
        let mut report = bound_report(Status::Resolved);
        apply(
            &mut report,
            Status::Closed,
            &head("sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(report.status, Status::Closed);
        assert_eq!(report.assigned_to.as_deref(), Some("emp-7"));
    }

    #[test]
    fn worker_cannot_close() {
        let mut report = bound_report(Status::Resolved);
        let err = apply(
            &mut report,
            Status::Closed,
            &worker_principal("emp-7", "sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::Forbidden { .. }));
    }

    #[test]
    fn reopen_appends_event_and_clears_binding() {
        let mut report = bound_report(Status::Resolved);
        report.history.push(StatusEvent {
            from: Status::InProgress,
            to: Status::Resolved,
            actor: "emp-7".to_string(),
            at: Utc::now(),
            note: None,
            evidence: vec!["photo-1".to_string()],
        });

        apply(
            &mut report,
            Status::Acknowledged,
            &head("sanitation"),
            Utc::now(),
            Some("work not actually done".to_string()),
            Vec::new(),
        )
        .unwrap();

        assert_eq!(report.status, Status::Acknowledged);
        // History is appended, never rewritten.
        assert_eq!(report.history.len(), 2);
        assert_eq!(report.history[1].from, Status::Resolved);
        assert!(report.assigned_to.is_none());
        assert!(report.assignment_consistent());
    }

    #[test]
    fn persisted_transition_emits_event_and_bumps_version() {
        let dir = TempDir::new().unwrap();
        let report = Report::create(dir.path(), draft("sanitation")).unwrap();
        let mut sink = MemorySink::default();

        let updated = transition(
            dir.path(),
            &report.id,
            Status::Acknowledged,
            &head("sanitation"),
            None,
            Vec::new(),
            &mut sink,
        )
        .unwrap();

        assert_eq!(updated.status, Status::Acknowledged);
        assert_eq!(updated.version, 2);
        assert_eq!(sink.events.len(), 1);
        assert!(matches!(
            sink.events[0],
            DomainEvent::StatusChanged {
                from: Status::Submitted,
                to: Status::Acknowledged,
                ..
            }
        ));
    }

    #[test]
    fn failed_transition_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let report = Report::create(dir.path(), draft("roads")).unwrap();
        let mut sink = MemorySink::default();

        let err = transition(
            dir.path(),
            &report.id,
            Status::Acknowledged,
            &head("sanitation"),
            None,
            Vec::new(),
            &mut sink,
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::ScopeMismatch { .. }));

        let stored = Report::load(dir.path(), &report.id).unwrap();
        assert_eq!(stored.status, Status::Submitted);
        assert_eq!(stored.version, 1);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn transition_missing_report_not_found() {
        let dir = TempDir::new().unwrap();
        let err = transition(
            dir.path(),
            "rpt-missing",
            Status::Acknowledged,
            &head("sanitation"),
            None,
            Vec::new(),
            &mut MemorySink::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::ReportNotFound(_)));
    }

    #[test]
    fn concurrent_writers_one_wins() {
        // Scenario C: both callers snapshot status=assigned; exactly one
        // commit succeeds, the other fails StaleState.
        let dir = TempDir::new().unwrap();
        let mut report = Report::create(dir.path(), draft("sanitation")).unwrap();
        report.status = Status::Assigned;
        report.assigned_to = Some("emp-7".to_string());
        report.assigned_at = Some(Utc::now());
        report.save_versioned(dir.path(), 1).unwrap();

        let mut first = Report::load(dir.path(), &report.id).unwrap();
        let mut second = Report::load(dir.path(), &report.id).unwrap();
        let snapshot_version = first.version;

        apply(
            &mut first,
            Status::InProgress,
            &worker_principal("emp-7", "sanitation"),
            Utc::now(),
            None,
            Vec::new(),
        )
        .unwrap();
        first.save_versioned(dir.path(), snapshot_version).unwrap();

        apply(
            &mut second,
            Status::Rejected,
            &head("sanitation"),
            Utc::now(),
            Some("duplicate".to_string()),
            Vec::new(),
        )
        .unwrap();
        let err = second
            .save_versioned(dir.path(), snapshot_version)
            .unwrap_err();
        assert!(matches!(err, CivicError::StaleState { .. }));

        let stored = Report::load(dir.path(), &report.id).unwrap();
        assert_eq!(stored.status, Status::InProgress);
    }

    #[test]
    fn resolve_frees_worker_capacity() {
        let dir = TempDir::new().unwrap();
        worker::add(dir.path(), worker::Worker::new("emp-7", "Asha", "sanitation")).unwrap();
        worker::adjust_open_assignments(dir.path(), "emp-7", 1).unwrap();

        let mut report = Report::create(dir.path(), draft("sanitation")).unwrap();
        report.status = Status::InProgress;
        report.assigned_to = Some("emp-7".to_string());
        report.assigned_at = Some(Utc::now());
        report.save_versioned(dir.path(), 1).unwrap();

        transition(
            dir.path(),
            &report.id,
            Status::Resolved,
            &worker_principal("emp-7", "sanitation"),
            None,
            vec!["photo-1".to_string()],
            &mut MemorySink::default(),
        )
        .unwrap();

        assert_eq!(
            worker::get(dir.path(), "emp-7").unwrap().open_assignments,
            0
        );
    }

    #[test]
    fn resolve_succeeds_when_worker_left_registry() {
        // The committed transition must not fail over the advisory count.
        let dir = TempDir::new().unwrap();
        let mut report = Report::create(dir.path(), draft("sanitation")).unwrap();
        report.status = Status::InProgress;
        report.assigned_to = Some("emp-gone".to_string());
        report.assigned_at = Some(Utc::now());
        report.save_versioned(dir.path(), 1).unwrap();

        let resolved = transition(
            dir.path(),
            &report.id,
            Status::Resolved,
            &worker_principal("emp-gone", "sanitation"),
            None,
            vec!["photo-1".to_string()],
            &mut MemorySink::default(),
        )
        .unwrap();
        assert_eq!(resolved.status, Status::Resolved);
    }

    #[test]
    fn overdue_only_before_assignment() {
        let sla = SlaConfig::default();
        let mut report = Report::new(draft("sanitation"));
        let later = report.created_at + Duration::hours(100);

        assert!(is_overdue(&report, later, &sla));
        assert!(!is_overdue(&report, report.created_at + Duration::hours(1), &sla));

        report.status = Status::InProgress;
        assert!(!is_overdue(&report, later, &sla));
    }

    #[test]
    fn overdue_uses_category_window() {
        let mut sla = SlaConfig::default();
        sla.per_category.insert("sanitation".to_string(), 4);
        let report = Report::new(draft("sanitation"));

        assert!(is_overdue(&report, report.created_at + Duration::hours(5), &sla));
        assert!(!is_overdue(&report, report.created_at + Duration::hours(3), &sla));
    }
}
