//! Binding workers to reports.
//!
//! Assignment is the only path onto the `assigned` edge of the lifecycle.
//! Records are append-only: reassignment adds a new record and never erases
//! who was assigned before.

use crate::auth::{self, Principal};
use crate::error::{CivicError, Result};
use crate::events::{DomainEvent, EventSink};
use crate::lifecycle;
use crate::report::Report;
use crate::role::Capability;
use crate::types::{Priority, Status};
use crate::worker::{self, Worker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// AssignmentRecord
// ---------------------------------------------------------------------------

/// Immutable audit entry binding a worker to a report at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub worker: String,
    pub assigned_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_override: Option<Priority>,
    pub estimated_hours: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub assigned_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of an `assign` call. A proposal touches no state; the caller must
/// confirm by calling again with the named worker.
#[derive(Debug)]
pub enum AssignOutcome {
    Assigned(Box<Report>),
    Proposed(Worker),
}

// ---------------------------------------------------------------------------
// Candidate ranking
// ---------------------------------------------------------------------------

/// Rank active workers for a category: specialization match first, then
/// fewest open assignments, then employee id for determinism.
pub fn propose_worker(root: &Path, category: &str) -> Result<Worker> {
    let mut candidates = worker::list_active(root, None)?;
    if candidates.is_empty() {
        return Err(CivicError::WorkerNotFound(
            "no active worker available".to_string(),
        ));
    }
    candidates.sort_by(|a, b| {
        let a_match = a.specialization == category;
        let b_match = b.specialization == category;
        b_match
            .cmp(&a_match)
            .then(a.open_assignments.cmp(&b.open_assignments))
            .then(a.employee_id.cmp(&b.employee_id))
    });
    Ok(candidates.remove(0))
}

// ---------------------------------------------------------------------------
// Assign
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
pub fn assign(
    root: &Path,
    report_id: &str,
    worker_id: Option<&str>,
    assigned_by: &Principal,
    priority_override: Option<Priority>,
    estimated_hours: u32,
    notes: Option<String>,
    sink: &mut dyn EventSink,
) -> Result<AssignOutcome> {
    let mut report = Report::load(root, report_id)?;
    let expected_version = report.version;

    if report.status.is_terminal() {
        return Err(CivicError::AlreadyTerminal(report.id.clone()));
    }

    auth::require_capability(assigned_by, Capability::AssignWorker, &report.scope)?;

    // No worker named: surface the top candidate; the caller confirms
    // explicitly. Nothing is written.
    let Some(worker_id) = worker_id else {
        return Ok(AssignOutcome::Proposed(propose_worker(
            root,
            &report.category,
        )?));
    };

    let candidate = worker::get(root, worker_id)?;
    if !candidate.is_active {
        return Err(CivicError::WorkerInactive(candidate.employee_id));
    }

    let now = Utc::now();
    let previous = report.assigned_to.clone();

    report.assignments.push(AssignmentRecord {
        worker: candidate.employee_id.clone(),
        assigned_by: assigned_by.id.clone(),
        priority_override,
        estimated_hours,
        notes,
        assigned_at: now,
    });
    report.assigned_to = Some(candidate.employee_id.clone());
    report.assigned_at = Some(now);
    if let Some(priority) = priority_override {
        report.priority = priority;
    }

    // From submitted/acknowledged the binding also drives the lifecycle
    // edge; a reassignment while assigned/in_progress changes only the
    // assignee and preserves status and progress.
    if matches!(report.status, Status::Submitted | Status::Acknowledged) {
        lifecycle::apply_assigned(&mut report, assigned_by, now);
    }

    report.save_versioned(root, expected_version)?;

    // Counts are ranking input only; the binding is committed above, so a
    // registry failure here does not fail the call.
    match previous {
        Some(prev_id) if prev_id == candidate.employee_id => {}
        Some(prev_id) => {
            let _ = worker::adjust_open_assignments(root, &prev_id, -1);
            let _ = worker::adjust_open_assignments(root, &candidate.employee_id, 1);
        }
        None => {
            let _ = worker::adjust_open_assignments(root, &candidate.employee_id, 1);
        }
    }

    sink.emit(DomainEvent::ReportAssigned {
        report_id: report.id.clone(),
        worker: candidate.employee_id,
        assigned_by: assigned_by.id.clone(),
        at: now,
    });

    Ok(AssignOutcome::Assigned(Box::new(report)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
