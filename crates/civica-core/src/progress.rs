//! Read-only progress derivation. Nothing here mutates a report.

use crate::error::{CivicError, Result};
use crate::lifecycle;
use crate::report::{Report, StatusEvent};
use crate::types::Status;

/// Completion percentage for a status. Terminal statuses all read 100;
/// adapters render rejected distinctly.
pub fn percent(status: Status) -> u8 {
    match status {
        Status::Submitted => 20,
        Status::Acknowledged => 40,
        Status::Assigned => 55,
        Status::InProgress => 70,
        Status::Resolved | Status::Rejected | Status::Closed => 100,
    }
}

/// Ordered sequence of hops reconstructing the path to the current status.
pub fn timeline(report: &Report) -> &[StatusEvent] {
    &report.history
}

/// Fold the timeline from `submitted`, verifying every stored hop is a
/// defined edge and the chain is contiguous. Returns the reconstructed
/// status, which must equal the report's current one.
pub fn replay(report: &Report) -> Result<Status> {
    let mut current = Status::Submitted;
    for event in &report.history {
        if event.from != current || !lifecycle::edge_allowed(event.from, event.to) {
            return Err(CivicError::InvalidTransition {
                from: event.from.to_string(),
                to: event.to.to_string(),
                reason: "stored history does not replay".to_string(),
            });
        }
        current = event.to;
    }
    if current != report.status {
        return Err(CivicError::InvalidTransition {
            from: current.to_string(),
            to: report.status.to_string(),
            reason: "replayed status does not match stored status".to_string(),
        });
    }
    Ok(current)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
