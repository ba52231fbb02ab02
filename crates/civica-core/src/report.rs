use crate::assignment::AssignmentRecord;
use crate::auth::Scope;
use crate::error::{CivicError, Result};
use crate::io;
use crate::paths;
use crate::types::{Priority, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// StatusEvent
// ---------------------------------------------------------------------------

/// One hop through the state machine. Appended exactly once per successful
/// transition, never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub from: Status,
    pub to: Status,
    pub actor: String,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Evidence references attached to the hop (only resolve carries any).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
}

// ---------------------------------------------------------------------------
// CommitLock
// ---------------------------------------------------------------------------

/// Exclusive per-report lock held across the versioned check-and-write.
///
/// Backed by a `create_new` lock file next to the manifest, so it excludes
/// other processes as well as other threads. Removed on drop; a lock left
/// behind by a crashed writer is stolen once it looks abandoned.
struct CommitLock {
    path: PathBuf,
}

impl CommitLock {
    const ATTEMPTS: u32 = 50;
    const BACKOFF: Duration = Duration::from_millis(10);
    const STALE_AFTER: Duration = Duration::from_secs(5);

    fn acquire(path: PathBuf) -> Result<Self> {
        for _ in 0..Self::ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Self::is_abandoned(&path) {
                        let _ = std::fs::remove_file(&path);
                        continue;
                    }
                    std::thread::sleep(Self::BACKOFF);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(CivicError::Unavailable(format!(
            "commit lock busy: {}",
            path.display()
        )))
    }

    fn is_abandoned(path: &Path) -> bool {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .map_or(false, |age| age > Self::STALE_AFTER)
    }
}

impl Drop for CommitLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Fields supplied by a citizen submission.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub location: String,
    pub reporter: String,
    pub scope: Scope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub status: Status,
    pub location: String,
    pub reporter: String,
    /// Department scope the report belongs to; capability checks run
    /// against this.
    pub scope: Scope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency counter, bumped on every committed save.
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    pub history: Vec<StatusEvent>,
    /// Full reassignment audit trail, append-only.
    #[serde(default)]
    pub assignments: Vec<AssignmentRecord>,
}

impl Report {
    pub fn new(draft: NewReport) -> Self {
        let now = Utc::now();
        Self {
            id: format!("rpt-{}", Uuid::new_v4()),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            priority: draft.priority,
            status: Status::Submitted,
            location: draft.location,
            reporter: draft.reporter,
            scope: draft.scope,
            created_at: now,
            updated_at: now,
            version: 0,
            assigned_to: None,
            assigned_at: None,
            history: Vec::new(),
            assignments: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn create(root: &Path, draft: NewReport) -> Result<Self> {
        paths::validate_slug(&draft.category)?;
        paths::validate_slug(draft.scope.as_str())?;
        let mut report = Self::new(draft);
        report.version = 1;
        report.write(root)?;
        Ok(report)
    }

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        let manifest = paths::report_manifest(root, id);
        if !manifest.exists() {
            return Err(CivicError::ReportNotFound(id.to_string()));
        }
        let data = std::fs::read_to_string(&manifest)?;
        let report: Report = serde_yaml::from_str(&data)?;
        Ok(report)
    }

    /// Commit with the optimistic check: the stored version must still be
    /// `expected_version` or the write fails `StaleState` and nothing
    /// changes on disk.
    ///
    /// The check and the write run under an exclusive per-report lock, so
    /// two writers racing from the same snapshot cannot both pass the
    /// version check; exactly one commits and the other sees `StaleState`.
    pub fn save_versioned(&mut self, root: &Path, expected_version: u64) -> Result<()> {
        let _lock = CommitLock::acquire(paths::report_lock(root, &self.id))?;
        let stored = Self::load(root, &self.id)?;
        if stored.version != expected_version {
            return Err(CivicError::StaleState {
                id: self.id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }
        self.version = expected_version + 1;
        self.updated_at = Utc::now();
        self.write(root)
    }

    fn write(&self, root: &Path) -> Result<()> {
        let manifest = paths::report_manifest(root, &self.id);
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&manifest, data.as_bytes())
    }

    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let reports_dir = root.join(paths::REPORTS_DIR);
        if !reports_dir.exists() {
            return Ok(Vec::new());
        }

        let mut reports = Vec::new();
        for entry in std::fs::read_dir(&reports_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let id = entry.file_name().to_string_lossy().into_owned();
                match Self::load(root, &id) {
                    Ok(r) => reports.push(r),
                    Err(CivicError::ReportNotFound(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        reports.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(reports)
    }

    // ---------------------------------------------------------------------------
    // Invariant helpers
    // ---------------------------------------------------------------------------

    /// `assigned_to` is set iff the status requires an assignee.
    pub fn assignment_consistent(&self) -> bool {
        self.assigned_to.is_some() == self.status.requires_assignee()
    }

    /// The most recently bound worker, surviving a reopen in the audit
    /// trail even after `assigned_to` is cleared.
    pub fn last_assignee(&self) -> Option<&str> {
        self.assignments.last().map(|a| a.worker.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
