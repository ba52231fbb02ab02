//! Field-worker registry.
//!
//! Layout:
//!   .civica/workers.yaml — flat list of all registered workers.
//!
//! The open-assignment count is maintained by the assignment engine and the
//! lifecycle (decremented when an assigned report reaches resolved or
//! rejected); it exists for candidate ranking, not for billing-grade
//! accounting.

use crate::error::{CivicError, Result};
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub employee_id: String,
    pub name: String,
    /// Department/category the worker specializes in, e.g. "sanitation".
    pub specialization: String,
    pub is_active: bool,
    #[serde(default)]
    pub open_assignments: u32,
}

impl Worker {
    pub fn new(
        employee_id: impl Into<String>,
        name: impl Into<String>,
        specialization: impl Into<String>,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            name: name.into(),
            specialization: specialization.into(),
            is_active: true,
            open_assignments: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry I/O
// ---------------------------------------------------------------------------

pub fn load_all(root: &Path) -> Result<Vec<Worker>> {
    let path = paths::workers_path(root);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(&path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::from_str(&content)?)
}

pub fn save_all(root: &Path, workers: &[Worker]) -> Result<()> {
    let content = serde_yaml::to_string(workers)?;
    io::atomic_write(&paths::workers_path(root), content.as_bytes())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Register a worker. The employee id must be unique.
pub fn add(root: &Path, worker: Worker) -> Result<Worker> {
    paths::validate_slug(&worker.employee_id)?;
    let mut workers = load_all(root)?;
    if workers.iter().any(|w| w.employee_id == worker.employee_id) {
        return Err(CivicError::DuplicateWorker(worker.employee_id));
    }
    workers.push(worker.clone());
    save_all(root, &workers)?;
    Ok(worker)
}

pub fn get(root: &Path, employee_id: &str) -> Result<Worker> {
    load_all(root)?
        .into_iter()
        .find(|w| w.employee_id == employee_id)
        .ok_or_else(|| CivicError::WorkerNotFound(employee_id.to_string()))
}

/// Active workers, optionally narrowed to one specialization.
pub fn list_active(root: &Path, specialization: Option<&str>) -> Result<Vec<Worker>> {
    let workers = load_all(root)?
        .into_iter()
        .filter(|w| w.is_active)
        .filter(|w| specialization.map_or(true, |s| w.specialization == s))
        .collect();
    Ok(workers)
}

pub fn set_active(root: &Path, employee_id: &str, active: bool) -> Result<Worker> {
    let mut workers = load_all(root)?;
    let worker = workers
        .iter_mut()
        .find(|w| w.employee_id == employee_id)
        .ok_or_else(|| CivicError::WorkerNotFound(employee_id.to_string()))?;
    worker.is_active = active;
    let updated = worker.clone();
    save_all(root, &workers)?;
    Ok(updated)
}

/// Shift a worker's open-assignment count by `delta`, saturating at zero.
pub fn adjust_open_assignments(root: &Path, employee_id: &str, delta: i32) -> Result<()> {
    let mut workers = load_all(root)?;
    let worker = workers
        .iter_mut()
        .find(|w| w.employee_id == employee_id)
        .ok_or_else(|| CivicError::WorkerNotFound(employee_id.to_string()))?;
    worker.open_assignments = worker.open_assignments.saturating_add_signed(delta);
    save_all(root, &workers)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
