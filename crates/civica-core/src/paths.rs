use crate::error::{CivicError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CIVICA_DIR: &str = ".civica";
pub const REPORTS_DIR: &str = ".civica/reports";

pub const CONFIG_FILE: &str = ".civica/config.yaml";
pub const WORKERS_FILE: &str = ".civica/workers.yaml";
pub const PRINCIPALS_FILE: &str = ".civica/principals.yaml";

pub const MANIFEST_FILE: &str = "manifest.yaml";
pub const LOCK_FILE: &str = "manifest.lock";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn civica_dir(root: &Path) -> PathBuf {
    root.join(CIVICA_DIR)
}

pub fn report_dir(root: &Path, id: &str) -> PathBuf {
    root.join(REPORTS_DIR).join(id)
}

pub fn report_manifest(root: &Path, id: &str) -> PathBuf {
    report_dir(root, id).join(MANIFEST_FILE)
}

pub fn report_lock(root: &Path, id: &str) -> PathBuf {
    report_dir(root, id).join(LOCK_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn workers_path(root: &Path) -> PathBuf {
    root.join(WORKERS_FILE)
}

pub fn principals_path(root: &Path) -> PathBuf {
    root.join(PRINCIPALS_FILE)
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Validate identifiers we embed in paths and rankings: scope ids,
/// categories, and employee ids.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(CivicError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
