//! Principal resolution and capability checks.
//!
//! Every mutating operation in the lifecycle and assignment modules calls
//! [`require_capability`] before touching any state. A failed check aborts
//! the operation with no side effects. Principals are explicit values passed
//! into each call; nothing here reads ambient or global session state.

use crate::error::{CivicError, Result};
use crate::io;
use crate::paths;
use crate::role::{self, Capability, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// A department, ward, or district identifier a principal is confined to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(pub String);

impl Scope {
    pub fn new(id: impl Into<String>) -> Self {
        Scope(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// An authenticated actor: identity, role, and the scope it acts within.
/// For workers, `id` is the employee id used by assignment binding checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub scope: Scope,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role, scope: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            scope: Scope::new(scope),
        }
    }
}

// ---------------------------------------------------------------------------
// Capability gate
// ---------------------------------------------------------------------------

/// Require `capability` of `principal` against a target entity's scope.
///
/// Scope-limited roles (department_head and every operational role) must
/// match the target scope exactly; higher tiers bypass the scope check.
pub fn require_capability(
    principal: &Principal,
    capability: Capability,
    target: &Scope,
) -> Result<()> {
    let scope_match = principal.scope == *target;
    match role::is_authorized(principal.role, capability, scope_match) {
        Err(CivicError::ScopeMismatch { .. }) => Err(CivicError::ScopeMismatch {
            principal: principal.scope.to_string(),
            target: target.to_string(),
        }),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Credential validation
// ---------------------------------------------------------------------------

/// External collaborator that turns an opaque credential into a Principal.
pub trait CredentialValidator {
    fn validate(&self, token: &str) -> Result<Principal>;
}

/// File-backed validator: `.civica/principals.yaml` maps tokens to
/// principals. A read failure is a fast `Unavailable`, never a retry loop.
pub struct FileValidator {
    principals: HashMap<String, Principal>,
}

impl FileValidator {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::principals_path(root);
        if !path.exists() {
            return Err(CivicError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)
            .map_err(|e| CivicError::Unavailable(format!("principals file: {e}")))?;
        let principals: HashMap<String, Principal> = serde_yaml::from_str(&data)?;
        Ok(Self { principals })
    }

    pub fn save(root: &Path, principals: &HashMap<String, Principal>) -> Result<()> {
        let data = serde_yaml::to_string(principals)?;
        io::atomic_write(&paths::principals_path(root), data.as_bytes())
    }
}

impl CredentialValidator for FileValidator {
    fn validate(&self, token: &str) -> Result<Principal> {
        self.principals
            .get(token)
            .cloned()
            .ok_or(CivicError::InvalidCredential)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
