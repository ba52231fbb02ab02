pub mod assign;
pub mod init;
pub mod overdue;
pub mod permissions;
pub mod report;
pub mod transition;
pub mod worker;

use anyhow::Context;
use civica_core::auth::{CredentialValidator, FileValidator, Principal};
use std::path::Path;

/// Resolve the acting principal from the `--token` credential.
pub fn principal(root: &Path, token: Option<&str>) -> anyhow::Result<Principal> {
    let token = token.context("a credential is required: pass --token or set CIVICA_TOKEN")?;
    let validator = FileValidator::load(root).context("failed to load credential registry")?;
    let principal = validator.validate(token)?;
    Ok(principal)
}
