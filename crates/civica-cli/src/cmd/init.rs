use anyhow::Context;
use civica_core::auth::{FileValidator, Principal};
use civica_core::config::Config;
use civica_core::role::Role;
use civica_core::{io, paths};
use std::collections::HashMap;
use std::path::Path;

/// Create the `.civica/` tree, a default config, and a demo credential
/// registry. Idempotent; existing files are left alone.
pub fn run(root: &Path, municipality: &str) -> anyhow::Result<()> {
    io::ensure_dir(&root.join(paths::REPORTS_DIR))?;

    if !paths::config_path(root).exists() {
        Config::new(municipality)
            .save(root)
            .context("failed to write config")?;
    }

    io::write_if_missing(&paths::workers_path(root), b"[]\n")?;

    if !paths::principals_path(root).exists() {
        let mut principals = HashMap::new();
        principals.insert(
            "tok-super".to_string(),
            Principal::new("admin-1", Role::SuperAdmin, "city-hall"),
        );
        FileValidator::save(root, &principals).context("failed to write credential registry")?;
    }

    println!("Initialized civica project for '{municipality}' in {}", root.display());
    println!("Demo credential: --token tok-super (super_admin)");
    Ok(())
}
