use crate::output::print_json;
use crate::sink::TracingSink;
use anyhow::bail;
use civica_core::error::CivicError;
use civica_core::report::Report;
use civica_core::types::Status;
use civica_core::{lifecycle, progress};
use std::path::Path;
use std::str::FromStr;

/// How many times a StaleState conflict is retried before surfacing it.
/// Only StaleState is retried; every other error kind goes straight out.
const STALE_RETRIES: u32 = 3;

pub fn run(
    root: &Path,
    id: &str,
    status: &str,
    note: Option<String>,
    evidence: Vec<String>,
    token: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let actor = super::principal(root, token)?;
    let target = Status::from_str(status)?;

    let mut attempt = 0;
    let report = loop {
        attempt += 1;
        match lifecycle::transition(
            root,
            id,
            target,
            &actor,
            note.clone(),
            evidence.clone(),
            &mut TracingSink,
        ) {
            Ok(report) => break report,
            Err(CivicError::StaleState { .. }) if attempt <= STALE_RETRIES => {
                tracing::warn!(report_id = id, attempt, "stale state, retrying");
            }
            Err(CivicError::StaleState { .. }) => {
                let current = Report::load(root, id)?;
                bail!(
                    "conflict: report {id} was changed concurrently; current status is '{}'",
                    current.status
                );
            }
            Err(e) => return Err(e.into()),
        }
    };

    if json {
        print_json(&report)?;
    } else {
        println!(
            "Report {} is now {} ({}%)",
            report.id,
            report.status,
            progress::percent(report.status)
        );
    }
    Ok(())
}
