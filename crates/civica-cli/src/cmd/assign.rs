use crate::output::print_json;
use crate::sink::TracingSink;
use civica_core::assignment::{self, AssignOutcome};
use civica_core::types::Priority;
use std::path::Path;
use std::str::FromStr;

#[allow(clippy::too_many_arguments)]
pub fn run(
    root: &Path,
    id: &str,
    worker: Option<&str>,
    priority_override: Option<&str>,
    hours: u32,
    notes: Option<String>,
    token: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let assigned_by = super::principal(root, token)?;
    let priority_override = priority_override.map(Priority::from_str).transpose()?;

    let outcome = assignment::assign(
        root,
        id,
        worker,
        &assigned_by,
        priority_override,
        hours,
        notes,
        &mut TracingSink,
    )?;

    match outcome {
        AssignOutcome::Assigned(report) => {
            if json {
                print_json(&report)?;
            } else {
                println!(
                    "Assigned {} to {}",
                    report.id,
                    report.assigned_to.as_deref().unwrap_or("?")
                );
            }
        }
        AssignOutcome::Proposed(candidate) => {
            if json {
                print_json(&candidate)?;
            } else {
                println!(
                    "Proposed worker: {} ({}, {} open assignments)",
                    candidate.employee_id, candidate.specialization, candidate.open_assignments
                );
                println!("Confirm with: civica assign {id} --worker {}", candidate.employee_id);
            }
        }
    }
    Ok(())
}
