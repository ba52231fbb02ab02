use crate::output::{print_json, print_table};
use anyhow::Context;
use civica_core::worker::{self, Worker};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum WorkerSubcommand {
    /// Register a field worker
    Add {
        employee_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        specialization: String,
    },
    /// List workers (active and inactive)
    List,
    /// Mark a worker active
    Activate { employee_id: String },
    /// Mark a worker inactive
    Deactivate { employee_id: String },
}

pub fn run(root: &Path, subcmd: WorkerSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        WorkerSubcommand::Add {
            employee_id,
            name,
            specialization,
        } => {
            let added = worker::add(root, Worker::new(employee_id, name, specialization))
                .context("failed to register worker")?;
            if json {
                print_json(&added)?;
            } else {
                println!("Registered worker: {} — {}", added.employee_id, added.name);
            }
            Ok(())
        }
        WorkerSubcommand::List => {
            let workers = worker::load_all(root)?;
            if json {
                print_json(&workers)?;
                return Ok(());
            }
            if workers.is_empty() {
                println!("No workers registered.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = workers
                .iter()
                .map(|w| {
                    vec![
                        w.employee_id.clone(),
                        w.name.clone(),
                        w.specialization.clone(),
                        if w.is_active { "active" } else { "inactive" }.to_string(),
                        w.open_assignments.to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "SPECIALIZATION", "STATUS", "OPEN"], rows);
            Ok(())
        }
        WorkerSubcommand::Activate { employee_id } => set_active(root, &employee_id, true, json),
        WorkerSubcommand::Deactivate { employee_id } => set_active(root, &employee_id, false, json),
    }
}

fn set_active(root: &Path, employee_id: &str, active: bool, json: bool) -> anyhow::Result<()> {
    let updated = worker::set_active(root, employee_id, active)?;
    if json {
        print_json(&updated)?;
    } else {
        println!(
            "Worker {} is now {}",
            updated.employee_id,
            if updated.is_active { "active" } else { "inactive" }
        );
    }
    Ok(())
}
