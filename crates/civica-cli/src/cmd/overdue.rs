use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::Utc;
use civica_core::config::Config;
use civica_core::lifecycle;
use civica_core::report::Report;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let now = Utc::now();

    let overdue: Vec<Report> = Report::list(root)?
        .into_iter()
        .filter(|r| lifecycle::is_overdue(r, now, &config.sla))
        .collect();

    if json {
        print_json(&overdue)?;
        return Ok(());
    }

    if overdue.is_empty() {
        println!("No overdue reports.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = overdue
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.status.to_string(),
                r.category.clone(),
                format!("{}h", config.sla.hours_for(&r.category)),
                r.created_at.to_rfc3339(),
            ]
        })
        .collect();
    print_table(&["ID", "STATUS", "CATEGORY", "SLA", "CREATED"], rows);
    Ok(())
}
