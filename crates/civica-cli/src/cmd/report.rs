use crate::output::{print_json, print_table};
use anyhow::Context;
use civica_core::auth::Scope;
use civica_core::progress;
use civica_core::report::{NewReport, Report};
use civica_core::types::Priority;
use clap::Subcommand;
use std::path::Path;
use std::str::FromStr;

#[derive(Subcommand)]
pub enum ReportSubcommand {
    /// Submit a new report (acts as the authenticated citizen)
    Submit {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Category slug, e.g. "roads" or "sanitation"
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        location: String,
        /// Department scope (defaults to the category)
        #[arg(long)]
        scope: Option<String>,
    },
    /// List all reports
    List,
    /// Show a report
    Show { id: String },
    /// Show the status timeline of a report
    Timeline { id: String },
}

pub fn run(
    root: &Path,
    subcmd: ReportSubcommand,
    token: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ReportSubcommand::Submit {
            title,
            description,
            category,
            priority,
            location,
            scope,
        } => submit(
            root, title, description, category, &priority, location, scope, token, json,
        ),
        ReportSubcommand::List => list(root, json),
        ReportSubcommand::Show { id } => show(root, &id, json),
        ReportSubcommand::Timeline { id } => timeline(root, &id, json),
    }
}

#[allow(clippy::too_many_arguments)]
fn submit(
    root: &Path,
    title: String,
    description: String,
    category: String,
    priority: &str,
    location: String,
    scope: Option<String>,
    token: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let reporter = super::principal(root, token)?;
    let priority = Priority::from_str(priority)?;
    let scope = scope.unwrap_or_else(|| category.clone());

    let report = Report::create(
        root,
        NewReport {
            title,
            description,
            category,
            priority,
            location,
            reporter: reporter.id,
            scope: Scope::new(scope),
        },
    )
    .context("failed to submit report")?;

    if json {
        print_json(&report)?;
    } else {
        println!("Submitted report: {}", report.id);
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let reports = Report::list(root).context("failed to list reports")?;

    if json {
        print_json(&reports)?;
        return Ok(());
    }

    if reports.is_empty() {
        println!("No reports yet.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = reports
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.status.to_string(),
                r.priority.to_string(),
                r.category.clone(),
                r.assigned_to.clone().unwrap_or_default(),
                r.title.clone(),
            ]
        })
        .collect();
    print_table(
        &["ID", "STATUS", "PRIORITY", "CATEGORY", "ASSIGNEE", "TITLE"],
        rows,
    );
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let report = Report::load(root, id)?;

    if json {
        print_json(&report)?;
        return Ok(());
    }

    println!("Report: {} — {}", report.id, report.title);
    println!("Status: {} ({}%)", report.status, progress::percent(report.status));
    println!("Priority: {}", report.priority);
    println!("Category: {} (scope: {})", report.category, report.scope);
    println!("Location: {}", report.location);
    println!("Reporter: {}", report.reporter);
    if let Some(worker) = &report.assigned_to {
        println!("Assigned to: {worker}");
    }
    Ok(())
}

fn timeline(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let report = Report::load(root, id)?;
    let events = progress::timeline(&report);

    if json {
        print_json(&events)?;
        return Ok(());
    }

    if events.is_empty() {
        println!("No transitions yet; report is {}.", report.status);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = events
        .iter()
        .map(|e| {
            vec![
                e.at.to_rfc3339(),
                format!("{} -> {}", e.from, e.to),
                e.actor.clone(),
                e.note.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["AT", "TRANSITION", "ACTOR", "NOTE"], rows);
    Ok(())
}
