mod cmd;
mod output;
mod root;
mod sink;

use clap::{Parser, Subcommand};
use cmd::{report::ReportSubcommand, worker::WorkerSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "civica",
    about = "Municipal civic-issue reporting — reports, assignments, and the lifecycle state machine",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .civica/)
    #[arg(long, global = true, env = "CIVICA_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Credential token identifying the acting principal
    #[arg(long, global = true, env = "CIVICA_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a civica project in the current directory
    Init {
        /// Municipality name
        #[arg(long, default_value = "municipality")]
        municipality: String,
    },

    /// Submit and inspect reports
    Report {
        #[command(subcommand)]
        subcommand: ReportSubcommand,
    },

    /// Move a report along the lifecycle
    Transition {
        id: String,
        status: String,
        /// Note attached to the status event (required for rejections)
        #[arg(long)]
        note: Option<String>,
        /// Evidence reference (repeatable; required to resolve)
        #[arg(long = "evidence")]
        evidence: Vec<String>,
    },

    /// Assign a worker to a report (omit --worker for a ranked proposal)
    Assign {
        id: String,
        #[arg(long)]
        worker: Option<String>,
        #[arg(long)]
        priority_override: Option<String>,
        #[arg(long, default_value = "4")]
        hours: u32,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Manage the worker registry
    Worker {
        #[command(subcommand)]
        subcommand: WorkerSubcommand,
    },

    /// Show the capability set of a role
    Permissions { role: String },

    /// List reports stuck past their category SLA window
    Overdue,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let token = cli.token.as_deref();

    let result = match cli.command {
        Commands::Init { municipality } => cmd::init::run(&root, &municipality),
        Commands::Report { subcommand } => cmd::report::run(&root, subcommand, token, cli.json),
        Commands::Transition {
            id,
            status,
            note,
            evidence,
        } => cmd::transition::run(&root, &id, &status, note, evidence, token, cli.json),
        Commands::Assign {
            id,
            worker,
            priority_override,
            hours,
            notes,
        } => cmd::assign::run(
            &root,
            &id,
            worker.as_deref(),
            priority_override.as_deref(),
            hours,
            notes,
            token,
            cli.json,
        ),
        Commands::Worker { subcommand } => cmd::worker::run(&root, subcommand, cli.json),
        Commands::Permissions { role } => cmd::permissions::run(&role, cli.json),
        Commands::Overdue => cmd::overdue::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
