use thiserror::Error;

#[derive(Debug, Error)]
pub enum CivicError {
    #[error("not initialized: run 'civica init'")]
    NotInitialized,

    #[error("report not found: {0}")]
    ReportNotFound(String),

    #[error("worker not found: {0}")]
    WorkerNotFound(String),

    #[error("worker is inactive: {0}")]
    WorkerInactive(String),

    #[error("worker already registered: {0}")]
    DuplicateWorker(String),

    #[error("forbidden: role '{role}' lacks capability '{capability}'")]
    Forbidden { role: String, capability: String },

    #[error("scope mismatch: principal scope '{principal}' cannot act on '{target}'")]
    ScopeMismatch { principal: String, target: String },

    #[error("unknown role: {0}")]
    UnauthorizedRole(String),

    #[error("invalid credential")]
    InvalidCredential,

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("resolving a report requires at least one evidence reference")]
    MissingEvidence,

    #[error("report {0} is in a terminal status and cannot be assigned")]
    AlreadyTerminal(String),

    #[error("stale state for report {id}: expected version {expected}, found {found}")]
    StaleState {
        id: String,
        expected: u64,
        found: u64,
    },

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CivicError>;
