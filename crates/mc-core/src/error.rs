use thiserror::Error;

#[derive(Debug, Error)]
pub enum McError {
    #[error("document not found: {0}")]
    DocNotFound(String),

    #[error("invalid document path: {0}")]
    InvalidDocPath(String),

    #[error("invalid frontmatter in {path}: {reason}")]
    InvalidFrontmatter { path: String, reason: String },

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("invalid task status: {0}")]
    InvalidStatus(String),

    #[error("invalid task priority: {0}")]
    InvalidPriority(String),

    #[error("invalid activity type: {0}")]
    InvalidActivityType(String),

    #[error("invalid activity status: {0}")]
    InvalidActivityStatus(String),

    #[error("date out of range: {0}")]
    InvalidDate(String),

    #[error("unknown billable service: {0}")]
    UnknownService(String),

    #[error("{0}")]
    Gateway(String),

    #[error("gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, McError>;
