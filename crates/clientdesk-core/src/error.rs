use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientdeskError {
    #[error("not initialized: run 'clientdesk init'")]
    NotInitialized,

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("invalid intake state: expected {expected}, engine is {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("question position {0} is out of range")]
    PositionOutOfRange(usize),

    #[error("question position {0} has not been reached yet")]
    PositionNotReached(usize),

    #[error("intake session not found: {0}")]
    SessionNotFound(String),

    #[error("invalid key '{0}': must be alphanumeric with hyphens")]
    InvalidKey(String),

    #[error("unknown tier: {0}")]
    UnknownTier(String),

    #[error("addon '{addon}' is not available for the {tier} tier")]
    UnknownAddon { addon: String, tier: String },

    #[error("invalid price input: {0}")]
    InvalidPrice(String),

    #[error("no tier selected")]
    NoTierSelected,

    #[error("submission not found: {0}")]
    SubmissionNotFound(i64),

    #[error("proposal not found: {0}")]
    ProposalNotFound(i64),

    #[error("notification not found: {0}")]
    NotificationNotFound(i64),

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl ClientdeskError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientdeskError>;
