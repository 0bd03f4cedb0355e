use thiserror::Error;

#[derive(Error, Debug)]
pub enum BudgetError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Only CSV files are accepted, rejected batch because of: {}", .files.join(", "))]
    BatchRejected { files: Vec<String> },

    #[error("Select at least one file to import")]
    EmptyBatch,

    #[error("Missing required columns: {}", .missing.join(", "))]
    HeaderMappingFailed { missing: Vec<String> },

    #[error("Unknown owner: {0}")]
    UnknownOwner(String),

    #[error("No owner selected. Pass --owner or set default_owner in settings")]
    NoOwner,

    #[error("No keyword rule with ID {0}")]
    UnknownRule(i64),

    #[error("No transaction with ID {0}")]
    UnknownTransaction(i64),

    #[error("Invalid keyword rule: {0}")]
    InvalidRule(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BudgetError>;
