//! Library error type

use thiserror::Error;

/// Errors raised by the tracking core and its SQLite store
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before touching the store
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// The store has no such column (legacy schema)
    #[error("column `{column}` is missing from table `{table}`")]
    MissingColumn { table: String, column: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// True for store rejections caused by an absent column
    pub fn is_missing_column(&self) -> bool {
        matches!(self, Error::MissingColumn { .. })
    }
}
