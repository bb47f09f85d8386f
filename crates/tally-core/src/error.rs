//! Error types for Tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Repository error in {operation}: {source}")]
    Repository {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap a backend failure with the name of the repository operation.
    ///
    /// Domain errors (validation, not found, cancellation) pass through untouched
    /// so callers can still tell client failures apart from storage failures.
    pub fn in_operation(operation: &'static str) -> impl FnOnce(Error) -> Error {
        move |err| match err {
            Error::Validation(_)
            | Error::NotFound(_)
            | Error::Cancelled
            | Error::Repository { .. } => err,
            other => Error::Repository {
                operation,
                source: Box::new(other),
            },
        }
    }

    /// True for failures caused by caller input rather than the backend
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
