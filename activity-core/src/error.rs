//! Error types for activity-board.

use thiserror::Error;

use crate::draft::DraftError;

/// Errors that can occur in board operations.
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote call itself failed (spawn, I/O, HTTP, protocol).
    #[error("CRM request failed: {0}")]
    Transport(String),

    /// The call went through but the record-level status was not SUCCESS.
    #[error("CRM rejected the {action}: {code} {message}")]
    Rejected {
        action: String,
        code: String,
        message: String,
    },

    #[error("{0}")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Invalid draft: {0}")]
    Draft(#[from] DraftError),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("CRM is not ready yet")]
    NotReady,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BoardError {
    fn from(err: serde_json::Error) -> Self {
        BoardError::Serialization(err.to_string())
    }
}

/// Result type alias for board operations.
pub type BoardResult<T> = Result<T, BoardError>;
