use std::time::Duration;

use thiserror::Error;

/// Boxed driver error carried by [`SqlForgeError::Execution`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for sqlforge operations
#[derive(Debug, Error)]
pub enum SqlForgeError {
    /// Missing or malformed input, detected before anything reaches the database.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    /// The driver rejected a statement, or no connection was open.
    #[error("Execution failed: {0}")]
    Execution(#[source] BoxError),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

impl SqlForgeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn execution(source: impl Into<BoxError>) -> Self {
        Self::Execution(source.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }
}

/// Result type alias for sqlforge operations
pub type Result<T> = std::result::Result<T, SqlForgeError>;
