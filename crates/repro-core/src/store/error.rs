//! Store error handling

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the local store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Stored row could not be decoded
    #[error("Invalid row in '{table}': {details}")]
    InvalidRow { table: String, details: String },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_row_display() {
        let err = StoreError::InvalidRow {
            table: "items".to_string(),
            details: "not a uuid".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("items"));
        assert!(msg.contains("not a uuid"));
    }

    #[test]
    fn test_database_error_from() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
