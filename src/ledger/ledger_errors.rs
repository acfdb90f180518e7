use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// Fatal data-corruption signal: a stored balance_after chain does not
    /// reconcile. Surfaced, never auto-corrected.
    #[error("Balance chain mismatch: {0}")]
    ChainMismatch(String),
}

impl From<DieselError> for LedgerError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => LedgerError::NotFound("Record not found".to_string()),
            _ => LedgerError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;
