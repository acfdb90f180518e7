use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for budget operations
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("A budget for {0} already exists; pass overwrite to replace it")]
    AlreadyExists(String),
}

impl From<DieselError> for BudgetError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => BudgetError::NotFound("Record not found".to_string()),
            _ => BudgetError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for budget operations
pub type Result<T> = std::result::Result<T, BudgetError>;
