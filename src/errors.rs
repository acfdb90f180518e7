use diesel::result::Error as DieselError;
use thiserror::Error;

use crate::accounts::AccountError;
use crate::budgets::BudgetError;
use crate::goals::GoalError;
use crate::ledger::LedgerError;
use crate::pricing::PricingError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the ledger core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Budget error: {0}")]
    Budget(#[from] BudgetError),

    #[error("Goal error: {0}")]
    Goal(#[from] GoalError),

    #[error("Price source error: {0}")]
    Pricing(#[from] PricingError),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(#[from] diesel::result::ConnectionError),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(#[from] r2d2::Error),

    #[error("Database query failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(rust_decimal::Decimal),

    #[error("Invalid month key '{0}', expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Stored value '{value}' in field '{field}' is not a valid decimal")]
    CorruptStoredValue { field: String, value: String },
}

impl From<DieselError> for Error {
    fn from(err: DieselError) -> Self {
        Error::Database(DatabaseError::QueryFailed(err))
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Database(DatabaseError::PoolCreationFailed(err))
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}
