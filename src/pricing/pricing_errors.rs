use thiserror::Error;

/// Custom error type for price source operations
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("No price available for symbol '{0}'")]
    Unavailable(String),
    #[error("Price source error: {0}")]
    ProviderError(String),
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

/// Result type for pricing operations
pub type Result<T> = std::result::Result<T, PricingError>;
