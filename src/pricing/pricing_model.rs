use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a resolved price came from. Callers surface this so a stale
/// fallback is never mistaken for a live quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceBasis {
    Live,
    Manual,
    LastKnown,
}

/// A resolved per-share price for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub symbol: String,
    pub price: Decimal,
    pub basis: PriceBasis,
    pub as_of: NaiveDateTime,
}

impl PriceQuote {
    pub fn new(symbol: impl Into<String>, price: Decimal, basis: PriceBasis) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            basis,
            as_of: chrono::Utc::now().naive_utc(),
        }
    }
}
