use rust_decimal::Decimal;

use super::pricing_errors::Result;

/// Contract a price provider implements. Providers return the current
/// per-share price or `PricingError::Unavailable`; fallback policy lives in
/// the service, not here.
pub trait PriceSourceTrait: Send + Sync {
    fn latest_price(&self, symbol: &str) -> Result<Decimal>;
}
