use log::warn;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::pricing_errors::PricingError;
use super::pricing_model::{PriceBasis, PriceQuote};
use super::pricing_traits::PriceSourceTrait;
use crate::errors::{Error, Result};

/// Resolves prices for valuations. The fallback order is fixed: live quote,
/// then the caller's manual price, then the last known price. A fallback is
/// labelled as such in the returned quote; an unpriceable symbol is an error,
/// never a silent zero.
pub struct PricingService {
    source: Arc<dyn PriceSourceTrait>,
}

impl PricingService {
    /// Creates a new PricingService instance
    pub fn new(source: Arc<dyn PriceSourceTrait>) -> Self {
        Self { source }
    }

    pub fn resolve_price(
        &self,
        symbol: &str,
        manual_price: Option<Decimal>,
        last_known: Option<Decimal>,
    ) -> Result<PriceQuote> {
        let provider_error = match self.source.latest_price(symbol) {
            Ok(price) => return Ok(PriceQuote::new(symbol, price, PriceBasis::Live)),
            Err(e) => e,
        };

        if let Some(price) = manual_price.filter(|p| *p > Decimal::ZERO) {
            return Ok(PriceQuote::new(symbol, price, PriceBasis::Manual));
        }

        if let Some(price) = last_known.filter(|p| *p > Decimal::ZERO) {
            warn!(
                "Live price for {} unavailable ({}), falling back to last known {}",
                symbol, provider_error, price
            );
            return Ok(PriceQuote::new(symbol, price, PriceBasis::LastKnown));
        }

        Err(Error::Pricing(PricingError::Unavailable(
            symbol.to_string(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct FixedSource(Decimal);

    impl PriceSourceTrait for FixedSource {
        fn latest_price(&self, _symbol: &str) -> super::super::pricing_errors::Result<Decimal> {
            Ok(self.0)
        }
    }

    struct DeadSource;

    impl PriceSourceTrait for DeadSource {
        fn latest_price(&self, symbol: &str) -> super::super::pricing_errors::Result<Decimal> {
            Err(PricingError::Unavailable(symbol.to_string()))
        }
    }

    #[test]
    fn test_live_price_preferred_over_manual() {
        let service = PricingService::new(Arc::new(FixedSource(dec!(42.50))));
        let quote = service
            .resolve_price("ACME", Some(dec!(40)), Some(dec!(38)))
            .unwrap();
        assert_eq!(quote.price, dec!(42.50));
        assert_eq!(quote.basis, PriceBasis::Live);
    }

    #[test]
    fn test_manual_price_preferred_over_last_known() {
        let service = PricingService::new(Arc::new(DeadSource));
        let quote = service
            .resolve_price("ACME", Some(dec!(40)), Some(dec!(38)))
            .unwrap();
        assert_eq!(quote.price, dec!(40));
        assert_eq!(quote.basis, PriceBasis::Manual);
    }

    #[test]
    fn test_falls_back_to_last_known() {
        let service = PricingService::new(Arc::new(DeadSource));
        let quote = service.resolve_price("ACME", None, Some(dec!(38))).unwrap();
        assert_eq!(quote.price, dec!(38));
        assert_eq!(quote.basis, PriceBasis::LastKnown);
    }

    #[test]
    fn test_no_price_at_all_is_an_error() {
        let service = PricingService::new(Arc::new(DeadSource));
        let result = service.resolve_price("ACME", None, Some(Decimal::ZERO));
        assert!(matches!(
            result,
            Err(Error::Pricing(PricingError::Unavailable(_)))
        ));
    }
}
