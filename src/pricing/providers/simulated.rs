use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

use super::super::pricing_errors::{PricingError, Result};
use super::super::pricing_traits::PriceSourceTrait;

const MAX_DRIFT_PERCENT: f64 = 2.0;

/// In-process provider that random-walks seeded prices, standing in for a
/// market feed. Each call drifts the stored price by up to ±2% so repeated
/// valuations move the way a real feed would.
pub struct SimulatedPriceSource {
    prices: Mutex<HashMap<String, Decimal>>,
}

impl SimulatedPriceSource {
    pub fn new() -> Self {
        Self {
            prices: Mutex::new(HashMap::new()),
        }
    }

    /// Seeds a symbol with a starting price
    pub fn with_price(self, symbol: impl Into<String>, price: Decimal) -> Self {
        {
            let mut prices = self
                .prices
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            prices.insert(symbol.into(), price);
        }
        self
    }
}

impl Default for SimulatedPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceSourceTrait for SimulatedPriceSource {
    fn latest_price(&self, symbol: &str) -> Result<Decimal> {
        let mut prices = self
            .prices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = prices
            .get(symbol)
            .copied()
            .ok_or_else(|| PricingError::Unavailable(symbol.to_string()))?;

        let drift_percent =
            rand::thread_rng().gen_range(-MAX_DRIFT_PERCENT..=MAX_DRIFT_PERCENT);
        let factor = Decimal::from_f64(1.0 + drift_percent / 100.0)
            .unwrap_or(Decimal::ONE);
        let next = (current * factor).round_dp(2).max(Decimal::new(1, 2));
        prices.insert(symbol.to_string(), next);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unknown_symbol_is_unavailable() {
        let source = SimulatedPriceSource::new();
        assert!(matches!(
            source.latest_price("NOPE"),
            Err(PricingError::Unavailable(_))
        ));
    }

    #[test]
    fn test_price_walks_within_bounds() {
        let source = SimulatedPriceSource::new().with_price("ACME", dec!(100));
        let mut previous = dec!(100);
        for _ in 0..50 {
            let next = source.latest_price("ACME").unwrap();
            let lower = (previous * dec!(0.98)).round_dp(2);
            let upper = (previous * dec!(1.02)).round_dp(2);
            assert!(
                next >= lower - dec!(0.01) && next <= upper + dec!(0.01),
                "price {} drifted outside [{}, {}]",
                next,
                lower,
                upper
            );
            assert!(next > Decimal::ZERO);
            previous = next;
        }
    }
}
