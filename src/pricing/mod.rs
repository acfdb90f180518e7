pub(crate) mod pricing_errors;
pub(crate) mod pricing_model;
pub(crate) mod pricing_service;
pub(crate) mod pricing_traits;
pub(crate) mod providers;

pub use pricing_errors::PricingError;
pub use pricing_model::{PriceBasis, PriceQuote};
pub use pricing_service::PricingService;
pub use pricing_traits::PriceSourceTrait;
pub use providers::SimulatedPriceSource;
