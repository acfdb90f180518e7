pub(crate) mod simulated;

pub use simulated::SimulatedPriceSource;
