pub(crate) mod engine_errors;
pub(crate) mod engine_model;
pub(crate) mod engine_traits;
pub(crate) mod wallet_engine;

pub use engine_errors::EngineFailure;
pub use engine_model::{AdjustmentDirection, OperationOutcome};
pub use engine_traits::TransactionEngineTrait;
pub use wallet_engine::WalletEngine;
