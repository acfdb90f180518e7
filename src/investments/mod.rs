pub(crate) mod investments_model;
pub(crate) mod investments_service;

pub use investments_model::{InvestmentPosition, PurchaseOutcome};
pub use investments_service::InvestmentService;
