pub mod db;

pub mod accounts;
pub mod analytics;
pub mod audit;
pub mod budgets;
pub mod engine;
pub mod goals;
pub mod investments;
pub mod ledger;
pub mod pricing;

pub mod constants;
pub mod errors;
pub mod schema;
pub mod utils;

pub use engine::*;
pub use errors::{Error, Result};
