use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::OperationOutcome;
use crate::pricing::PriceQuote;

/// Holding state of one investment account after a position update. The
/// average cost is a single blended figure, not per-lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPosition {
    pub account_id: String,
    pub symbol: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub invested_amount: Decimal,
}

/// Result of a purchase: the wallet-side outcome, the price that was used,
/// and the updated position when the purchase went through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOutcome {
    pub outcome: OperationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<PriceQuote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<InvestmentPosition>,
}
