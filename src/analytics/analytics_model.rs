use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Income vs. expense rollup for one month
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    /// net / income, zero when there was no income
    pub savings_rate: Decimal,
}

/// One category's share of a month's spending
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category: String,
    pub amount: Decimal,
    pub percent: Decimal,
}

/// One month in a spending trend, chronological within the series
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Three-tier budget usage rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetHealth {
    OnTrack,
    ApproachingLimit,
    OverBudget,
}

/// Limit vs. actual for one budget, with its health rating
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetUsage {
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub health: BudgetHealth,
}

/// 0-100 composite financial health score with its components
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub month: String,
    pub score: Decimal,
    pub savings_component: Decimal,
    pub budget_component: Decimal,
    pub net_component: Decimal,
}

/// One income source's total for a month
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSource {
    pub source: String,
    pub amount: Decimal,
}
