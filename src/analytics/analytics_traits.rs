use super::analytics_model::{
    BudgetUsage, CategorySpend, HealthScore, IncomeSource, MonthlySummary, TrendPoint,
};
use crate::errors::Result;

/// Read-side reporting API. Everything is computed from ledger rows at call
/// time; there are no cached aggregates to invalidate.
pub trait AnalyticsServiceTrait: Send + Sync {
    fn monthly_summary(&self, user_id: &str, month: &str) -> Result<MonthlySummary>;
    fn category_breakdown(&self, user_id: &str, month: &str) -> Result<Vec<CategorySpend>>;
    fn spending_trend(&self, user_id: &str, months_back: u32) -> Result<Vec<TrendPoint>>;
    fn budget_vs_actual(&self, user_id: &str, month: &str) -> Result<Vec<BudgetUsage>>;
    fn health_score(&self, user_id: &str, month: &str) -> Result<HealthScore>;
    fn income_sources(&self, user_id: &str, month: &str) -> Result<Vec<IncomeSource>>;
}
