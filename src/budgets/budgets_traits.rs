use super::budgets_model::{Budget, BudgetKey, BudgetStatus, NewBudget};
use crate::errors::Result;

/// Contract the wallet engine and budget service hold on budget rows.
pub trait BudgetRepositoryTrait: Send + Sync {
    fn find(&self, key: &BudgetKey) -> Result<Option<Budget>>;
    fn upsert(&self, new_budget: NewBudget) -> Result<Budget>;
    fn delete(&self, key: &BudgetKey) -> Result<usize>;
    fn list_for_month(&self, user_id: &str, month: &str) -> Result<Vec<Budget>>;
}

/// Public budget API surfaced to callers.
pub trait BudgetServiceTrait: Send + Sync {
    fn get_status(&self, key: &BudgetKey) -> Result<Option<BudgetStatus>>;
    fn set_limit(&self, new_budget: NewBudget, overwrite: bool) -> Result<Budget>;
    fn delete(&self, key: &BudgetKey) -> Result<()>;
    fn list_for_month(&self, user_id: &str, month: &str) -> Result<Vec<Budget>>;
}
