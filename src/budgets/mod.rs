pub(crate) mod budgets_errors;
pub(crate) mod budgets_model;
pub(crate) mod budgets_repository;
pub(crate) mod budgets_service;
pub(crate) mod budgets_traits;

pub use budgets_errors::BudgetError;
pub use budgets_model::{Budget, BudgetKey, BudgetStatus, NewBudget};
pub use budgets_repository::BudgetRepository;
pub use budgets_service::BudgetService;
pub use budgets_traits::{BudgetRepositoryTrait, BudgetServiceTrait};

use crate::errors::Result;

impl BudgetRepositoryTrait for BudgetRepository {
    fn find(&self, key: &BudgetKey) -> Result<Option<Budget>> {
        Ok(BudgetRepository::find(self, key)?)
    }

    fn upsert(&self, new_budget: NewBudget) -> Result<Budget> {
        Ok(BudgetRepository::upsert(self, new_budget)?)
    }

    fn delete(&self, key: &BudgetKey) -> Result<usize> {
        Ok(BudgetRepository::delete(self, key)?)
    }

    fn list_for_month(&self, user_id: &str, month: &str) -> Result<Vec<Budget>> {
        Ok(BudgetRepository::list_for_month(self, user_id, month)?)
    }
}
