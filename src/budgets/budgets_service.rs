use log::debug;
use std::sync::Arc;

use super::budgets_errors::BudgetError;
use super::budgets_model::{Budget, BudgetKey, BudgetStatus, NewBudget};
use super::budgets_traits::{BudgetRepositoryTrait, BudgetServiceTrait};
use crate::errors::Result;
use crate::ledger::LedgerRepositoryTrait;

/// Service for managing budgets. The `spent` side of a status is always
/// recomputed from the ledger so it cannot drift from the audit trail.
pub struct BudgetService {
    budget_repository: Arc<dyn BudgetRepositoryTrait>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
}

impl BudgetService {
    /// Creates a new BudgetService instance with injected dependencies
    pub fn new(
        budget_repository: Arc<dyn BudgetRepositoryTrait>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    ) -> Self {
        Self {
            budget_repository,
            ledger_repository,
        }
    }
}

impl BudgetServiceTrait for BudgetService {
    fn get_status(&self, key: &BudgetKey) -> Result<Option<BudgetStatus>> {
        let Some(budget) = self.budget_repository.find(key)? else {
            return Ok(None);
        };

        let spent =
            self.ledger_repository
                .sum_expenses(&key.user_id, &key.category, &key.month)?;

        Ok(Some(BudgetStatus {
            key: key.clone(),
            limit: budget.limit_amount,
            spent,
        }))
    }

    fn set_limit(&self, new_budget: NewBudget, overwrite: bool) -> Result<Budget> {
        if !overwrite && self.budget_repository.find(&new_budget.key)?.is_some() {
            return Err(BudgetError::AlreadyExists(new_budget.key.to_string()).into());
        }

        debug!(
            "Setting budget limit {} for {}",
            new_budget.limit_amount, new_budget.key
        );
        self.budget_repository.upsert(new_budget)
    }

    fn delete(&self, key: &BudgetKey) -> Result<()> {
        self.budget_repository.delete(key)?;
        Ok(())
    }

    fn list_for_month(&self, user_id: &str, month: &str) -> Result<Vec<Budget>> {
        self.budget_repository.list_for_month(user_id, month)
    }
}
