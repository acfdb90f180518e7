use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::goals_errors::GoalError;
use super::goals_model::{
    FinancialGoal, GoalContribution, GoalProgress, GoalStatus, NewGoal,
};
use super::goals_traits::GoalRepositoryTrait;
use crate::accounts::AccountStoreTrait;
use crate::constants::GOAL_CONTRIBUTION_CATEGORY;
use crate::engine::{OperationOutcome, TransactionEngineTrait};
use crate::errors::{Error, Result};

/// Service for savings goals. Money movement is delegated to the wallet
/// engine; this service only mutates goal state, and only after the wallet
/// debit succeeded.
pub struct GoalService {
    repository: Arc<dyn GoalRepositoryTrait>,
    accounts: Arc<dyn AccountStoreTrait>,
    engine: Arc<dyn TransactionEngineTrait>,
}

impl GoalService {
    /// Creates a new GoalService instance
    pub fn new(
        repository: Arc<dyn GoalRepositoryTrait>,
        accounts: Arc<dyn AccountStoreTrait>,
        engine: Arc<dyn TransactionEngineTrait>,
    ) -> Self {
        Self {
            repository,
            accounts,
            engine,
        }
    }

    pub fn create_goal(&self, new_goal: NewGoal) -> Result<FinancialGoal> {
        self.repository.create(new_goal)
    }

    pub fn get_goal(&self, goal_id: &str) -> Result<FinancialGoal> {
        self.repository.get_by_id(goal_id)
    }

    pub fn list_goals(&self, user_id: &str) -> Result<Vec<FinancialGoal>> {
        self.repository.list_for_user(user_id)
    }

    /// Funds a goal out of the principal's wallet. The wallet expense runs
    /// first; a rejected expense (insufficient funds, budget) comes back as
    /// the unsuccessful outcome with the goal untouched.
    pub fn contribute(
        &self,
        principal: &str,
        goal_id: &str,
        amount: Decimal,
        source: &str,
    ) -> Result<OperationOutcome> {
        let goal = self.repository.get_by_id(goal_id)?;
        if goal.status == GoalStatus::Stopped {
            return Err(Error::Goal(GoalError::GoalStopped(goal.name)));
        }

        let wallet = self.accounts.get_wallet_for_user(principal)?;
        let outcome = self.engine.process_expense(
            principal,
            &wallet.account_ref(),
            amount,
            GOAL_CONTRIBUTION_CATEGORY,
            "Wallet",
            Some(&format!("Contribution to goal '{}'", goal.name)),
            None,
        )?;
        if !outcome.success {
            return Ok(outcome);
        }

        let (updated, _) = self.repository.apply_contribution(goal_id, amount, source)?;
        debug!(
            "Goal '{}' now at {} of {}",
            updated.name, updated.current_savings, updated.target_amount
        );

        Ok(outcome)
    }

    pub fn stop(&self, goal_id: &str) -> Result<FinancialGoal> {
        self.repository.set_status(goal_id, GoalStatus::Stopped)
    }

    pub fn reactivate(&self, goal_id: &str) -> Result<FinancialGoal> {
        self.repository.set_status(goal_id, GoalStatus::Active)
    }

    pub fn progress(&self, goal_id: &str) -> Result<GoalProgress> {
        let goal = self.repository.get_by_id(goal_id)?;
        Ok(GoalProgress::of(&goal))
    }

    pub fn contributions(&self, goal_id: &str) -> Result<Vec<GoalContribution>> {
        self.repository.contributions_for_goal(goal_id)
    }
}
