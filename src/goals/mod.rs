pub(crate) mod goals_errors;
pub(crate) mod goals_model;
pub(crate) mod goals_repository;
pub(crate) mod goals_service;
pub(crate) mod goals_traits;

pub use goals_errors::GoalError;
pub use goals_model::{
    FinancialGoal, GoalContribution, GoalProgress, GoalStatus, NewGoal,
};
pub use goals_repository::GoalRepository;
pub use goals_service::GoalService;
pub use goals_traits::GoalRepositoryTrait;

use crate::errors::Result;
use rust_decimal::Decimal;

impl GoalRepositoryTrait for GoalRepository {
    fn create(&self, new_goal: NewGoal) -> Result<FinancialGoal> {
        Ok(GoalRepository::create(self, new_goal)?)
    }

    fn get_by_id(&self, goal_id: &str) -> Result<FinancialGoal> {
        Ok(GoalRepository::get_by_id(self, goal_id)?)
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<FinancialGoal>> {
        Ok(GoalRepository::list_for_user(self, user_id)?)
    }

    fn set_status(&self, goal_id: &str, status: GoalStatus) -> Result<FinancialGoal> {
        Ok(GoalRepository::set_status(self, goal_id, status)?)
    }

    fn apply_contribution(
        &self,
        goal_id: &str,
        amount: Decimal,
        source: &str,
    ) -> Result<(FinancialGoal, GoalContribution)> {
        Ok(GoalRepository::apply_contribution(
            self, goal_id, amount, source,
        )?)
    }

    fn contributions_for_goal(&self, goal_id: &str) -> Result<Vec<GoalContribution>> {
        Ok(GoalRepository::contributions_for_goal(self, goal_id)?)
    }
}
