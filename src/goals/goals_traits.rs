use rust_decimal::Decimal;

use super::goals_model::{FinancialGoal, GoalContribution, GoalStatus, NewGoal};
use crate::errors::Result;

/// Contract the goal service holds on goal storage.
pub trait GoalRepositoryTrait: Send + Sync {
    fn create(&self, new_goal: NewGoal) -> Result<FinancialGoal>;
    fn get_by_id(&self, goal_id: &str) -> Result<FinancialGoal>;
    fn list_for_user(&self, user_id: &str) -> Result<Vec<FinancialGoal>>;
    fn set_status(&self, goal_id: &str, status: GoalStatus) -> Result<FinancialGoal>;
    fn apply_contribution(
        &self,
        goal_id: &str,
        amount: Decimal,
        source: &str,
    ) -> Result<(FinancialGoal, GoalContribution)>;
    fn contributions_for_goal(&self, goal_id: &str) -> Result<Vec<GoalContribution>>;
}
