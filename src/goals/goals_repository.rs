use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use super::goals_errors::{GoalError, Result};
use super::goals_model::{
    stored_decimal, FinancialGoal, GoalContribution, GoalContributionDB, GoalDB, GoalStatus,
    NewGoal,
};
use crate::db::get_connection;
use crate::schema::{goal_contributions, goals};

/// Repository for goals and their contribution rows
pub struct GoalRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl GoalRepository {
    /// Creates a new GoalRepository instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    pub fn create(&self, new_goal: NewGoal) -> Result<FinancialGoal> {
        new_goal.validate()?;
        let mut conn =
            get_connection(&self.pool).map_err(|e| GoalError::DatabaseError(e.to_string()))?;

        let db: GoalDB = new_goal.into();
        diesel::insert_into(goals::table)
            .values(&db)
            .execute(&mut conn)
            .map_err(GoalError::from)?;

        FinancialGoal::try_from(db)
    }

    pub fn get_by_id(&self, goal_id: &str) -> Result<FinancialGoal> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| GoalError::DatabaseError(e.to_string()))?;

        let db = goals::table
            .find(goal_id)
            .first::<GoalDB>(&mut conn)
            .map_err(|e| match e {
                DieselError::NotFound => GoalError::NotFound(format!("No goal with id {}", goal_id)),
                other => GoalError::from(other),
            })?;

        FinancialGoal::try_from(db)
    }

    /// All goals for a user, newest first
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<FinancialGoal>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| GoalError::DatabaseError(e.to_string()))?;

        let rows = goals::table
            .filter(goals::user_id.eq(user_id))
            .order(goals::created_at.desc())
            .load::<GoalDB>(&mut conn)
            .map_err(GoalError::from)?;

        rows.into_iter().map(FinancialGoal::try_from).collect()
    }

    pub fn set_status(&self, goal_id: &str, status: GoalStatus) -> Result<FinancialGoal> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| GoalError::DatabaseError(e.to_string()))?;

        let affected = diesel::update(goals::table.find(goal_id))
            .set((
                goals::status.eq(status.as_str()),
                goals::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(GoalError::from)?;

        if affected == 0 {
            return Err(GoalError::NotFound(format!("No goal with id {}", goal_id)));
        }

        let db = goals::table
            .find(goal_id)
            .first::<GoalDB>(&mut conn)
            .map_err(GoalError::from)?;
        FinancialGoal::try_from(db)
    }

    /// Increments the goal's savings and writes the contribution row in one
    /// database transaction, so the pair can never land half-applied.
    pub fn apply_contribution(
        &self,
        goal_id: &str,
        amount: rust_decimal::Decimal,
        source: &str,
    ) -> Result<(FinancialGoal, GoalContribution)> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| GoalError::DatabaseError(e.to_string()))?;

        let (goal_db, contribution_db) = conn
            .transaction::<(GoalDB, GoalContributionDB), GoalError, _>(|conn| {
                let db = goals::table
                    .find(goal_id)
                    .first::<GoalDB>(conn)
                    .map_err(|e| match e {
                        DieselError::NotFound => {
                            GoalError::NotFound(format!("No goal with id {}", goal_id))
                        }
                        other => GoalError::from(other),
                    })?;

                let current = stored_decimal(&db.current_savings, "current_savings")?;
                let updated_savings = (current + amount).to_string();
                let now = chrono::Utc::now().naive_utc();

                diesel::update(goals::table.find(goal_id))
                    .set((
                        goals::current_savings.eq(&updated_savings),
                        goals::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(GoalError::from)?;

                let contribution = GoalContributionDB {
                    id: uuid::Uuid::new_v4().to_string(),
                    goal_id: goal_id.to_string(),
                    amount: amount.to_string(),
                    source: source.to_string(),
                    created_at: now,
                };
                diesel::insert_into(goal_contributions::table)
                    .values(&contribution)
                    .execute(conn)
                    .map_err(GoalError::from)?;

                let stored = goals::table
                    .find(goal_id)
                    .first::<GoalDB>(conn)
                    .map_err(GoalError::from)?;
                Ok((stored, contribution))
            })?;

        Ok((
            FinancialGoal::try_from(goal_db)?,
            GoalContribution::try_from(contribution_db)?,
        ))
    }

    /// Contribution rows for one goal, newest first
    pub fn contributions_for_goal(&self, goal_id: &str) -> Result<Vec<GoalContribution>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| GoalError::DatabaseError(e.to_string()))?;

        let rows = goal_contributions::table
            .filter(goal_contributions::goal_id.eq(goal_id))
            .order(goal_contributions::created_at.desc())
            .load::<GoalContributionDB>(&mut conn)
            .map_err(GoalError::from)?;

        rows.into_iter().map(GoalContribution::try_from).collect()
    }
}
