use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use super::budgets_errors::{BudgetError, Result};
use super::budgets_model::{Budget, BudgetDB, BudgetKey, NewBudget};
use crate::db::get_connection;
use crate::schema::budgets;

/// Repository for budget rows
pub struct BudgetRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl BudgetRepository {
    /// Creates a new BudgetRepository instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Finds the budget for a composite key, if one exists
    pub fn find(&self, key: &BudgetKey) -> Result<Option<Budget>> {
        key.validate()?;
        let mut conn = get_connection(&self.pool)
            .map_err(|e| BudgetError::DatabaseError(e.to_string()))?;

        let row = budgets::table
            .filter(budgets::user_id.eq(&key.user_id))
            .filter(budgets::category.eq(&key.category))
            .filter(budgets::month.eq(&key.month))
            .first::<BudgetDB>(&mut conn)
            .optional()
            .map_err(BudgetError::from)?;

        row.map(Budget::try_from).transpose()
    }

    /// Inserts or replaces the budget row for the key
    pub fn upsert(&self, new_budget: NewBudget) -> Result<Budget> {
        new_budget.validate()?;
        let mut conn = get_connection(&self.pool)
            .map_err(|e| BudgetError::DatabaseError(e.to_string()))?;

        let db: BudgetDB = new_budget.into();

        diesel::insert_into(budgets::table)
            .values(&db)
            .on_conflict((budgets::user_id, budgets::category, budgets::month))
            .do_update()
            .set((
                budgets::limit_amount.eq(&db.limit_amount),
                budgets::updated_at.eq(db.updated_at),
            ))
            .execute(&mut conn)
            .map_err(BudgetError::from)?;

        // Re-read so an updated row keeps its original id and created_at.
        let stored = budgets::table
            .filter(budgets::user_id.eq(&db.user_id))
            .filter(budgets::category.eq(&db.category))
            .filter(budgets::month.eq(&db.month))
            .first::<BudgetDB>(&mut conn)
            .map_err(BudgetError::from)?;

        Budget::try_from(stored)
    }

    /// Deletes the limit row only; expense records stay untouched.
    pub fn delete(&self, key: &BudgetKey) -> Result<usize> {
        key.validate()?;
        let mut conn = get_connection(&self.pool)
            .map_err(|e| BudgetError::DatabaseError(e.to_string()))?;

        let affected = diesel::delete(
            budgets::table
                .filter(budgets::user_id.eq(&key.user_id))
                .filter(budgets::category.eq(&key.category))
                .filter(budgets::month.eq(&key.month)),
        )
        .execute(&mut conn)
        .map_err(BudgetError::from)?;

        if affected == 0 {
            return Err(BudgetError::NotFound(format!("No budget for {}", key)));
        }

        Ok(affected)
    }

    /// All budgets for a user and month, alphabetical by category
    pub fn list_for_month(&self, user_id: &str, month: &str) -> Result<Vec<Budget>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| BudgetError::DatabaseError(e.to_string()))?;

        let rows = budgets::table
            .filter(budgets::user_id.eq(user_id))
            .filter(budgets::month.eq(month))
            .order(budgets::category.asc())
            .load::<BudgetDB>(&mut conn)
            .map_err(BudgetError::from)?;

        rows.into_iter().map(Budget::try_from).collect()
    }
}
