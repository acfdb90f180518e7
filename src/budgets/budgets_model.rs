use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::budgets_errors::{BudgetError, Result};
use crate::utils::{parse_stored_decimal, validate_month_key};

/// Composite budget identity. A proper struct key rather than a delimited
/// string, so category names containing separators stay unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetKey {
    pub user_id: String,
    pub category: String,
    pub month: String,
}

impl BudgetKey {
    pub fn new(
        user_id: impl Into<String>,
        category: impl Into<String>,
        month: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            category: category.into(),
            month: month.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(BudgetError::InvalidData(
                "Budget owner cannot be empty".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(BudgetError::InvalidData(
                "Budget category cannot be empty".to_string(),
            ));
        }
        validate_month_key(&self.month).map_err(|e| BudgetError::InvalidData(e.to_string()))
    }
}

impl std::fmt::Display for BudgetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "user {}, category '{}', month {}",
            self.user_id, self.category, self.month
        )
    }
}

/// A monthly per-category spending cap
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub month: String,
    pub limit_amount: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Budget {
    pub fn key(&self) -> BudgetKey {
        BudgetKey::new(
            self.user_id.clone(),
            self.category.clone(),
            self.month.clone(),
        )
    }
}

/// Input model for upserting a budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub key: BudgetKey,
    pub limit_amount: Decimal,
}

impl NewBudget {
    pub fn validate(&self) -> Result<()> {
        self.key.validate()?;
        if self.limit_amount <= Decimal::ZERO {
            return Err(BudgetError::InvalidData(format!(
                "Budget limit must be positive, got {}",
                self.limit_amount
            )));
        }
        Ok(())
    }
}

/// Limit vs. actual for one budget. `spent` is recomputed from the ledger at
/// query time, never read from a stored counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub key: BudgetKey,
    pub limit: Decimal,
    pub spent: Decimal,
}

impl BudgetStatus {
    pub fn remaining(&self) -> Decimal {
        self.limit - self.spent
    }
}

/// Database model for budgets
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::budgets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BudgetDB {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub month: String,
    pub limit_amount: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<BudgetDB> for Budget {
    type Error = BudgetError;

    fn try_from(db: BudgetDB) -> Result<Budget> {
        Ok(Budget {
            id: db.id,
            user_id: db.user_id,
            category: db.category,
            month: db.month,
            limit_amount: parse_stored_decimal(&db.limit_amount, "limit_amount")
                .map_err(|e| BudgetError::InvalidData(e.to_string()))?,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<NewBudget> for BudgetDB {
    fn from(domain: NewBudget) -> Self {
        let now = chrono::Utc::now().naive_utc();
        BudgetDB {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: domain.key.user_id,
            category: domain.key.category,
            month: domain.key.month,
            limit_amount: domain.limit_amount.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
