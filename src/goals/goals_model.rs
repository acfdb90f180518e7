use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::goals_errors::{GoalError, Result};
use crate::accounts::AccountKind;
use crate::utils::parse_stored_decimal;

/// A stored amount that does not parse is data corruption, surfaced rather
/// than coerced.
pub(crate) fn stored_decimal(value: &str, field: &str) -> Result<Decimal> {
    parse_stored_decimal(value, field).map_err(|e| GoalError::InvalidData(e.to_string()))
}

/// Goal lifecycle. Stopped is reversible; there is no terminal completed
/// state, a funded goal simply reports 100% or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    Active,
    Stopped,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "ACTIVE",
            GoalStatus::Stopped => "STOPPED",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "ACTIVE" => Ok(GoalStatus::Active),
            "STOPPED" => Ok(GoalStatus::Stopped),
            other => Err(GoalError::InvalidData(format!(
                "Unknown goal status '{}'",
                other
            ))),
        }
    }
}

/// A savings target funded by wallet contributions. `monthly_savings` is the
/// flat per-month amount derived at creation; `current_savings` is never
/// clamped at the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialGoal {
    pub id: String,
    pub user_id: String,
    pub account_kind: AccountKind,
    pub account_id: Option<String>,
    pub name: String,
    pub target_amount: Decimal,
    pub months_to_achieve: i32,
    pub monthly_savings: Decimal,
    pub current_savings: Decimal,
    pub status: GoalStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub account_kind: AccountKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub name: String,
    pub target_amount: Decimal,
    pub months_to_achieve: i32,
}

impl NewGoal {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(GoalError::InvalidData(
                "Goal owner cannot be empty".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(GoalError::InvalidData(
                "Goal name cannot be empty".to_string(),
            ));
        }
        if self.target_amount <= Decimal::ZERO {
            return Err(GoalError::InvalidData(format!(
                "Goal target must be positive, got {}",
                self.target_amount
            )));
        }
        if self.months_to_achieve <= 0 {
            return Err(GoalError::InvalidData(format!(
                "Months to achieve must be positive, got {}",
                self.months_to_achieve
            )));
        }
        Ok(())
    }

    pub fn monthly_savings(&self) -> Decimal {
        (self.target_amount / Decimal::from(self.months_to_achieve)).round_dp(2)
    }
}

/// Audit row for one contribution into a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalContribution {
    pub id: String,
    pub goal_id: String,
    pub amount: Decimal,
    pub source: String,
    pub created_at: NaiveDateTime,
}

/// Funding progress of one goal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal_id: String,
    pub name: String,
    pub target_amount: Decimal,
    pub current_savings: Decimal,
    pub percent_funded: Decimal,
    pub remaining: Decimal,
}

impl GoalProgress {
    pub fn of(goal: &FinancialGoal) -> Self {
        let percent_funded = if goal.target_amount > Decimal::ZERO {
            (goal.current_savings / goal.target_amount * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };
        GoalProgress {
            goal_id: goal.id.clone(),
            name: goal.name.clone(),
            target_amount: goal.target_amount,
            current_savings: goal.current_savings,
            percent_funded,
            remaining: (goal.target_amount - goal.current_savings).max(Decimal::ZERO),
        }
    }
}

/// Database model for goals
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
#[diesel(table_name = crate::schema::goals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GoalDB {
    pub id: String,
    pub user_id: String,
    pub account_kind: String,
    pub account_id: Option<String>,
    pub name: String,
    pub target_amount: String,
    pub months_to_achieve: i32,
    pub monthly_savings: String,
    pub current_savings: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<GoalDB> for FinancialGoal {
    type Error = GoalError;

    fn try_from(db: GoalDB) -> Result<FinancialGoal> {
        let account_kind = AccountKind::parse(&db.account_kind)
            .map_err(|e| GoalError::InvalidData(e.to_string()))?;
        Ok(FinancialGoal {
            id: db.id,
            user_id: db.user_id,
            account_kind,
            account_id: db.account_id,
            name: db.name,
            target_amount: stored_decimal(&db.target_amount, "target_amount")?,
            months_to_achieve: db.months_to_achieve,
            monthly_savings: stored_decimal(&db.monthly_savings, "monthly_savings")?,
            current_savings: stored_decimal(&db.current_savings, "current_savings")?,
            status: GoalStatus::parse(&db.status)?,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<NewGoal> for GoalDB {
    fn from(domain: NewGoal) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let monthly_savings = domain.monthly_savings();
        GoalDB {
            id: domain
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            user_id: domain.user_id,
            account_kind: domain.account_kind.as_str().to_string(),
            account_id: domain.account_id,
            name: domain.name,
            target_amount: domain.target_amount.to_string(),
            months_to_achieve: domain.months_to_achieve,
            monthly_savings: monthly_savings.to_string(),
            current_savings: Decimal::ZERO.to_string(),
            status: GoalStatus::Active.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Database model for goal contributions
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::goal_contributions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GoalContributionDB {
    pub id: String,
    pub goal_id: String,
    pub amount: String,
    pub source: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<GoalContributionDB> for GoalContribution {
    type Error = GoalError;

    fn try_from(db: GoalContributionDB) -> Result<GoalContribution> {
        Ok(GoalContribution {
            id: db.id,
            goal_id: db.goal_id,
            amount: stored_decimal(&db.amount, "amount")?,
            source: db.source,
            created_at: db.created_at,
        })
    }
}
