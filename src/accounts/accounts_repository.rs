use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::accounts_errors::{AccountError, Result};
use super::accounts_model::{Account, AccountDB, AccountKind, AccountRef, NewAccount};
use crate::db::get_connection;
use crate::schema::accounts;

/// Repository for managing account rows in the database
pub struct AccountRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl AccountRepository {
    /// Creates a new AccountRepository instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Creates a new account in the database
    pub fn create(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;

        let mut account_db: AccountDB = new_account.into();
        if account_db.id.is_empty() {
            account_db.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        diesel::insert_into(accounts::table)
            .values(&account_db)
            .execute(&mut conn)
            .map_err(AccountError::from)?;

        Account::try_from(account_db)
    }

    /// Retrieves an account by its ID
    pub fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let account_db = accounts::table
            .find(account_id)
            .first::<AccountDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    AccountError::NotFound(format!("Account with id {} not found", account_id))
                }
                _ => AccountError::DatabaseError(e.to_string()),
            })?;

        Account::try_from(account_db)
    }

    /// Retrieves an account by reference, enforcing kind agreement
    pub fn get(&self, account_ref: &AccountRef) -> Result<Account> {
        let account = self.get_by_id(&account_ref.account_id)?;
        if account.kind != account_ref.kind {
            return Err(AccountError::KindMismatch {
                account_id: account_ref.account_id.clone(),
                expected: account_ref.kind.to_string(),
                actual: account.kind.to_string(),
            });
        }
        Ok(account)
    }

    /// Retrieves the active wallet account owned by a user
    pub fn get_wallet_for_user(&self, user_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let account_db = accounts::table
            .filter(accounts::user_id.eq(user_id))
            .filter(accounts::kind.eq(AccountKind::Wallet.as_str()))
            .filter(accounts::is_active.eq(true))
            .first::<AccountDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    AccountError::NotFound(format!("No wallet found for user {}", user_id))
                }
                _ => AccountError::DatabaseError(e.to_string()),
            })?;

        Account::try_from(account_db)
    }

    /// Lists all active accounts owned by a user
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let rows = accounts::table
            .filter(accounts::user_id.eq(user_id))
            .filter(accounts::is_active.eq(true))
            .order(accounts::name.asc())
            .load::<AccountDB>(&mut conn)
            .map_err(AccountError::from)?;

        rows.into_iter().map(Account::try_from).collect()
    }

    /// Reads the current balance for an account reference
    pub fn get_balance(&self, account_ref: &AccountRef) -> Result<Decimal> {
        Ok(self.get(account_ref)?.balance)
    }

    /// Writes a new balance for an account reference. Pure state write: no
    /// business validation happens here.
    pub fn set_balance(&self, account_ref: &AccountRef, new_value: Decimal) -> Result<()> {
        // Kind agreement is still enforced before the write.
        self.get(account_ref)?;

        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let affected = diesel::update(accounts::table.find(&account_ref.account_id))
            .set((
                accounts::balance.eq(new_value.to_string()),
                accounts::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(AccountError::from)?;

        if affected == 0 {
            return Err(AccountError::NotFound(format!(
                "Account with id {} not found",
                account_ref.account_id
            )));
        }

        Ok(())
    }

    /// Updates the position metadata on an investment account. The monetary
    /// value itself is only ever moved through the wallet engine.
    pub fn update_investment_position(
        &self,
        account_id: &str,
        quantity: Decimal,
        price_per_share: Decimal,
        invested_amount: Decimal,
    ) -> Result<()> {
        let account = self.get_by_id(account_id)?;
        if account.kind != AccountKind::Investment {
            return Err(AccountError::KindMismatch {
                account_id: account_id.to_string(),
                expected: AccountKind::Investment.to_string(),
                actual: account.kind.to_string(),
            });
        }

        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        diesel::update(accounts::table.find(account_id))
            .set((
                accounts::quantity.eq(Some(quantity.to_string())),
                accounts::price_per_share.eq(Some(price_per_share.to_string())),
                accounts::invested_amount.eq(Some(invested_amount.to_string())),
                accounts::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(AccountError::from)?;

        Ok(())
    }

    /// Deactivates an account. Rows are kept so the transaction trail stays
    /// resolvable.
    pub fn deactivate(&self, account_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let affected = diesel::update(accounts::table.find(account_id))
            .set((
                accounts::is_active.eq(false),
                accounts::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(AccountError::from)?;

        if affected == 0 {
            return Err(AccountError::NotFound(format!(
                "Account with id {} not found",
                account_id
            )));
        }

        Ok(())
    }
}
