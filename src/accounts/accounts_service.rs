use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::accounts_model::{Account, AccountRef, NewAccount};
use super::accounts_repository::AccountRepository;
use super::accounts_traits::AccountStoreTrait;
use crate::errors::Result;

/// Service for managing accounts
pub struct AccountService {
    repository: AccountRepository,
}

impl AccountService {
    /// Creates a new AccountService instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self {
            repository: AccountRepository::new(pool),
        }
    }

    /// Creates a new account
    pub fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        debug!(
            "Creating {} account for user {}",
            new_account.details.kind(),
            new_account.user_id
        );
        Ok(self.repository.create(new_account)?)
    }

    /// Lists all active accounts owned by a user
    pub fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>> {
        Ok(self.repository.list_for_user(user_id)?)
    }

    /// Deactivates an account
    pub fn deactivate_account(&self, account_id: &str) -> Result<()> {
        Ok(self.repository.deactivate(account_id)?)
    }
}

impl AccountStoreTrait for AccountService {
    fn get(&self, account_ref: &AccountRef) -> Result<Account> {
        Ok(self.repository.get(account_ref)?)
    }

    fn get_wallet_for_user(&self, user_id: &str) -> Result<Account> {
        Ok(self.repository.get_wallet_for_user(user_id)?)
    }

    fn get_balance(&self, account_ref: &AccountRef) -> Result<Decimal> {
        Ok(self.repository.get_balance(account_ref)?)
    }

    fn set_balance(&self, account_ref: &AccountRef, new_value: Decimal) -> Result<()> {
        Ok(self.repository.set_balance(account_ref, new_value)?)
    }

    fn update_investment_position(
        &self,
        account_id: &str,
        quantity: Decimal,
        price_per_share: Decimal,
        invested_amount: Decimal,
    ) -> Result<()> {
        Ok(self.repository.update_investment_position(
            account_id,
            quantity,
            price_per_share,
            invested_amount,
        )?)
    }
}
