use rust_decimal::Decimal;

use super::accounts_model::{Account, AccountRef};
use crate::errors::Result;

/// Contract the wallet engine holds on account state. Pure accessors: no
/// business rules live behind this trait.
pub trait AccountStoreTrait: Send + Sync {
    fn get(&self, account_ref: &AccountRef) -> Result<Account>;
    fn get_wallet_for_user(&self, user_id: &str) -> Result<Account>;
    fn get_balance(&self, account_ref: &AccountRef) -> Result<Decimal>;
    fn set_balance(&self, account_ref: &AccountRef, new_value: Decimal) -> Result<()>;
    fn update_investment_position(
        &self,
        account_id: &str,
        quantity: Decimal,
        price_per_share: Decimal,
        invested_amount: Decimal,
    ) -> Result<()>;
}
