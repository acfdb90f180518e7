use rust_decimal::Decimal;

use super::engine_model::{AdjustmentDirection, OperationOutcome};
use crate::accounts::AccountRef;
use crate::errors::Result;

/// Contract the goal and investment services hold on the wallet engine.
pub trait TransactionEngineTrait: Send + Sync {
    fn process_income(
        &self,
        principal: &str,
        account_ref: &AccountRef,
        amount: Decimal,
        category: &str,
        source: &str,
    ) -> Result<OperationOutcome>;

    #[allow(clippy::too_many_arguments)]
    fn process_expense(
        &self,
        principal: &str,
        account_ref: &AccountRef,
        amount: Decimal,
        category: &str,
        payment_mode: &str,
        description: Option<&str>,
        subtype: Option<&str>,
    ) -> Result<OperationOutcome>;

    fn process_transfer(
        &self,
        sender_user: &str,
        receiver_user: &str,
        amount: Decimal,
    ) -> Result<OperationOutcome>;

    fn undo_last(&self, principal: &str) -> Result<OperationOutcome>;

    fn admin_adjust(
        &self,
        actor: &str,
        account_ref: &AccountRef,
        direction: AdjustmentDirection,
        amount: Decimal,
        reason: &str,
    ) -> Result<OperationOutcome>;
}
