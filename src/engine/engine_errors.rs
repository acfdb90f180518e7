use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Business-rule failures of the wallet engine. These are returned inside an
/// unsuccessful `OperationOutcome`, never as `Err`: the caller must re-decide,
/// nothing is retried and no state was changed.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum EngineFailure {
    #[error("Insufficient funds: requested {requested} but only {available} is available (short by {shortfall})", shortfall = .requested - .available)]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Budget exceeded for '{category}': {spent} already spent of {limit}, adding {requested} would overrun the limit")]
    BudgetExceeded {
        category: String,
        limit: Decimal,
        spent: Decimal,
        requested: Decimal,
    },

    #[error("Credit limit exceeded: {requested} requested but only {remaining} of the {limit} limit remains this month")]
    CreditLimitExceeded {
        limit: Decimal,
        remaining: Decimal,
        requested: Decimal,
    },

    #[error("Transfer must move funds between two different wallets")]
    SelfTransfer,

    #[error("Account {account_id} is a {actual} account, not {expected}")]
    InvalidAccountKind {
        account_id: String,
        expected: String,
        actual: String,
    },

    #[error("Undoing this income would drive the balance below zero")]
    NegativeBalanceWouldResult,

    #[error("Transfer cannot be undone: the receiver has already spent the funds")]
    ReceiverAlreadySpent,

    #[error("Nothing to undo")]
    NothingToUndo,
}
