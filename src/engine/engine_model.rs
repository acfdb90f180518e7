use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::engine_errors::EngineFailure;
use crate::accounts::AccountRef;

/// Result triple of every engine operation: success flag, the resulting
/// account value, and a structured summary message. Business-rule failures
/// additionally carry their typed kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub success: bool,
    pub resulting_balance: Decimal,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<EngineFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl OperationOutcome {
    pub fn succeeded(
        resulting_balance: Decimal,
        message: impl Into<String>,
        record_id: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            resulting_balance,
            message: message.into(),
            failure: None,
            record_id: Some(record_id.into()),
        }
    }

    pub fn failed(resulting_balance: Decimal, failure: EngineFailure) -> Self {
        Self {
            success: false,
            resulting_balance,
            message: failure.to_string(),
            failure: Some(failure),
            record_id: None,
        }
    }
}

/// Direction of an admin balance override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentDirection {
    Credit,
    Debit,
}

/// One undoable engine mutation. The history is a bounded in-memory view;
/// the ledger stays the only source of truth.
#[derive(Debug, Clone)]
pub enum UndoEntry {
    Income {
        user_id: String,
        account: AccountRef,
        amount: Decimal,
        source: String,
        record_id: String,
    },
    Expense {
        user_id: String,
        account: AccountRef,
        amount: Decimal,
        record_id: String,
    },
    Transfer {
        sender_user_id: String,
        receiver_user_id: String,
        sender_wallet: AccountRef,
        receiver_wallet: AccountRef,
        amount: Decimal,
        sender_record_id: String,
        receiver_record_id: String,
    },
}
