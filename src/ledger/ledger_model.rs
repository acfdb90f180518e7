use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ledger_errors::{LedgerError, Result};
use crate::accounts::{AccountKind, AccountRef};
use crate::utils::parse_stored_decimal;

/// A stored amount that does not parse is data corruption, surfaced as an
/// invalid record rather than coerced.
pub(crate) fn stored_decimal(value: &str, field: &str) -> Result<Decimal> {
    parse_stored_decimal(value, field).map_err(|e| LedgerError::InvalidRecord(e.to_string()))
}

/// Transaction record types. Admin variants cover operator overrides and the
/// compensating records written by undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
    AdminCredit,
    AdminDebit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::AdminCredit => "ADMIN_CREDIT",
            TransactionType::AdminDebit => "ADMIN_DEBIT",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            "TRANSFER" => Ok(TransactionType::Transfer),
            "ADMIN_CREDIT" => Ok(TransactionType::AdminCredit),
            "ADMIN_DEBIT" => Ok(TransactionType::AdminDebit),
            other => Err(LedgerError::InvalidRecord(format!(
                "Unknown transaction type '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable transaction record. `balance_after` equals the account's value
/// immediately after this record was applied, forming a verifiable forward
/// chain per account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub user_id: String,
    pub account_kind: AccountKind,
    pub account_id: String,
    pub txn_type: TransactionType,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub category: String,
    pub subtype: Option<String>,
    pub payment_mode: Option<String>,
    pub description: Option<String>,
    pub sender_id: Option<String>,
    pub receiver_id: Option<String>,
    pub created_at: NaiveDateTime,
}

impl TransactionRecord {
    pub fn account_ref(&self) -> AccountRef {
        AccountRef::new(self.account_kind, self.account_id.clone())
    }
}

/// Input model for appending a transaction record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub user_id: String,
    pub account_kind: AccountKind,
    pub account_id: String,
    pub txn_type: TransactionType,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub category: String,
    pub subtype: Option<String>,
    pub payment_mode: Option<String>,
    pub description: Option<String>,
    pub sender_id: Option<String>,
    pub receiver_id: Option<String>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidRecord(format!(
                "Transaction amount must be positive, got {}",
                self.amount
            )));
        }
        if self.user_id.trim().is_empty() {
            return Err(LedgerError::InvalidRecord(
                "Transaction user cannot be empty".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(LedgerError::InvalidRecord(
                "Transaction category cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Entry in the parallel wallet income ledger consumed by analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeEntry {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub amount: Decimal,
    pub category: String,
    pub source: String,
    pub created_at: NaiveDateTime,
}

/// Input model for the wallet income ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncomeEntry {
    pub user_id: String,
    pub account_id: String,
    pub amount: Decimal,
    pub category: String,
    pub source: String,
}

/// Wallet-to-wallet transfer row linking the two TRANSFER records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: String,
    pub sender_user_id: String,
    pub receiver_user_id: String,
    pub sender_wallet_id: String,
    pub receiver_wallet_id: String,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
}

/// Input model for a transfer row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransfer {
    pub sender_user_id: String,
    pub receiver_user_id: String,
    pub sender_wallet_id: String,
    pub receiver_wallet_id: String,
    pub amount: Decimal,
}

/// Query filter for ledger reads; results are ordered date desc.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub user_id: Option<String>,
    pub account: Option<AccountRef>,
    pub txn_type: Option<TransactionType>,
    pub category: Option<String>,
    pub month: Option<String>,
}

/// Database model for transaction records
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub user_id: String,
    pub account_kind: String,
    pub account_id: String,
    pub txn_type: String,
    pub amount: String,
    pub balance_after: String,
    pub category: String,
    pub subtype: Option<String>,
    pub payment_mode: Option<String>,
    pub description: Option<String>,
    pub sender_id: Option<String>,
    pub receiver_id: Option<String>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<TransactionDB> for TransactionRecord {
    type Error = LedgerError;

    fn try_from(db: TransactionDB) -> Result<TransactionRecord> {
        let account_kind = AccountKind::parse(&db.account_kind)
            .map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;
        let txn_type = TransactionType::parse(&db.txn_type)?;
        Ok(TransactionRecord {
            id: db.id,
            user_id: db.user_id,
            account_kind,
            account_id: db.account_id,
            txn_type,
            amount: stored_decimal(&db.amount, "amount")?,
            balance_after: stored_decimal(&db.balance_after, "balance_after")?,
            category: db.category,
            subtype: db.subtype,
            payment_mode: db.payment_mode,
            description: db.description,
            sender_id: db.sender_id,
            receiver_id: db.receiver_id,
            created_at: db.created_at,
        })
    }
}

impl From<NewTransaction> for TransactionDB {
    fn from(domain: NewTransaction) -> Self {
        TransactionDB {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: domain.user_id,
            account_kind: domain.account_kind.as_str().to_string(),
            account_id: domain.account_id,
            txn_type: domain.txn_type.as_str().to_string(),
            amount: domain.amount.to_string(),
            balance_after: domain.balance_after.to_string(),
            category: domain.category,
            subtype: domain.subtype,
            payment_mode: domain.payment_mode,
            description: domain.description,
            sender_id: domain.sender_id,
            receiver_id: domain.receiver_id,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Database model for the wallet income ledger
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::income_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IncomeEntryDB {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub amount: String,
    pub category: String,
    pub source: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<IncomeEntryDB> for IncomeEntry {
    type Error = LedgerError;

    fn try_from(db: IncomeEntryDB) -> Result<IncomeEntry> {
        Ok(IncomeEntry {
            id: db.id,
            user_id: db.user_id,
            account_id: db.account_id,
            amount: stored_decimal(&db.amount, "amount")?,
            category: db.category,
            source: db.source,
            created_at: db.created_at,
        })
    }
}

impl From<NewIncomeEntry> for IncomeEntryDB {
    fn from(domain: NewIncomeEntry) -> Self {
        IncomeEntryDB {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: domain.user_id,
            account_id: domain.account_id,
            amount: domain.amount.to_string(),
            category: domain.category,
            source: domain.source,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Database model for transfer rows
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::transfers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransferDB {
    pub id: String,
    pub sender_user_id: String,
    pub receiver_user_id: String,
    pub sender_wallet_id: String,
    pub receiver_wallet_id: String,
    pub amount: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<TransferDB> for TransferRecord {
    type Error = LedgerError;

    fn try_from(db: TransferDB) -> Result<TransferRecord> {
        Ok(TransferRecord {
            id: db.id,
            sender_user_id: db.sender_user_id,
            receiver_user_id: db.receiver_user_id,
            sender_wallet_id: db.sender_wallet_id,
            receiver_wallet_id: db.receiver_wallet_id,
            amount: stored_decimal(&db.amount, "amount")?,
            created_at: db.created_at,
        })
    }
}

impl From<NewTransfer> for TransferDB {
    fn from(domain: NewTransfer) -> Self {
        TransferDB {
            id: uuid::Uuid::new_v4().to_string(),
            sender_user_id: domain.sender_user_id,
            receiver_user_id: domain.receiver_user_id,
            sender_wallet_id: domain.sender_wallet_id,
            receiver_wallet_id: domain.receiver_wallet_id,
            amount: domain.amount.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
