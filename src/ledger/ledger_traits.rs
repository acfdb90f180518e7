use rust_decimal::Decimal;

use super::ledger_model::{
    IncomeEntry, NewIncomeEntry, NewTransaction, NewTransfer, TransactionFilter,
    TransactionRecord, TransferRecord,
};
use crate::accounts::AccountRef;
use crate::errors::Result;

/// Contract the wallet engine and read-side services hold on the ledger.
pub trait LedgerRepositoryTrait: Send + Sync {
    fn append(&self, new_transaction: NewTransaction) -> Result<TransactionRecord>;
    fn append_transfer(
        &self,
        sender_record: NewTransaction,
        receiver_record: NewTransaction,
        transfer: NewTransfer,
    ) -> Result<(TransactionRecord, TransactionRecord, TransferRecord)>;
    fn append_reversal_pair(
        &self,
        first: NewTransaction,
        second: NewTransaction,
    ) -> Result<(TransactionRecord, TransactionRecord)>;
    fn search(
        &self,
        filter: &TransactionFilter,
        limit: Option<i64>,
    ) -> Result<Vec<TransactionRecord>>;
    fn recent_for_account(
        &self,
        account: &AccountRef,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>>;
    fn sum_expenses(&self, user_id: &str, category: &str, month: &str) -> Result<Decimal>;
    fn sum_account_expenses(
        &self,
        account: &AccountRef,
        category: &str,
        month: &str,
    ) -> Result<Decimal>;
    fn record_income_entry(&self, entry: NewIncomeEntry) -> Result<IncomeEntry>;
    fn income_entries_for_month(&self, user_id: &str, month: &str) -> Result<Vec<IncomeEntry>>;
    fn monthly_totals(&self, user_id: &str, month: &str) -> Result<(Decimal, Decimal)>;
    fn expense_totals_by_category(
        &self,
        user_id: &str,
        month: &str,
    ) -> Result<Vec<(String, Decimal)>>;
    fn verify_balance_chain(&self, account: &AccountRef, current_balance: Decimal) -> Result<()>;
}
