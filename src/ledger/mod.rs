pub(crate) mod ledger_errors;
pub(crate) mod ledger_model;
pub(crate) mod ledger_repository;
pub(crate) mod ledger_traits;

pub use ledger_errors::LedgerError;
pub use ledger_model::{
    IncomeEntry, NewIncomeEntry, NewTransaction, NewTransfer, TransactionFilter,
    TransactionRecord, TransactionType, TransferRecord,
};
pub use ledger_repository::LedgerRepository;
pub use ledger_traits::LedgerRepositoryTrait;

use crate::accounts::AccountRef;
use crate::errors::Result;
use rust_decimal::Decimal;

impl LedgerRepositoryTrait for LedgerRepository {
    fn append(&self, new_transaction: NewTransaction) -> Result<TransactionRecord> {
        Ok(LedgerRepository::append(self, new_transaction)?)
    }

    fn append_transfer(
        &self,
        sender_record: NewTransaction,
        receiver_record: NewTransaction,
        transfer: NewTransfer,
    ) -> Result<(TransactionRecord, TransactionRecord, TransferRecord)> {
        Ok(LedgerRepository::append_transfer(
            self,
            sender_record,
            receiver_record,
            transfer,
        )?)
    }

    fn append_reversal_pair(
        &self,
        first: NewTransaction,
        second: NewTransaction,
    ) -> Result<(TransactionRecord, TransactionRecord)> {
        Ok(LedgerRepository::append_reversal_pair(self, first, second)?)
    }

    fn search(
        &self,
        filter: &TransactionFilter,
        limit: Option<i64>,
    ) -> Result<Vec<TransactionRecord>> {
        Ok(LedgerRepository::search(self, filter, limit)?)
    }

    fn recent_for_account(
        &self,
        account: &AccountRef,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>> {
        Ok(LedgerRepository::recent_for_account(self, account, limit)?)
    }

    fn sum_expenses(&self, user_id: &str, category: &str, month: &str) -> Result<Decimal> {
        Ok(LedgerRepository::sum_expenses(self, user_id, category, month)?)
    }

    fn sum_account_expenses(
        &self,
        account: &AccountRef,
        category: &str,
        month: &str,
    ) -> Result<Decimal> {
        Ok(LedgerRepository::sum_account_expenses(
            self, account, category, month,
        )?)
    }

    fn record_income_entry(&self, entry: NewIncomeEntry) -> Result<IncomeEntry> {
        Ok(LedgerRepository::record_income_entry(self, entry)?)
    }

    fn income_entries_for_month(&self, user_id: &str, month: &str) -> Result<Vec<IncomeEntry>> {
        Ok(LedgerRepository::income_entries_for_month(
            self, user_id, month,
        )?)
    }

    fn monthly_totals(&self, user_id: &str, month: &str) -> Result<(Decimal, Decimal)> {
        Ok(LedgerRepository::monthly_totals(self, user_id, month)?)
    }

    fn expense_totals_by_category(
        &self,
        user_id: &str,
        month: &str,
    ) -> Result<Vec<(String, Decimal)>> {
        Ok(LedgerRepository::expense_totals_by_category(
            self, user_id, month,
        )?)
    }

    fn verify_balance_chain(&self, account: &AccountRef, current_balance: Decimal) -> Result<()> {
        Ok(LedgerRepository::verify_balance_chain(
            self,
            account,
            current_balance,
        )?)
    }
}
