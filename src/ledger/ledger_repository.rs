use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::ledger_errors::{LedgerError, Result};
use super::ledger_model::*;
use crate::accounts::{AccountKind, AccountRef};
use crate::constants::REVERSAL_CATEGORY;
use crate::db::get_connection;
use crate::schema::{income_entries, transactions, transfers};
use crate::utils::month_bounds;

/// Append-only repository for the transaction trail. Records are never
/// updated or deleted; corrections arrive as new compensating records.
pub struct LedgerRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<crate::db::DbConnection> {
        get_connection(&self.pool).map_err(|e| LedgerError::DatabaseError(e.to_string()))
    }

    fn insert_transaction(
        conn: &mut SqliteConnection,
        new_transaction: NewTransaction,
    ) -> Result<TransactionRecord> {
        new_transaction.validate()?;
        let db: TransactionDB = new_transaction.into();
        diesel::insert_into(transactions::table)
            .values(&db)
            .execute(conn)
            .map_err(LedgerError::from)?;
        TransactionRecord::try_from(db)
    }

    /// Appends a single transaction record and returns it with its id
    pub fn append(&self, new_transaction: NewTransaction) -> Result<TransactionRecord> {
        let mut conn = self.conn()?;
        Self::insert_transaction(&mut conn, new_transaction)
    }

    /// Appends both legs of a transfer plus the transfer row in one database
    /// transaction, so the ledger never holds half a transfer.
    pub fn append_transfer(
        &self,
        sender_record: NewTransaction,
        receiver_record: NewTransaction,
        transfer: NewTransfer,
    ) -> Result<(TransactionRecord, TransactionRecord, TransferRecord)> {
        let mut conn = self.conn()?;

        conn.transaction::<_, LedgerError, _>(|tx_conn| {
            let sender = Self::insert_transaction(tx_conn, sender_record)?;
            let receiver = Self::insert_transaction(tx_conn, receiver_record)?;

            let transfer_db: TransferDB = transfer.into();
            diesel::insert_into(transfers::table)
                .values(&transfer_db)
                .execute(tx_conn)
                .map_err(LedgerError::from)?;

            Ok((sender, receiver, TransferRecord::try_from(transfer_db)?))
        })
    }

    /// Appends the two compensating records of a transfer reversal in one
    /// database transaction; a reversal must never land half-written.
    pub fn append_reversal_pair(
        &self,
        first: NewTransaction,
        second: NewTransaction,
    ) -> Result<(TransactionRecord, TransactionRecord)> {
        let mut conn = self.conn()?;

        conn.transaction::<_, LedgerError, _>(|tx_conn| {
            let a = Self::insert_transaction(tx_conn, first)?;
            let b = Self::insert_transaction(tx_conn, second)?;
            Ok((a, b))
        })
    }

    /// Queries the ledger with optional filters, most recent first
    pub fn search(
        &self,
        filter: &TransactionFilter,
        limit: Option<i64>,
    ) -> Result<Vec<TransactionRecord>> {
        let mut conn = self.conn()?;

        let mut query = transactions::table.into_boxed();

        if let Some(ref user) = filter.user_id {
            query = query.filter(transactions::user_id.eq(user.clone()));
        }
        if let Some(ref account) = filter.account {
            query = query
                .filter(transactions::account_kind.eq(account.kind.as_str()))
                .filter(transactions::account_id.eq(account.account_id.clone()));
        }
        if let Some(txn_type) = filter.txn_type {
            query = query.filter(transactions::txn_type.eq(txn_type.as_str()));
        }
        if let Some(ref category) = filter.category {
            query = query.filter(transactions::category.eq(category.clone()));
        }
        if let Some(ref month) = filter.month {
            let (start, end) =
                month_bounds(month).map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;
            query = query
                .filter(transactions::created_at.ge(start))
                .filter(transactions::created_at.lt(end));
        }

        query = query.order(transactions::created_at.desc());
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let rows = query
            .load::<TransactionDB>(&mut conn)
            .map_err(LedgerError::from)?;

        rows.into_iter().map(TransactionRecord::try_from).collect()
    }

    /// Most recent records for one account
    pub fn recent_for_account(
        &self,
        account: &AccountRef,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>> {
        self.search(
            &TransactionFilter {
                account: Some(account.clone()),
                ..Default::default()
            },
            Some(limit),
        )
    }

    /// Sums wallet-kind EXPENSE records for (user, category, month). This is
    /// the authoritative `spent` figure for budget enforcement; budgets only
    /// constrain wallet expenses. Summation happens in Rust over Decimal —
    /// SQLite's SUM would round through floats.
    pub fn sum_expenses(&self, user_id: &str, category: &str, month: &str) -> Result<Decimal> {
        let mut conn = self.conn()?;
        let (start, end) =
            month_bounds(month).map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;

        let amounts: Vec<String> = transactions::table
            .filter(transactions::user_id.eq(user_id))
            .filter(transactions::account_kind.eq(AccountKind::Wallet.as_str()))
            .filter(transactions::txn_type.eq(TransactionType::Expense.as_str()))
            .filter(transactions::category.eq(category))
            .filter(transactions::created_at.ge(start))
            .filter(transactions::created_at.lt(end))
            .select(transactions::amount)
            .load::<String>(&mut conn)
            .map_err(LedgerError::from)?;

        sum_amounts(&amounts)
    }

    /// Sums EXPENSE records on one account for a category and month
    /// (credit-card usage tracking).
    pub fn sum_account_expenses(
        &self,
        account: &AccountRef,
        category: &str,
        month: &str,
    ) -> Result<Decimal> {
        let mut conn = self.conn()?;
        let (start, end) =
            month_bounds(month).map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;

        let amounts: Vec<String> = transactions::table
            .filter(transactions::account_kind.eq(account.kind.as_str()))
            .filter(transactions::account_id.eq(&account.account_id))
            .filter(transactions::txn_type.eq(TransactionType::Expense.as_str()))
            .filter(transactions::category.eq(category))
            .filter(transactions::created_at.ge(start))
            .filter(transactions::created_at.lt(end))
            .select(transactions::amount)
            .load::<String>(&mut conn)
            .map_err(LedgerError::from)?;

        sum_amounts(&amounts)
    }

    /// Writes an entry to the parallel wallet income ledger
    pub fn record_income_entry(&self, entry: NewIncomeEntry) -> Result<IncomeEntry> {
        let mut conn = self.conn()?;
        let db: IncomeEntryDB = entry.into();
        diesel::insert_into(income_entries::table)
            .values(&db)
            .execute(&mut conn)
            .map_err(LedgerError::from)?;
        IncomeEntry::try_from(db)
    }

    /// Wallet income entries for a month, most recent first
    pub fn income_entries_for_month(&self, user_id: &str, month: &str) -> Result<Vec<IncomeEntry>> {
        let mut conn = self.conn()?;
        let (start, end) =
            month_bounds(month).map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;

        let rows = income_entries::table
            .filter(income_entries::user_id.eq(user_id))
            .filter(income_entries::created_at.ge(start))
            .filter(income_entries::created_at.lt(end))
            .order(income_entries::created_at.desc())
            .load::<IncomeEntryDB>(&mut conn)
            .map_err(LedgerError::from)?;

        rows.into_iter().map(IncomeEntry::try_from).collect()
    }

    /// Total INCOME and EXPENSE amounts for a user and month. Undo writes
    /// compensating admin records tagged with the reversed type; those net
    /// the original back out so undone income and expenses do not count.
    /// Plain admin adjustments stay excluded.
    pub fn monthly_totals(&self, user_id: &str, month: &str) -> Result<(Decimal, Decimal)> {
        let mut conn = self.conn()?;
        let (start, end) =
            month_bounds(month).map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;

        let rows: Vec<(String, String, Option<String>, String)> = transactions::table
            .filter(transactions::user_id.eq(user_id))
            .filter(transactions::created_at.ge(start))
            .filter(transactions::created_at.lt(end))
            .select((
                transactions::txn_type,
                transactions::category,
                transactions::subtype,
                transactions::amount,
            ))
            .load::<(String, String, Option<String>, String)>(&mut conn)
            .map_err(LedgerError::from)?;

        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;
        for (txn_type, category, subtype, amount) in &rows {
            let amount = stored_decimal(amount, "amount")?;
            let reversal_of = |t: TransactionType| {
                category.as_str() == REVERSAL_CATEGORY && subtype.as_deref() == Some(t.as_str())
            };
            match txn_type.as_str() {
                "INCOME" => income += amount,
                "EXPENSE" => expense += amount,
                "ADMIN_DEBIT" if reversal_of(TransactionType::Income) => income -= amount,
                "ADMIN_CREDIT" if reversal_of(TransactionType::Expense) => expense -= amount,
                _ => {}
            }
        }
        Ok((income, expense))
    }

    /// Per-category EXPENSE totals for a user and month, largest first
    pub fn expense_totals_by_category(
        &self,
        user_id: &str,
        month: &str,
    ) -> Result<Vec<(String, Decimal)>> {
        let mut conn = self.conn()?;
        let (start, end) =
            month_bounds(month).map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;

        let rows: Vec<(String, String)> = transactions::table
            .filter(transactions::user_id.eq(user_id))
            .filter(transactions::txn_type.eq(TransactionType::Expense.as_str()))
            .filter(transactions::created_at.ge(start))
            .filter(transactions::created_at.lt(end))
            .select((transactions::category, transactions::amount))
            .load::<(String, String)>(&mut conn)
            .map_err(LedgerError::from)?;

        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for (category, amount) in rows {
            *totals.entry(category).or_insert(Decimal::ZERO) +=
                stored_decimal(&amount, "amount")?;
        }

        let mut out: Vec<(String, Decimal)> = totals.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(out)
    }

    /// Walks the full record chain for an account oldest-first and checks
    /// that every `balance_after` follows from the previous one, ending at
    /// the currently stored balance. A mismatch is fatal data corruption.
    pub fn verify_balance_chain(
        &self,
        account: &AccountRef,
        current_balance: Decimal,
    ) -> Result<()> {
        let mut records = self.search(
            &TransactionFilter {
                account: Some(account.clone()),
                ..Default::default()
            },
            None,
        )?;
        records.reverse(); // oldest first

        let mut prev_after: Option<Decimal> = None;
        for record in &records {
            if let Some(prev) = prev_after {
                let expected = prev + signed_amount(record, account);
                if record.balance_after != expected {
                    return Err(LedgerError::ChainMismatch(format!(
                        "record {} on account {} has balance_after {} but {} was expected",
                        record.id, account.account_id, record.balance_after, expected
                    )));
                }
            }
            prev_after = Some(record.balance_after);
        }

        if let Some(last) = prev_after {
            if last != current_balance {
                return Err(LedgerError::ChainMismatch(format!(
                    "account {} balance {} does not match last recorded balance_after {}",
                    account.account_id, current_balance, last
                )));
            }
        }

        Ok(())
    }
}

fn sum_amounts(amounts: &[String]) -> Result<Decimal> {
    let mut total = Decimal::ZERO;
    for amount in amounts {
        total += stored_decimal(amount, "amount")?;
    }
    Ok(total)
}

/// Effect of a record on the given account's balance. A TRANSFER record is a
/// debit on the sender wallet and a credit on the receiver wallet.
fn signed_amount(record: &TransactionRecord, account: &AccountRef) -> Decimal {
    match record.txn_type {
        TransactionType::Income | TransactionType::AdminCredit => record.amount,
        TransactionType::Expense | TransactionType::AdminDebit => -record.amount,
        TransactionType::Transfer => {
            if record.sender_id.as_deref() == Some(account.account_id.as_str()) {
                -record.amount
            } else {
                record.amount
            }
        }
    }
}
