use log::{debug, error};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::engine_errors::EngineFailure;
use super::engine_model::{AdjustmentDirection, OperationOutcome, UndoEntry};
use crate::accounts::{AccountError, AccountKind, AccountRef, AccountStoreTrait};
use crate::audit::AuditSink;
use crate::budgets::{BudgetKey, BudgetRepositoryTrait};
use crate::constants::{
    CREDIT_CARD_PAYMENT_CATEGORY, PAYMENT_MODE_CREDIT_CARD, REVERSAL_CATEGORY,
    UNDO_HISTORY_CAPACITY,
};
use crate::errors::{Error, Result, ValidationError};
use crate::ledger::{
    LedgerRepositoryTrait, NewIncomeEntry, NewTransaction, NewTransfer, TransactionType,
};
use crate::utils::current_month_key;

/// The transaction core. Every operation follows the same protocol:
/// validate, mutate the account store, append the ledger record, apply side
/// effects, return the outcome triple. A balance write without its ledger
/// record must never survive, so an append failure restores the previous
/// balance before the error propagates.
pub struct WalletEngine {
    accounts: Arc<dyn AccountStoreTrait>,
    ledger: Arc<dyn LedgerRepositoryTrait>,
    budgets: Arc<dyn BudgetRepositoryTrait>,
    audit: Arc<dyn AuditSink>,
    undo_history: Mutex<VecDeque<UndoEntry>>,
}

impl WalletEngine {
    /// Creates a new WalletEngine instance with injected dependencies
    pub fn new(
        accounts: Arc<dyn AccountStoreTrait>,
        ledger: Arc<dyn LedgerRepositoryTrait>,
        budgets: Arc<dyn BudgetRepositoryTrait>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            accounts,
            ledger,
            budgets,
            audit,
            undo_history: Mutex::new(VecDeque::with_capacity(UNDO_HISTORY_CAPACITY)),
        }
    }

    fn ensure_positive(amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::NonPositiveAmount(
                amount,
            )));
        }
        Ok(())
    }

    /// Resolves an account, turning a kind mismatch into a business failure
    /// outcome rather than an error.
    fn resolve_account(
        &self,
        account_ref: &AccountRef,
    ) -> Result<std::result::Result<crate::accounts::Account, EngineFailure>> {
        match self.accounts.get(account_ref) {
            Ok(account) => Ok(Ok(account)),
            Err(Error::Account(AccountError::KindMismatch {
                account_id,
                expected,
                actual,
            })) => Ok(Err(EngineFailure::InvalidAccountKind {
                account_id,
                expected,
                actual,
            })),
            Err(e) => Err(e),
        }
    }

    fn push_undo(&self, entry: UndoEntry) {
        let mut history = self
            .undo_history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if history.len() == UNDO_HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(entry);
    }

    fn pop_undo(&self) -> Option<UndoEntry> {
        self.undo_history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_back()
    }

    /// Restores a balance after a failed ledger append. A failure here leaves
    /// balance and ledger diverged, which only a chain verification can
    /// surface, so it is logged as loudly as possible.
    fn restore_balance(&self, account_ref: &AccountRef, previous: Decimal) {
        if let Err(e) = self.accounts.set_balance(account_ref, previous) {
            error!(
                "Failed to restore balance {} on account {} after ledger append failure: {}",
                previous, account_ref.account_id, e
            );
        }
    }

    /// Credits an account and appends the INCOME record. Wallet-kind income
    /// additionally lands in the parallel income ledger used by analytics.
    pub fn process_income(
        &self,
        principal: &str,
        account_ref: &AccountRef,
        amount: Decimal,
        category: &str,
        source: &str,
    ) -> Result<OperationOutcome> {
        Self::ensure_positive(amount)?;

        let account = match self.resolve_account(account_ref)? {
            Ok(account) => account,
            Err(failure) => return Ok(OperationOutcome::failed(Decimal::ZERO, failure)),
        };

        let previous_balance = account.balance;
        let new_balance = previous_balance + amount;

        self.accounts.set_balance(account_ref, new_balance)?;

        let record = match self.ledger.append(NewTransaction {
            user_id: principal.to_string(),
            account_kind: account_ref.kind,
            account_id: account_ref.account_id.clone(),
            txn_type: TransactionType::Income,
            amount,
            balance_after: new_balance,
            category: category.to_string(),
            subtype: None,
            payment_mode: None,
            description: Some(source.to_string()),
            sender_id: None,
            receiver_id: None,
        }) {
            Ok(record) => record,
            Err(e) => {
                self.restore_balance(account_ref, previous_balance);
                return Err(e);
            }
        };

        if account_ref.kind == AccountKind::Wallet {
            // Secondary analytics ledger; the authoritative record is already
            // committed, so a failure here degrades reporting only.
            if let Err(e) = self.ledger.record_income_entry(NewIncomeEntry {
                user_id: principal.to_string(),
                account_id: account_ref.account_id.clone(),
                amount,
                category: category.to_string(),
                source: source.to_string(),
            }) {
                log::warn!("Income ledger entry failed for record {}: {}", record.id, e);
            }
        }

        self.push_undo(UndoEntry::Income {
            user_id: principal.to_string(),
            account: account_ref.clone(),
            amount,
            source: source.to_string(),
            record_id: record.id.clone(),
        });

        self.audit.log(
            principal,
            &format!(
                "income {} ({}) credited to {} account {}",
                amount, category, account_ref.kind, account_ref.account_id
            ),
        );
        debug!("Recorded income {} on {}", amount, account_ref.account_id);

        Ok(OperationOutcome::succeeded(
            new_balance,
            format!("Income of {} recorded under '{}'", amount, category),
            record.id,
        ))
    }

    /// Debits an account and appends the EXPENSE record, enforcing the
    /// funds, budget and credit-card preconditions.
    #[allow(clippy::too_many_arguments)]
    pub fn process_expense(
        &self,
        principal: &str,
        account_ref: &AccountRef,
        amount: Decimal,
        category: &str,
        payment_mode: &str,
        description: Option<&str>,
        subtype: Option<&str>,
    ) -> Result<OperationOutcome> {
        Self::ensure_positive(amount)?;

        let account = match self.resolve_account(account_ref)? {
            Ok(account) => account,
            Err(failure) => return Ok(OperationOutcome::failed(Decimal::ZERO, failure)),
        };

        let previous_balance = account.balance;
        if amount > previous_balance {
            return Ok(OperationOutcome::failed(
                previous_balance,
                EngineFailure::InsufficientFunds {
                    available: previous_balance,
                    requested: amount,
                },
            ));
        }

        let month = current_month_key();

        // Budgets constrain wallet-kind expenses only. Bank, investment and
        // manual expenses bypass budget checks; this asymmetry is deliberate.
        if account_ref.kind == AccountKind::Wallet {
            let key = BudgetKey::new(principal, category, month.clone());
            if let Some(budget) = self.budgets.find(&key)? {
                if budget.limit_amount > Decimal::ZERO {
                    let spent = self.ledger.sum_expenses(principal, category, &month)?;
                    if spent + amount > budget.limit_amount {
                        return Ok(OperationOutcome::failed(
                            previous_balance,
                            EngineFailure::BudgetExceeded {
                                category: category.to_string(),
                                limit: budget.limit_amount,
                                spent,
                                requested: amount,
                            },
                        ));
                    }
                }
            }
        }

        if account_ref.kind == AccountKind::Bank && payment_mode == PAYMENT_MODE_CREDIT_CARD {
            if let crate::accounts::AccountDetails::Bank {
                credit_card_limit, ..
            } = &account.details
            {
                let used = self.ledger.sum_account_expenses(
                    account_ref,
                    CREDIT_CARD_PAYMENT_CATEGORY,
                    &month,
                )?;
                let remaining = *credit_card_limit - used;
                if amount > remaining {
                    return Ok(OperationOutcome::failed(
                        previous_balance,
                        EngineFailure::CreditLimitExceeded {
                            limit: *credit_card_limit,
                            remaining,
                            requested: amount,
                        },
                    ));
                }
            }
        }

        let new_balance = previous_balance - amount;
        self.accounts.set_balance(account_ref, new_balance)?;

        let record = match self.ledger.append(NewTransaction {
            user_id: principal.to_string(),
            account_kind: account_ref.kind,
            account_id: account_ref.account_id.clone(),
            txn_type: TransactionType::Expense,
            amount,
            balance_after: new_balance,
            category: category.to_string(),
            subtype: subtype.map(str::to_string),
            payment_mode: Some(payment_mode.to_string()),
            description: description.map(str::to_string),
            sender_id: None,
            receiver_id: None,
        }) {
            Ok(record) => record,
            Err(e) => {
                self.restore_balance(account_ref, previous_balance);
                return Err(e);
            }
        };

        self.push_undo(UndoEntry::Expense {
            user_id: principal.to_string(),
            account: account_ref.clone(),
            amount,
            record_id: record.id.clone(),
        });

        self.audit.log(
            principal,
            &format!(
                "expense {} ({}) debited from {} account {}",
                amount, category, account_ref.kind, account_ref.account_id
            ),
        );
        debug!("Recorded expense {} on {}", amount, account_ref.account_id);

        Ok(OperationOutcome::succeeded(
            new_balance,
            format!("Expense of {} recorded under '{}'", amount, category),
            record.id,
        ))
    }

    /// Moves funds between two users' wallets. The receiver-side credit
    /// failing after the sender debit reverts the debit before returning;
    /// both ledger records plus the transfer row land atomically.
    pub fn process_transfer(
        &self,
        sender_user: &str,
        receiver_user: &str,
        amount: Decimal,
    ) -> Result<OperationOutcome> {
        Self::ensure_positive(amount)?;

        let sender_wallet = self.accounts.get_wallet_for_user(sender_user)?;
        let receiver_wallet = self.accounts.get_wallet_for_user(receiver_user)?;
        let sender_ref = sender_wallet.account_ref();
        let receiver_ref = receiver_wallet.account_ref();

        let sender_balance = sender_wallet.balance;

        // Both legs would resolve to the same row; the credit would overwrite
        // the debit and mint the transferred amount. Rejected before any
        // mutation.
        if sender_user == receiver_user || sender_ref.account_id == receiver_ref.account_id {
            return Ok(OperationOutcome::failed(
                sender_balance,
                EngineFailure::SelfTransfer,
            ));
        }

        if amount > sender_balance {
            return Ok(OperationOutcome::failed(
                sender_balance,
                EngineFailure::InsufficientFunds {
                    available: sender_balance,
                    requested: amount,
                },
            ));
        }

        let receiver_balance = self.accounts.get_balance(&receiver_ref)?;
        let sender_after = sender_balance - amount;
        let receiver_after = receiver_balance + amount;

        self.accounts.set_balance(&sender_ref, sender_after)?;

        if let Err(e) = self.accounts.set_balance(&receiver_ref, receiver_after) {
            // Compensating rollback: money must not vanish on a failed credit.
            self.restore_balance(&sender_ref, sender_balance);
            return Err(e);
        }

        let sender_record = NewTransaction {
            user_id: sender_user.to_string(),
            account_kind: AccountKind::Wallet,
            account_id: sender_ref.account_id.clone(),
            txn_type: TransactionType::Transfer,
            amount,
            balance_after: sender_after,
            category: "Transfer".to_string(),
            subtype: None,
            payment_mode: None,
            description: Some(format!("Transfer to {}", receiver_user)),
            sender_id: Some(sender_ref.account_id.clone()),
            receiver_id: Some(receiver_ref.account_id.clone()),
        };
        let receiver_record = NewTransaction {
            user_id: receiver_user.to_string(),
            account_kind: AccountKind::Wallet,
            account_id: receiver_ref.account_id.clone(),
            txn_type: TransactionType::Transfer,
            amount,
            balance_after: receiver_after,
            category: "Transfer".to_string(),
            subtype: None,
            payment_mode: None,
            description: Some(format!("Transfer from {}", sender_user)),
            sender_id: Some(sender_ref.account_id.clone()),
            receiver_id: Some(receiver_ref.account_id.clone()),
        };
        let transfer = NewTransfer {
            sender_user_id: sender_user.to_string(),
            receiver_user_id: receiver_user.to_string(),
            sender_wallet_id: sender_ref.account_id.clone(),
            receiver_wallet_id: receiver_ref.account_id.clone(),
            amount,
        };

        let (sender_rec, receiver_rec, _) =
            match self
                .ledger
                .append_transfer(sender_record, receiver_record, transfer)
            {
                Ok(result) => result,
                Err(e) => {
                    self.restore_balance(&receiver_ref, receiver_balance);
                    self.restore_balance(&sender_ref, sender_balance);
                    return Err(e);
                }
            };

        self.push_undo(UndoEntry::Transfer {
            sender_user_id: sender_user.to_string(),
            receiver_user_id: receiver_user.to_string(),
            sender_wallet: sender_ref.clone(),
            receiver_wallet: receiver_ref,
            amount,
            sender_record_id: sender_rec.id.clone(),
            receiver_record_id: receiver_rec.id,
        });

        self.audit.log(
            sender_user,
            &format!("transfer {} to user {}", amount, receiver_user),
        );

        Ok(OperationOutcome::succeeded(
            sender_after,
            format!("Transferred {} to {}", amount, receiver_user),
            sender_rec.id,
        ))
    }

    /// Reverses the most recent engine mutation by appending a compensating
    /// record. Originals are never touched; the trail stays append-only.
    pub fn undo_last(&self, principal: &str) -> Result<OperationOutcome> {
        let Some(entry) = self.pop_undo() else {
            return Ok(OperationOutcome::failed(
                Decimal::ZERO,
                EngineFailure::NothingToUndo,
            ));
        };

        match entry {
            UndoEntry::Expense {
                ref user_id,
                ref account,
                amount,
                ref record_id,
            } => {
                let balance = self.accounts.get_balance(account)?;
                let restored = balance + amount;
                self.accounts.set_balance(account, restored)?;

                let record = match self.append_reversal(
                    user_id,
                    account,
                    TransactionType::AdminCredit,
                    TransactionType::Expense,
                    amount,
                    restored,
                    record_id,
                ) {
                    Ok(record) => record,
                    Err(e) => {
                        self.restore_balance(account, balance);
                        self.push_undo(entry.clone());
                        return Err(e);
                    }
                };

                self.audit
                    .log(principal, &format!("undo expense record {}", record_id));
                Ok(OperationOutcome::succeeded(
                    restored,
                    format!("Reversed expense of {}", amount),
                    record,
                ))
            }
            UndoEntry::Income {
                ref user_id,
                ref account,
                amount,
                ref source,
                ref record_id,
            } => {
                let balance = self.accounts.get_balance(account)?;
                if balance < amount {
                    self.push_undo(entry.clone());
                    return Ok(OperationOutcome::failed(
                        balance,
                        EngineFailure::NegativeBalanceWouldResult,
                    ));
                }

                let restored = balance - amount;
                self.accounts.set_balance(account, restored)?;

                let record = match self.append_reversal(
                    user_id,
                    account,
                    TransactionType::AdminDebit,
                    TransactionType::Income,
                    amount,
                    restored,
                    record_id,
                ) {
                    Ok(record) => record,
                    Err(e) => {
                        self.restore_balance(account, balance);
                        self.push_undo(entry.clone());
                        return Err(e);
                    }
                };

                if account.kind == AccountKind::Wallet {
                    // Nets the original entry back out of the parallel income
                    // ledger, keeping analytics income consistent with the
                    // reversed balance.
                    if let Err(e) = self.ledger.record_income_entry(NewIncomeEntry {
                        user_id: user_id.clone(),
                        account_id: account.account_id.clone(),
                        amount: -amount,
                        category: REVERSAL_CATEGORY.to_string(),
                        source: source.clone(),
                    }) {
                        log::warn!(
                            "Income ledger reversal failed for record {}: {}",
                            record_id,
                            e
                        );
                    }
                }

                self.audit
                    .log(principal, &format!("undo income record {}", record_id));
                Ok(OperationOutcome::succeeded(
                    restored,
                    format!("Reversed income of {}", amount),
                    record,
                ))
            }
            UndoEntry::Transfer {
                ref sender_user_id,
                ref receiver_user_id,
                ref sender_wallet,
                ref receiver_wallet,
                amount,
                ref sender_record_id,
                ref receiver_record_id,
            } => {
                let receiver_balance = self.accounts.get_balance(receiver_wallet)?;
                if receiver_balance < amount {
                    self.push_undo(entry.clone());
                    return Ok(OperationOutcome::failed(
                        receiver_balance,
                        EngineFailure::ReceiverAlreadySpent,
                    ));
                }

                let sender_balance = self.accounts.get_balance(sender_wallet)?;
                let receiver_after = receiver_balance - amount;
                let sender_after = sender_balance + amount;

                self.accounts.set_balance(receiver_wallet, receiver_after)?;
                if let Err(e) = self.accounts.set_balance(sender_wallet, sender_after) {
                    self.restore_balance(receiver_wallet, receiver_balance);
                    self.push_undo(entry.clone());
                    return Err(e);
                }

                // Both compensating records land in one database transaction;
                // a half-written reversal would leave a permanent chain
                // mismatch on one of the wallets.
                let receiver_reversal = Self::reversal_record(
                    receiver_user_id,
                    receiver_wallet,
                    TransactionType::AdminDebit,
                    TransactionType::Transfer,
                    amount,
                    receiver_after,
                    receiver_record_id,
                );
                let sender_reversal = Self::reversal_record(
                    sender_user_id,
                    sender_wallet,
                    TransactionType::AdminCredit,
                    TransactionType::Transfer,
                    amount,
                    sender_after,
                    sender_record_id,
                );

                let record = match self
                    .ledger
                    .append_reversal_pair(receiver_reversal, sender_reversal)
                {
                    Ok((_, sender_rec)) => sender_rec.id,
                    Err(e) => {
                        self.restore_balance(sender_wallet, sender_balance);
                        self.restore_balance(receiver_wallet, receiver_balance);
                        self.push_undo(entry.clone());
                        return Err(e);
                    }
                };

                self.audit.log(
                    principal,
                    &format!("undo transfer record {}", sender_record_id),
                );
                Ok(OperationOutcome::succeeded(
                    sender_after,
                    format!("Reversed transfer of {}", amount),
                    record,
                ))
            }
        }
    }

    /// Compensating record for an undone mutation. The subtype names the
    /// reversed transaction type so aggregations can net the original out.
    fn reversal_record(
        user_id: &str,
        account: &AccountRef,
        txn_type: TransactionType,
        reversed: TransactionType,
        amount: Decimal,
        balance_after: Decimal,
        original_record_id: &str,
    ) -> NewTransaction {
        NewTransaction {
            user_id: user_id.to_string(),
            account_kind: account.kind,
            account_id: account.account_id.clone(),
            txn_type,
            amount,
            balance_after,
            category: REVERSAL_CATEGORY.to_string(),
            subtype: Some(reversed.as_str().to_string()),
            payment_mode: None,
            description: Some(format!("Reversal of transaction {}", original_record_id)),
            sender_id: None,
            receiver_id: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn append_reversal(
        &self,
        user_id: &str,
        account: &AccountRef,
        txn_type: TransactionType,
        reversed: TransactionType,
        amount: Decimal,
        balance_after: Decimal,
        original_record_id: &str,
    ) -> Result<String> {
        let record = self.ledger.append(Self::reversal_record(
            user_id,
            account,
            txn_type,
            reversed,
            amount,
            balance_after,
            original_record_id,
        ))?;
        Ok(record.id)
    }

    /// Operator override. Bypasses budget checks but follows the same
    /// mutate-and-record protocol, and always leaves an audit entry. Not
    /// undoable.
    pub fn admin_adjust(
        &self,
        actor: &str,
        account_ref: &AccountRef,
        direction: AdjustmentDirection,
        amount: Decimal,
        reason: &str,
    ) -> Result<OperationOutcome> {
        Self::ensure_positive(amount)?;

        let account = match self.resolve_account(account_ref)? {
            Ok(account) => account,
            Err(failure) => return Ok(OperationOutcome::failed(Decimal::ZERO, failure)),
        };

        let previous_balance = account.balance;
        let (txn_type, new_balance) = match direction {
            AdjustmentDirection::Credit => {
                (TransactionType::AdminCredit, previous_balance + amount)
            }
            AdjustmentDirection::Debit => {
                if amount > previous_balance {
                    return Ok(OperationOutcome::failed(
                        previous_balance,
                        EngineFailure::InsufficientFunds {
                            available: previous_balance,
                            requested: amount,
                        },
                    ));
                }
                (TransactionType::AdminDebit, previous_balance - amount)
            }
        };

        self.accounts.set_balance(account_ref, new_balance)?;

        let record = match self.ledger.append(NewTransaction {
            user_id: account.user_id.clone(),
            account_kind: account_ref.kind,
            account_id: account_ref.account_id.clone(),
            txn_type,
            amount,
            balance_after: new_balance,
            category: "Admin Adjustment".to_string(),
            subtype: None,
            payment_mode: None,
            description: Some(reason.to_string()),
            sender_id: None,
            receiver_id: None,
        }) {
            Ok(record) => record,
            Err(e) => {
                self.restore_balance(account_ref, previous_balance);
                return Err(e);
            }
        };

        self.audit.log(
            actor,
            &format!(
                "admin {:?} of {} on {} account {}: {}",
                direction, amount, account_ref.kind, account_ref.account_id, reason
            ),
        );

        Ok(OperationOutcome::succeeded(
            new_balance,
            format!("Admin adjustment of {} applied", amount),
            record.id,
        ))
    }

    /// Number of mutations currently undoable
    pub fn undo_depth(&self) -> usize {
        self.undo_history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl super::engine_traits::TransactionEngineTrait for WalletEngine {
    fn process_income(
        &self,
        principal: &str,
        account_ref: &AccountRef,
        amount: Decimal,
        category: &str,
        source: &str,
    ) -> Result<OperationOutcome> {
        WalletEngine::process_income(self, principal, account_ref, amount, category, source)
    }

    fn process_expense(
        &self,
        principal: &str,
        account_ref: &AccountRef,
        amount: Decimal,
        category: &str,
        payment_mode: &str,
        description: Option<&str>,
        subtype: Option<&str>,
    ) -> Result<OperationOutcome> {
        WalletEngine::process_expense(
            self,
            principal,
            account_ref,
            amount,
            category,
            payment_mode,
            description,
            subtype,
        )
    }

    fn process_transfer(
        &self,
        sender_user: &str,
        receiver_user: &str,
        amount: Decimal,
    ) -> Result<OperationOutcome> {
        WalletEngine::process_transfer(self, sender_user, receiver_user, amount)
    }

    fn undo_last(&self, principal: &str) -> Result<OperationOutcome> {
        WalletEngine::undo_last(self, principal)
    }

    fn admin_adjust(
        &self,
        actor: &str,
        account_ref: &AccountRef,
        direction: AdjustmentDirection,
        amount: Decimal,
        reason: &str,
    ) -> Result<OperationOutcome> {
        WalletEngine::admin_adjust(self, actor, account_ref, direction, amount, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{Account, AccountDetails};
    use crate::budgets::{Budget, BudgetKey, NewBudget};
    use crate::ledger::{
        IncomeEntry, LedgerError, TransactionFilter, TransactionRecord, TransferRecord,
    };
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn wallet_account(id: &str, user: &str, balance: Decimal) -> Account {
        let now = chrono::Utc::now().naive_utc();
        Account {
            id: id.to_string(),
            user_id: user.to_string(),
            name: format!("{} wallet", user),
            kind: AccountKind::Wallet,
            balance,
            details: AccountDetails::Wallet,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn bank_account(id: &str, user: &str, balance: Decimal, limit: Decimal) -> Account {
        let now = chrono::Utc::now().naive_utc();
        Account {
            id: id.to_string(),
            user_id: user.to_string(),
            name: format!("{} bank", user),
            kind: AccountKind::Bank,
            balance,
            details: AccountDetails::Bank {
                bank_name: "Test Bank".to_string(),
                ifsc: "TEST0000001".to_string(),
                last_four: "4242".to_string(),
                credit_card_limit: limit,
            },
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[derive(Default)]
    struct MockAccountStore {
        accounts: Mutex<HashMap<String, Account>>,
        fail_set_balance_for: Mutex<Option<String>>,
    }

    impl MockAccountStore {
        fn with_accounts(accounts: Vec<Account>) -> Self {
            let map = accounts.into_iter().map(|a| (a.id.clone(), a)).collect();
            Self {
                accounts: Mutex::new(map),
                fail_set_balance_for: Mutex::new(None),
            }
        }

        fn fail_next_set_balance(&self, account_id: &str) {
            *self.fail_set_balance_for.lock().unwrap() = Some(account_id.to_string());
        }

        fn balance_of(&self, account_id: &str) -> Decimal {
            self.accounts.lock().unwrap()[account_id].balance
        }
    }

    impl AccountStoreTrait for MockAccountStore {
        fn get(&self, account_ref: &AccountRef) -> Result<Account> {
            let accounts = self.accounts.lock().unwrap();
            let account = accounts.get(&account_ref.account_id).ok_or_else(|| {
                Error::Account(AccountError::NotFound(account_ref.account_id.clone()))
            })?;
            if account.kind != account_ref.kind {
                return Err(Error::Account(AccountError::KindMismatch {
                    account_id: account.id.clone(),
                    expected: account_ref.kind.to_string(),
                    actual: account.kind.to_string(),
                }));
            }
            Ok(account.clone())
        }

        fn get_wallet_for_user(&self, user_id: &str) -> Result<Account> {
            let accounts = self.accounts.lock().unwrap();
            accounts
                .values()
                .find(|a| a.user_id == user_id && a.kind == AccountKind::Wallet && a.is_active)
                .cloned()
                .ok_or_else(|| {
                    Error::Account(AccountError::NotFound(format!("wallet of {}", user_id)))
                })
        }

        fn get_balance(&self, account_ref: &AccountRef) -> Result<Decimal> {
            Ok(self.get(account_ref)?.balance)
        }

        fn set_balance(&self, account_ref: &AccountRef, new_value: Decimal) -> Result<()> {
            let mut fail_for = self.fail_set_balance_for.lock().unwrap();
            if fail_for.as_deref() == Some(account_ref.account_id.as_str()) {
                *fail_for = None;
                return Err(Error::Account(AccountError::DatabaseError(
                    "injected write failure".to_string(),
                )));
            }
            drop(fail_for);
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts.get_mut(&account_ref.account_id).ok_or_else(|| {
                Error::Account(AccountError::NotFound(account_ref.account_id.clone()))
            })?;
            account.balance = new_value;
            Ok(())
        }

        fn update_investment_position(
            &self,
            _account_id: &str,
            _quantity: Decimal,
            _price_per_share: Decimal,
            _invested_amount: Decimal,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockLedger {
        records: Mutex<Vec<TransactionRecord>>,
        income_entries: Mutex<Vec<IncomeEntry>>,
        fail_append: Mutex<bool>,
    }

    impl MockLedger {
        fn fail_next_append(&self) {
            *self.fail_append.lock().unwrap() = true;
        }

        fn record_count(&self) -> usize {
            self.records.lock().unwrap().len()
        }

        fn last_record(&self) -> TransactionRecord {
            self.records.lock().unwrap().last().cloned().unwrap()
        }

        fn store(&self, new_transaction: NewTransaction) -> TransactionRecord {
            let record = TransactionRecord {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: new_transaction.user_id,
                account_kind: new_transaction.account_kind,
                account_id: new_transaction.account_id,
                txn_type: new_transaction.txn_type,
                amount: new_transaction.amount,
                balance_after: new_transaction.balance_after,
                category: new_transaction.category,
                subtype: new_transaction.subtype,
                payment_mode: new_transaction.payment_mode,
                description: new_transaction.description,
                sender_id: new_transaction.sender_id,
                receiver_id: new_transaction.receiver_id,
                created_at: chrono::Utc::now().naive_utc(),
            };
            self.records.lock().unwrap().push(record.clone());
            record
        }
    }

    impl crate::ledger::LedgerRepositoryTrait for MockLedger {
        fn append(&self, new_transaction: NewTransaction) -> Result<TransactionRecord> {
            let mut fail = self.fail_append.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(Error::Ledger(LedgerError::DatabaseError(
                    "injected append failure".to_string(),
                )));
            }
            drop(fail);
            Ok(self.store(new_transaction))
        }

        fn append_transfer(
            &self,
            sender_record: NewTransaction,
            receiver_record: NewTransaction,
            transfer: NewTransfer,
        ) -> Result<(TransactionRecord, TransactionRecord, TransferRecord)> {
            let mut fail = self.fail_append.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(Error::Ledger(LedgerError::DatabaseError(
                    "injected append failure".to_string(),
                )));
            }
            drop(fail);
            let sender = self.store(sender_record);
            let receiver = self.store(receiver_record);
            let transfer = TransferRecord {
                id: uuid::Uuid::new_v4().to_string(),
                sender_user_id: transfer.sender_user_id,
                receiver_user_id: transfer.receiver_user_id,
                sender_wallet_id: transfer.sender_wallet_id,
                receiver_wallet_id: transfer.receiver_wallet_id,
                amount: transfer.amount,
                created_at: chrono::Utc::now().naive_utc(),
            };
            Ok((sender, receiver, transfer))
        }

        fn append_reversal_pair(
            &self,
            first: NewTransaction,
            second: NewTransaction,
        ) -> Result<(TransactionRecord, TransactionRecord)> {
            let mut fail = self.fail_append.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(Error::Ledger(LedgerError::DatabaseError(
                    "injected append failure".to_string(),
                )));
            }
            drop(fail);
            Ok((self.store(first), self.store(second)))
        }

        fn search(
            &self,
            _filter: &TransactionFilter,
            _limit: Option<i64>,
        ) -> Result<Vec<TransactionRecord>> {
            Ok(self.records.lock().unwrap().clone())
        }

        fn recent_for_account(
            &self,
            account: &AccountRef,
            limit: i64,
        ) -> Result<Vec<TransactionRecord>> {
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .rev()
                .filter(|r| r.account_id == account.account_id)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        fn sum_expenses(&self, user_id: &str, category: &str, _month: &str) -> Result<Decimal> {
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .filter(|r| {
                    r.user_id == user_id
                        && r.category == category
                        && r.txn_type == TransactionType::Expense
                        && r.account_kind == AccountKind::Wallet
                })
                .map(|r| r.amount)
                .sum())
        }

        fn sum_account_expenses(
            &self,
            account: &AccountRef,
            category: &str,
            _month: &str,
        ) -> Result<Decimal> {
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .filter(|r| {
                    r.account_id == account.account_id
                        && r.category == category
                        && r.txn_type == TransactionType::Expense
                })
                .map(|r| r.amount)
                .sum())
        }

        fn record_income_entry(&self, entry: NewIncomeEntry) -> Result<IncomeEntry> {
            let income = IncomeEntry {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: entry.user_id,
                account_id: entry.account_id,
                amount: entry.amount,
                category: entry.category,
                source: entry.source,
                created_at: chrono::Utc::now().naive_utc(),
            };
            self.income_entries.lock().unwrap().push(income.clone());
            Ok(income)
        }

        fn income_entries_for_month(
            &self,
            _user_id: &str,
            _month: &str,
        ) -> Result<Vec<IncomeEntry>> {
            Ok(self.income_entries.lock().unwrap().clone())
        }

        fn monthly_totals(&self, _user_id: &str, _month: &str) -> Result<(Decimal, Decimal)> {
            Ok((Decimal::ZERO, Decimal::ZERO))
        }

        fn expense_totals_by_category(
            &self,
            _user_id: &str,
            _month: &str,
        ) -> Result<Vec<(String, Decimal)>> {
            Ok(Vec::new())
        }

        fn verify_balance_chain(
            &self,
            _account: &AccountRef,
            _current_balance: Decimal,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockBudgets {
        budgets: Mutex<HashMap<(String, String), Decimal>>,
    }

    impl MockBudgets {
        fn with_limit(user_id: &str, category: &str, limit: Decimal) -> Self {
            let mut budgets = HashMap::new();
            budgets.insert((user_id.to_string(), category.to_string()), limit);
            Self {
                budgets: Mutex::new(budgets),
            }
        }
    }

    impl BudgetRepositoryTrait for MockBudgets {
        fn find(&self, key: &BudgetKey) -> Result<Option<Budget>> {
            let budgets = self.budgets.lock().unwrap();
            let now = chrono::Utc::now().naive_utc();
            Ok(budgets
                .get(&(key.user_id.clone(), key.category.clone()))
                .map(|limit| Budget {
                    id: "b1".to_string(),
                    user_id: key.user_id.clone(),
                    category: key.category.clone(),
                    month: key.month.clone(),
                    limit_amount: *limit,
                    created_at: now,
                    updated_at: now,
                }))
        }

        fn upsert(&self, _new_budget: NewBudget) -> Result<Budget> {
            unimplemented!("not exercised by engine tests")
        }

        fn delete(&self, _key: &BudgetKey) -> Result<usize> {
            unimplemented!("not exercised by engine tests")
        }

        fn list_for_month(&self, _user_id: &str, _month: &str) -> Result<Vec<Budget>> {
            Ok(Vec::new())
        }
    }

    struct NoopAudit;

    impl AuditSink for NoopAudit {
        fn log(&self, _actor: &str, _action: &str) {}
    }

    fn engine_with(
        accounts: Arc<MockAccountStore>,
        ledger: Arc<MockLedger>,
        budgets: Arc<MockBudgets>,
    ) -> WalletEngine {
        WalletEngine::new(accounts, ledger, budgets, Arc::new(NoopAudit))
    }

    fn wallet_ref(id: &str) -> AccountRef {
        AccountRef::new(AccountKind::Wallet, id)
    }

    #[test]
    fn test_income_credits_wallet_and_records_entry() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(100),
        )]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        let outcome = engine
            .process_income("alice", &wallet_ref("w1"), dec!(2500), "Salary", "Acme Corp")
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.resulting_balance, dec!(2600));
        assert_eq!(accounts.balance_of("w1"), dec!(2600));
        assert_eq!(ledger.record_count(), 1);
        let record = ledger.last_record();
        assert_eq!(record.txn_type, TransactionType::Income);
        assert_eq!(record.balance_after, dec!(2600));
        assert_eq!(ledger.income_entries.lock().unwrap().len(), 1);
        assert_eq!(engine.undo_depth(), 1);
    }

    #[test]
    fn test_income_rejects_non_positive_amount() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(100),
        )]));
        let engine = engine_with(
            accounts,
            Arc::new(MockLedger::default()),
            Arc::new(MockBudgets::default()),
        );

        let result = engine.process_income("alice", &wallet_ref("w1"), dec!(0), "Salary", "x");
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::NonPositiveAmount(_)))
        ));
    }

    #[test]
    fn test_expense_insufficient_funds_leaves_state_untouched() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(50),
        )]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        let outcome = engine
            .process_expense(
                "alice",
                &wallet_ref("w1"),
                dec!(80),
                "Food",
                "UPI",
                None,
                None,
            )
            .unwrap();

        assert!(!outcome.success);
        assert!(matches!(
            outcome.failure,
            Some(EngineFailure::InsufficientFunds { .. })
        ));
        assert_eq!(outcome.resulting_balance, dec!(50));
        assert_eq!(accounts.balance_of("w1"), dec!(50));
        assert_eq!(ledger.record_count(), 0);
        assert_eq!(engine.undo_depth(), 0);
    }

    #[test]
    fn test_expense_exact_balance_allowed() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(50),
        )]));
        let engine = engine_with(
            accounts.clone(),
            Arc::new(MockLedger::default()),
            Arc::new(MockBudgets::default()),
        );

        let outcome = engine
            .process_expense(
                "alice",
                &wallet_ref("w1"),
                dec!(50),
                "Food",
                "Cash",
                None,
                None,
            )
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.resulting_balance, dec!(0));
    }

    #[test]
    fn test_expense_budget_exceeded() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(10000),
        )]));
        let ledger = Arc::new(MockLedger::default());
        let budgets = Arc::new(MockBudgets::with_limit("alice", "Food", dec!(2000)));
        let engine = engine_with(accounts.clone(), ledger.clone(), budgets);

        let first = engine
            .process_expense(
                "alice",
                &wallet_ref("w1"),
                dec!(1500),
                "Food",
                "UPI",
                None,
                None,
            )
            .unwrap();
        assert!(first.success);

        let second = engine
            .process_expense(
                "alice",
                &wallet_ref("w1"),
                dec!(600),
                "Food",
                "UPI",
                None,
                None,
            )
            .unwrap();
        assert!(!second.success);
        match second.failure {
            Some(EngineFailure::BudgetExceeded {
                limit,
                spent,
                requested,
                ..
            }) => {
                assert_eq!(limit, dec!(2000));
                assert_eq!(spent, dec!(1500));
                assert_eq!(requested, dec!(600));
            }
            other => panic!("Expected BudgetExceeded, got {:?}", other),
        }
        assert_eq!(accounts.balance_of("w1"), dec!(8500));
        assert_eq!(ledger.record_count(), 1);
    }

    #[test]
    fn test_budget_boundary_spend_to_exact_limit_allowed() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(10000),
        )]));
        let budgets = Arc::new(MockBudgets::with_limit("alice", "Food", dec!(2000)));
        let engine = engine_with(accounts, Arc::new(MockLedger::default()), budgets);

        let first = engine
            .process_expense(
                "alice",
                &wallet_ref("w1"),
                dec!(1500),
                "Food",
                "UPI",
                None,
                None,
            )
            .unwrap();
        assert!(first.success);

        let second = engine
            .process_expense(
                "alice",
                &wallet_ref("w1"),
                dec!(500),
                "Food",
                "UPI",
                None,
                None,
            )
            .unwrap();
        assert!(second.success, "spending exactly to the limit must pass");
    }

    #[test]
    fn test_bank_expense_ignores_wallet_budget() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![bank_account(
            "b1",
            "alice",
            dec!(10000),
            dec!(0),
        )]));
        let budgets = Arc::new(MockBudgets::with_limit("alice", "Food", dec!(100)));
        let engine = engine_with(accounts, Arc::new(MockLedger::default()), budgets);

        let outcome = engine
            .process_expense(
                "alice",
                &AccountRef::new(AccountKind::Bank, "b1"),
                dec!(500),
                "Food",
                "Debit Card",
                None,
                None,
            )
            .unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn test_credit_card_limit_enforced_per_month() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![bank_account(
            "b1",
            "alice",
            dec!(500000),
            dec!(100000),
        )]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );
        let bank = AccountRef::new(AccountKind::Bank, "b1");

        let first = engine
            .process_expense(
                "alice",
                &bank,
                dec!(100000),
                CREDIT_CARD_PAYMENT_CATEGORY,
                PAYMENT_MODE_CREDIT_CARD,
                None,
                None,
            )
            .unwrap();
        assert!(first.success, "spending exactly the limit must pass");

        let second = engine
            .process_expense(
                "alice",
                &bank,
                dec!(0.01),
                CREDIT_CARD_PAYMENT_CATEGORY,
                PAYMENT_MODE_CREDIT_CARD,
                None,
                None,
            )
            .unwrap();
        assert!(!second.success);
        assert!(matches!(
            second.failure,
            Some(EngineFailure::CreditLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_non_credit_card_mode_skips_limit_check() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![bank_account(
            "b1",
            "alice",
            dec!(500000),
            dec!(100),
        )]));
        let engine = engine_with(
            accounts,
            Arc::new(MockLedger::default()),
            Arc::new(MockBudgets::default()),
        );

        let outcome = engine
            .process_expense(
                "alice",
                &AccountRef::new(AccountKind::Bank, "b1"),
                dec!(5000),
                "Rent",
                "Net Banking",
                None,
                None,
            )
            .unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn test_kind_mismatch_is_business_failure() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(100),
        )]));
        let engine = engine_with(
            accounts,
            Arc::new(MockLedger::default()),
            Arc::new(MockBudgets::default()),
        );

        let outcome = engine
            .process_income(
                "alice",
                &AccountRef::new(AccountKind::Bank, "w1"),
                dec!(10),
                "Salary",
                "x",
            )
            .unwrap();
        assert!(!outcome.success);
        assert!(matches!(
            outcome.failure,
            Some(EngineFailure::InvalidAccountKind { .. })
        ));
    }

    #[test]
    fn test_expense_append_failure_restores_balance() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(1000),
        )]));
        let ledger = Arc::new(MockLedger::default());
        ledger.fail_next_append();
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        let result = engine.process_expense(
            "alice",
            &wallet_ref("w1"),
            dec!(100),
            "Food",
            "UPI",
            None,
            None,
        );
        assert!(result.is_err());
        assert_eq!(accounts.balance_of("w1"), dec!(1000));
        assert_eq!(ledger.record_count(), 0);
        assert_eq!(engine.undo_depth(), 0);
    }

    #[test]
    fn test_transfer_moves_funds_between_wallets() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![
            wallet_account("w1", "alice", dec!(1000)),
            wallet_account("w2", "bob", dec!(200)),
        ]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        let outcome = engine.process_transfer("alice", "bob", dec!(300)).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.resulting_balance, dec!(700));
        assert_eq!(accounts.balance_of("w1"), dec!(700));
        assert_eq!(accounts.balance_of("w2"), dec!(500));
        assert_eq!(ledger.record_count(), 2);
        assert_eq!(engine.undo_depth(), 1);
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![
            wallet_account("w1", "alice", dec!(100)),
            wallet_account("w2", "bob", dec!(0)),
        ]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        let outcome = engine.process_transfer("alice", "bob", dec!(300)).unwrap();
        assert!(!outcome.success);
        assert_eq!(accounts.balance_of("w1"), dec!(100));
        assert_eq!(accounts.balance_of("w2"), dec!(0));
        assert_eq!(ledger.record_count(), 0);
    }

    #[test]
    fn test_transfer_receiver_credit_failure_restores_sender() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![
            wallet_account("w1", "alice", dec!(1000)),
            wallet_account("w2", "bob", dec!(200)),
        ]));
        accounts.fail_next_set_balance("w2");
        let engine = engine_with(
            accounts.clone(),
            Arc::new(MockLedger::default()),
            Arc::new(MockBudgets::default()),
        );

        let result = engine.process_transfer("alice", "bob", dec!(300));
        assert!(result.is_err());
        assert_eq!(accounts.balance_of("w1"), dec!(1000));
        assert_eq!(accounts.balance_of("w2"), dec!(200));
    }

    #[test]
    fn test_transfer_append_failure_restores_both_balances() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![
            wallet_account("w1", "alice", dec!(1000)),
            wallet_account("w2", "bob", dec!(200)),
        ]));
        let ledger = Arc::new(MockLedger::default());
        ledger.fail_next_append();
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        let result = engine.process_transfer("alice", "bob", dec!(300));
        assert!(result.is_err());
        assert_eq!(accounts.balance_of("w1"), dec!(1000));
        assert_eq!(accounts.balance_of("w2"), dec!(200));
        assert_eq!(ledger.record_count(), 0);
    }

    #[test]
    fn test_transfer_to_self_rejected_before_any_mutation() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(1000),
        )]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        let outcome = engine
            .process_transfer("alice", "alice", dec!(100))
            .unwrap();

        assert!(!outcome.success);
        assert!(matches!(outcome.failure, Some(EngineFailure::SelfTransfer)));
        assert_eq!(accounts.balance_of("w1"), dec!(1000));
        assert_eq!(ledger.record_count(), 0);
        assert_eq!(engine.undo_depth(), 0);
    }

    #[test]
    fn test_undo_expense_appends_compensating_credit() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(1000),
        )]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        engine
            .process_expense(
                "alice",
                &wallet_ref("w1"),
                dec!(400),
                "Food",
                "UPI",
                None,
                None,
            )
            .unwrap();

        let outcome = engine.undo_last("alice").unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.resulting_balance, dec!(1000));
        assert_eq!(accounts.balance_of("w1"), dec!(1000));
        assert_eq!(ledger.record_count(), 2);
        let reversal = ledger.last_record();
        assert_eq!(reversal.txn_type, TransactionType::AdminCredit);
        assert_eq!(reversal.category, REVERSAL_CATEGORY);
        assert_eq!(engine.undo_depth(), 0);
    }

    #[test]
    fn test_undo_income_blocked_when_funds_spent() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(0),
        )]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        engine
            .process_income("alice", &wallet_ref("w1"), dec!(500), "Salary", "x")
            .unwrap();
        // Drain the balance outside the engine's view of history.
        accounts
            .set_balance(&wallet_ref("w1"), dec!(100))
            .unwrap();

        let outcome = engine.undo_last("alice").unwrap();
        assert!(!outcome.success);
        assert!(matches!(
            outcome.failure,
            Some(EngineFailure::NegativeBalanceWouldResult)
        ));
        // The entry goes back; a later undo attempt must still see it.
        assert_eq!(engine.undo_depth(), 1);
        assert_eq!(accounts.balance_of("w1"), dec!(100));
    }

    #[test]
    fn test_undo_transfer_reverses_both_wallets() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![
            wallet_account("w1", "alice", dec!(1000)),
            wallet_account("w2", "bob", dec!(200)),
        ]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        engine.process_transfer("alice", "bob", dec!(300)).unwrap();
        let outcome = engine.undo_last("alice").unwrap();

        assert!(outcome.success);
        assert_eq!(accounts.balance_of("w1"), dec!(1000));
        assert_eq!(accounts.balance_of("w2"), dec!(200));
        // Two transfer records plus two compensating records.
        assert_eq!(ledger.record_count(), 4);
    }

    #[test]
    fn test_undo_income_nets_parallel_income_ledger() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(0),
        )]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        engine
            .process_income("alice", &wallet_ref("w1"), dec!(500), "Salary", "Acme Corp")
            .unwrap();
        let outcome = engine.undo_last("alice").unwrap();
        assert!(outcome.success);

        let reversal = ledger.last_record();
        assert_eq!(reversal.txn_type, TransactionType::AdminDebit);
        assert_eq!(reversal.subtype.as_deref(), Some("INCOME"));

        let entries = ledger.income_entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].amount, dec!(-500));
        assert_eq!(entries[1].source, "Acme Corp");
        assert_eq!(entries[0].amount + entries[1].amount, Decimal::ZERO);
    }

    #[test]
    fn test_undo_transfer_append_failure_leaves_no_partial_reversal() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![
            wallet_account("w1", "alice", dec!(1000)),
            wallet_account("w2", "bob", dec!(200)),
        ]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );

        engine.process_transfer("alice", "bob", dec!(300)).unwrap();
        ledger.fail_next_append();

        let result = engine.undo_last("alice");
        assert!(result.is_err());
        // Balances back to their post-transfer values, no orphan reversal
        // record on either wallet, and the entry stays undoable.
        assert_eq!(accounts.balance_of("w1"), dec!(700));
        assert_eq!(accounts.balance_of("w2"), dec!(500));
        assert_eq!(ledger.record_count(), 2);
        assert_eq!(engine.undo_depth(), 1);
    }

    #[test]
    fn test_undo_transfer_blocked_when_receiver_spent() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![
            wallet_account("w1", "alice", dec!(1000)),
            wallet_account("w2", "bob", dec!(0)),
        ]));
        let engine = engine_with(
            accounts.clone(),
            Arc::new(MockLedger::default()),
            Arc::new(MockBudgets::default()),
        );

        engine.process_transfer("alice", "bob", dec!(300)).unwrap();
        accounts.set_balance(&wallet_ref("w2"), dec!(50)).unwrap();

        let outcome = engine.undo_last("alice").unwrap();
        assert!(!outcome.success);
        assert!(matches!(
            outcome.failure,
            Some(EngineFailure::ReceiverAlreadySpent)
        ));
        assert_eq!(engine.undo_depth(), 1);
    }

    #[test]
    fn test_undo_with_empty_history() {
        let engine = engine_with(
            Arc::new(MockAccountStore::default()),
            Arc::new(MockLedger::default()),
            Arc::new(MockBudgets::default()),
        );

        let outcome = engine.undo_last("alice").unwrap();
        assert!(!outcome.success);
        assert!(matches!(outcome.failure, Some(EngineFailure::NothingToUndo)));
    }

    #[test]
    fn test_undo_history_is_bounded() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(0),
        )]));
        let engine = engine_with(
            accounts,
            Arc::new(MockLedger::default()),
            Arc::new(MockBudgets::default()),
        );

        for _ in 0..(UNDO_HISTORY_CAPACITY + 5) {
            engine
                .process_income("alice", &wallet_ref("w1"), dec!(10), "Salary", "x")
                .unwrap();
        }
        assert_eq!(engine.undo_depth(), UNDO_HISTORY_CAPACITY);
    }

    #[test]
    fn test_admin_adjust_credit_and_debit() {
        let accounts = Arc::new(MockAccountStore::with_accounts(vec![wallet_account(
            "w1",
            "alice",
            dec!(100),
        )]));
        let ledger = Arc::new(MockLedger::default());
        let engine = engine_with(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MockBudgets::default()),
        );
        let account = wallet_ref("w1");

        let credit = engine
            .admin_adjust(
                "ops",
                &account,
                AdjustmentDirection::Credit,
                dec!(50),
                "correction",
            )
            .unwrap();
        assert!(credit.success);
        assert_eq!(credit.resulting_balance, dec!(150));
        assert_eq!(ledger.last_record().txn_type, TransactionType::AdminCredit);

        let debit = engine
            .admin_adjust(
                "ops",
                &account,
                AdjustmentDirection::Debit,
                dec!(150),
                "correction",
            )
            .unwrap();
        assert!(debit.success);
        assert_eq!(debit.resulting_balance, dec!(0));

        let overdraw = engine
            .admin_adjust(
                "ops",
                &account,
                AdjustmentDirection::Debit,
                dec!(1),
                "correction",
            )
            .unwrap();
        assert!(!overdraw.success);
        assert!(matches!(
            overdraw.failure,
            Some(EngineFailure::InsufficientFunds { .. })
        ));

        // Admin adjustments never enter the undo history.
        assert_eq!(engine.undo_depth(), 0);
    }
}
