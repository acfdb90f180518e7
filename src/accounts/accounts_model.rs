use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::accounts_errors::{AccountError, Result};
use crate::utils::parse_stored_decimal;

/// The four structurally different account kinds unified under one
/// transaction protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Wallet,
    Bank,
    Investment,
    Manual,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Wallet => "WALLET",
            AccountKind::Bank => "BANK",
            AccountKind::Investment => "INVESTMENT",
            AccountKind::Manual => "MANUAL",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "WALLET" => Ok(AccountKind::Wallet),
            "BANK" => Ok(AccountKind::Bank),
            "INVESTMENT" => Ok(AccountKind::Investment),
            "MANUAL" => Ok(AccountKind::Manual),
            other => Err(AccountError::InvalidData(format!(
                "Unknown account kind '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite reference to one account instance. Every balance operation
/// takes a reference, and a kind that disagrees with the stored row is
/// rejected rather than silently coerced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRef {
    pub kind: AccountKind,
    pub account_id: String,
}

impl AccountRef {
    pub fn new(kind: AccountKind, account_id: impl Into<String>) -> Self {
        Self {
            kind,
            account_id: account_id.into(),
        }
    }
}

/// Kind-specific metadata carried by an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AccountDetails {
    Wallet,
    Bank {
        bank_name: String,
        ifsc: String,
        last_four: String,
        credit_card_limit: Decimal,
    },
    Investment {
        symbol: String,
        quantity: Decimal,
        price_per_share: Decimal,
        invested_amount: Decimal,
    },
    Manual,
}

impl AccountDetails {
    pub fn kind(&self) -> AccountKind {
        match self {
            AccountDetails::Wallet => AccountKind::Wallet,
            AccountDetails::Bank { .. } => AccountKind::Bank,
            AccountDetails::Investment { .. } => AccountKind::Investment,
            AccountDetails::Manual => AccountKind::Manual,
        }
    }
}

/// Domain model representing an account. `balance` is the current monetary
/// value for every kind (investment accounts treat it as current value).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub balance: Decimal,
    pub details: AccountDetails,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Account {
    pub fn account_ref(&self) -> AccountRef {
        AccountRef::new(self.kind, self.id.clone())
    }
}

/// Input model for creating a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub opening_balance: Decimal,
    pub details: AccountDetails,
}

impl NewAccount {
    /// Validates the new account data
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(AccountError::InvalidData(
                "Account owner cannot be empty".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(AccountError::InvalidData(
                "Account name cannot be empty".to_string(),
            ));
        }
        if self.opening_balance < Decimal::ZERO {
            return Err(AccountError::InvalidData(
                "Opening balance cannot be negative".to_string(),
            ));
        }
        match &self.details {
            AccountDetails::Bank {
                bank_name,
                credit_card_limit,
                ..
            } => {
                if bank_name.trim().is_empty() {
                    return Err(AccountError::InvalidData(
                        "Bank name cannot be empty".to_string(),
                    ));
                }
                if *credit_card_limit < Decimal::ZERO {
                    return Err(AccountError::InvalidData(
                        "Credit card limit cannot be negative".to_string(),
                    ));
                }
            }
            AccountDetails::Investment {
                symbol, quantity, ..
            } => {
                if symbol.trim().is_empty() {
                    return Err(AccountError::InvalidData(
                        "Investment symbol cannot be empty".to_string(),
                    ));
                }
                if *quantity < Decimal::ZERO {
                    return Err(AccountError::InvalidData(
                        "Investment quantity cannot be negative".to_string(),
                    ));
                }
            }
            AccountDetails::Wallet | AccountDetails::Manual => {}
        }
        Ok(())
    }
}

/// Database model for accounts
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub kind: String,
    pub balance: String,
    pub bank_name: Option<String>,
    pub ifsc: Option<String>,
    pub last_four: Option<String>,
    pub credit_card_limit: Option<String>,
    pub symbol: Option<String>,
    pub quantity: Option<String>,
    pub price_per_share: Option<String>,
    pub invested_amount: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A stored amount that does not parse is data corruption, surfaced rather
/// than coerced into a plausible balance.
fn stored_decimal(value: &str, field: &str) -> Result<Decimal> {
    parse_stored_decimal(value, field).map_err(|e| AccountError::InvalidData(e.to_string()))
}

fn opt_decimal(value: &Option<String>, field: &str) -> Result<Decimal> {
    match value.as_deref() {
        Some(v) => stored_decimal(v, field),
        None => Ok(Decimal::ZERO),
    }
}

impl TryFrom<AccountDB> for Account {
    type Error = AccountError;

    fn try_from(db: AccountDB) -> Result<Account> {
        let kind = AccountKind::parse(&db.kind)?;
        let details = match kind {
            AccountKind::Wallet => AccountDetails::Wallet,
            AccountKind::Manual => AccountDetails::Manual,
            AccountKind::Bank => AccountDetails::Bank {
                bank_name: db.bank_name.clone().unwrap_or_default(),
                ifsc: db.ifsc.clone().unwrap_or_default(),
                last_four: db.last_four.clone().unwrap_or_default(),
                credit_card_limit: opt_decimal(&db.credit_card_limit, "credit_card_limit")?,
            },
            AccountKind::Investment => AccountDetails::Investment {
                symbol: db.symbol.clone().unwrap_or_default(),
                quantity: opt_decimal(&db.quantity, "quantity")?,
                price_per_share: opt_decimal(&db.price_per_share, "price_per_share")?,
                invested_amount: opt_decimal(&db.invested_amount, "invested_amount")?,
            },
        };

        Ok(Account {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            kind,
            balance: stored_decimal(&db.balance, "balance")?,
            details,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<NewAccount> for AccountDB {
    fn from(domain: NewAccount) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let kind = domain.details.kind();
        let mut db = AccountDB {
            id: domain.id.unwrap_or_default(),
            user_id: domain.user_id,
            name: domain.name,
            kind: kind.as_str().to_string(),
            balance: domain.opening_balance.to_string(),
            bank_name: None,
            ifsc: None,
            last_four: None,
            credit_card_limit: None,
            symbol: None,
            quantity: None,
            price_per_share: None,
            invested_amount: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        match domain.details {
            AccountDetails::Bank {
                bank_name,
                ifsc,
                last_four,
                credit_card_limit,
            } => {
                db.bank_name = Some(bank_name);
                db.ifsc = Some(ifsc);
                db.last_four = Some(last_four);
                db.credit_card_limit = Some(credit_card_limit.to_string());
            }
            AccountDetails::Investment {
                symbol,
                quantity,
                price_per_share,
                invested_amount,
            } => {
                db.symbol = Some(symbol);
                db.quantity = Some(quantity.to_string());
                db.price_per_share = Some(price_per_share.to_string());
                db.invested_amount = Some(invested_amount.to_string());
            }
            AccountDetails::Wallet | AccountDetails::Manual => {}
        }
        db
    }
}
