use log::{debug, error};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::investments_model::{InvestmentPosition, PurchaseOutcome};
use crate::accounts::{AccountDetails, AccountRef, AccountStoreTrait};
use crate::constants::INVESTMENT_PURCHASE_CATEGORY;
use crate::engine::{AdjustmentDirection, TransactionEngineTrait};
use crate::errors::{Error, Result, ValidationError};
use crate::pricing::PricingService;

/// Buys into an investment account out of a funding wallet. Price resolution,
/// the wallet debit and the investment credit all go through the shared
/// services; this service only owns the position arithmetic.
pub struct InvestmentService {
    accounts: Arc<dyn AccountStoreTrait>,
    engine: Arc<dyn TransactionEngineTrait>,
    pricing: Arc<PricingService>,
}

impl InvestmentService {
    /// Creates a new InvestmentService instance
    pub fn new(
        accounts: Arc<dyn AccountStoreTrait>,
        engine: Arc<dyn TransactionEngineTrait>,
        pricing: Arc<PricingService>,
    ) -> Self {
        Self {
            accounts,
            engine,
            pricing,
        }
    }

    pub fn purchase(
        &self,
        principal: &str,
        investment_ref: &AccountRef,
        funding_wallet_user: &str,
        quantity: Decimal,
        manual_price: Option<Decimal>,
    ) -> Result<PurchaseOutcome> {
        if quantity <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::NonPositiveAmount(
                quantity,
            )));
        }

        let account = self.accounts.get(investment_ref)?;
        let (symbol, held_quantity, price_per_share, invested_amount) = match &account.details {
            AccountDetails::Investment {
                symbol,
                quantity,
                price_per_share,
                invested_amount,
            } => (
                symbol.clone(),
                *quantity,
                *price_per_share,
                *invested_amount,
            ),
            _ => {
                return Err(Error::Account(crate::accounts::AccountError::InvalidData(
                    format!("Account {} carries no investment details", account.id),
                )))
            }
        };

        let quote = self
            .pricing
            .resolve_price(&symbol, manual_price, Some(price_per_share))?;
        let cost = (quote.price * quantity).round_dp(2);

        let wallet = self.accounts.get_wallet_for_user(funding_wallet_user)?;
        let wallet_ref = wallet.account_ref();
        let debit = self.engine.process_expense(
            principal,
            &wallet_ref,
            cost,
            INVESTMENT_PURCHASE_CATEGORY,
            "Wallet",
            Some(&format!("Buy {} x {}", quantity, symbol)),
            Some(&symbol),
        )?;
        if !debit.success {
            return Ok(PurchaseOutcome {
                outcome: debit,
                quote: Some(quote),
                position: None,
            });
        }

        let credit = self.engine.process_income(
            principal,
            investment_ref,
            cost,
            INVESTMENT_PURCHASE_CATEGORY,
            &format!("Purchase of {} x {}", quantity, symbol),
        );
        match credit {
            Ok(outcome) if outcome.success => {}
            Ok(outcome) => {
                self.refund_wallet(principal, &wallet_ref, cost);
                return Ok(PurchaseOutcome {
                    outcome,
                    quote: Some(quote),
                    position: None,
                });
            }
            Err(e) => {
                self.refund_wallet(principal, &wallet_ref, cost);
                return Err(e);
            }
        }

        let new_quantity = held_quantity + quantity;
        let new_invested = invested_amount + cost;
        // Blended weighted-average cost across all purchases of the symbol.
        let average_cost = (new_invested / new_quantity).round_dp(2);
        self.accounts.update_investment_position(
            &investment_ref.account_id,
            new_quantity,
            average_cost,
            new_invested,
        )?;

        debug!(
            "Position {}: {} units at blended cost {}",
            symbol, new_quantity, average_cost
        );

        Ok(PurchaseOutcome {
            outcome: debit,
            quote: Some(quote),
            position: Some(InvestmentPosition {
                account_id: investment_ref.account_id.clone(),
                symbol,
                quantity: new_quantity,
                average_cost,
                invested_amount: new_invested,
            }),
        })
    }

    /// Puts the money back in the wallet after a failed investment-side
    /// credit. The admin credit leaves its own ledger record.
    fn refund_wallet(&self, principal: &str, wallet_ref: &AccountRef, amount: Decimal) {
        if let Err(e) = self.engine.admin_adjust(
            principal,
            wallet_ref,
            AdjustmentDirection::Credit,
            amount,
            "Refund of failed investment purchase",
        ) {
            error!(
                "Refund of {} to wallet {} failed after aborted purchase: {}",
                amount, wallet_ref.account_id, e
            );
        }
    }
}
