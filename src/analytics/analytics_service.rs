use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::analytics_model::{
    BudgetHealth, BudgetUsage, CategorySpend, HealthScore, IncomeSource, MonthlySummary,
    TrendPoint,
};
use super::analytics_traits::AnalyticsServiceTrait;
use crate::budgets::BudgetRepositoryTrait;
use crate::errors::Result;
use crate::ledger::LedgerRepositoryTrait;
use crate::utils::{current_month_key, shift_month_back, validate_month_key};

const ON_TRACK_THRESHOLD: Decimal = Decimal::from_parts(70, 0, 0, false, 2); // 0.70
const SAVINGS_COMPONENT_MAX: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
const BUDGET_COMPONENT_MAX: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
const NET_COMPONENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Read-side reporting over ledger rows. Sums are taken over `Decimal` in
/// Rust; SQLite's SUM would round through floats.
pub struct AnalyticsService {
    ledger: Arc<dyn LedgerRepositoryTrait>,
    budgets: Arc<dyn BudgetRepositoryTrait>,
}

impl AnalyticsService {
    /// Creates a new AnalyticsService instance
    pub fn new(
        ledger: Arc<dyn LedgerRepositoryTrait>,
        budgets: Arc<dyn BudgetRepositoryTrait>,
    ) -> Self {
        Self { ledger, budgets }
    }

    fn usage_of(limit: Decimal, spent: Decimal) -> BudgetHealth {
        if limit <= Decimal::ZERO {
            return BudgetHealth::OverBudget;
        }
        let used = spent / limit;
        if used <= ON_TRACK_THRESHOLD {
            BudgetHealth::OnTrack
        } else if used <= Decimal::ONE {
            BudgetHealth::ApproachingLimit
        } else {
            BudgetHealth::OverBudget
        }
    }
}

impl AnalyticsServiceTrait for AnalyticsService {
    fn monthly_summary(&self, user_id: &str, month: &str) -> Result<MonthlySummary> {
        validate_month_key(month)?;
        let (income, expense) = self.ledger.monthly_totals(user_id, month)?;
        let net = income - expense;
        let savings_rate = if income > Decimal::ZERO {
            (net / income).round_dp(4)
        } else {
            Decimal::ZERO
        };
        Ok(MonthlySummary {
            month: month.to_string(),
            income,
            expense,
            net,
            savings_rate,
        })
    }

    fn category_breakdown(&self, user_id: &str, month: &str) -> Result<Vec<CategorySpend>> {
        validate_month_key(month)?;
        let totals = self.ledger.expense_totals_by_category(user_id, month)?;
        let grand_total: Decimal = totals.iter().map(|(_, amount)| *amount).sum();

        Ok(totals
            .into_iter()
            .map(|(category, amount)| {
                let percent = if grand_total > Decimal::ZERO {
                    (amount / grand_total * Decimal::ONE_HUNDRED).round_dp(2)
                } else {
                    Decimal::ZERO
                };
                CategorySpend {
                    category,
                    amount,
                    percent,
                }
            })
            .collect())
    }

    fn spending_trend(&self, user_id: &str, months_back: u32) -> Result<Vec<TrendPoint>> {
        let current = current_month_key();
        let mut points = Vec::with_capacity(months_back as usize);
        // Oldest first, ending at the current month.
        for offset in (0..months_back).rev() {
            let month = shift_month_back(&current, offset)?;
            let (income, expense) = self.ledger.monthly_totals(user_id, &month)?;
            points.push(TrendPoint {
                month,
                income,
                expense,
                net: income - expense,
            });
        }
        Ok(points)
    }

    fn budget_vs_actual(&self, user_id: &str, month: &str) -> Result<Vec<BudgetUsage>> {
        validate_month_key(month)?;
        let budgets = self.budgets.list_for_month(user_id, month)?;
        let mut usages = Vec::with_capacity(budgets.len());
        for budget in budgets {
            let spent = self
                .ledger
                .sum_expenses(user_id, &budget.category, month)?;
            usages.push(BudgetUsage {
                category: budget.category,
                limit: budget.limit_amount,
                spent,
                remaining: budget.limit_amount - spent,
                health: Self::usage_of(budget.limit_amount, spent),
            });
        }
        Ok(usages)
    }

    /// Deterministic 0-100 composite: up to 50 for the savings rate, up to 30
    /// for budget adherence (full marks when no budget is overrun, and when
    /// no budgets are set), 20 for a positive net month.
    fn health_score(&self, user_id: &str, month: &str) -> Result<HealthScore> {
        let summary = self.monthly_summary(user_id, month)?;

        let savings_component = (summary.savings_rate.clamp(Decimal::ZERO, Decimal::ONE)
            * SAVINGS_COMPONENT_MAX)
            .round_dp(2);

        let usages = self.budget_vs_actual(user_id, month)?;
        let budget_component = if usages.is_empty() {
            BUDGET_COMPONENT_MAX
        } else {
            let kept = usages
                .iter()
                .filter(|u| u.health != BudgetHealth::OverBudget)
                .count();
            (Decimal::from(kept) / Decimal::from(usages.len()) * BUDGET_COMPONENT_MAX).round_dp(2)
        };

        let net_component = if summary.net > Decimal::ZERO {
            NET_COMPONENT
        } else {
            Decimal::ZERO
        };

        Ok(HealthScore {
            month: month.to_string(),
            score: savings_component + budget_component + net_component,
            savings_component,
            budget_component,
            net_component,
        })
    }

    fn income_sources(&self, user_id: &str, month: &str) -> Result<Vec<IncomeSource>> {
        validate_month_key(month)?;
        let entries = self.ledger.income_entries_for_month(user_id, month)?;

        let mut by_source: HashMap<String, Decimal> = HashMap::new();
        for entry in entries {
            *by_source.entry(entry.source).or_insert(Decimal::ZERO) += entry.amount;
        }

        // Undone income leaves a negative entry under the same source; a
        // source that nets to nothing is not an income source.
        let mut sources: Vec<IncomeSource> = by_source
            .into_iter()
            .filter(|(_, amount)| *amount > Decimal::ZERO)
            .map(|(source, amount)| IncomeSource { source, amount })
            .collect();
        sources.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.source.cmp(&b.source)));
        Ok(sources)
    }
}
