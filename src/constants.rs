/// Month key format used throughout the ledger (e.g. "2024-01")
pub const MONTH_KEY_FORMAT: &str = "%Y-%m";

/// Payment mode that triggers the credit-card limit check on bank expenses
pub const PAYMENT_MODE_CREDIT_CARD: &str = "Credit Card";

/// Category that counts against a bank account's credit-card limit
pub const CREDIT_CARD_PAYMENT_CATEGORY: &str = "Credit Card Payment";

/// Category written on goal-funding wallet expenses
pub const GOAL_CONTRIBUTION_CATEGORY: &str = "Goal Contribution";

/// Category written on investment purchase movements
pub const INVESTMENT_PURCHASE_CATEGORY: &str = "Investment Purchase";

/// Category written on compensating (undo) records
pub const REVERSAL_CATEGORY: &str = "Reversal";

/// Most-recent engine mutations kept undoable
pub const UNDO_HISTORY_CAPACITY: usize = 10;

/// Decimal precision for display amounts
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;
