use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user balance record.
///
/// Invariants: `balance >= 0`, `locked >= 0`, and `locked` equals the sum
/// of stakes over the user's pending trades in this currency. Every
/// mutation goes through `WalletStore` as an atomic delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: String,
    pub currency: String,
    pub balance: Decimal,
    pub locked: Decimal,
}

impl Wallet {
    #[must_use]
    pub fn new(user_id: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            currency: currency.into(),
            balance: Decimal::ZERO,
            locked: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Stake moved from balance to locked at placement.
    TradeStake,
    /// Stake plus profit credited to balance on a win.
    TradePayout,
    /// Stake forfeited from locked funds on a loss.
    TradeForfeit,
    /// Stake released back to balance on administrative cancellation.
    TradeRefund,
}

/// Append-only audit record, one per ledger mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub tx_type: TransactionType,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        tx_type: TransactionType,
        amount: Decimal,
        balance_after: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            tx_type,
            amount,
            balance_after,
            reason: reason.into(),
            created_at: Utc::now(),
        }
    }
}
