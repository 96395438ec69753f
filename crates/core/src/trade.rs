use crate::market::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trade lifecycle. `Pending` is the only non-terminal state; terminal
/// trades are immutable and the transition is applied exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Pending,
    Won,
    Lost,
    Cancelled,
}

impl TradeStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOutcome {
    Win,
    Loss,
}

/// A stake-based binary option position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub user_id: String,
    pub asset_id: String,
    pub direction: Direction,
    pub stake: Decimal,
    pub entry_price: Decimal,
    /// Effective rate at placement: asset rate x timeframe multiplier x global multiplier.
    pub payout_rate: Decimal,
    pub placed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: TradeStatus,
    pub exit_price: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Whether the trade has reached its expiry deadline.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Profit on a win: `stake x payout_rate`.
    #[must_use]
    pub fn win_profit(&self) -> Decimal {
        self.stake * self.payout_rate
    }
}

/// Terminal fields written by the conditional status update.
#[derive(Debug, Clone)]
pub struct TerminalFields {
    pub exit_price: Option<Decimal>,
    pub profit_loss: Decimal,
    pub settled_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_trade() -> Trade {
        let now = Utc::now();
        Trade {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            asset_id: "btc".to_string(),
            direction: Direction::Call,
            stake: dec!(100),
            entry_price: dec!(45000),
            payout_rate: dec!(0.8),
            placed_at: now,
            expires_at: now + chrono::Duration::seconds(60),
            status: TradeStatus::Pending,
            exit_price: None,
            profit_loss: None,
            settled_at: None,
        }
    }

    #[test]
    fn win_profit_is_stake_times_rate() {
        assert_eq!(sample_trade().win_profit(), dec!(80.0));
    }

    #[test]
    fn pending_is_the_only_non_terminal_status() {
        assert!(!TradeStatus::Pending.is_terminal());
        assert!(TradeStatus::Won.is_terminal());
        assert!(TradeStatus::Lost.is_terminal());
        assert!(TradeStatus::Cancelled.is_terminal());
    }

    #[test]
    fn expiry_is_a_hard_deadline() {
        let trade = sample_trade();
        assert!(!trade.is_expired(trade.placed_at));
        assert!(trade.is_expired(trade.expires_at));
    }
}
