use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tradable instrument. Price is mutated only by the feed simulator;
/// `volatility` and `payout_rate` come from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub category: AssetCategory,
    pub current_price: Decimal,
    /// Maximum absolute price move per tick, in price units.
    pub volatility: Decimal,
    /// Base fraction of stake paid as profit on a win.
    pub payout_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Crypto,
    Forex,
    Commodity,
    Stock,
}

/// One point of the simulated price series for an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    pub asset_id: String,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Call,
    Put,
}

impl Direction {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Call => Self::Put,
            Self::Put => Self::Call,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrength {
    Weak,
    Medium,
    Strong,
}

/// A time-boxed directional recommendation derived from indicators.
///
/// At most one signal is active per asset at a time; publishing a new
/// signal supersedes the previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub asset_id: String,
    pub direction: Direction,
    pub strength: SignalStrength,
    /// Indicator agreement score in `[0, 1]`.
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Signal {
    /// Whether the signal is still live at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn direction_opposite_flips() {
        assert_eq!(Direction::Call.opposite(), Direction::Put);
        assert_eq!(Direction::Put.opposite(), Direction::Call);
    }

    #[test]
    fn signal_active_until_expiry() {
        let now = Utc::now();
        let signal = Signal {
            id: Uuid::new_v4(),
            asset_id: "btc".to_string(),
            direction: Direction::Call,
            strength: SignalStrength::Strong,
            confidence: 0.9,
            created_at: now,
            expires_at: now + Duration::seconds(30),
        };
        assert!(signal.is_active(now));
        assert!(!signal.is_active(now + Duration::seconds(31)));
    }

    #[test]
    fn strength_orders_weak_to_strong() {
        assert!(SignalStrength::Weak < SignalStrength::Medium);
        assert!(SignalStrength::Medium < SignalStrength::Strong);
    }
}
