use binopt_core::{PlacementError, TradingConfig};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct DayCounters {
    day: NaiveDate,
    trades: u32,
    losses: Decimal,
}

/// Per-user daily risk counters: number of trades placed and total losses
/// realized today. Counters roll over on the UTC date change.
#[derive(Default)]
pub struct RiskTracker {
    inner: Mutex<HashMap<String, DayCounters>>,
}

impl RiskTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the placement when either daily limit has been reached.
    ///
    /// # Errors
    ///
    /// `DailyTradeLimit` or `DailyLossLimit` with the configured limit.
    pub fn check(
        &self,
        user_id: &str,
        config: &TradingConfig,
        now: DateTime<Utc>,
    ) -> Result<(), PlacementError> {
        let inner = self.inner.lock().expect("risk tracker lock poisoned");
        let Some(counters) = inner.get(user_id) else {
            return Ok(());
        };
        if counters.day != now.date_naive() {
            return Ok(());
        }
        if counters.trades >= config.daily_trade_limit {
            return Err(PlacementError::DailyTradeLimit {
                limit: config.daily_trade_limit,
            });
        }
        if counters.losses >= config.daily_loss_limit {
            return Err(PlacementError::DailyLossLimit {
                limit: config.daily_loss_limit,
            });
        }
        Ok(())
    }

    pub fn record_trade(&self, user_id: &str, now: DateTime<Utc>) {
        let mut inner = self.inner.lock().expect("risk tracker lock poisoned");
        let counters = Self::today(&mut inner, user_id, now);
        counters.trades += 1;
    }

    pub fn record_loss(&self, user_id: &str, amount: Decimal, now: DateTime<Utc>) {
        let mut inner = self.inner.lock().expect("risk tracker lock poisoned");
        let counters = Self::today(&mut inner, user_id, now);
        counters.losses += amount;
    }

    fn today<'a>(
        inner: &'a mut HashMap<String, DayCounters>,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> &'a mut DayCounters {
        let counters = inner
            .entry(user_id.to_string())
            .or_insert_with(|| DayCounters {
                day: now.date_naive(),
                trades: 0,
                losses: Decimal::ZERO,
            });
        if counters.day != now.date_naive() {
            counters.day = now.date_naive();
            counters.trades = 0;
            counters.losses = Decimal::ZERO;
        }
        counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limits(trades: u32, losses: Decimal) -> TradingConfig {
        TradingConfig {
            daily_trade_limit: trades,
            daily_loss_limit: losses,
            ..TradingConfig::default()
        }
    }

    #[test]
    fn fresh_user_passes() {
        let tracker = RiskTracker::new();
        assert!(tracker.check("u1", &limits(2, dec!(100)), Utc::now()).is_ok());
    }

    #[test]
    fn trade_count_limit_is_enforced() {
        let tracker = RiskTracker::new();
        let config = limits(2, dec!(100));
        let now = Utc::now();
        tracker.record_trade("u1", now);
        tracker.record_trade("u1", now);
        assert_eq!(
            tracker.check("u1", &config, now),
            Err(PlacementError::DailyTradeLimit { limit: 2 })
        );
        // A different user is unaffected.
        assert!(tracker.check("u2", &config, now).is_ok());
    }

    #[test]
    fn loss_limit_is_enforced() {
        let tracker = RiskTracker::new();
        let config = limits(50, dec!(100));
        let now = Utc::now();
        tracker.record_loss("u1", dec!(100), now);
        assert_eq!(
            tracker.check("u1", &config, now),
            Err(PlacementError::DailyLossLimit { limit: dec!(100) })
        );
    }

    #[test]
    fn counters_roll_over_on_date_change() {
        let tracker = RiskTracker::new();
        let config = limits(1, dec!(100));
        let yesterday = Utc::now() - chrono::Duration::days(1);
        tracker.record_trade("u1", yesterday);
        assert!(tracker.check("u1", &config, Utc::now()).is_ok());
    }
}
