use binopt_core::Signal;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Holds the at-most-one active signal per asset.
///
/// Publishing replaces any previous signal for the asset, whether or not
/// that signal had expired; reads filter out expired entries.
pub struct SignalBook {
    inner: RwLock<HashMap<String, Signal>>,
}

impl Default for SignalBook {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBook {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Installs `signal` as the active signal for its asset, returning
    /// the superseded one if any.
    pub fn publish(&self, signal: Signal) -> Option<Signal> {
        let mut inner = self.inner.write().expect("signal book lock poisoned");
        inner.insert(signal.asset_id.clone(), signal)
    }

    /// The active (unexpired) signal for an asset.
    #[must_use]
    pub fn active(&self, asset_id: &str, now: DateTime<Utc>) -> Option<Signal> {
        let inner = self.inner.read().expect("signal book lock poisoned");
        inner
            .get(asset_id)
            .filter(|s| s.is_active(now))
            .cloned()
    }

    /// All active signals across assets.
    #[must_use]
    pub fn active_all(&self, now: DateTime<Utc>) -> Vec<Signal> {
        let inner = self.inner.read().expect("signal book lock poisoned");
        inner.values().filter(|s| s.is_active(now)).cloned().collect()
    }

    /// Drops expired entries. Correctness does not depend on this; it
    /// only bounds memory over long runs.
    pub fn prune(&self, now: DateTime<Utc>) {
        let mut inner = self.inner.write().expect("signal book lock poisoned");
        inner.retain(|_, s| s.is_active(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binopt_core::{Direction, SignalStrength};
    use chrono::Duration;
    use uuid::Uuid;

    fn signal(asset: &str, direction: Direction, ttl_secs: i64) -> Signal {
        let now = Utc::now();
        Signal {
            id: Uuid::new_v4(),
            asset_id: asset.to_string(),
            direction,
            strength: SignalStrength::Medium,
            confidence: 0.6,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_secs),
        }
    }

    #[test]
    fn publishing_supersedes_the_active_signal() {
        let book = SignalBook::new();
        let first = signal("btc-usd", Direction::Call, 30);
        let first_id = first.id;
        assert!(book.publish(first).is_none());

        let superseded = book.publish(signal("btc-usd", Direction::Put, 30)).unwrap();
        assert_eq!(superseded.id, first_id);

        let active = book.active("btc-usd", Utc::now()).unwrap();
        assert_eq!(active.direction, Direction::Put);
        assert_eq!(book.active_all(Utc::now()).len(), 1);
    }

    #[test]
    fn expired_signals_are_not_active() {
        let book = SignalBook::new();
        book.publish(signal("btc-usd", Direction::Call, -1));
        assert!(book.active("btc-usd", Utc::now()).is_none());
    }

    #[test]
    fn signals_for_different_assets_coexist() {
        let book = SignalBook::new();
        book.publish(signal("btc-usd", Direction::Call, 30));
        book.publish(signal("eur-usd", Direction::Put, 30));
        assert_eq!(book.active_all(Utc::now()).len(), 2);
    }

    #[test]
    fn prune_drops_expired_entries() {
        let book = SignalBook::new();
        book.publish(signal("btc-usd", Direction::Call, -1));
        book.publish(signal("eur-usd", Direction::Put, 30));
        book.prune(Utc::now());
        assert!(book.active("eur-usd", Utc::now()).is_some());
        assert_eq!(book.active_all(Utc::now()).len(), 1);
    }
}
