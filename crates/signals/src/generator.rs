use crate::book::SignalBook;
use crate::classify::classify;
use binopt_core::{Signal, SignalGenConfig};
use binopt_feed::PriceBook;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

const SIGNAL_CHANNEL_CAPACITY: usize = 64;

/// Periodically evaluates every asset's recent history and publishes
/// directional signals with a short TTL. At most one signal is active per
/// asset; a fresh verdict supersedes the previous signal.
pub struct SignalGenerator {
    prices: Arc<PriceBook>,
    book: Arc<SignalBook>,
    config: SignalGenConfig,
    signal_tx: broadcast::Sender<Signal>,
}

impl SignalGenerator {
    #[must_use]
    pub fn new(prices: Arc<PriceBook>, book: Arc<SignalBook>, config: SignalGenConfig) -> Self {
        let (signal_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            prices,
            book,
            config,
            signal_tx,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.signal_tx.subscribe()
    }

    /// One evaluation pass over all assets. Assets still in warm-up are
    /// skipped silently; the generated signals are published to the book
    /// and broadcast fire-and-forget.
    pub fn evaluate_once(&self) -> Vec<Signal> {
        let now = Utc::now();
        let ttl = Duration::seconds(i64::try_from(self.config.ttl_secs).unwrap_or(30));
        let mut published = Vec::new();

        for asset in self.prices.assets() {
            let history = self.prices.history(&asset.id);
            let Some(verdict) = classify(&history, &self.config) else {
                continue;
            };

            let signal = Signal {
                id: Uuid::new_v4(),
                asset_id: asset.id.clone(),
                direction: verdict.direction,
                strength: verdict.strength,
                confidence: verdict.confidence,
                created_at: now,
                expires_at: now + ttl,
            };

            tracing::info!(
                asset = %asset.id,
                direction = ?signal.direction,
                strength = ?signal.strength,
                confidence = signal.confidence,
                "signal generated"
            );

            if let Some(old) = self.book.publish(signal.clone()) {
                tracing::debug!(asset = %asset.id, superseded = %old.id, "signal superseded");
            }
            let _ = self.signal_tx.send(signal.clone());
            published.push(signal);
        }

        self.book.prune(now);
        published
    }

    /// Runs the generation loop until shutdown is signalled.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(self.config.interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(
            "signal generator running, interval {}s",
            self.config.interval_secs
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let signals = self.evaluate_once();
                    tracing::debug!("published {} signals", signals.len());
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("signal generator shutting down");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binopt_core::{Asset, AssetCategory, Direction, SignalStrength};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn seeded_book(prices: &[Decimal]) -> Arc<PriceBook> {
        let book = Arc::new(PriceBook::new(300));
        book.seed(
            vec![Asset {
                id: "btc-usd".to_string(),
                symbol: "BTC/USD".to_string(),
                category: AssetCategory::Crypto,
                current_price: prices[0],
                volatility: dec!(100),
                payout_rate: dec!(0.85),
            }],
            Utc::now(),
        );
        for &price in &prices[1..] {
            book.apply_tick(binopt_core::PriceTick {
                asset_id: "btc-usd".to_string(),
                price,
                timestamp: Utc::now(),
            });
        }
        book
    }

    fn crash_prices() -> Vec<Decimal> {
        let mut prices = vec![dec!(100); 40];
        for i in 1..=8u32 {
            prices.push(dec!(100) - Decimal::from(i * 3));
        }
        prices
    }

    #[test]
    fn warm_up_assets_produce_no_signals() {
        let prices = seeded_book(&[dec!(100), dec!(101)]);
        let generator =
            SignalGenerator::new(prices, Arc::new(SignalBook::new()), SignalGenConfig::default());
        assert!(generator.evaluate_once().is_empty());
    }

    #[test]
    fn crash_produces_a_strong_call_and_broadcasts_it() {
        let prices = seeded_book(&crash_prices());
        let book = Arc::new(SignalBook::new());
        let generator = SignalGenerator::new(prices, book.clone(), SignalGenConfig::default());
        let mut rx = generator.subscribe();

        let signals = generator.evaluate_once();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Call);
        assert_eq!(signals[0].strength, SignalStrength::Strong);

        let received = rx.try_recv().unwrap();
        assert_eq!(received.id, signals[0].id);
        assert_eq!(book.active("btc-usd", Utc::now()).unwrap().id, signals[0].id);
    }

    #[test]
    fn repeated_evaluation_keeps_one_active_signal_per_asset() {
        let prices = seeded_book(&crash_prices());
        let book = Arc::new(SignalBook::new());
        let generator = SignalGenerator::new(prices, book.clone(), SignalGenConfig::default());

        generator.evaluate_once();
        let second = generator.evaluate_once();
        assert_eq!(second.len(), 1);
        let active = book.active_all(Utc::now());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second[0].id);
    }
}
