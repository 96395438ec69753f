use binopt_core::{Asset, PriceTick};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

struct AssetSeries {
    asset: Asset,
    ticks: std::collections::VecDeque<PriceTick>,
}

/// Shared price state: one bounded tick history per asset.
///
/// Single writer (the simulator), many readers. Readers never need a
/// multi-field snapshot, so a plain `RwLock` around the map with short
/// critical sections is sufficient; all read methods return owned data.
pub struct PriceBook {
    window: usize,
    inner: RwLock<HashMap<String, AssetSeries>>,
}

impl PriceBook {
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Registers assets, seeding each history with the current price.
    /// Re-seeding an existing asset keeps its history and updates the
    /// configured volatility and payout rate.
    pub fn seed(&self, assets: Vec<Asset>, now: DateTime<Utc>) {
        let mut inner = self.inner.write().expect("price book lock poisoned");
        for asset in assets {
            match inner.get_mut(&asset.id) {
                Some(series) => {
                    series.asset.volatility = asset.volatility;
                    series.asset.payout_rate = asset.payout_rate;
                }
                None => {
                    let tick = PriceTick {
                        asset_id: asset.id.clone(),
                        price: asset.current_price,
                        timestamp: now,
                    };
                    let mut ticks = std::collections::VecDeque::with_capacity(self.window);
                    ticks.push_back(tick);
                    inner.insert(asset.id.clone(), AssetSeries { asset, ticks });
                }
            }
        }
    }

    #[must_use]
    pub fn asset(&self, asset_id: &str) -> Option<Asset> {
        let inner = self.inner.read().expect("price book lock poisoned");
        inner.get(asset_id).map(|s| s.asset.clone())
    }

    #[must_use]
    pub fn assets(&self) -> Vec<Asset> {
        let inner = self.inner.read().expect("price book lock poisoned");
        inner.values().map(|s| s.asset.clone()).collect()
    }

    #[must_use]
    pub fn current_price(&self, asset_id: &str) -> Option<Decimal> {
        let inner = self.inner.read().expect("price book lock poisoned");
        inner.get(asset_id).map(|s| s.asset.current_price)
    }

    /// Price history, oldest to newest.
    #[must_use]
    pub fn history(&self, asset_id: &str) -> Vec<Decimal> {
        let inner = self.inner.read().expect("price book lock poisoned");
        inner
            .get(asset_id)
            .map(|s| s.ticks.iter().map(|t| t.price).collect())
            .unwrap_or_default()
    }

    /// Full ticks, oldest to newest.
    #[must_use]
    pub fn ticks(&self, asset_id: &str) -> Vec<PriceTick> {
        let inner = self.inner.read().expect("price book lock poisoned");
        inner
            .get(asset_id)
            .map(|s| s.ticks.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Appends a tick, evicting the oldest beyond the window. Timestamps
    /// are forced strictly monotonic per asset; the returned tick is the
    /// one actually stored. Writer side of the book: called by the
    /// simulator, which is the single writer per asset.
    pub fn apply_tick(&self, mut tick: PriceTick) -> Option<PriceTick> {
        let mut inner = self.inner.write().expect("price book lock poisoned");
        let series = inner.get_mut(&tick.asset_id)?;

        if let Some(last) = series.ticks.back() {
            if tick.timestamp <= last.timestamp {
                tick.timestamp = last.timestamp + chrono::Duration::milliseconds(1);
            }
        }

        series.asset.current_price = tick.price;
        series.ticks.push_back(tick.clone());
        while series.ticks.len() > self.window {
            series.ticks.pop_front();
        }
        Some(tick)
    }
}
