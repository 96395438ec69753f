use crate::market::{Asset, AssetCategory};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub signals: SignalGenConfig,
    pub trading: TradingConfig,
    pub settlement: SettlementConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Price advancement cadence in milliseconds.
    pub tick_interval_ms: u64,
    /// Ring buffer size per asset; older ticks are evicted.
    pub history_window: usize,
    /// Asset universe. Empty means "use the built-in fallback table" so
    /// that startup never fails for lack of configuration.
    pub assets: Vec<AssetConfig>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            history_window: 300,
            assets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub id: String,
    pub symbol: String,
    pub category: AssetCategory,
    pub initial_price: Decimal,
    pub volatility: Decimal,
    pub payout_rate: Decimal,
}

impl From<AssetConfig> for Asset {
    fn from(cfg: AssetConfig) -> Self {
        Self {
            id: cfg.id,
            symbol: cfg.symbol,
            category: cfg.category,
            current_price: cfg.initial_price,
            volatility: cfg.volatility,
            payout_rate: cfg.payout_rate,
        }
    }
}

/// Static seed table used when no assets are configured. Volatility is in
/// price units per tick and spans orders of magnitude across categories.
#[must_use]
pub fn fallback_assets() -> Vec<AssetConfig> {
    vec![
        AssetConfig {
            id: "btc-usd".to_string(),
            symbol: "BTC/USD".to_string(),
            category: AssetCategory::Crypto,
            initial_price: dec!(45000),
            volatility: dec!(100),
            payout_rate: dec!(0.85),
        },
        AssetConfig {
            id: "eth-usd".to_string(),
            symbol: "ETH/USD".to_string(),
            category: AssetCategory::Crypto,
            initial_price: dec!(2500),
            volatility: dec!(12),
            payout_rate: dec!(0.85),
        },
        AssetConfig {
            id: "eur-usd".to_string(),
            symbol: "EUR/USD".to_string(),
            category: AssetCategory::Forex,
            initial_price: dec!(1.0850),
            volatility: dec!(0.001),
            payout_rate: dec!(0.80),
        },
        AssetConfig {
            id: "xau-usd".to_string(),
            symbol: "XAU/USD".to_string(),
            category: AssetCategory::Commodity,
            initial_price: dec!(2400),
            volatility: dec!(4),
            payout_rate: dec!(0.75),
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalGenConfig {
    /// Generation cadence in seconds.
    pub interval_secs: u64,
    /// Signal time-to-live in seconds.
    pub ttl_secs: u64,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_k: Decimal,
    pub fast_ema_period: usize,
    pub slow_sma_period: usize,
}

impl Default for SignalGenConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            ttl_secs: 30,
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_k: dec!(2),
            fast_ema_period: 9,
            slow_sma_period: 21,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub currency: String,
    pub min_stake: Decimal,
    pub max_stake: Decimal,
    /// Applied on top of asset rate and timeframe multiplier.
    pub global_payout_multiplier: Decimal,
    pub daily_trade_limit: u32,
    pub daily_loss_limit: Decimal,
    pub timeframes: Vec<TimeframeConfig>,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            min_stake: dec!(1),
            max_stake: dec!(1000),
            global_payout_multiplier: dec!(1),
            daily_trade_limit: 50,
            daily_loss_limit: dec!(500),
            timeframes: vec![
                TimeframeConfig {
                    duration_secs: 60,
                    payout_multiplier: dec!(1),
                },
                TimeframeConfig {
                    duration_secs: 300,
                    payout_multiplier: dec!(1.05),
                },
                TimeframeConfig {
                    duration_secs: 900,
                    payout_multiplier: dec!(1.1),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeConfig {
    pub duration_secs: u64,
    pub payout_multiplier: Decimal,
}

impl TradingConfig {
    /// Resolves a configured timeframe by duration.
    #[must_use]
    pub fn timeframe(&self, duration_secs: u64) -> Option<&TimeframeConfig> {
        self.timeframes
            .iter()
            .find(|tf| tf.duration_secs == duration_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Catch-up sweep cadence in seconds.
    pub sweep_interval_secs: u64,
    pub market_mode: MarketMode,
    /// Relative bound on the synthesized exit-price offset (e.g. 0.002 =
    /// up to 0.2% away from entry).
    pub exit_offset_pct: Decimal,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 5,
            market_mode: MarketMode::default(),
            exit_offset_pct: dec!(0.002),
        }
    }
}

/// Outcome algorithm selector. Kept as an explicit, named strategy so
/// tests can substitute a deterministic implementation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MarketMode {
    /// Coin flip with a fixed win probability, independent of direction.
    Random { win_probability: f64 },
    /// Coin flip skewed toward the house by a fixed margin.
    Signal { house_edge: f64 },
}

impl Default for MarketMode {
    fn default() -> Self {
        Self::Random {
            win_probability: 0.45,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_knob() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.feed.tick_interval_ms, 1000);
        assert_eq!(cfg.feed.history_window, 300);
        assert!(cfg.feed.assets.is_empty());
        assert_eq!(cfg.signals.rsi_period, 14);
        assert_eq!(cfg.trading.currency, "USD");
        assert_eq!(cfg.settlement.sweep_interval_secs, 5);
    }

    #[test]
    fn fallback_table_spans_price_scales() {
        let assets = fallback_assets();
        assert!(assets.len() >= 3);
        let max_vol = assets.iter().map(|a| a.volatility).max().unwrap();
        let min_vol = assets.iter().map(|a| a.volatility).min().unwrap();
        assert!(max_vol / min_vol > dec!(1000));
    }

    #[test]
    fn timeframe_lookup_by_duration() {
        let cfg = TradingConfig::default();
        assert!(cfg.timeframe(60).is_some());
        assert!(cfg.timeframe(61).is_none());
    }

    #[test]
    fn market_mode_deserializes_tagged() {
        let mode: MarketMode =
            serde_json::from_str(r#"{"mode":"random","win_probability":0.4}"#).unwrap();
        assert!(matches!(mode, MarketMode::Random { win_probability } if win_probability == 0.4));
    }
}
