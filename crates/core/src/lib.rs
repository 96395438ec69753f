pub mod config;
pub mod config_loader;
pub mod error;
pub mod market;
pub mod trade;
pub mod traits;
pub mod wallet;

pub use config::{
    fallback_assets, AppConfig, AssetConfig, FeedConfig, MarketMode, SettlementConfig,
    SignalGenConfig, TimeframeConfig, TradingConfig,
};
pub use config_loader::ConfigLoader;
pub use error::{PlacementError, SettlementError, WalletError};
pub use market::{Asset, AssetCategory, Direction, PriceTick, Signal, SignalStrength};
pub use trade::{TerminalFields, Trade, TradeOutcome, TradeStatus};
pub use traits::{AuditStore, TradeStore, WalletStore};
pub use wallet::{Transaction, TransactionType, Wallet};
