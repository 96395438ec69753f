pub mod outcome;
pub mod placement;
pub mod risk;
pub mod settlement;
pub mod store;

pub use outcome::{strategy_for, FixedOutcome, OutcomeStrategy, RandomOutcome};
pub use placement::{MarketState, PlacementService};
pub use risk::RiskTracker;
pub use settlement::{SettleAction, SettlementKey, SettlementScheduler};
pub use store::{MemoryAuditStore, MemoryTradeStore, MemoryWalletStore};
