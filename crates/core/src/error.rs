use rust_decimal::Decimal;
use thiserror::Error;

/// Failures of atomic wallet mutations. The store applies nothing when it
/// returns an error (fail closed).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("wallet not found for user {user_id} ({currency})")]
    NotFound { user_id: String, currency: String },

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("insufficient locked funds: requested {requested}, locked {locked}")]
    InsufficientLocked { requested: Decimal, locked: Decimal },
}

/// Placement rejections. These are expected, user-facing outcomes; the
/// caller receives the precise reason and no state was mutated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("unknown asset {0}")]
    UnknownAsset(String),

    #[error("no timeframe configured for {0}s")]
    UnknownTimeframe(u64),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("stake {stake} below minimum {min}")]
    StakeBelowMinimum { stake: Decimal, min: Decimal },

    #[error("stake {stake} above maximum {max}")]
    StakeAboveMaximum { stake: Decimal, max: Decimal },

    #[error("daily trade limit of {limit} reached")]
    DailyTradeLimit { limit: u32 },

    #[error("daily loss limit of {limit} reached")]
    DailyLossLimit { limit: Decimal },

    #[error("market is closed for maintenance")]
    MarketClosed,

    #[error("placement storage failure: {0}")]
    Internal(String),
}

/// Settlement-side failures. A conditional-update race is NOT an error
/// (it is a benign no-op); these variants cover the ledger-inconsistency
/// class that must be surfaced for reconciliation.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("trade {trade_id} not found")]
    TradeNotFound { trade_id: uuid::Uuid },

    #[error("trade {trade_id} is not cancellable: {reason}")]
    NotCancellable { trade_id: uuid::Uuid, reason: String },

    #[error("wallet mutation failed after status transition on trade {trade_id}: {source}")]
    LedgerInconsistency {
        trade_id: uuid::Uuid,
        #[source]
        source: WalletError,
    },

    #[error("audit append failed: {0}")]
    Audit(String),

    #[error("settlement storage failure: {0}")]
    Storage(String),
}
