use crate::error::WalletError;
use crate::trade::{TerminalFields, Trade, TradeStatus};
use crate::wallet::{Transaction, Wallet};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Wallet persistence seam. `apply_delta` is the only mutation path used
/// by placement and settlement and must be atomic: it either applies both
/// deltas or, when a resulting balance would go negative, applies nothing.
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn get(&self, user_id: &str, currency: &str) -> Result<Option<Wallet>>;

    /// Creates the wallet if missing and credits `amount` to its balance.
    async fn deposit(&self, user_id: &str, currency: &str, amount: Decimal) -> Result<Wallet>;

    /// Atomically applies `balance_delta` and `locked_delta`, failing
    /// closed if either resulting field would be negative.
    async fn apply_delta(
        &self,
        user_id: &str,
        currency: &str,
        balance_delta: Decimal,
        locked_delta: Decimal,
    ) -> Result<Wallet, WalletError>;
}

/// Trade persistence seam. `transition` is the settlement idempotency
/// guard: the update only applies while the stored status equals `from`.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn insert(&self, trade: Trade) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<Trade>>;

    /// Conditionally moves the trade from `from` to `to`, writing the
    /// terminal fields. Returns the updated trade, or `None` when the
    /// predicate no longer holds (already settled by a concurrent sweep).
    async fn transition(
        &self,
        id: Uuid,
        from: TradeStatus,
        to: TradeStatus,
        fields: TerminalFields,
    ) -> Result<Option<Trade>>;

    /// All pending trades whose expiry is at or before `now`. This is the
    /// catch-up sweep query; it must see trades enqueued before a restart.
    async fn expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Trade>>;

    /// Pending trades for one user, oldest first.
    async fn pending_for_user(&self, user_id: &str) -> Result<Vec<Trade>>;
}

/// Append-only audit seam. A failure here never rolls back the wallet
/// mutation but must be surfaced, not swallowed.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, tx: Transaction) -> Result<()>;

    async fn for_user(&self, user_id: &str) -> Result<Vec<Transaction>>;
}
