//! In-memory storage backends.
//!
//! These implement the `binopt-core` storage traits with the same
//! atomicity contract a database-backed implementation would provide:
//! wallet deltas fail closed, and the trade status transition is a
//! compare-and-swap on the current status.

use anyhow::Result;
use async_trait::async_trait;
use binopt_core::{
    AuditStore, TerminalFields, Trade, TradeStatus, TradeStore, Transaction, Wallet, WalletError,
    WalletStore,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryWalletStore {
    inner: Mutex<HashMap<(String, String), Wallet>>,
}

impl MemoryWalletStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn get(&self, user_id: &str, currency: &str) -> Result<Option<Wallet>> {
        let inner = self.inner.lock().expect("wallet store lock poisoned");
        Ok(inner
            .get(&(user_id.to_string(), currency.to_string()))
            .cloned())
    }

    async fn deposit(&self, user_id: &str, currency: &str, amount: Decimal) -> Result<Wallet> {
        let mut inner = self.inner.lock().expect("wallet store lock poisoned");
        let wallet = inner
            .entry((user_id.to_string(), currency.to_string()))
            .or_insert_with(|| Wallet::new(user_id, currency));
        wallet.balance += amount;
        Ok(wallet.clone())
    }

    async fn apply_delta(
        &self,
        user_id: &str,
        currency: &str,
        balance_delta: Decimal,
        locked_delta: Decimal,
    ) -> Result<Wallet, WalletError> {
        let mut inner = self.inner.lock().expect("wallet store lock poisoned");
        let wallet = inner
            .get_mut(&(user_id.to_string(), currency.to_string()))
            .ok_or_else(|| WalletError::NotFound {
                user_id: user_id.to_string(),
                currency: currency.to_string(),
            })?;

        let balance = wallet.balance + balance_delta;
        let locked = wallet.locked + locked_delta;
        if balance < Decimal::ZERO {
            return Err(WalletError::InsufficientBalance {
                requested: -balance_delta,
                available: wallet.balance,
            });
        }
        if locked < Decimal::ZERO {
            return Err(WalletError::InsufficientLocked {
                requested: -locked_delta,
                locked: wallet.locked,
            });
        }

        wallet.balance = balance;
        wallet.locked = locked;
        Ok(wallet.clone())
    }
}

#[derive(Default)]
pub struct MemoryTradeStore {
    inner: Mutex<HashMap<Uuid, Trade>>,
}

impl MemoryTradeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn insert(&self, trade: Trade) -> Result<()> {
        let mut inner = self.inner.lock().expect("trade store lock poisoned");
        inner.insert(trade.id, trade);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Trade>> {
        let inner = self.inner.lock().expect("trade store lock poisoned");
        Ok(inner.get(&id).cloned())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: TradeStatus,
        to: TradeStatus,
        fields: TerminalFields,
    ) -> Result<Option<Trade>> {
        let mut inner = self.inner.lock().expect("trade store lock poisoned");
        let Some(trade) = inner.get_mut(&id) else {
            return Ok(None);
        };
        if trade.status != from {
            return Ok(None);
        }

        trade.status = to;
        trade.exit_price = fields.exit_price;
        trade.profit_loss = Some(fields.profit_loss);
        trade.settled_at = Some(fields.settled_at);
        Ok(Some(trade.clone()))
    }

    async fn expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Trade>> {
        let inner = self.inner.lock().expect("trade store lock poisoned");
        let mut due: Vec<Trade> = inner
            .values()
            .filter(|t| t.status == TradeStatus::Pending && t.is_expired(now))
            .cloned()
            .collect();
        due.sort_by_key(|t| t.expires_at);
        Ok(due)
    }

    async fn pending_for_user(&self, user_id: &str) -> Result<Vec<Trade>> {
        let inner = self.inner.lock().expect("trade store lock poisoned");
        let mut pending: Vec<Trade> = inner
            .values()
            .filter(|t| t.status == TradeStatus::Pending && t.user_id == user_id)
            .cloned()
            .collect();
        pending.sort_by_key(|t| t.placed_at);
        Ok(pending)
    }
}

#[derive(Default)]
pub struct MemoryAuditStore {
    inner: Mutex<Vec<Transaction>>,
}

impl MemoryAuditStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of recorded transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("audit store lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, tx: Transaction) -> Result<()> {
        let mut inner = self.inner.lock().expect("audit store lock poisoned");
        inner.push(tx);
        Ok(())
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let inner = self.inner.lock().expect("audit store lock poisoned");
        Ok(inner
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect())
    }
}
