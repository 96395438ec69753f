use crate::risk::RiskTracker;
use crate::settlement::SettlementKey;
use binopt_core::{
    AuditStore, Direction, PlacementError, SettlementError, TerminalFields, Trade, TradeStatus,
    TradeStore, TradingConfig, Transaction, TransactionType, WalletError, WalletStore,
};
use binopt_feed::PriceBook;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Global market availability flag, toggleable at runtime for
/// maintenance windows.
pub struct MarketState {
    open: AtomicBool,
}

impl Default for MarketState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MarketState {
    #[must_use]
    pub fn new(open: bool) -> Self {
        Self {
            open: AtomicBool::new(open),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::Relaxed);
        tracing::info!(open, "market availability changed");
    }
}

/// Validates and records trades. Placement is all-or-nothing: every
/// precondition is checked before any mutation, and the stake lock is an
/// atomic wallet delta that fails closed.
pub struct PlacementService {
    wallets: Arc<dyn WalletStore>,
    trades: Arc<dyn TradeStore>,
    audit: Arc<dyn AuditStore>,
    prices: Arc<PriceBook>,
    risk: Arc<RiskTracker>,
    market: Arc<MarketState>,
    config: TradingConfig,
    settle_tx: mpsc::Sender<SettlementKey>,
}

impl PlacementService {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        wallets: Arc<dyn WalletStore>,
        trades: Arc<dyn TradeStore>,
        audit: Arc<dyn AuditStore>,
        prices: Arc<PriceBook>,
        risk: Arc<RiskTracker>,
        market: Arc<MarketState>,
        config: TradingConfig,
        settle_tx: mpsc::Sender<SettlementKey>,
    ) -> Self {
        Self {
            wallets,
            trades,
            audit,
            prices,
            risk,
            market,
            config,
            settle_tx,
        }
    }

    /// Places a stake-based trade.
    ///
    /// Preconditions are checked in order, first failure wins: wallet
    /// exists and covers the stake, stake within configured bounds, daily
    /// risk limits, market open. On success the stake moves from balance
    /// to locked, a pending trade is recorded with a binding expiry, one
    /// audit row is written, and the trade is enqueued for settlement.
    ///
    /// # Errors
    ///
    /// A [`PlacementError`] naming the precise rejection reason; no state
    /// was mutated.
    pub async fn place_trade(
        &self,
        user_id: &str,
        asset_id: &str,
        direction: Direction,
        stake: Decimal,
        timeframe_secs: u64,
    ) -> Result<Trade, PlacementError> {
        let asset = self
            .prices
            .asset(asset_id)
            .ok_or_else(|| PlacementError::UnknownAsset(asset_id.to_string()))?;
        let timeframe = self
            .config
            .timeframe(timeframe_secs)
            .ok_or(PlacementError::UnknownTimeframe(timeframe_secs))?;
        let currency = self.config.currency.as_str();
        let now = Utc::now();

        let wallet = self
            .wallets
            .get(user_id, currency)
            .await
            .map_err(|e| PlacementError::Internal(e.to_string()))?
            .ok_or_else(|| {
                PlacementError::Wallet(WalletError::NotFound {
                    user_id: user_id.to_string(),
                    currency: currency.to_string(),
                })
            })?;
        if stake > wallet.balance {
            return Err(WalletError::InsufficientBalance {
                requested: stake,
                available: wallet.balance,
            }
            .into());
        }

        if stake < self.config.min_stake {
            return Err(PlacementError::StakeBelowMinimum {
                stake,
                min: self.config.min_stake,
            });
        }
        if stake > self.config.max_stake {
            return Err(PlacementError::StakeAboveMaximum {
                stake,
                max: self.config.max_stake,
            });
        }

        self.risk.check(user_id, &self.config, now)?;

        if !self.market.is_open() {
            return Err(PlacementError::MarketClosed);
        }

        // Atomic stake lock; a concurrent placement racing this one fails
        // closed here rather than overdrawing.
        let wallet = self
            .wallets
            .apply_delta(user_id, currency, -stake, stake)
            .await?;

        let payout_rate =
            asset.payout_rate * timeframe.payout_multiplier * self.config.global_payout_multiplier;
        // The deadline arithmetic overflows far below u64::MAX; cap
        // pathological configured durations at a year instead.
        const MAX_DURATION_SECS: i64 = 366 * 24 * 60 * 60;
        let duration_secs = i64::try_from(timeframe.duration_secs)
            .unwrap_or(MAX_DURATION_SECS)
            .min(MAX_DURATION_SECS);
        let expires_at = now + Duration::seconds(duration_secs);
        let trade = Trade {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            asset_id: asset.id.clone(),
            direction,
            stake,
            entry_price: asset.current_price,
            payout_rate,
            placed_at: now,
            expires_at,
            status: TradeStatus::Pending,
            exit_price: None,
            profit_loss: None,
            settled_at: None,
        };

        if let Err(e) = self.trades.insert(trade.clone()).await {
            // Keep placement all-or-nothing: release the stake again.
            if let Err(release) = self
                .wallets
                .apply_delta(user_id, currency, stake, -stake)
                .await
            {
                tracing::error!(
                    trade_id = %trade.id,
                    error = %release,
                    "failed to release stake after trade insert failure"
                );
            }
            return Err(PlacementError::Internal(e.to_string()));
        }

        self.risk.record_trade(user_id, now);

        let audit_row = Transaction::new(
            user_id,
            TransactionType::TradeStake,
            stake,
            wallet.balance,
            format!("stake locked for trade {} on {}", trade.id, asset.id),
        );
        if let Err(e) = self.audit.append(audit_row).await {
            tracing::error!(trade_id = %trade.id, error = %e, "audit append failed");
        }

        if let Err(e) = self
            .settle_tx
            .send(SettlementKey {
                trade_id: trade.id,
                expires_at,
            })
            .await
        {
            // The catch-up sweep is the correctness backstop.
            tracing::warn!(trade_id = %trade.id, error = %e, "settlement enqueue failed");
        }

        tracing::info!(
            trade_id = %trade.id,
            user = user_id,
            asset = %trade.asset_id,
            direction = ?direction,
            %stake,
            expires_at = %expires_at,
            "trade placed"
        );
        Ok(trade)
    }

    /// Administrative cancellation of a pending trade before its expiry.
    /// Releases the stake without payout and records a refund.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotCancellable`] once the trade expired or
    /// settled; ledger failures are surfaced for reconciliation.
    pub async fn cancel_trade(&self, trade_id: Uuid) -> Result<Trade, SettlementError> {
        let now = Utc::now();
        let trade = self
            .trades
            .get(trade_id)
            .await
            .map_err(|e| SettlementError::Storage(e.to_string()))?
            .ok_or(SettlementError::TradeNotFound { trade_id })?;

        if trade.is_expired(now) {
            return Err(SettlementError::NotCancellable {
                trade_id,
                reason: "expiry passed, trade must settle".to_string(),
            });
        }

        let cancelled = self
            .trades
            .transition(
                trade_id,
                TradeStatus::Pending,
                TradeStatus::Cancelled,
                TerminalFields {
                    exit_price: None,
                    profit_loss: Decimal::ZERO,
                    settled_at: now,
                },
            )
            .await
            .map_err(|e| SettlementError::Storage(e.to_string()))?
            .ok_or_else(|| SettlementError::NotCancellable {
                trade_id,
                reason: format!("status is {:?}", trade.status),
            })?;

        let wallet = self
            .wallets
            .apply_delta(&trade.user_id, &self.config.currency, trade.stake, -trade.stake)
            .await
            .map_err(|source| SettlementError::LedgerInconsistency { trade_id, source })?;

        let audit_row = Transaction::new(
            &trade.user_id,
            TransactionType::TradeRefund,
            trade.stake,
            wallet.balance,
            format!("administrative cancellation of trade {trade_id}"),
        );
        self.audit
            .append(audit_row)
            .await
            .map_err(|e| SettlementError::Audit(e.to_string()))?;

        tracing::info!(%trade_id, user = %trade.user_id, "trade cancelled");
        Ok(cancelled)
    }
}
