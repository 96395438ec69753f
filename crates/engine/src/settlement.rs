use crate::outcome::{synthesize_exit_price, OutcomeStrategy};
use crate::risk::RiskTracker;
use binopt_core::{
    AuditStore, SettlementConfig, SettlementError, TerminalFields, Trade, TradeOutcome,
    TradeStatus, TradeStore, Transaction, TransactionType, WalletStore,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// Deadline handed from placement to the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct SettlementKey {
    pub trade_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// What a single settlement attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleAction {
    Won,
    Lost,
    /// The conditional update found the trade no longer pending; a
    /// concurrent attempt settled it first. Benign.
    AlreadySettled,
    /// The trade has not reached its expiry yet.
    NotDue,
}

/// Drives the trade state machine: at or after expiry, decides the
/// outcome, synthesizes a consistent exit price, transitions the trade
/// exactly once, and applies the ledger mutation.
///
/// Deadlines arrive over an mpsc channel into an expiry-ordered min-heap;
/// a periodic catch-up sweep over the trade store is the correctness
/// backstop across restarts and missed timers.
pub struct SettlementScheduler {
    trades: Arc<dyn TradeStore>,
    wallets: Arc<dyn WalletStore>,
    audit: Arc<dyn AuditStore>,
    risk: Arc<RiskTracker>,
    outcome: Box<dyn OutcomeStrategy>,
    rng: StdRng,
    config: SettlementConfig,
    currency: String,
    rx: mpsc::Receiver<SettlementKey>,
    rx_closed: bool,
    deadlines: BinaryHeap<Reverse<(DateTime<Utc>, Uuid)>>,
}

impl SettlementScheduler {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        trades: Arc<dyn TradeStore>,
        wallets: Arc<dyn WalletStore>,
        audit: Arc<dyn AuditStore>,
        risk: Arc<RiskTracker>,
        outcome: Box<dyn OutcomeStrategy>,
        config: SettlementConfig,
        currency: String,
        rx: mpsc::Receiver<SettlementKey>,
    ) -> Self {
        Self {
            trades,
            wallets,
            audit,
            risk,
            outcome,
            rng: StdRng::from_entropy(),
            config,
            currency,
            rx,
            rx_closed: false,
            deadlines: BinaryHeap::new(),
        }
    }

    /// Runs until shutdown: wakes for the nearest enqueued deadline and
    /// sweeps the store on a fixed cadence.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut sweep = tokio::time::interval(std::time::Duration::from_secs(
            self.config.sweep_interval_secs.max(1),
        ));
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(
            strategy = self.outcome.name(),
            sweep_interval = self.config.sweep_interval_secs,
            "settlement scheduler running"
        );

        loop {
            let until_next = self.deadlines.peek().map_or(
                std::time::Duration::from_secs(60),
                |Reverse((deadline, _))| {
                    (*deadline - Utc::now())
                        .to_std()
                        .unwrap_or(std::time::Duration::ZERO)
                },
            );

            tokio::select! {
                key = self.rx.recv(), if !self.rx_closed => {
                    match key {
                        Some(key) => {
                            self.deadlines.push(Reverse((key.expires_at, key.trade_id)));
                        }
                        // All placement handles dropped; the sweep keeps
                        // settling whatever is already in the store.
                        None => self.rx_closed = true,
                    }
                }
                _ = tokio::time::sleep(until_next) => {
                    self.settle_due().await;
                }
                _ = sweep.tick() => {
                    self.sweep().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("settlement scheduler shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// Settles every heap entry whose deadline has passed.
    pub async fn settle_due(&mut self) {
        let now = Utc::now();
        while let Some(Reverse((deadline, trade_id))) = self.deadlines.peek().copied() {
            if deadline > now {
                break;
            }
            self.deadlines.pop();

            match self.trades.get(trade_id).await {
                Ok(Some(trade)) => {
                    if let Err(e) = self.settle_trade(&trade).await {
                        tracing::error!(%trade_id, error = %e, "settlement failed");
                    }
                }
                Ok(None) => tracing::warn!(%trade_id, "enqueued trade missing from store"),
                Err(e) => tracing::error!(%trade_id, error = %e, "trade load failed"),
            }
        }
    }

    /// Catch-up scan: settles every pending trade whose expiry has
    /// passed, regardless of whether its deadline was ever enqueued.
    pub async fn sweep(&mut self) {
        let now = Utc::now();
        let due = match self.trades.expired_pending(now).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = %e, "expired-pending query failed");
                return;
            }
        };
        if due.is_empty() {
            return;
        }

        tracing::info!("catch-up sweep found {} expired pending trades", due.len());
        for trade in due {
            if let Err(e) = self.settle_trade(&trade).await {
                tracing::error!(trade_id = %trade.id, error = %e, "sweep settlement failed");
            }
        }
    }

    /// Settles one trade. Safe to call concurrently with a sweep racing
    /// the same trade: the conditional status transition guarantees the
    /// wallet is mutated exactly once.
    ///
    /// # Errors
    ///
    /// Only the ledger-inconsistency class: the wallet mutation or audit
    /// append failing after the status transition already applied.
    pub async fn settle_trade(&mut self, trade: &Trade) -> Result<SettleAction, SettlementError> {
        let now = Utc::now();
        if trade.status != TradeStatus::Pending {
            return Ok(SettleAction::AlreadySettled);
        }
        if !trade.is_expired(now) {
            return Ok(SettleAction::NotDue);
        }

        let outcome = self.outcome.decide(trade);
        let exit_price = synthesize_exit_price(
            &mut self.rng,
            trade.entry_price,
            trade.direction,
            outcome,
            self.config.exit_offset_pct,
        );

        let (status, profit_loss) = match outcome {
            TradeOutcome::Win => (TradeStatus::Won, trade.win_profit()),
            TradeOutcome::Loss => (TradeStatus::Lost, -trade.stake),
        };

        let updated = self
            .trades
            .transition(
                trade.id,
                TradeStatus::Pending,
                status,
                TerminalFields {
                    exit_price: Some(exit_price),
                    profit_loss,
                    settled_at: now,
                },
            )
            .await
            .map_err(|e| SettlementError::Storage(e.to_string()))?;

        if updated.is_none() {
            tracing::debug!(trade_id = %trade.id, "lost settlement race, no-op");
            return Ok(SettleAction::AlreadySettled);
        }

        // Past this point the status is terminal; a wallet failure is the
        // fatal inconsistency class and must be surfaced.
        let (balance_delta, action, tx_type) = match outcome {
            TradeOutcome::Win => (
                trade.stake + profit_loss,
                SettleAction::Won,
                TransactionType::TradePayout,
            ),
            TradeOutcome::Loss => (Decimal::ZERO, SettleAction::Lost, TransactionType::TradeForfeit),
        };

        let wallet = self
            .wallets
            .apply_delta(&trade.user_id, &self.currency, balance_delta, -trade.stake)
            .await
            .map_err(|source| {
                tracing::error!(
                    trade_id = %trade.id,
                    error = %source,
                    "wallet mutation failed after status transition"
                );
                SettlementError::LedgerInconsistency {
                    trade_id: trade.id,
                    source,
                }
            })?;

        if outcome == TradeOutcome::Loss {
            self.risk.record_loss(&trade.user_id, trade.stake, now);
        }

        let amount = match outcome {
            TradeOutcome::Win => trade.stake + profit_loss,
            TradeOutcome::Loss => trade.stake,
        };
        let audit_row = Transaction::new(
            &trade.user_id,
            tx_type,
            amount,
            wallet.balance,
            format!("settlement of trade {} ({:?})", trade.id, status),
        );
        self.audit
            .append(audit_row)
            .await
            .map_err(|e| SettlementError::Audit(e.to_string()))?;

        tracing::info!(
            trade_id = %trade.id,
            user = %trade.user_id,
            outcome = ?outcome,
            %profit_loss,
            %exit_price,
            "trade settled"
        );
        Ok(action)
    }
}
