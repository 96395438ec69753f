use anyhow::{Context, Result};
use binopt_core::{ConfigLoader, SignalStrength, WalletStore};
use binopt_engine::{
    strategy_for, MarketState, MemoryAuditStore, MemoryTradeStore, MemoryWalletStore,
    PlacementService, RiskTracker, SettlementScheduler,
};
use binopt_feed::{PriceBook, PriceFeedSimulator};
use binopt_signals::{SignalBook, SignalGenerator};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[derive(Parser)]
#[command(name = "binopt")]
#[command(about = "Binary options trading engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine: price feed, signal generator, and settlement
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Place a demo trade on every medium-or-stronger signal
        #[arg(long)]
        demo: bool,
        /// Demo wallet starting balance
        #[arg(long, default_value = "1000")]
        demo_balance: Decimal,
    },
    /// Print the effective configuration and exit
    ShowConfig {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            demo,
            demo_balance,
        } => run(&config, demo, demo_balance).await,
        Commands::ShowConfig { config } => {
            let config = ConfigLoader::load(&config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run(config_path: &str, demo: bool, demo_balance: Decimal) -> Result<()> {
    let config = ConfigLoader::load(config_path).context("failed to load configuration")?;
    tracing::info!("configuration loaded from {config_path}");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Price feed.
    let prices = Arc::new(PriceBook::new(config.feed.history_window));
    let simulator = PriceFeedSimulator::new(&config.feed, prices.clone());

    // Signal generation.
    let signal_book = Arc::new(SignalBook::new());
    let generator = SignalGenerator::new(prices.clone(), signal_book.clone(), config.signals.clone());
    let mut signal_rx = generator.subscribe();

    // Trading engine.
    let wallets = Arc::new(MemoryWalletStore::new());
    let trades = Arc::new(MemoryTradeStore::new());
    let audit = Arc::new(MemoryAuditStore::new());
    let risk = Arc::new(RiskTracker::new());
    let market = Arc::new(MarketState::new(true));
    let (settle_tx, settle_rx) = mpsc::channel(256);

    let placement = Arc::new(PlacementService::new(
        wallets.clone(),
        trades.clone(),
        audit.clone(),
        prices,
        risk.clone(),
        market,
        config.trading.clone(),
        settle_tx,
    ));
    let scheduler = SettlementScheduler::new(
        trades,
        wallets.clone(),
        audit,
        risk,
        strategy_for(config.settlement.market_mode),
        config.settlement.clone(),
        config.trading.currency.clone(),
        settle_rx,
    );

    let mut tasks = tokio::task::JoinSet::new();
    tasks.spawn(simulator.run(shutdown_rx.clone()));
    tasks.spawn(generator.run(shutdown_rx.clone()));
    tasks.spawn(scheduler.run(shutdown_rx.clone()));

    if demo {
        wallets
            .deposit("demo", &config.trading.currency, demo_balance)
            .await
            .context("failed to seed demo wallet")?;
        tracing::info!(%demo_balance, "demo mode: trading medium-or-stronger signals");

        let placement = placement.clone();
        let timeframe = config
            .trading
            .timeframes
            .first()
            .map_or(60, |tf| tf.duration_secs);
        let mut demo_shutdown = shutdown_rx.clone();
        tasks.spawn(async move {
            loop {
                tokio::select! {
                    signal = signal_rx.recv() => {
                        let Ok(signal) = signal else { continue };
                        if signal.strength < SignalStrength::Medium {
                            continue;
                        }
                        match placement
                            .place_trade("demo", &signal.asset_id, signal.direction, dec!(10), timeframe)
                            .await
                        {
                            Ok(trade) => tracing::info!(trade_id = %trade.id, "demo trade placed"),
                            Err(e) => tracing::warn!("demo trade rejected: {e}"),
                        }
                    }
                    _ = demo_shutdown.changed() => {
                        if *demo_shutdown.borrow() {
                            return;
                        }
                    }
                }
            }
        });
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("shutting down");
    let _ = shutdown_tx.send(true);
    while tasks.join_next().await.is_some() {}

    Ok(())
}
