use binopt_core::{Direction, MarketMode, Trade, TradeOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Decides whether an expiring trade wins or loses.
///
/// Injected into the settlement scheduler so the market mode stays a
/// named, swappable strategy; tests substitute [`FixedOutcome`].
pub trait OutcomeStrategy: Send {
    fn decide(&mut self, trade: &Trade) -> TradeOutcome;
    fn name(&self) -> &'static str;
}

/// Coin flip with a configured win probability, independent of direction
/// or price movement.
pub struct RandomOutcome {
    win_probability: f64,
    rng: StdRng,
}

impl RandomOutcome {
    #[must_use]
    pub fn new(win_probability: f64) -> Self {
        Self {
            win_probability: win_probability.clamp(0.0, 1.0),
            rng: StdRng::from_entropy(),
        }
    }

    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl OutcomeStrategy for RandomOutcome {
    fn decide(&mut self, _trade: &Trade) -> TradeOutcome {
        if self.rng.gen_bool(self.win_probability) {
            TradeOutcome::Win
        } else {
            TradeOutcome::Loss
        }
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Always returns the configured outcome. Test seam.
pub struct FixedOutcome(pub TradeOutcome);

impl OutcomeStrategy for FixedOutcome {
    fn decide(&mut self, _trade: &Trade) -> TradeOutcome {
        self.0
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Builds the strategy selected by the configured market mode. Signal
/// mode is an even flip skewed toward the house by the configured margin.
#[must_use]
pub fn strategy_for(mode: MarketMode) -> Box<dyn OutcomeStrategy> {
    match mode {
        MarketMode::Random { win_probability } => Box::new(RandomOutcome::new(win_probability)),
        MarketMode::Signal { house_edge } => Box::new(RandomOutcome::new(0.5 - house_edge)),
    }
}

/// Synthesizes an exit price consistent with the outcome and direction:
/// a winning CALL (or losing PUT) exits above entry, a losing CALL (or
/// winning PUT) exits below. The offset is a random fraction of
/// `max_offset_pct` of the entry price, never zero, and the result never
/// reaches zero.
pub fn synthesize_exit_price(
    rng: &mut StdRng,
    entry: Decimal,
    direction: Direction,
    outcome: TradeOutcome,
    max_offset_pct: Decimal,
) -> Decimal {
    const MIN_OFFSET: Decimal = Decimal::from_parts(1, 0, 0, false, 8); // 1e-8

    let fraction = rng.gen_range(0.2..=1.0);
    let fraction = Decimal::from_f64(fraction).unwrap_or(Decimal::ONE);
    let offset = (entry.abs() * max_offset_pct * fraction)
        .round_dp(8)
        .max(MIN_OFFSET);

    let above = matches!(
        (direction, outcome),
        (Direction::Call, TradeOutcome::Win) | (Direction::Put, TradeOutcome::Loss)
    );

    if above {
        entry + offset
    } else {
        (entry - offset).max(MIN_OFFSET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binopt_core::TradeStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn trade(direction: Direction) -> Trade {
        let now = Utc::now();
        Trade {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            asset_id: "btc-usd".to_string(),
            direction,
            stake: dec!(100),
            entry_price: dec!(45000),
            payout_rate: dec!(0.8),
            placed_at: now,
            expires_at: now,
            status: TradeStatus::Pending,
            exit_price: None,
            profit_loss: None,
            settled_at: None,
        }
    }

    #[test]
    fn degenerate_probabilities_are_deterministic() {
        let mut always = RandomOutcome::new(1.0);
        let mut never = RandomOutcome::new(0.0);
        for _ in 0..20 {
            assert_eq!(always.decide(&trade(Direction::Call)), TradeOutcome::Win);
            assert_eq!(never.decide(&trade(Direction::Call)), TradeOutcome::Loss);
        }
    }

    #[test]
    fn random_outcome_tracks_the_configured_probability() {
        let mut strategy = RandomOutcome::new(0.45).with_rng_seed(9);
        let wins = (0..2000)
            .filter(|_| strategy.decide(&trade(Direction::Call)) == TradeOutcome::Win)
            .count();
        let rate = wins as f64 / 2000.0;
        assert!((rate - 0.45).abs() < 0.05, "win rate {rate} off target");
    }

    #[test]
    fn exit_price_agrees_with_outcome_and_direction() {
        let mut rng = StdRng::seed_from_u64(3);
        let entry = dec!(45000);
        let pct = dec!(0.002);

        for _ in 0..50 {
            let call_win =
                synthesize_exit_price(&mut rng, entry, Direction::Call, TradeOutcome::Win, pct);
            assert!(call_win > entry);

            let call_loss =
                synthesize_exit_price(&mut rng, entry, Direction::Call, TradeOutcome::Loss, pct);
            assert!(call_loss < entry);

            let put_win =
                synthesize_exit_price(&mut rng, entry, Direction::Put, TradeOutcome::Win, pct);
            assert!(put_win < entry);

            let put_loss =
                synthesize_exit_price(&mut rng, entry, Direction::Put, TradeOutcome::Loss, pct);
            assert!(put_loss > entry);
        }
    }

    #[test]
    fn exit_price_never_reaches_zero() {
        let mut rng = StdRng::seed_from_u64(4);
        let tiny = dec!(0.0001);
        let exit =
            synthesize_exit_price(&mut rng, tiny, Direction::Put, TradeOutcome::Win, dec!(0.5));
        assert!(exit > Decimal::ZERO);
    }
}
