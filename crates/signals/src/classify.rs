use binopt_core::{Direction, SignalGenConfig, SignalStrength};
use binopt_indicators::{bollinger, ema, macd, rsi, sma};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// RSI below this with a lower-band breach reads as oversold.
const RSI_OVERSOLD: Decimal = dec!(30);
/// RSI above this with an upper-band breach reads as overbought.
const RSI_OVERBOUGHT: Decimal = dec!(70);
/// Minimum |MACD| / price for a trend signal to count as Medium rather
/// than Weak.
const MOMENTUM_THRESHOLD: Decimal = dec!(0.0005);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub direction: Direction,
    pub strength: SignalStrength,
    pub confidence: f64,
}

/// Classifies a price history into a directional verdict, or `None` when
/// the indicators disagree.
///
/// Mean-reversion extremes dominate: oversold below the lower Bollinger
/// band is a strong CALL, overbought above the upper band a strong PUT.
/// Otherwise a fast-EMA/slow-SMA trend that agrees with the MACD sign
/// yields a Medium or Weak momentum signal depending on magnitude.
///
/// Sparse history (shorter than the longest configured period) returns
/// `None` rather than erroring; the generator keeps running regardless of
/// warm-up state.
#[must_use]
pub fn classify(history: &[Decimal], cfg: &SignalGenConfig) -> Option<Verdict> {
    let warmup = cfg
        .rsi_period
        .max(cfg.bollinger_period)
        .max(cfg.slow_sma_period)
        + 1;
    if history.len() < warmup {
        return None;
    }

    let price = *history.last()?;
    let rsi_value = rsi(history, cfg.rsi_period);
    let bands = bollinger(history, cfg.bollinger_period, cfg.bollinger_k);
    let momentum = macd(history);
    let fast = ema(history, cfg.fast_ema_period);
    let slow = sma(history, cfg.slow_sma_period);

    // Mean-reversion extremes first.
    if rsi_value < RSI_OVERSOLD && price < bands.lower {
        return Some(Verdict {
            direction: Direction::Call,
            strength: SignalStrength::Strong,
            confidence: agreement(Direction::Call, rsi_value, price, bands, momentum, fast, slow),
        });
    }
    if rsi_value > RSI_OVERBOUGHT && price > bands.upper {
        return Some(Verdict {
            direction: Direction::Put,
            strength: SignalStrength::Strong,
            confidence: agreement(Direction::Put, rsi_value, price, bands, momentum, fast, slow),
        });
    }

    // Momentum: trend direction must agree with the MACD sign.
    let trend_up = fast > slow;
    let trend_down = fast < slow;
    let direction = if trend_up && momentum.macd > Decimal::ZERO {
        Direction::Call
    } else if trend_down && momentum.macd < Decimal::ZERO {
        Direction::Put
    } else {
        return None;
    };

    // Discrete strength from momentum magnitude relative to price scale.
    let magnitude = if price > Decimal::ZERO {
        momentum.macd.abs() / price
    } else {
        Decimal::ZERO
    };
    let strength = if magnitude >= MOMENTUM_THRESHOLD {
        SignalStrength::Medium
    } else {
        SignalStrength::Weak
    };

    Some(Verdict {
        direction,
        strength,
        confidence: agreement(direction, rsi_value, price, bands, momentum, fast, slow),
    })
}

/// Confidence as the fraction of indicators voting for `direction`:
/// RSI lean, Bollinger position, EMA/SMA trend, MACD sign.
#[allow(clippy::too_many_arguments)]
fn agreement(
    direction: Direction,
    rsi_value: Decimal,
    price: Decimal,
    bands: binopt_indicators::Bands,
    momentum: binopt_indicators::Macd,
    fast: Decimal,
    slow: Decimal,
) -> f64 {
    let neutral = dec!(50);
    let votes = match direction {
        Direction::Call => [
            rsi_value < neutral,
            price < bands.middle,
            fast > slow,
            momentum.macd > Decimal::ZERO,
        ],
        Direction::Put => [
            rsi_value > neutral,
            price > bands.middle,
            fast < slow,
            momentum.macd < Decimal::ZERO,
        ],
    };
    let agreeing = votes.iter().filter(|&&v| v).count();
    agreeing as f64 / votes.len() as f64
}
