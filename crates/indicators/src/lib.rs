//! Pure technical indicator functions over an ordered price series
//! (oldest to newest).
//!
//! No I/O, no state. Every function is deterministic and returns a
//! documented neutral value instead of erroring when the series is
//! shorter than the indicator's period, so callers can run continuously
//! during warm-up.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

/// Simple moving average of the last `period` points.
///
/// Returns `Decimal::ZERO` when fewer than `period` points exist.
#[must_use]
pub fn sma(series: &[Decimal], period: usize) -> Decimal {
    if period == 0 || series.len() < period {
        return Decimal::ZERO;
    }
    let window = &series[series.len() - period..];
    window.iter().copied().sum::<Decimal>() / Decimal::from(period)
}

/// Exponential moving average with multiplier `2 / (period + 1)`, seeded
/// with the SMA of the first `period` points.
///
/// Returns `Decimal::ZERO` when fewer than `period` points exist.
#[must_use]
pub fn ema(series: &[Decimal], period: usize) -> Decimal {
    ema_series(series, period)
        .last()
        .copied()
        .unwrap_or(Decimal::ZERO)
}

/// Full EMA series, one value per input point from index `period - 1`.
fn ema_series(series: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 || series.len() < period {
        return Vec::new();
    }

    let k = dec!(2) / Decimal::from(period + 1);
    let seed = series[..period].iter().copied().sum::<Decimal>() / Decimal::from(period);

    let mut out = Vec::with_capacity(series.len() - period + 1);
    out.push(seed);
    for &price in &series[period..] {
        let prev = out[out.len() - 1];
        out.push(price * k + prev * (Decimal::ONE - k));
    }
    out
}

/// Relative Strength Index with Wilder smoothing.
///
/// Returns the neutral value 50 when fewer than `period + 1` points
/// exist, and 100 when there are no down-moves (`avg_loss == 0` is a
/// documented edge case, not a division error).
#[must_use]
pub fn rsi(series: &[Decimal], period: usize) -> Decimal {
    if period == 0 || series.len() < period + 1 {
        return dec!(50);
    }

    let changes: Vec<Decimal> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let period_d = Decimal::from(period);

    let mut avg_gain = changes[..period]
        .iter()
        .map(|&c| c.max(Decimal::ZERO))
        .sum::<Decimal>()
        / period_d;
    let mut avg_loss = changes[..period]
        .iter()
        .map(|&c| (-c).max(Decimal::ZERO))
        .sum::<Decimal>()
        / period_d;

    for &c in &changes[period..] {
        let gain = c.max(Decimal::ZERO);
        let loss = (-c).max(Decimal::ZERO);
        avg_gain = (avg_gain * (period_d - Decimal::ONE) + gain) / period_d;
        avg_loss = (avg_loss * (period_d - Decimal::ONE) + loss) / period_d;
    }

    if avg_loss.is_zero() {
        return dec!(100);
    }

    let rs = avg_gain / avg_loss;
    dec!(100) - dec!(100) / (Decimal::ONE + rs)
}

/// MACD line, signal line, and histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Macd {
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

/// MACD as `EMA(12) - EMA(26)` with a 9-period EMA signal line.
///
/// Returns all zeroes (neutral) when fewer than 26 points exist. When the
/// MACD line itself is shorter than 9 points the signal line falls back
/// to its arithmetic mean.
#[must_use]
pub fn macd(series: &[Decimal]) -> Macd {
    const FAST: usize = 12;
    const SLOW: usize = 26;
    const SIGNAL: usize = 9;

    if series.len() < SLOW {
        return Macd::default();
    }

    let fast = ema_series(series, FAST);
    let slow = ema_series(series, SLOW);

    // Align the tails: slow is the shorter series.
    let offset = fast.len() - slow.len();
    let line: Vec<Decimal> = slow
        .iter()
        .enumerate()
        .map(|(i, &s)| fast[i + offset] - s)
        .collect();

    let macd_value = line[line.len() - 1];
    let signal = if line.len() >= SIGNAL {
        ema(&line, SIGNAL)
    } else {
        line.iter().copied().sum::<Decimal>() / Decimal::from(line.len())
    };

    Macd {
        macd: macd_value,
        signal,
        histogram: macd_value - signal,
    }
}

/// Bollinger Bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bands {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

/// Bollinger Bands: middle = `SMA(period)`, bands = middle +/- `k * stddev`.
///
/// Returns all zeroes when fewer than `period` points exist.
#[must_use]
pub fn bollinger(series: &[Decimal], period: usize, k: Decimal) -> Bands {
    if period == 0 || series.len() < period {
        return Bands::default();
    }

    let middle = sma(series, period);
    let dev = stddev(series, period);

    Bands {
        upper: middle + k * dev,
        middle,
        lower: middle - k * dev,
    }
}

/// Population standard deviation of the last `period` points.
///
/// Returns `Decimal::ZERO` when fewer than `period` points exist.
#[must_use]
pub fn stddev(series: &[Decimal], period: usize) -> Decimal {
    if period == 0 || series.len() < period {
        return Decimal::ZERO;
    }

    let mean = sma(series, period);
    let window = &series[series.len() - period..];
    let variance = window
        .iter()
        .map(|&p| (p - mean) * (p - mean))
        .sum::<Decimal>()
        / Decimal::from(period);

    variance.sqrt().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(v: Decimal, n: usize) -> Vec<Decimal> {
        vec![v; n]
    }

    fn increasing(n: usize) -> Vec<Decimal> {
        (1..=n).map(Decimal::from).collect()
    }

    #[test]
    fn sma_of_constant_series_is_the_constant() {
        let series = constant(dec!(42.5), 30);
        assert_eq!(sma(&series, 20), dec!(42.5));
    }

    #[test]
    fn sma_short_series_is_neutral_zero() {
        assert_eq!(sma(&increasing(5), 10), Decimal::ZERO);
        assert_eq!(sma(&[], 10), Decimal::ZERO);
    }

    #[test]
    fn sma_uses_only_the_last_period_points() {
        let mut series = constant(dec!(1), 10);
        series.extend(constant(dec!(3), 5));
        assert_eq!(sma(&series, 5), dec!(3));
    }

    #[test]
    fn ema_of_constant_series_is_the_constant() {
        let series = constant(dec!(7), 50);
        assert_eq!(ema(&series, 12), dec!(7));
    }

    #[test]
    fn ema_tracks_recent_prices_closer_than_sma() {
        let mut series = constant(dec!(100), 30);
        series.extend(constant(dec!(110), 5));
        let e = ema(&series, 10);
        let s = sma(&series, 30);
        assert!(e > s);
    }

    #[test]
    fn rsi_of_strictly_increasing_series_is_100() {
        assert_eq!(rsi(&increasing(30), 14), dec!(100));
    }

    #[test]
    fn rsi_of_strictly_decreasing_series_is_0() {
        let series: Vec<Decimal> = (1..=30).rev().map(Decimal::from).collect();
        assert_eq!(rsi(&series, 14), Decimal::ZERO);
    }

    #[test]
    fn rsi_short_series_is_neutral_50() {
        assert_eq!(rsi(&increasing(10), 14), dec!(50));
        assert_eq!(rsi(&[], 14), dec!(50));
    }

    #[test]
    fn macd_neutral_below_26_points() {
        assert_eq!(macd(&increasing(25)), Macd::default());
    }

    #[test]
    fn macd_positive_in_an_uptrend() {
        let out = macd(&increasing(60));
        assert!(out.macd > Decimal::ZERO);
    }

    #[test]
    fn macd_negative_in_a_downtrend() {
        let series: Vec<Decimal> = (1..=60).rev().map(Decimal::from).collect();
        assert!(macd(&series).macd < Decimal::ZERO);
    }

    #[test]
    fn bollinger_of_constant_series_collapses_to_middle() {
        let series = constant(dec!(50), 25);
        let bands = bollinger(&series, 20, dec!(2));
        assert_eq!(bands.middle, dec!(50));
        assert_eq!(bands.upper, dec!(50));
        assert_eq!(bands.lower, dec!(50));
    }

    #[test]
    fn bollinger_bands_bracket_the_middle() {
        let bands = bollinger(&increasing(40), 20, dec!(2));
        assert!(bands.upper > bands.middle);
        assert!(bands.lower < bands.middle);
    }

    #[test]
    fn identical_input_produces_identical_output() {
        let series = increasing(60);
        assert_eq!(rsi(&series, 14), rsi(&series, 14));
        assert_eq!(macd(&series), macd(&series));
        assert_eq!(
            bollinger(&series, 20, dec!(2)),
            bollinger(&series, 20, dec!(2))
        );
    }
}
