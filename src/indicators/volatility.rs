//! Volatility indicators: True Range (TR), Average True Range (ATR) and
//! Average Daily Range percent (ADR%)

use crate::indicators::candle::Candle;

pub const DEFAULT_ATR_PERIOD: usize = 14;

/// Calculates the True Range for a single candle.
///
/// True Range is the greatest of:
/// - Current High - Current Low (candle range)
/// - |Current High - Previous Close|
/// - |Current Low - Previous Close|
///
/// For the first candle (no previous close), returns the candle's range.
pub fn true_range(candle: &Candle, prev_close: Option<f64>) -> f64 {
    match prev_close {
        Some(prev) => {
            let high_prev = (candle.get_high() - prev).abs();
            let low_prev = (candle.get_low() - prev).abs();
            candle.range().max(high_prev).max(low_prev)
        }
        None => candle.range(),
    }
}

/// Calculates the Wilder-smoothed ATR series, aligned to the input.
///
/// True ranges are taken from the second candle onward. The first `period`
/// of them are averaged to seed the series, then each following value is
/// `(atr_prev * (period - 1) + tr) / period`.
///
/// The output is left-padded with the seed so `atr[i]` lines up with
/// `candles[i]`; padded values are flat, not back-computed. Returns an empty
/// vector if there are fewer than `period + 1` candles.
pub fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period + 1 {
        return Vec::new();
    }

    let tr: Vec<f64> = candles
        .windows(2)
        .map(|pair| true_range(&pair[1], Some(pair[0].get_close())))
        .collect();

    let seed = tr[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(candles.len());
    out.resize(period + 1, seed);

    let mut prev = seed;
    for &range in &tr[period..] {
        prev = (prev * (period - 1) as f64 + range) / period as f64;
        out.push(prev);
    }

    out
}

/// Average Daily Range as a percent of close over the last `period` candles.
///
/// Mean of `(high - low) / close * 100`. Returns `0.0` when fewer than
/// `period` candles exist.
pub fn adr_pct(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period {
        return 0.0;
    }

    let recent = &candles[candles.len() - period..];
    recent.iter().map(|c| c.range_pct()).sum::<f64>() / period as f64
}
