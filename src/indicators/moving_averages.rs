//! Moving averages: Simple Moving Average (SMA) and Exponential Moving Average (EMA)
//!
//! Both operate on plain value slices so they can be applied to closes,
//! volumes or any derived series.

use crate::indicators::candle::Candle;

/// Calculates the Simple Moving Average of the most recent `period` values.
///
/// SMA = (V1 + V2 + ... + Vn) / n
///
/// Returns `0.0` if there are not enough values for the given period.
pub fn sma(values: &[f64], period: usize) -> f64 {
    if period == 0 || values.len() < period {
        return 0.0;
    }

    let start_index = values.len() - period;
    values[start_index..].iter().sum::<f64>() / period as f64
}

/// Calculates the full SMA series.
///
/// The returned vector has length `values.len() - period + 1`; empty if there
/// are not enough values.
pub fn sma_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    values
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Calculates the EMA series, one value per input value.
///
/// EMA = V * k + EMA_prev * (1 - k), where k = 2 / (period + 1)
///
/// Evaluated as `EMA_prev + k * (V - EMA_prev)` so a constant input is an
/// exact fixed point.
///
/// The series is seeded with the first value itself rather than an SMA of
/// the first `period` values, so the output length always equals the input
/// length. Empty input yields an empty series.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = first;
    out.push(prev);

    for &value in &values[1..] {
        prev += k * (value - prev);
        out.push(prev);
    }

    out
}

/// Latest EMA value, or `0.0` for empty input.
pub fn ema_last(values: &[f64], period: usize) -> f64 {
    ema(values, period).last().copied().unwrap_or(0.0)
}

/// Mean volume over the most recent `period` candles.
///
/// Uses every candle when fewer than `period` exist; `0.0` for no candles.
pub fn avg_volume(candles: &[Candle], period: usize) -> f64 {
    let start = candles.len().saturating_sub(period);
    let slice = &candles[start..];
    if slice.is_empty() {
        return 0.0;
    }
    slice.iter().map(|c| c.get_volume()).sum::<f64>() / slice.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_values() -> Vec<f64> {
        vec![10.0, 11.0, 12.0, 13.0, 14.0]
    }

    #[test]
    fn test_sma_basic() {
        // (12 + 13 + 14) / 3 = 13.0
        assert_eq!(sma(&sample_values(), 3), 13.0);
    }

    #[test]
    fn test_sma_insufficient_values() {
        assert_eq!(sma(&sample_values(), 10), 0.0);
        assert_eq!(sma(&sample_values(), 0), 0.0);
    }

    #[test]
    fn test_sma_series_values() {
        let series = sma_series(&sample_values(), 3);
        assert_eq!(series, vec![11.0, 12.0, 13.0]);
    }

    #[test]
    fn test_ema_seeds_with_first_value() {
        let series = ema(&sample_values(), 3);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], 10.0);
        // k = 0.5: 11 * 0.5 + 10 * 0.5
        assert_eq!(series[1], 10.5);
        assert_eq!(series[2], 11.25);
    }

    #[test]
    fn test_ema_constant_is_fixed_point() {
        let series = ema(&[42.0; 50], 21);
        assert!(series.iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_ema_empty() {
        assert!(ema(&[], 10).is_empty());
        assert_eq!(ema_last(&[], 10), 0.0);
    }

    #[test]
    fn test_ema_lags_uptrend() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let last = ema_last(&values, 10);
        assert!(last < 139.0, "EMA ({}) should trail the latest value", last);
        assert!(last > sma(&values, 40));
    }

    #[test]
    fn test_avg_volume_uses_available_bars() {
        let candles: Vec<Candle> = (1..=4)
            .map(|i| Candle::new(i, 10.0, 11.0, 9.0, 10.0, i as f64 * 100.0))
            .collect();
        assert_eq!(avg_volume(&candles, 2), 350.0);
        assert_eq!(avg_volume(&candles, 50), 250.0);
        assert_eq!(avg_volume(&[], 50), 0.0);
    }
}
