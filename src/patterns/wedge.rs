//! Ascending lows (rising wedge / higher-lows structure)

use crate::indicators::candle::Candle;
use crate::indicators::pivots::{DEFAULT_PIVOT_LEFT, DEFAULT_PIVOT_RIGHT, pivot_lows};

pub const DEFAULT_MIN_LOWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HigherLows {
    pub ok: bool,
    /// Prices of the pivot lows that were compared, oldest first
    pub points: Vec<f64>,
}

/// Checks whether the last `min_count` pivot lows are strictly ascending.
///
/// Fewer than `min_count` pivot lows (or `min_count < 2`) is a negative verdict.
pub fn detect_higher_lows(candles: &[Candle], min_count: usize) -> HigherLows {
    let lows = pivot_lows(candles, DEFAULT_PIVOT_LEFT, DEFAULT_PIVOT_RIGHT);
    if min_count < 2 || lows.len() < min_count {
        return HigherLows::default();
    }

    let points: Vec<f64> = lows[lows.len() - min_count..].iter().map(|p| p.price).collect();
    let ok = points.windows(2).all(|w| w[1] > w[0]);

    HigherLows { ok, points }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat bars at 100 with dips placed at the given (index, low) points.
    fn with_dips(n: usize, dips: &[(usize, f64)]) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let low = dips
                    .iter()
                    .find(|(at, _)| *at == i)
                    .map(|&(_, low)| low)
                    .unwrap_or(99.0);
                Candle::new(i as i64, 100.0, 101.0, low, 100.0, 1.0)
            })
            .collect()
    }

    #[test]
    fn test_ascending_lows() {
        let candles = with_dips(40, &[(5, 90.0), (15, 92.0), (25, 94.0)]);
        let result = detect_higher_lows(&candles, 3);
        assert!(result.ok);
        assert_eq!(result.points, vec![90.0, 92.0, 94.0]);
    }

    #[test]
    fn test_only_last_three_count() {
        let candles = with_dips(50, &[(5, 95.0), (15, 90.0), (25, 92.0), (35, 94.0)]);
        assert!(detect_higher_lows(&candles, 3).ok);
    }

    #[test]
    fn test_equal_lows_are_not_ascending() {
        let candles = with_dips(40, &[(5, 90.0), (15, 92.0), (25, 92.0)]);
        assert!(!detect_higher_lows(&candles, 3).ok);
    }

    #[test]
    fn test_not_enough_pivots() {
        let candles = with_dips(40, &[(5, 90.0), (15, 92.0)]);
        let result = detect_higher_lows(&candles, 3);
        assert!(!result.ok);
        assert!(result.points.is_empty());
    }
}
