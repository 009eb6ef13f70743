//! Pivot (swing) highs and lows

use crate::indicators::candle::Candle;

pub const DEFAULT_PIVOT_LEFT: usize = 3;
pub const DEFAULT_PIVOT_RIGHT: usize = 3;

/// A confirmed local extremum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    /// Index into the candle slice the pivot was detected on
    pub index: usize,
    pub price: f64,
}

/// Finds pivot highs.
///
/// Bar `i` is a pivot high when its high is strictly above every high in
/// `[i - left, i)` and no high in `(i, i + right]` exceeds it. Equal highs to
/// the right are allowed, so the first bar of a flat top wins the tie.
/// Bars without `left` bars before and `right` bars after are never pivots.
pub fn pivot_highs(candles: &[Candle], left: usize, right: usize) -> Vec<Pivot> {
    find_pivots(candles, left, right, |c| c.get_high(), |a, b| a > b)
}

/// Finds pivot lows. Mirror image of [`pivot_highs`] using lows and `<`.
pub fn pivot_lows(candles: &[Candle], left: usize, right: usize) -> Vec<Pivot> {
    find_pivots(candles, left, right, |c| c.get_low(), |a, b| a < b)
}

fn find_pivots(
    candles: &[Candle],
    left: usize,
    right: usize,
    price_of: impl Fn(&Candle) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> Vec<Pivot> {
    if candles.len() < left + right + 1 {
        return Vec::new();
    }

    (left..candles.len() - right)
        .filter_map(|i| {
            let price = price_of(&candles[i]);
            let clears_left = candles[i - left..i]
                .iter()
                .all(|c| beats(price, price_of(c)));
            let holds_right = candles[i + 1..=i + right]
                .iter()
                .all(|c| !beats(price_of(c), price));

            (clears_left && holds_right).then_some(Pivot { index: i, price })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_highs_lows(points: &[(f64, f64)]) -> Vec<Candle> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(h, l))| Candle::new(i as i64, l, h, l, h, 1.0))
            .collect()
    }

    #[test]
    fn test_single_peak() {
        let candles = from_highs_lows(&[
            (10.0, 9.0),
            (11.0, 9.0),
            (12.0, 9.0),
            (15.0, 9.0),
            (12.0, 9.0),
            (11.0, 9.0),
            (10.0, 9.0),
        ]);
        let highs = pivot_highs(&candles, 3, 3);
        assert_eq!(highs, vec![Pivot { index: 3, price: 15.0 }]);
    }

    #[test]
    fn test_edge_bars_never_pivot() {
        let candles = from_highs_lows(&[
            (20.0, 1.0),
            (10.0, 5.0),
            (10.0, 5.0),
            (10.0, 5.0),
            (20.0, 1.0),
        ]);
        assert!(pivot_highs(&candles, 1, 1).is_empty());
        assert!(pivot_lows(&candles, 1, 1).is_empty());
    }

    #[test]
    fn test_equal_high_on_left_blocks_pivot() {
        let candles = from_highs_lows(&[(10.0, 9.0), (15.0, 9.0), (15.0, 9.0), (10.0, 9.0)]);
        // index 1: right neighbour ties (allowed); index 2: left neighbour ties (blocked)
        let highs = pivot_highs(&candles, 1, 1);
        assert_eq!(highs, vec![Pivot { index: 1, price: 15.0 }]);
    }

    #[test]
    fn test_higher_high_on_right_blocks_pivot() {
        let candles = from_highs_lows(&[(10.0, 9.0), (15.0, 9.0), (16.0, 9.0), (10.0, 9.0)]);
        let highs = pivot_highs(&candles, 1, 1);
        assert_eq!(highs, vec![Pivot { index: 2, price: 16.0 }]);
    }

    #[test]
    fn test_pivot_lows() {
        let candles = from_highs_lows(&[
            (20.0, 10.0),
            (20.0, 9.0),
            (20.0, 7.0),
            (20.0, 8.0),
            (20.0, 9.0),
        ]);
        let lows = pivot_lows(&candles, 2, 2);
        assert_eq!(lows, vec![Pivot { index: 2, price: 7.0 }]);
    }

    #[test]
    fn test_too_short_series() {
        let candles = from_highs_lows(&[(10.0, 9.0), (12.0, 8.0)]);
        assert!(pivot_highs(&candles, 3, 3).is_empty());
    }
}
