//! Resistance clustering and breakout trigger selection

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicators::candle::Candle;
use crate::indicators::pivots::pivot_highs;
use crate::patterns::inside_day::inside_day_high;

pub const DEFAULT_CLUSTER_TOLERANCE_PCT: f64 = 0.3;
pub const DEFAULT_MIN_CLUSTER_TOUCHES: usize = 3;
/// Only the most recent pivots take part in clustering.
pub const DEFAULT_TRIGGER_PIVOT_WINDOW: usize = 20;

/// A zone formed by merging nearby pivot prices.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Running mean of the member prices
    pub price: f64,
    pub touches: usize,
    pub members: Vec<f64>,
}

impl Cluster {
    fn seed(price: f64) -> Self {
        Self {
            price,
            touches: 1,
            members: vec![price],
        }
    }

    fn absorb(&mut self, price: f64) {
        let n = self.touches as f64;
        self.price = (self.price * n + price) / (n + 1.0);
        self.touches += 1;
        self.members.push(price);
    }

    fn accepts(&self, price: f64, tolerance_pct: f64) -> bool {
        (price - self.price).abs() <= self.price * tolerance_pct / 100.0
    }
}

/// Greedy first-fit clustering of price levels.
///
/// Prices are visited in ascending order; each joins the first existing
/// cluster whose running mean is within `tolerance_pct` of it, else it seeds
/// a new cluster. Clusters are never re-sorted or re-merged while building,
/// so the assignment depends on visiting order. The result is ordered by
/// touch count, most first, with ties kept in creation order.
pub fn cluster_levels(prices: &[f64], tolerance_pct: f64) -> Vec<Cluster> {
    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut clusters: Vec<Cluster> = Vec::new();
    for price in sorted {
        match clusters.iter_mut().find(|c| c.accepts(price, tolerance_pct)) {
            Some(cluster) => cluster.absorb(price),
            None => clusters.push(Cluster::seed(price)),
        }
    }

    clusters.sort_by(|a, b| b.touches.cmp(&a.touches));
    clusters
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerReason {
    FlatTopCluster,
    InsideDayHigh,
    SwingHigh,
}

impl TriggerReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerReason::FlatTopCluster => "FLAT_TOP_CLUSTER",
            TriggerReason::InsideDayHigh => "INSIDE_DAY_HIGH",
            TriggerReason::SwingHigh => "SWING_HIGH",
        }
    }
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub price: f64,
    pub reason: TriggerReason,
}

/// Outcome of trigger selection. `trigger` is `None` when nothing resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSelection {
    pub trigger: Option<Trigger>,
    /// Touches of the strongest cluster when it qualified as a flat top, else 0
    pub cluster_touches: usize,
    pub best_cluster: Option<Cluster>,
}

/// Parameters for [`pick_trigger`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerParams {
    pub pivot_left: usize,
    pub pivot_right: usize,
    pub pivot_window: usize,
    pub tolerance_pct: f64,
    pub min_touches: usize,
}

impl Default for TriggerParams {
    fn default() -> Self {
        Self {
            pivot_left: 3,
            pivot_right: 3,
            pivot_window: DEFAULT_TRIGGER_PIVOT_WINDOW,
            tolerance_pct: DEFAULT_CLUSTER_TOLERANCE_PCT,
            min_touches: DEFAULT_MIN_CLUSTER_TOUCHES,
        }
    }
}

/// Selects the breakout trigger price.
///
/// Priority:
/// 1. strongest pivot-high cluster with at least `min_touches` touches
/// 2. the latest bar's high when it is an inside day
/// 3. the most recent swing-high pivot
pub fn pick_trigger(candles: &[Candle], params: &TriggerParams) -> TriggerSelection {
    let pivots = pivot_highs(candles, params.pivot_left, params.pivot_right);
    let recent = &pivots[pivots.len().saturating_sub(params.pivot_window)..];
    let prices: Vec<f64> = recent.iter().map(|p| p.price).collect();

    let best_cluster = cluster_levels(&prices, params.tolerance_pct).into_iter().next();

    if let Some(cluster) = best_cluster.as_ref().filter(|c| c.touches >= params.min_touches) {
        return TriggerSelection {
            trigger: Some(Trigger {
                price: cluster.price,
                reason: TriggerReason::FlatTopCluster,
            }),
            cluster_touches: cluster.touches,
            best_cluster,
        };
    }

    let fallback = inside_day_high(candles)
        .map(|price| Trigger {
            price,
            reason: TriggerReason::InsideDayHigh,
        })
        .or_else(|| {
            prices.last().map(|&price| Trigger {
                price,
                reason: TriggerReason::SwingHigh,
            })
        });

    TriggerSelection {
        trigger: fallback,
        cluster_touches: 0,
        best_cluster,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_merges_within_tolerance() {
        let clusters = cluster_levels(&[100.0, 100.2, 105.0, 100.1], 0.3);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].touches, 3);
        assert!((clusters[0].price - 100.1).abs() < 1e-9);
        assert_eq!(clusters[0].members, vec![100.0, 100.1, 100.2]);
        assert_eq!(clusters[1].price, 105.0);
    }

    #[test]
    fn test_cluster_is_first_fit_on_running_mean() {
        // 100 seeds, 100.3 joins (within 0.3), mean 100.15; 100.5 is 0.35 away
        // from the mean (tolerance ~0.3005) and starts its own cluster.
        let clusters = cluster_levels(&[100.5, 100.3, 100.0], 0.3);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![100.0, 100.3]);
        assert_eq!(clusters[1].members, vec![100.5]);
    }

    #[test]
    fn test_cluster_empty() {
        assert!(cluster_levels(&[], 0.3).is_empty());
    }

    /// Repeating 10-bar cycle whose 6th bar prints `peak`.
    fn flat_top(cycles: usize, peak: f64) -> Vec<Candle> {
        (0..cycles * 10)
            .map(|i| {
                let high = if i % 10 == 5 { peak } else { 100.5 };
                Candle::new(i as i64, 99.8, high, 98.5, 100.0, 1.0)
            })
            .collect()
    }

    #[test]
    fn test_trigger_prefers_flat_top_cluster() {
        let candles = flat_top(5, 101.0);
        let selection = pick_trigger(&candles, &TriggerParams::default());
        let trigger = selection.trigger.unwrap();
        assert_eq!(trigger.reason, TriggerReason::FlatTopCluster);
        assert_eq!(trigger.price, 101.0);
        assert_eq!(selection.cluster_touches, 5);
    }

    #[test]
    fn test_trigger_falls_back_to_inside_day() {
        let mut candles = flat_top(2, 101.0);
        candles.push(Candle::new(100, 99.8, 100.4, 98.6, 100.0, 1.0));
        let selection = pick_trigger(&candles, &TriggerParams::default());
        let trigger = selection.trigger.unwrap();
        assert_eq!(trigger.reason, TriggerReason::InsideDayHigh);
        assert_eq!(trigger.price, 100.4);
        assert_eq!(selection.cluster_touches, 0);
    }

    #[test]
    fn test_trigger_falls_back_to_swing_high() {
        let mut candles = flat_top(2, 101.0);
        candles[15] = Candle::new(15, 99.8, 102.0, 98.5, 100.0, 1.0);
        candles.push(Candle::new(100, 99.8, 100.6, 98.0, 100.0, 1.0));
        let trigger = pick_trigger(&candles, &TriggerParams::default()).trigger.unwrap();
        assert_eq!(trigger.reason, TriggerReason::SwingHigh);
        assert_eq!(trigger.price, 102.0);
    }

    #[test]
    fn test_no_trigger_without_pivots() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64;
                Candle::new(i, base, base + 1.0, base - 1.0, base + 0.5, 1.0)
            })
            .collect();
        assert!(pick_trigger(&candles, &TriggerParams::default()).trigger.is_none());
    }
}
