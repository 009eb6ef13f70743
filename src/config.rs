use std::env;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::patterns::resistance::TriggerParams;

/// Scanner thresholds and pacing.
///
/// Every field has a default matching the production scanner, so a config
/// file (or environment) only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    // ── Fetching ───────────────────────────────────────────────────
    /// Calendar days of history requested per symbol
    pub lookback_days: i64,
    /// Fixed pause before each symbol's fetch
    pub fetch_delay_ms: u64,
    /// Minimum gap between fetch starts across all symbols; 0 disables
    pub min_fetch_gap_ms: u64,
    pub max_concurrency: usize,

    // ── Hard filters ───────────────────────────────────────────────
    pub min_history_bars: usize,
    pub min_avg_volume: f64,
    pub volume_period: usize,
    pub min_adr_pct: f64,
    pub adr_period: usize,
    /// Checked by the orchestrator right after fetch; unknown caps pass
    pub min_market_cap: f64,
    pub max_distance_pct: f64,

    // ── Detectors ──────────────────────────────────────────────────
    pub base_lookback: usize,
    pub max_base_range_pct: f64,
    pub higher_lows_count: usize,
    pub volume_lookback: usize,
    pub pivot_left: usize,
    pub pivot_right: usize,
    pub trigger_pivot_window: usize,
    pub cluster_tolerance_pct: f64,
    pub min_cluster_touches: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            lookback_days: 420,
            fetch_delay_ms: 500,
            min_fetch_gap_ms: 0,
            max_concurrency: 3,
            min_history_bars: 260,
            min_avg_volume: 1_000_000.0,
            volume_period: 50,
            min_adr_pct: 2.0,
            adr_period: 14,
            min_market_cap: 300_000_000.0,
            max_distance_pct: 3.0,
            base_lookback: 120,
            max_base_range_pct: 25.0,
            higher_lows_count: 3,
            volume_lookback: 30,
            pivot_left: 3,
            pivot_right: 3,
            trigger_pivot_window: 20,
            cluster_tolerance_pct: 0.3,
            min_cluster_touches: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid config `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

impl ScanConfig {
    /// Reads overrides from `SCAN_*` environment variables.
    ///
    /// Unset, empty or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`ScanConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let get = |name: &str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let num = |name: &str, default: f64| {
            get(name).and_then(|s| s.parse().ok()).unwrap_or(default)
        };
        let int = |name: &str, default: usize| {
            get(name).and_then(|s| s.parse().ok()).unwrap_or(default)
        };
        let ms = |name: &str, default: u64| {
            get(name).and_then(|s| s.parse().ok()).unwrap_or(default)
        };

        Self {
            lookback_days: get("SCAN_LOOKBACK_DAYS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.lookback_days),
            fetch_delay_ms: ms("SCAN_FETCH_DELAY_MS", d.fetch_delay_ms),
            min_fetch_gap_ms: ms("SCAN_MIN_FETCH_GAP_MS", d.min_fetch_gap_ms),
            max_concurrency: int("SCAN_MAX_CONCURRENCY", d.max_concurrency),
            min_history_bars: int("SCAN_MIN_HISTORY_BARS", d.min_history_bars),
            min_avg_volume: num("SCAN_MIN_AVG_VOLUME", d.min_avg_volume),
            volume_period: int("SCAN_VOLUME_PERIOD", d.volume_period),
            min_adr_pct: num("SCAN_MIN_ADR_PCT", d.min_adr_pct),
            adr_period: int("SCAN_ADR_PERIOD", d.adr_period),
            min_market_cap: num("SCAN_MIN_MARKET_CAP", d.min_market_cap),
            max_distance_pct: num("SCAN_MAX_DISTANCE_PCT", d.max_distance_pct),
            base_lookback: int("SCAN_BASE_LOOKBACK", d.base_lookback),
            max_base_range_pct: num("SCAN_MAX_BASE_RANGE_PCT", d.max_base_range_pct),
            higher_lows_count: int("SCAN_HIGHER_LOWS_COUNT", d.higher_lows_count),
            volume_lookback: int("SCAN_VOLUME_LOOKBACK", d.volume_lookback),
            pivot_left: int("SCAN_PIVOT_LEFT", d.pivot_left),
            pivot_right: int("SCAN_PIVOT_RIGHT", d.pivot_right),
            trigger_pivot_window: int("SCAN_TRIGGER_PIVOT_WINDOW", d.trigger_pivot_window),
            cluster_tolerance_pct: num("SCAN_CLUSTER_TOLERANCE_PCT", d.cluster_tolerance_pct),
            min_cluster_touches: int("SCAN_MIN_CLUSTER_TOUCHES", d.min_cluster_touches),
        }
    }

    /// Rejects settings the scanner cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(invalid("max_concurrency", "must be at least 1"));
        }
        if self.lookback_days <= 0 {
            return Err(invalid("lookback_days", "must be positive"));
        }
        let periods = [
            ("volume_period", self.volume_period),
            ("adr_period", self.adr_period),
            ("base_lookback", self.base_lookback),
            ("volume_lookback", self.volume_lookback),
            ("trigger_pivot_window", self.trigger_pivot_window),
            ("min_cluster_touches", self.min_cluster_touches),
        ];
        if let Some((field, _)) = periods.iter().find(|(_, v)| *v == 0) {
            return Err(invalid(*field, "must be at least 1"));
        }
        if self.higher_lows_count < 2 {
            return Err(invalid("higher_lows_count", "must be at least 2"));
        }
        let thresholds = [
            ("min_avg_volume", self.min_avg_volume),
            ("min_adr_pct", self.min_adr_pct),
            ("min_market_cap", self.min_market_cap),
            ("max_distance_pct", self.max_distance_pct),
            ("max_base_range_pct", self.max_base_range_pct),
            ("cluster_tolerance_pct", self.cluster_tolerance_pct),
        ];
        if let Some((field, _)) = thresholds
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(invalid(*field, "must be a non-negative number"));
        }
        Ok(())
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    pub fn min_fetch_gap(&self) -> Duration {
        Duration::from_millis(self.min_fetch_gap_ms)
    }

    pub fn trigger_params(&self) -> TriggerParams {
        TriggerParams {
            pivot_left: self.pivot_left,
            pivot_right: self.pivot_right,
            pivot_window: self.trigger_pivot_window,
            tolerance_pct: self.cluster_tolerance_pct,
            min_touches: self.min_cluster_touches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fetch_delay(), Duration::from_millis(500));
        assert_eq!(config.max_concurrency, 3);
    }

    #[test]
    fn test_lookup_overrides_and_fallbacks() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SCAN_MAX_CONCURRENCY", " 8 "),
            ("SCAN_MIN_ADR_PCT", "2.5"),
            ("SCAN_MIN_AVG_VOLUME", "lots"),
            ("SCAN_FETCH_DELAY_MS", ""),
        ]);
        let config = ScanConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.min_adr_pct, 2.5);
        assert_eq!(config.min_avg_volume, 1_000_000.0);
        assert_eq!(config.fetch_delay_ms, 500);
    }

    #[test]
    fn test_zero_concurrency_is_invalid() {
        let config = ScanConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "max_concurrency",
                reason: "must be at least 1"
            })
        );
    }

    #[test]
    fn test_negative_threshold_is_invalid() {
        let config = ScanConfig {
            max_distance_pct: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "max_distance_pct", .. })
        ));
    }

    #[test]
    fn test_zero_cluster_touches_is_invalid() {
        let config = ScanConfig {
            min_cluster_touches: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "min_cluster_touches",
                reason: "must be at least 1"
            })
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{"max_concurrency": 5, "min_adr_pct": 3.0}"#).unwrap();
        assert_eq!(config.max_concurrency, 5);
        assert_eq!(config.min_adr_pct, 3.0);
        assert_eq!(config.lookback_days, 420);
    }
}
