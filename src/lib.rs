//! Breakout scanner: finds stocks sitting just under a breakout trigger.
//!
//! The crate is organised leaves first:
//! - `indicators` - candle model plus SMA/EMA, ATR, ADR% and pivot detection
//! - `patterns` - consolidation, structure, compression and resistance detectors
//! - `scoring` - the 0-100 breakout score and the actionability gate
//! - `scan` - the per-symbol pipeline and the concurrent universe scanner
//! - `market` - the data provider boundary (trait + Polygon implementation)

pub mod config;
pub mod indicators;
pub mod market;
pub mod patterns;
pub mod scan;
pub mod scoring;

pub use config::{ConfigError, ScanConfig};
pub use indicators::candle::{Candle, CandleError, CandleSeries};
pub use market::provider::{DataProvider, ProviderError};
pub use scan::scan_one::{Rejection, ScanResult, SetupType, evaluate, scan_one};
pub use scan::scan_universe::{ScanReport, Scanner};
pub use scoring::breakout_score::{BreakoutScore, ScoreInputs, is_actionable, score_breakout};
