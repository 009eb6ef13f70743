//! Per-symbol pipeline, universe orchestration and result bookkeeping.

pub mod scan_one;
pub mod scan_universe;
pub mod sink;
pub mod tasks;

pub use scan_one::{Rejection, ScanResult, SetupType, evaluate, scan_one};
pub use scan_universe::{DEFAULT_UNIVERSE, ScanReport, Scanner};
pub use sink::{JsonLinesSink, MemorySink, ResultSink, SinkError};
pub use tasks::{ScanTask, TaskError, TaskStatus, TaskStore};
