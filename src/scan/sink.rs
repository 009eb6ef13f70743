//! Append-only destinations for scan results.

use std::io::Write;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use crate::scan::scan_one::ScanResult;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistence is a downstream consumer; it only ever appends.
pub trait ResultSink: Send + Sync {
    fn append(&self, results: &[ScanResult]) -> Result<(), SinkError>;
}

/// Keeps everything in memory. Used by tests and short-lived runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Mutex<Vec<ScanResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<ScanResult> {
        self.rows.lock().clone()
    }
}

impl ResultSink for MemorySink {
    fn append(&self, results: &[ScanResult]) -> Result<(), SinkError> {
        self.rows.lock().extend_from_slice(results);
        Ok(())
    }
}

#[derive(Serialize)]
struct Row<'a> {
    #[serde(flatten)]
    result: &'a ScanResult,
    scanned_at: DateTime<Utc>,
}

/// One JSON object per line, stamped with `scanned_at`.
pub struct JsonLinesSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> ResultSink for JsonLinesSink<W> {
    fn append(&self, results: &[ScanResult]) -> Result<(), SinkError> {
        if results.is_empty() {
            return Ok(());
        }

        let scanned_at = Utc::now();
        let mut out = self.out.lock();
        for result in results {
            serde_json::to_writer(&mut *out, &Row { result, scanned_at })?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}
