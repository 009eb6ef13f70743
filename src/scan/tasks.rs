//! In-memory tracker for background scan jobs.
//!
//! `TaskStore` is a cheap-to-clone handle; every clone sees the same tasks.
//! Lifecycle: `Pending -> Running -> Completed | Failed`. A pending task may
//! also fail directly.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::scan::scan_one::ScanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanTask {
    pub id: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Vec<ScanResult>,
    pub error: Option<String>,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("unknown task `{0}`")]
    NotFound(String),
    #[error("task `{id}` cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
}

#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<Mutex<HashMap<String, ScanTask>>>,
    seq: Arc<AtomicU64>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending scan over `symbols` and returns its id.
    pub fn create(&self, symbols: Vec<String>) -> String {
        let now = Utc::now();
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let id = format!("scan-{}-{n}", now.timestamp_millis());

        let task = ScanTask {
            id: id.clone(),
            status: TaskStatus::Pending,
            created_at: now,
            started_at: None,
            completed_at: None,
            results: Vec::new(),
            error: None,
            symbols,
        };
        self.tasks.lock().insert(id.clone(), task);
        debug!(task_id = %id, "scan task created");
        id
    }

    /// Marks a pending task running and hands back the symbols to scan.
    pub fn start(&self, id: &str) -> Result<Vec<String>, TaskError> {
        self.transition(id, TaskStatus::Running, |task, now| {
            task.started_at = Some(now);
        })
        .map(|task| task.symbols)
    }

    pub fn complete(&self, id: &str, results: Vec<ScanResult>) -> Result<(), TaskError> {
        self.transition(id, TaskStatus::Completed, |task, now| {
            task.completed_at = Some(now);
            task.results = results;
        })
        .map(|_| ())
    }

    pub fn fail(&self, id: &str, error: impl Into<String>) -> Result<(), TaskError> {
        let error = error.into();
        self.transition(id, TaskStatus::Failed, |task, now| {
            task.completed_at = Some(now);
            task.error = Some(error);
        })
        .map(|_| ())
    }

    /// Snapshot of a task.
    pub fn get(&self, id: &str) -> Option<ScanTask> {
        self.tasks.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Drops every task created more than `max_age` ago. Returns how many went.
    pub fn cleanup_older_than(&self, max_age: TimeDelta) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|_, task| task.created_at >= cutoff);
        before - tasks.len()
    }

    fn transition(
        &self,
        id: &str,
        to: TaskStatus,
        apply: impl FnOnce(&mut ScanTask, DateTime<Utc>),
    ) -> Result<ScanTask, TaskError> {
        let mut tasks = self.tasks.lock();
        let task = tasks.get_mut(id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        let allowed = match to {
            TaskStatus::Running => task.status == TaskStatus::Pending,
            TaskStatus::Completed => task.status == TaskStatus::Running,
            TaskStatus::Failed => !task.status.is_finished(),
            TaskStatus::Pending => false,
        };
        if !allowed {
            return Err(TaskError::InvalidTransition {
                id: id.to_string(),
                from: task.status,
                to,
            });
        }

        task.status = to;
        apply(task, Utc::now());
        debug!(task_id = %id, status = ?to, "scan task updated");
        Ok(task.clone())
    }
}
