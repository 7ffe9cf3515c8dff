//! Per-pass results and process-wide repricing statistics

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub updated: u64,
    pub errors: u64,
    pub duration_ms: u64,
    /// Another pass held the single-pass guard; nothing ran
    pub busy: bool,
}

impl RunResult {
    pub fn busy() -> Self {
        Self {
            busy: true,
            ..Self::default()
        }
    }
}

/// Statistics scoped to the scheduler's lifetime. Reset only on restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Completed passes, including passes that aborted on a store failure
    pub total_updates_ever: u64,
    /// Applied price changes across all passes
    pub succeeded: u64,
    /// Item, owner and pass-wide failures across all passes
    pub failed: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    /// Smoothed as `(previous + latest) / 2`, not a true mean
    pub average_run_duration_ms: f64,
    pub last_run_updated: u64,
    pub last_run_errors: u64,
    /// Periodic execution is scheduled
    pub running: bool,
    pub pass_in_progress: bool,
}

impl RunStats {
    /// Folds a finished pass into the totals. Busy results are ignored.
    pub fn record_pass(&mut self, result: &RunResult, finished_at: DateTime<Utc>) {
        if result.busy {
            return;
        }
        self.total_updates_ever += 1;
        self.succeeded += result.updated;
        self.failed += result.errors;
        self.last_run_at = Some(finished_at);
        self.average_run_duration_ms =
            (self.average_run_duration_ms + result.duration_ms as f64) / 2.0;
        self.last_run_updated = result.updated;
        self.last_run_errors = result.errors;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
