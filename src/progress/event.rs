//! Event schema for progress observability.

use serde::Serialize;
use std::path::PathBuf;

/// Progress of a long-running engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Directory walk began
    ScanStarted { root: PathBuf },
    /// Walk finished; `to_hash` entries need hashing
    ScanFinished { observed: usize, to_hash: usize },
    /// One entry hashed during update or import
    Hashed { done: usize, total: usize },
    /// One tracked entry checked during verify
    Checked { done: usize, total: usize },
}

/// Receiver of progress events.
///
/// Events may arrive from worker threads, hence `Sync`.
pub trait ProgressSink: Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: ProgressEvent) {}
}
