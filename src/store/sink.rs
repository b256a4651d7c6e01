//! # Event Sinks
//!
//! The store reports every finished operation to an [`EventSink`] instead of a
//! global logger, so callers decide where tracing goes and tests can observe it.

use std::path::Path;
use std::sync::Mutex;

use crate::error::{Operation, StoreError};

/// A successful store operation.
#[derive(Debug, Clone, Copy)]
pub struct StoreEvent<'a> {
    pub op: Operation,
    pub path: Option<&'a Path>,
    /// Short operation-specific summary, e.g. an array's dtype and shape.
    pub detail: Option<&'a str>,
}

/// Receives store events. Implementations must be cheap; they run inline.
pub trait EventSink: Send + Sync {
    fn succeeded(&self, event: &StoreEvent<'_>);

    /// Called with the error right before it is returned to the caller.
    fn failed(&self, _error: &StoreError) {}
}

// --- LogSink ---

/// Forwards events to the `log` facade under the `artifact_store` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn succeeded(&self, event: &StoreEvent<'_>) {
        match (event.path, event.detail) {
            (Some(path), Some(detail)) => {
                log::info!(target: "artifact_store", "{} {} ({})", event.op, path.display(), detail)
            }
            (Some(path), None) => log::info!(target: "artifact_store", "{} {}", event.op, path.display()),
            (None, Some(detail)) => log::info!(target: "artifact_store", "{} ({})", event.op, detail),
            (None, None) => log::info!(target: "artifact_store", "{}", event.op),
        }
    }

    fn failed(&self, error: &StoreError) {
        log::debug!(target: "artifact_store", "{error}");
    }
}

// --- NullSink ---

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn succeeded(&self, _event: &StoreEvent<'_>) {}
}

// --- MemorySink ---

/// An owned copy of a [`StoreEvent`] or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub op: Operation,
    pub path: Option<std::path::PathBuf>,
    pub detail: Option<String>,
    pub ok: bool,
}

/// Keeps every event in memory. Useful for asserting on what a pipeline step
/// persisted.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: RecordedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl EventSink for MemorySink {
    fn succeeded(&self, event: &StoreEvent<'_>) {
        self.push(RecordedEvent {
            op: event.op,
            path: event.path.map(Path::to_path_buf),
            detail: event.detail.map(str::to_string),
            ok: true,
        });
    }

    fn failed(&self, error: &StoreError) {
        self.push(RecordedEvent {
            op: error.operation(),
            path: error.path().map(Path::to_path_buf),
            detail: Some(error.kind().to_string()),
            ok: false,
        });
    }
}
