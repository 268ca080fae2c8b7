//! Structured events for a vendorize run
//!
//! Every copy, skip and rewrite produces one event. Sinks decide how to
//! present them.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const EVENT_VERSION: u32 = 1;

/// Actions taken during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VendorEvent {
    RunStarted {
        root: String,
        destination: String,
        dry_run: bool,
    },
    TraversalStarted {
        identifier: String,
    },
    ImportsDiscovered {
        identifier: String,
        imports: Vec<String>,
    },
    UnitExcluded {
        identifier: String,
        prefix: String,
    },
    Copying {
        identifier: String,
        from: PathBuf,
        to: PathBuf,
        dry_run: bool,
    },
    FileCopied {
        from: PathBuf,
        to: PathBuf,
        dry_run: bool,
    },
    PreexistingSkipped {
        identifier: String,
        destination: PathBuf,
    },
    FileRewritten {
        identifier: String,
        file: PathBuf,
        replaced: usize,
        dry_run: bool,
    },
    TraversalCompleted {
        identifier: String,
        remaining: usize,
    },
    TraversalFailed {
        identifier: String,
        category: String,
        error: String,
        remaining: usize,
    },
    RunCompleted {
        copied: usize,
        visited: usize,
        errors: usize,
        elapsed_ms: u64,
    },
}

/// Event envelope with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub version: u32,
    pub sequence: u64,
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: VendorEvent,
}

/// Event sink trait for emitting events
pub trait EventSink: Send + Sync {
    fn emit(&self, envelope: &EventEnvelope);
}

/// Sink that forwards events to `tracing`
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn emit(&self, envelope: &EventEnvelope) {
        match &envelope.event {
            VendorEvent::RunStarted {
                root,
                destination,
                dry_run,
            } => {
                tracing::info!(%root, %destination, dry_run, "Vendorizing");
            }
            VendorEvent::TraversalStarted { identifier } => {
                tracing::debug!("Vendorizing {}", identifier);
            }
            VendorEvent::ImportsDiscovered {
                identifier,
                imports,
            } => {
                tracing::debug!("{} imports {:?}", identifier, imports);
            }
            VendorEvent::UnitExcluded { identifier, prefix } => {
                tracing::debug!("Not copying {} (excluded by {:?})", identifier, prefix);
            }
            VendorEvent::Copying { from, to, .. } => {
                tracing::info!("Copying contents of {:?} to {:?}", from, to);
            }
            VendorEvent::FileCopied { from, to, .. } => {
                tracing::debug!("Copying {:?} to {:?}", from, to);
            }
            VendorEvent::PreexistingSkipped { destination, .. } => {
                tracing::info!("Ignored (preexisting): {:?}", destination);
            }
            VendorEvent::FileRewritten { file, replaced, .. } => {
                tracing::info!("Rewrote {} imports in {:?}", replaced, file);
            }
            VendorEvent::TraversalCompleted {
                identifier,
                remaining,
            } => {
                tracing::info!("[Packages Remaining: {}] Package vendorized {}", remaining, identifier);
            }
            VendorEvent::TraversalFailed {
                error, remaining, ..
            } => {
                tracing::warn!("[Packages Remaining: {}] {}", remaining, error);
            }
            VendorEvent::RunCompleted {
                copied,
                visited,
                errors,
                elapsed_ms,
            } => {
                tracing::info!(copied, visited, errors, elapsed_ms, "Run complete");
            }
        }
    }
}

/// A buffering event sink that collects events
#[derive(Default)]
pub struct BufferingEventSink {
    events: RwLock<Vec<EventEnvelope>>,
}

impl BufferingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_events(&self) -> Vec<EventEnvelope> {
        self.events.read().clone()
    }

    pub fn events(&self) -> Vec<VendorEvent> {
        self.events.read().iter().map(|e| e.event.clone()).collect()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl EventSink for BufferingEventSink {
    fn emit(&self, envelope: &EventEnvelope) {
        self.events.write().push(envelope.clone());
    }
}

/// Writes one JSON document per event
pub struct JsonLinesEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesEventSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl EventSink for JsonLinesEventSink {
    fn emit(&self, envelope: &EventEnvelope) {
        let line = match serde_json::to_string(envelope) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to serialize event {}: {}", envelope.sequence, e);
                return;
            }
        };
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{line}") {
            tracing::warn!("Failed to write event {}: {}", envelope.sequence, e);
        }
    }
}

/// Stamps events with the run id and a per-run sequence before handing
/// them to the sink
#[derive(Clone)]
pub struct EventBus {
    run_id: Arc<str>,
    sequence: Arc<AtomicU64>,
    sink: Arc<dyn EventSink>,
}

impl EventBus {
    pub fn new(run_id: impl Into<Arc<str>>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            run_id: run_id.into(),
            sequence: Arc::new(AtomicU64::new(0)),
            sink,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn emit(&self, event: VendorEvent) {
        let envelope = EventEnvelope {
            version: EVENT_VERSION,
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            run_id: self.run_id.to_string(),
            timestamp: Utc::now(),
            event,
        };
        self.sink.emit(&envelope);
    }
}
