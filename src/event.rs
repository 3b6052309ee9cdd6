//! Progress events emitted by the build pipeline and the live mode.
//!
//! Build code never prints. It sends [`Event`]s down an optional channel and
//! [`crate::output`] turns them into display lines, so every message can be
//! asserted on in tests.

use std::path::PathBuf;
use std::sync::mpsc::Sender;

/// How a message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Why a section pass stopped before processing documents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionAbort {
    #[error("source directory missing: {0}")]
    SourceDirMissing(PathBuf),
    #[error("no .md files in {0}")]
    Empty(PathBuf),
}

/// File-system change kinds the watcher reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Orphan cleanup deleted a generated page.
    OrphanRemoved { section: String, file_name: String },
    /// Orphan cleanup could not list or delete files.
    ReconcileFailed { section: String, error: String },
    /// The section pass stopped early.
    SectionAborted { section: String, reason: SectionAbort },
    /// Document processing is about to start.
    SectionStarted { section: String, document_count: usize },
    DocumentBuilt {
        section: String,
        file_name: String,
        url: String,
    },
    /// Required front-matter fields are missing; no output was written.
    DocumentSkipped {
        section: String,
        file_name: String,
        missing: Vec<String>,
    },
    /// Reading, parsing or writing failed; no output was written.
    DocumentFailed {
        section: String,
        file_name: String,
        error: String,
    },
    IndexPublished {
        section: String,
        path: PathBuf,
        entries: usize,
    },
    IndexFailed { section: String, error: String },
    SectionFinished {
        section: String,
        built: usize,
        skipped: usize,
        failed: usize,
    },
    /// Live mode: a section source directory is being watched.
    WatchStarted { section: String, dir: PathBuf },
    /// Live mode: the watcher reported an error.
    WatchFailed { error: String },
    /// Live mode: a debounced change is about to trigger a rebuild.
    ChangeDetected {
        section: String,
        kind: ChangeKind,
        file_name: String,
    },
    ServerStarted { url: String },
    /// The preview server could not be spawned; watching continues.
    ServerFailed { error: String },
    /// A line of the preview server's own output.
    ServerOutput { line: String, stderr: bool },
    ServerStopped,
}

impl Event {
    pub fn severity(&self) -> Severity {
        match self {
            Event::DocumentBuilt { .. } | Event::IndexPublished { .. } => Severity::Success,
            Event::SectionFinished {
                skipped, failed, ..
            } if *skipped + *failed > 0 => Severity::Warning,
            Event::SectionFinished { .. } => Severity::Success,
            Event::SectionAborted { .. }
            | Event::DocumentSkipped { .. }
            | Event::ServerFailed { .. }
            | Event::ReconcileFailed { .. } => Severity::Warning,
            Event::DocumentFailed { .. } | Event::IndexFailed { .. } | Event::WatchFailed { .. } => {
                Severity::Error
            }
            Event::ServerOutput { stderr: true, .. } => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

/// Send an event if a listener is attached. A hung-up listener is ignored.
pub fn emit(events: Option<&Sender<Event>>, event: Event) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
