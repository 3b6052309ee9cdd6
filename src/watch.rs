//! Live rebuild loop.
//!
//! Watches every existing section source directory (non-recursively) and
//! rebuilds a section once its changes have settled:
//!
//! ```text
//! notify ──▶ relevant_changes() ──▶ Debouncer ──▶ pipeline::build_section()
//!            (*.md, no temp files)   (per-section     (same pass as `build`)
//!                                     deadline)
//! ```
//!
//! Every relevant event pushes its section's deadline out by the debounce
//! window. A section is rebuilt when its deadline passes without further
//! events, so a burst of saves yields one pass. Sections debounce
//! independently. Rebuilds run on the loop thread; events arriving during a
//! pass wait in the channel and schedule another pass afterwards.
//!
//! The loop polls the shutdown flag at least every [`IDLE_POLL`].

use crate::config::SiteConfig;
use crate::event::{ChangeKind, Event, emit};
use crate::naming::{self, SOURCE_EXT};
use crate::pipeline::{self, BuildMode};
use notify::{EventKind, RecursiveMode, Watcher};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Upper bound on how long the loop blocks without checking the shutdown flag.
pub const IDLE_POLL: Duration = Duration::from_millis(200);

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),
}

// =============================================================================
// Debounce State
// =============================================================================

/// A change waiting for its section's quiet period to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    /// Position of the section in `SiteConfig::sections`.
    pub section: usize,
    /// The most recent change seen for the section.
    pub kind: ChangeKind,
    pub file_name: String,
}

/// Per-section trailing-edge debounce. Time is passed in so tests control it.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: BTreeMap<usize, (Instant, PendingChange)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: BTreeMap::new(),
        }
    }

    /// Record a change, resetting the section's deadline to `now + window`.
    pub fn record(&mut self, section: usize, kind: ChangeKind, file_name: String, now: Instant) {
        let change = PendingChange {
            section,
            kind,
            file_name,
        };
        self.pending.insert(section, (now + self.window, change));
    }

    /// Remove and return every change whose deadline has passed, in section order.
    pub fn take_due(&mut self, now: Instant) -> Vec<PendingChange> {
        let due: Vec<usize> = self
            .pending
            .iter()
            .filter(|(_, (deadline, _))| *deadline <= now)
            .map(|(section, _)| *section)
            .collect();
        due.into_iter()
            .filter_map(|section| self.pending.remove(&section).map(|(_, change)| change))
            .collect()
    }

    /// How long to wait for the next event: until the nearest deadline,
    /// capped at [`IDLE_POLL`].
    pub fn timeout(&self, now: Instant) -> Duration {
        self.pending
            .values()
            .map(|(deadline, _)| deadline.saturating_duration_since(now))
            .min()
            .map_or(IDLE_POLL, |wait| wait.min(IDLE_POLL))
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

// =============================================================================
// Event Filtering
// =============================================================================

fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}

/// Source documents touched by a notify event, mapped to their section.
///
/// `dirs` pairs each watched directory with its section position. Only
/// `.md` files directly inside a watched directory count.
pub fn relevant_changes(
    event: &notify::Event,
    dirs: &[(usize, PathBuf)],
) -> Vec<(usize, ChangeKind, String)> {
    let Some(kind) = change_kind(&event.kind) else {
        return Vec::new();
    };
    event
        .paths
        .iter()
        .filter(|path| naming::has_extension(path, SOURCE_EXT) && !naming::is_temp_file(path))
        .filter_map(|path| {
            let parent = path.parent()?;
            dirs.iter()
                .find(|(_, dir)| dir == parent)
                .map(|(section, _)| (*section, kind, naming::file_name(path)))
        })
        .collect()
}

// =============================================================================
// Watcher Setup
// =============================================================================

/// Existing section source directories, canonicalized so they compare equal
/// to the paths notify reports.
fn watched_dirs(config: &SiteConfig) -> Vec<(usize, PathBuf)> {
    config
        .sections
        .iter()
        .enumerate()
        .filter_map(|(i, section)| canonical_dir(&section.source).map(|dir| (i, dir)))
        .collect()
}

fn canonical_dir(dir: &Path) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }
    dir.canonicalize().ok()
}

// =============================================================================
// Public API
// =============================================================================

/// Watch section sources and rebuild on change until `running` is cleared.
pub fn watch_blocking(
    config: &SiteConfig,
    running: &AtomicBool,
    events: Option<&Sender<Event>>,
) -> Result<(), WatchError> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)?;

    let dirs = watched_dirs(config);
    for (section, dir) in &dirs {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        emit(
            events,
            Event::WatchStarted {
                section: config.sections[*section].name.clone(),
                dir: config.sections[*section].source.clone(),
            },
        );
    }

    let mut debouncer = Debouncer::new(config.watch.debounce());

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(debouncer.timeout(Instant::now())) {
            Ok(Ok(event)) => {
                let now = Instant::now();
                for (section, kind, file_name) in relevant_changes(&event, &dirs) {
                    debouncer.record(section, kind, file_name, now);
                }
            }
            Ok(Err(e)) => emit(
                events,
                Event::WatchFailed {
                    error: e.to_string(),
                },
            ),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        for change in debouncer.take_due(Instant::now()) {
            let section = &config.sections[change.section];
            emit(
                events,
                Event::ChangeDetected {
                    section: section.name.clone(),
                    kind: change.kind,
                    file_name: change.file_name,
                },
            );
            pipeline::build_section(section, BuildMode::Write, events);
        }
    }

    Ok(())
}
