//! Orphan removal.
//!
//! A generated page whose source document was renamed or deleted would
//! otherwise linger in the output directory and stay reachable. Before each
//! section pass, every `<stem>.html` in the output directory without a
//! matching `<stem>.md` in the source directory is deleted.

use crate::config::SectionConfig;
use crate::naming::{self, OUTPUT_EXT, SOURCE_EXT};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// What one reconciliation did.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Orphans deleted, in filename order.
    pub removed: Vec<PathBuf>,
    /// Orphans that could not be deleted. The rest were still attempted.
    pub failed: Vec<(PathBuf, std::io::Error)>,
}

/// Delete generated documents with no source.
///
/// A missing source directory means every generated document is an orphan.
/// Failing to list either directory is an error; failing to delete one file
/// is recorded and the remaining orphans are still removed.
pub fn remove_orphans(section: &SectionConfig) -> std::io::Result<Reconciliation> {
    remove_orphans_with(section, |path| fs::remove_file(path))
}

fn remove_orphans_with(
    section: &SectionConfig,
    mut remove: impl FnMut(&Path) -> std::io::Result<()>,
) -> std::io::Result<Reconciliation> {
    let mut result = Reconciliation::default();
    let outputs = naming::files_with_extension(&section.output, OUTPUT_EXT)?;
    if outputs.is_empty() {
        return Ok(result);
    }

    let sources: HashSet<String> = naming::files_with_extension(&section.source, SOURCE_EXT)?
        .iter()
        .map(|p| naming::stem(p))
        .collect();

    for output in outputs {
        if sources.contains(&naming::stem(&output)) {
            continue;
        }
        match remove(&output) {
            Ok(()) => result.removed.push(output),
            Err(e) => result.failed.push((output, e)),
        }
    }
    Ok(result)
}
