//! Index Artifact publishing.
//!
//! Sections with `generate_index = true` get a small ES module listing the
//! site-relative paths of their generated pages:
//!
//! ```text
//! export const ARTICLE_FILE_NAMES = [
//!   "/articles/first-post.html",
//!   "/articles/second-post.html"
//! ]
//! ```
//!
//! The client-side listing widget imports this constant, fetches every page
//! and renders the list. The section's own index document is never listed.
//! Entries are sorted so the same set of pages always yields the same bytes,
//! keeping version-control diffs free of reordering noise.

use crate::config::SectionConfig;
use crate::naming;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sorted listing entries: `paths` minus the index document's path.
pub fn index_entries(paths: &[String], index_document_path: &str) -> Vec<String> {
    let mut entries: Vec<String> = paths
        .iter()
        .filter(|p| p.as_str() != index_document_path)
        .cloned()
        .collect();
    entries.sort();
    entries
}

/// Render the artifact text for `entries`.
pub fn render_artifact(variable: &str, entries: &[String]) -> Result<String, IndexError> {
    let json = serde_json::to_string_pretty(entries)?;
    Ok(format!("export const {variable} = {json}\n"))
}

/// Write the Index Artifact for `section` from its generated physical paths.
///
/// Returns the written path and the number of entries, or `None` when the
/// section does not publish an index.
pub fn publish_index(
    section: &SectionConfig,
    generated: &[String],
) -> Result<Option<(PathBuf, usize)>, IndexError> {
    let Some((output, variable)) = section.index_target() else {
        return Ok(None);
    };

    let index_path = naming::physical_path(&section.name, &section.index_document);
    let entries = index_entries(generated, &index_path);
    let text = render_artifact(variable, &entries)?;
    write_creating_parent(output, &text)?;
    Ok(Some((output.to_path_buf(), entries.len())))
}

fn write_creating_parent(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
