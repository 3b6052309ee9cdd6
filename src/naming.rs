//! Filename conventions shared by every pipeline step.
//!
//! A source document `<stem>.md` becomes `<stem>.html` in its section's
//! output directory. The stem is the identity that ties the two together:
//! orphan reconciliation, index exclusion and canonical URLs all compare
//! stems, never full paths.
//!
//! ```text
//! articles-markdown/hello-world.md  →  articles/hello-world.html
//!                                       /articles/hello-world.html   (physical path)
//!                                       /articles/hello-world.html   (canonical URL)
//! articles-markdown/index.md        →  articles/index.html
//!                                       /articles/index.html         (physical path)
//!                                       /articles/                   (canonical URL)
//! ```

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of source documents.
pub const SOURCE_EXT: &str = "md";
/// Extension of generated documents.
pub const OUTPUT_EXT: &str = "html";

/// File stem as an owned string (`hello-world.md` → `hello-world`).
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File name for display (`/a/b/hello.md` → `hello.md`).
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Generated file name for a stem (`hello` → `hello.html`).
pub fn output_file_name(stem: &str) -> String {
    format!("{stem}.{OUTPUT_EXT}")
}

/// Site-relative path of a generated document, used for bookkeeping.
///
/// Always points at the file itself, index document included.
pub fn physical_path(section: &str, stem: &str) -> String {
    format!("/{section}/{}", output_file_name(stem))
}

/// Semantic URL embedded in the page itself.
///
/// The index document resolves to the section root with a trailing slash;
/// everything else to its own file.
pub fn canonical_url(section: &str, stem: &str, is_index: bool) -> String {
    if is_index {
        format!("/{section}/")
    } else {
        physical_path(section, stem)
    }
}

/// Whether `path` has exactly the given extension. `a.MD` is not `md`.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// Editor artifacts the watcher should not react to.
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bak" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Regular files directly inside `dir` with the given extension, sorted by name.
///
/// A missing directory yields an empty list.
pub fn files_with_extension(dir: &Path, ext: &str) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && has_extension(path, ext) && !is_temp_file(path) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}
