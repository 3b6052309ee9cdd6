//! CLI output formatting.
//!
//! Build code reports progress as [`Event`]s; this module turns them into
//! display lines. Messages lead with their context (section and file name)
//! so a long build log stays greppable:
//!
//! ```text
//! Removed orphan: articles/old-post.html
//! ==> Building 3 articles page(s)
//! Built articles: hello.md → /articles/hello.html
//! Warning: Skipping articles/draft.md: missing [hero, datePublished]
//! Error: articles/broken.md: front-matter is not valid YAML: ...
//! Generated index (2 items): articles-list-index.js
//! articles build complete: 1 built, 1 skipped, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function is pure and returns `Vec<String>` for
//! testability; `print_*` wrappers write to the terminal. Warnings and
//! errors go to stderr, everything else to stdout.

use crate::event::{ChangeKind, Event, Severity};
use crate::listing::ListingEntry;
use crate::pipeline::SectionReport;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_pos, _)) => format!("{}...", &text[..byte_pos]),
        None => text.to_string(),
    }
}

/// Display `path` relative to `root` when possible.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn severity_prefix(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "Warning: ",
        Severity::Error => "Error: ",
        Severity::Info | Severity::Success => "",
    }
}

fn change_label(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Created => "created",
        ChangeKind::Modified => "modified",
        ChangeKind::Removed => "removed",
    }
}

// ============================================================================
// Build events
// ============================================================================

/// Format a single event as display lines. Paths are shown relative to `root`.
pub fn format_event(event: &Event, root: &Path) -> Vec<String> {
    let message = match event {
        Event::OrphanRemoved { section, file_name } => {
            format!("Removed orphan: {section}/{file_name}")
        }
        Event::ReconcileFailed { section, error } => {
            format!("{section}: orphan cleanup failed: {error}")
        }
        Event::SectionAborted { section, reason } => {
            format!("Skipping {section}: {reason}")
        }
        Event::SectionStarted {
            section,
            document_count,
        } => format!("==> Building {document_count} {section} page(s)"),
        Event::DocumentBuilt {
            section,
            file_name,
            url,
        } => format!("Built {section}: {file_name} \u{2192} {url}"),
        Event::DocumentSkipped {
            section,
            file_name,
            missing,
        } => format!(
            "Skipping {section}/{file_name}: missing [{}]",
            missing.join(", ")
        ),
        Event::DocumentFailed {
            section,
            file_name,
            error,
        } => format!("{section}/{file_name}: {error}"),
        Event::IndexPublished {
            path, entries, ..
        } => format!(
            "Generated index ({entries} items): {}",
            relative(path, root)
        ),
        Event::IndexFailed { section, error } => {
            format!("{section}: index not written: {error}")
        }
        Event::SectionFinished {
            section,
            built,
            skipped,
            failed,
        } => format!("{section} build complete: {built} built, {skipped} skipped, {failed} failed"),
        Event::WatchStarted { section, dir } => {
            format!("Watching {}/ for {section}", relative(dir, root))
        }
        Event::WatchFailed { error } => format!("watcher: {error}"),
        Event::ChangeDetected {
            section,
            kind,
            file_name,
        } => {
            return vec![
                String::new(),
                format!(
                    "Change detected in {section} ({}: {file_name})",
                    change_label(*kind)
                ),
            ];
        }
        Event::ServerStarted { url } => format!("Serving {url}"),
        Event::ServerFailed { error } => {
            return vec![
                format!("{}HTTP server failed: {error}", severity_prefix(Severity::Warning)),
                format!("{}Live mode continues without a server.", indent(1)),
            ];
        }
        Event::ServerOutput { line, .. } => return vec![format!("[HTTP] {line}")],
        Event::ServerStopped => "HTTP server stopped".to_string(),
    };
    vec![format!("{}{}", severity_prefix(event.severity()), message)]
}

/// Print an event, routing warnings and errors to stderr.
pub fn print_event(event: &Event, root: &Path) {
    let to_stderr = matches!(event.severity(), Severity::Warning | Severity::Error);
    for line in format_event(event, root) {
        if to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ============================================================================
// Summaries
// ============================================================================

/// One line per section plus a total, used after `build` and `check`.
pub fn format_summary(reports: &[SectionReport]) -> Vec<String> {
    let mut lines = Vec::new();
    let (mut built, mut skipped, mut failed) = (0, 0, 0);
    for report in reports {
        match &report.aborted {
            Some(reason) => lines.push(format!("{}: not built ({reason})", report.section)),
            None => lines.push(format!(
                "{}: {} built, {} skipped, {} failed",
                report.section,
                report.built(),
                report.skipped(),
                report.failed()
            )),
        }
        built += report.built();
        skipped += report.skipped();
        failed += report.failed();
    }
    lines.push(format!(
        "Total: {built} built, {skipped} skipped, {failed} failed"
    ));
    lines
}

pub fn print_summary(reports: &[SectionReport]) {
    for line in format_summary(reports) {
        println!("{}", line);
    }
}

// ============================================================================
// Listing
// ============================================================================

/// Format listing entries, newest first, one block per page.
///
/// ```text
/// 001 Second post
///     Date: June 1st, 2025
///     Path: /articles/second.html
///     Description: What happened next
/// ```
pub fn format_listing(entries: &[ListingEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), entry.title));
        if let Some(date) = entry.display_date() {
            lines.push(format!("{}Date: {}", indent(1), date));
        }
        lines.push(format!("{}Path: {}", indent(1), entry.path));
        if !entry.description.is_empty() {
            lines.push(format!(
                "{}Description: {}",
                indent(1),
                truncate_desc(&entry.description, 60)
            ));
        }
    }
    lines
}

pub fn print_listing(entries: &[ListingEntry]) {
    for line in format_listing(entries) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SectionAbort;
    use crate::listing::parse_date;
    use std::path::PathBuf;

    fn lines(event: Event) -> Vec<String> {
        format_event(&event, Path::new("/site"))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn truncate_desc_short_and_long() {
        assert_eq!(truncate_desc("short", 10), "short");
        assert_eq!(truncate_desc("exactly", 7), "exactly");
        assert_eq!(truncate_desc("a longer text", 6), "a long...");
    }

    #[test]
    fn truncate_desc_respects_char_boundaries() {
        assert_eq!(truncate_desc("héllo wörld", 4), "héll...");
    }

    // =========================================================================
    // Events
    // =========================================================================

    #[test]
    fn built_line_shows_url() {
        let out = lines(Event::DocumentBuilt {
            section: "articles".into(),
            file_name: "hello.md".into(),
            url: "/articles/hello.html".into(),
        });
        assert_eq!(out, vec!["Built articles: hello.md \u{2192} /articles/hello.html"]);
    }

    #[test]
    fn skipped_line_lists_missing_fields() {
        let out = lines(Event::DocumentSkipped {
            section: "articles".into(),
            file_name: "draft.md".into(),
            missing: vec!["hero".into(), "datePublished".into()],
        });
        assert_eq!(
            out,
            vec!["Warning: Skipping articles/draft.md: missing [hero, datePublished]"]
        );
    }

    #[test]
    fn failed_line_is_error() {
        let out = lines(Event::DocumentFailed {
            section: "about".into(),
            file_name: "me.md".into(),
            error: "cannot read source: denied".into(),
        });
        assert_eq!(out, vec!["Error: about/me.md: cannot read source: denied"]);
    }

    #[test]
    fn aborted_section_is_warning() {
        let out = lines(Event::SectionAborted {
            section: "about".into(),
            reason: SectionAbort::SourceDirMissing(PathBuf::from("/site/about-markdown")),
        });
        assert_eq!(
            out,
            vec!["Warning: Skipping about: source directory missing: /site/about-markdown"]
        );
    }

    #[test]
    fn index_path_is_relative_to_root() {
        let out = lines(Event::IndexPublished {
            section: "articles".into(),
            path: PathBuf::from("/site/articles-list-index.js"),
            entries: 2,
        });
        assert_eq!(out, vec!["Generated index (2 items): articles-list-index.js"]);
    }

    #[test]
    fn change_detected_starts_with_blank_line() {
        let out = lines(Event::ChangeDetected {
            section: "articles".into(),
            kind: ChangeKind::Modified,
            file_name: "hello.md".into(),
        });
        assert_eq!(out, vec!["", "Change detected in articles (modified: hello.md)"]);
    }

    #[test]
    fn server_output_is_tagged() {
        let out = lines(Event::ServerOutput {
            line: "GET / 200".into(),
            stderr: true,
        });
        assert_eq!(out, vec!["[HTTP] GET / 200"]);
    }

    #[test]
    fn server_failure_explains_fallback() {
        let out = lines(Event::ServerFailed {
            error: "No such file".into(),
        });
        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("Warning: HTTP server failed"));
    }

    // =========================================================================
    // Summary and listing
    // =========================================================================

    #[test]
    fn summary_totals_sections() {
        let reports = vec![
            SectionReport {
                section: "articles".into(),
                ..SectionReport::default()
            },
            SectionReport {
                section: "about".into(),
                aborted: Some(SectionAbort::Empty(PathBuf::from("about-markdown"))),
                ..SectionReport::default()
            },
        ];
        let out = format_summary(&reports);
        assert_eq!(out[0], "articles: 0 built, 0 skipped, 0 failed");
        assert_eq!(out[1], "about: not built (no .md files in about-markdown)");
        assert_eq!(out[2], "Total: 0 built, 0 skipped, 0 failed");
    }

    #[test]
    fn listing_block_per_entry() {
        let entries = vec![
            ListingEntry {
                path: "/articles/b.html".into(),
                title: "Second".into(),
                description: "What happened next".into(),
                published: parse_date("2025-06-01"),
            },
            ListingEntry {
                path: "/articles/a.html".into(),
                title: "Undated".into(),
                description: String::new(),
                published: None,
            },
        ];
        assert_eq!(
            format_listing(&entries),
            vec![
                "001 Second",
                "    Date: June 1st, 2025",
                "    Path: /articles/b.html",
                "    Description: What happened next",
                "002 Undated",
                "    Path: /articles/a.html",
            ]
        );
    }
}
