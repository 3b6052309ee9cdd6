//! Shared test utilities for the mdsections test suite.
//!
//! Provides a fixture site copied into a temp directory plus lookup helpers
//! for section reports.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let config = load_fixture_config(&tmp);
//! let reports = build_all(&config, BuildMode::Write, None);
//!
//! let articles = find_report(&reports, "articles");
//! assert_eq!(built_names(articles), vec!["first-post.md", "index.md", "second-post.md"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::{SiteConfig, load_config};
use crate::naming;
use crate::pipeline::{DocumentOutcome, SectionReport};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

/// Load the fixture's `site.toml`, resolved against the temp directory.
pub fn load_fixture_config(tmp: &TempDir) -> SiteConfig {
    load_config(tmp.path()).unwrap()
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Report lookups — panics with a clear message on miss
// =========================================================================

/// Find a section report by name. Panics if not found.
pub fn find_report<'a>(reports: &'a [SectionReport], section: &str) -> &'a SectionReport {
    reports
        .iter()
        .find(|r| r.section == section)
        .unwrap_or_else(|| {
            let names: Vec<&str> = reports.iter().map(|r| r.section.as_str()).collect();
            panic!("section '{section}' not found. Available: {names:?}")
        })
}

/// Source file names of built documents, in processing order.
pub fn built_names(report: &SectionReport) -> Vec<String> {
    names_where(report, |o| matches!(o, DocumentOutcome::Built { .. }))
}

/// Source file names of skipped documents, in processing order.
pub fn skipped_names(report: &SectionReport) -> Vec<String> {
    names_where(report, |o| matches!(o, DocumentOutcome::Skipped { .. }))
}

fn names_where(report: &SectionReport, pred: impl Fn(&DocumentOutcome) -> bool) -> Vec<String> {
    report
        .documents
        .iter()
        .filter(|d| pred(&d.outcome))
        .map(|d| naming::file_name(&d.source))
        .collect()
}
