//! Section build orchestration.
//!
//! One pass over one section runs these steps in order:
//!
//! ```text
//! 1. remove orphans        out/*.html without src/*.md are deleted
//! 2. source dir present?   no  → SectionAborted(SourceDirMissing), empty index
//! 3. any .md files?        no  → SectionAborted(Empty), empty index
//! 4. per document          load → validate → render → compose → write
//! 5. publish index         only when the section asks for one
//! ```
//!
//! Documents are processed one at a time in filename order. A document that
//! fails validation is skipped with a warning; one that fails to read, parse
//! or write is logged as an error. Neither stops its siblings. Nothing is
//! retried: the next pass (a rerun, or the watcher) is the retry.
//!
//! Sections never share output files, so passes over different sections are
//! independent of each other.

use crate::config::{SectionConfig, SiteConfig};
use crate::content::{ContentError, ContentUnit};
use crate::event::{Event, SectionAbort, emit};
use crate::index;
use crate::naming::{self, SOURCE_EXT};
use crate::reconcile;
use crate::render;
use crate::template::{self, Substitutions};
use crate::validate;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Per-document failure. All variants are handled the same way (skip and
/// log); the variant only shapes the message.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("cannot read source: {0}")]
    SourceUnreadable(std::io::Error),
    #[error("{0}")]
    FrontMatter(ContentError),
    #[error("cannot read template {}: {source}", path.display())]
    TemplateUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ContentError> for DocumentError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Io(e) => DocumentError::SourceUnreadable(e),
            other => DocumentError::FrontMatter(other),
        }
    }
}

/// Whether a pass writes anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Full pass: reconcile, write pages, publish index.
    Write,
    /// Load, validate, render and compose only. Nothing on disk changes.
    Check,
}

/// Result of processing one source document.
#[derive(Debug)]
pub enum DocumentOutcome {
    Built {
        /// Written file.
        output: PathBuf,
        /// Site-relative path of the file, used for the index.
        physical_path: String,
        /// Semantic URL embedded in the page.
        url: String,
    },
    Skipped {
        missing: Vec<String>,
    },
    Failed(DocumentError),
}

#[derive(Debug)]
pub struct DocumentReport {
    pub source: PathBuf,
    pub outcome: DocumentOutcome,
}

/// Everything that happened during one section pass.
#[derive(Debug, Default)]
pub struct SectionReport {
    pub section: String,
    pub removed_orphans: Vec<PathBuf>,
    pub aborted: Option<SectionAbort>,
    pub documents: Vec<DocumentReport>,
    /// Written Index Artifact and its entry count.
    pub index: Option<(PathBuf, usize)>,
}

impl SectionReport {
    /// Physical paths of successfully built documents, in processing order.
    pub fn generated_paths(&self) -> Vec<String> {
        self.documents
            .iter()
            .filter_map(|d| match &d.outcome {
                DocumentOutcome::Built { physical_path, .. } => Some(physical_path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn built(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Built { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }
}

/// Build every section in declaration order.
pub fn build_all(
    config: &SiteConfig,
    mode: BuildMode,
    events: Option<&Sender<Event>>,
) -> Vec<SectionReport> {
    config
        .sections
        .iter()
        .map(|section| build_section(section, mode, events))
        .collect()
}

/// Run one pass over a section.
pub fn build_section(
    section: &SectionConfig,
    mode: BuildMode,
    events: Option<&Sender<Event>>,
) -> SectionReport {
    let name = section.name.clone();
    let mut report = SectionReport {
        section: name.clone(),
        ..SectionReport::default()
    };

    if mode == BuildMode::Write {
        match reconcile::remove_orphans(section) {
            Ok(reconciled) => {
                for path in &reconciled.removed {
                    emit(
                        events,
                        Event::OrphanRemoved {
                            section: name.clone(),
                            file_name: naming::file_name(path),
                        },
                    );
                }
                for (path, e) in &reconciled.failed {
                    emit(
                        events,
                        Event::ReconcileFailed {
                            section: name.clone(),
                            error: format!("cannot remove {}: {e}", naming::file_name(path)),
                        },
                    );
                }
                report.removed_orphans = reconciled.removed;
            }
            Err(e) => emit(
                events,
                Event::ReconcileFailed {
                    section: name.clone(),
                    error: e.to_string(),
                },
            ),
        }
    }

    let sources = match list_sources(&section.source) {
        Ok(sources) => sources,
        Err(reason) => {
            emit(
                events,
                Event::SectionAborted {
                    section: name,
                    reason: reason.clone(),
                },
            );
            report.aborted = Some(reason);
            // Reconcile has removed every page, so the index must not list them.
            if mode == BuildMode::Write {
                publish(section, &mut report, events);
            }
            return report;
        }
    };

    emit(
        events,
        Event::SectionStarted {
            section: name.clone(),
            document_count: sources.len(),
        },
    );

    for source in sources {
        let outcome = process_document(section, &source, mode);
        emit(events, outcome_event(&name, &source, &outcome));
        if mode == BuildMode::Write
            && !matches!(outcome, DocumentOutcome::Built { .. })
            && let Some(stale) = remove_stale_output(section, &source)
        {
            emit(
                events,
                Event::OrphanRemoved {
                    section: name.clone(),
                    file_name: naming::file_name(&stale),
                },
            );
            report.removed_orphans.push(stale);
        }
        report.documents.push(DocumentReport { source, outcome });
    }

    if mode == BuildMode::Write {
        publish(section, &mut report, events);
    }

    emit(
        events,
        Event::SectionFinished {
            section: name,
            built: report.built(),
            skipped: report.skipped(),
            failed: report.failed(),
        },
    );
    report
}

/// Publish the section's Index Artifact from the pages built so far.
fn publish(section: &SectionConfig, report: &mut SectionReport, events: Option<&Sender<Event>>) {
    match index::publish_index(section, &report.generated_paths()) {
        Ok(Some((path, entries))) => {
            emit(
                events,
                Event::IndexPublished {
                    section: section.name.clone(),
                    path: path.clone(),
                    entries,
                },
            );
            report.index = Some((path, entries));
        }
        Ok(None) => {}
        Err(e) => emit(
            events,
            Event::IndexFailed {
                section: section.name.clone(),
                error: e.to_string(),
            },
        ),
    }
}

/// Sorted `.md` sources, or the reason the section cannot be built.
fn list_sources(dir: &Path) -> Result<Vec<PathBuf>, SectionAbort> {
    if !dir.is_dir() {
        return Err(SectionAbort::SourceDirMissing(dir.to_path_buf()));
    }
    let sources = naming::files_with_extension(dir, SOURCE_EXT)
        .map_err(|_| SectionAbort::SourceDirMissing(dir.to_path_buf()))?;
    if sources.is_empty() {
        return Err(SectionAbort::Empty(dir.to_path_buf()));
    }
    Ok(sources)
}

/// Delete the page a now-invalid document produced on an earlier pass.
fn remove_stale_output(section: &SectionConfig, source: &Path) -> Option<PathBuf> {
    let output = section
        .output
        .join(naming::output_file_name(&naming::stem(source)));
    fs::remove_file(&output).ok().map(|()| output)
}

/// Load, validate, render, compose and (in write mode) write one document.
pub fn process_document(section: &SectionConfig, source: &Path, mode: BuildMode) -> DocumentOutcome {
    let unit = match ContentUnit::load(source) {
        Ok(unit) => unit,
        Err(e) => return DocumentOutcome::Failed(e.into()),
    };

    let stem = naming::stem(source);
    let is_index = section.is_index_document(&stem);

    let missing = validate::missing_fields(&unit, &section.required_fields, is_index);
    if !missing.is_empty() {
        return DocumentOutcome::Skipped { missing };
    }

    let url = naming::canonical_url(&section.name, &stem, is_index);
    let physical_path = naming::physical_path(&section.name, &stem);
    let output = section.output.join(naming::output_file_name(&stem));

    match compose_document(section, &unit, &url) {
        Ok(document) => {
            if mode == BuildMode::Write
                && let Err(e) = write_document(&output, &document)
            {
                return DocumentOutcome::Failed(e);
            }
            DocumentOutcome::Built {
                output,
                physical_path,
                url,
            }
        }
        Err(e) => DocumentOutcome::Failed(e),
    }
}

fn compose_document(
    section: &SectionConfig,
    unit: &ContentUnit,
    url: &str,
) -> Result<String, DocumentError> {
    let template_text =
        fs::read_to_string(&section.template).map_err(|source| DocumentError::TemplateUnreadable {
            path: section.template.clone(),
            source,
        })?;
    let content_html = render::markdown_to_html(&unit.body);
    let substitutions = Substitutions::for_document(unit, url, &content_html);
    Ok(template::compose(&template_text, &substitutions))
}

fn write_document(output: &Path, document: &str) -> Result<(), DocumentError> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, document)
    };
    write().map_err(|source| DocumentError::WriteFailure {
        path: output.to_path_buf(),
        source,
    })
}

fn outcome_event(section: &str, source: &Path, outcome: &DocumentOutcome) -> Event {
    let section = section.to_string();
    let file_name = naming::file_name(source);
    match outcome {
        DocumentOutcome::Built { url, .. } => Event::DocumentBuilt {
            section,
            file_name,
            url: url.clone(),
        },
        DocumentOutcome::Skipped { missing } => Event::DocumentSkipped {
            section,
            file_name,
            missing: missing.clone(),
        },
        DocumentOutcome::Failed(error) => Event::DocumentFailed {
            section,
            file_name,
            error: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    const TEMPLATE: &str = "<title>{{TITLE}}</title>\n<link rel=\"canonical\" href=\"{{URL}}\">\n<main>{{ARTICLE_CONTENT}}</main>\n";

    fn section(tmp: &TempDir) -> SectionConfig {
        let root = tmp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("template.html"), TEMPLATE).unwrap();
        SectionConfig {
            name: "articles".to_string(),
            source: root.join("src"),
            output: root.join("out"),
            template: root.join("template.html"),
            required_fields: vec!["title".into(), "datePublished".into()],
            generate_index: true,
            index_output: Some(root.join("index.js")),
            index_variable: Some("FILES".to_string()),
            index_document: "index".to_string(),
        }
    }

    fn write_source(s: &SectionConfig, name: &str, contents: &str) {
        fs::write(s.source.join(name), contents).unwrap();
    }

    fn collect(rx: mpsc::Receiver<Event>) -> Vec<Event> {
        rx.try_iter().collect()
    }

    #[test]
    fn builds_document_into_output_dir() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        write_source(&s, "hello.md", "---\ntitle: Hello\ndatePublished: 2024-01-01\n---\n# Hi\n");

        let report = build_section(&s, BuildMode::Write, None);

        let output = s.output.join("hello.html");
        assert_eq!(report.built(), 1);
        let html = fs::read_to_string(&output).unwrap();
        assert!(html.contains("<title>Hello</title>"));
        assert!(html.contains(r#"href="/articles/hello.html""#));
        assert!(html.contains("<main><h1>Hi</h1></main>"));
        match &report.documents[0].outcome {
            DocumentOutcome::Built {
                output: written,
                physical_path,
                url,
            } => {
                assert_eq!(written, &output);
                assert_eq!(physical_path, "/articles/hello.html");
                assert_eq!(url, "/articles/hello.html");
            }
            other => panic!("expected Built, got {other:?}"),
        }
    }

    #[test]
    fn index_document_uses_section_root_url_and_skips_dates() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        write_source(&s, "index.md", "---\ntitle: All articles\n---\nList\n");

        let report = build_section(&s, BuildMode::Write, None);

        assert_eq!(report.built(), 1);
        let html = fs::read_to_string(s.output.join("index.html")).unwrap();
        assert!(html.contains(r#"href="/articles/""#));
        assert_eq!(report.generated_paths(), vec!["/articles/index.html"]);
    }

    #[test]
    fn invalid_document_is_skipped_and_siblings_build() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        write_source(&s, "a.md", "---\ntitle: A\ndatePublished: 2024-01-01\n---\n");
        write_source(&s, "b.md", "---\ntitle: B\n---\n");
        write_source(&s, "c.md", "---\ntitle: [broken\n---\n");
        write_source(&s, "d.md", "---\ntitle: D\ndatePublished: 2024-02-01\n---\n");

        let (tx, rx) = mpsc::channel();
        let report = build_section(&s, BuildMode::Write, Some(&tx));

        assert_eq!((report.built(), report.skipped(), report.failed()), (2, 1, 1));
        assert!(s.output.join("a.html").exists());
        assert!(!s.output.join("b.html").exists());
        assert!(!s.output.join("c.html").exists());
        assert!(s.output.join("d.html").exists());

        let events = collect(rx);
        assert!(events.contains(&Event::DocumentSkipped {
            section: "articles".into(),
            file_name: "b.md".into(),
            missing: vec!["datePublished".into()],
        }));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::DocumentFailed { file_name, .. } if file_name == "c.md"
        )));
    }

    #[test]
    fn missing_template_fails_each_document() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        fs::remove_file(&s.template).unwrap();
        write_source(&s, "a.md", "---\ntitle: A\ndatePublished: 2024-01-01\n---\n");

        let report = build_section(&s, BuildMode::Write, None);

        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.documents[0].outcome,
            DocumentOutcome::Failed(DocumentError::TemplateUnreadable { .. })
        ));
    }

    #[test]
    fn missing_source_dir_aborts_section() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        fs::remove_dir(&s.source).unwrap();

        let report = build_section(&s, BuildMode::Write, None);

        assert_eq!(
            report.aborted,
            Some(SectionAbort::SourceDirMissing(s.source.clone()))
        );
        assert_eq!(
            fs::read_to_string(s.index_output.as_ref().unwrap()).unwrap(),
            "export const FILES = []\n"
        );
    }

    #[test]
    fn emptied_section_republishes_empty_index() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        write_source(&s, "a.md", "---\ntitle: A\ndatePublished: 2024-01-01\n---\n");
        build_section(&s, BuildMode::Write, None);
        fs::remove_file(s.source.join("a.md")).unwrap();

        let report = build_section(&s, BuildMode::Write, None);

        assert_eq!(report.aborted, Some(SectionAbort::Empty(s.source.clone())));
        assert!(!s.output.join("a.html").exists());
        assert_eq!(report.index, Some((tmp.path().join("index.js"), 0)));
        assert_eq!(
            fs::read_to_string(tmp.path().join("index.js")).unwrap(),
            "export const FILES = []\n"
        );
    }

    #[test]
    fn aborted_check_pass_writes_no_index() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        build_section(&s, BuildMode::Check, None);
        assert!(!tmp.path().join("index.js").exists());
    }

    #[test]
    fn empty_source_dir_aborts_section() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        write_source(&s, "readme.txt", "not markdown");

        let report = build_section(&s, BuildMode::Write, None);
        assert_eq!(report.aborted, Some(SectionAbort::Empty(s.source.clone())));
    }

    #[test]
    fn orphans_removed_before_build() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        fs::create_dir_all(&s.output).unwrap();
        fs::write(s.output.join("gone.html"), "old").unwrap();
        write_source(&s, "kept.md", "---\ntitle: K\ndatePublished: 2024-01-01\n---\n");

        let report = build_section(&s, BuildMode::Write, None);

        assert_eq!(report.removed_orphans, vec![s.output.join("gone.html")]);
        assert!(!s.output.join("gone.html").exists());
        assert!(s.output.join("kept.html").exists());
    }

    #[test]
    fn page_of_invalidated_document_is_removed() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        write_source(&s, "a.md", "---\ntitle: A\ndatePublished: 2024-01-01\n---\n");
        build_section(&s, BuildMode::Write, None);
        assert!(s.output.join("a.html").exists());

        write_source(&s, "a.md", "---\ntitle: A\n---\n");
        let report = build_section(&s, BuildMode::Write, None);

        assert_eq!(report.skipped(), 1);
        assert!(!s.output.join("a.html").exists());
        assert_eq!(report.removed_orphans, vec![s.output.join("a.html")]);
    }

    #[test]
    fn index_lists_built_documents_only() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        write_source(&s, "index.md", "---\ntitle: Index\n---\n");
        write_source(&s, "c.md", "---\ntitle: C\ndatePublished: 2024-01-03\n---\n");
        write_source(&s, "a.md", "---\ntitle: A\ndatePublished: 2024-01-01\n---\n");
        write_source(&s, "b.md", "---\ntitle: B\n---\n");

        let report = build_section(&s, BuildMode::Write, None);

        assert_eq!(report.index, Some((tmp.path().join("index.js"), 2)));
        assert_eq!(
            fs::read_to_string(tmp.path().join("index.js")).unwrap(),
            "export const FILES = [\n  \"/articles/a.html\",\n  \"/articles/c.html\"\n]\n"
        );
    }

    #[test]
    fn second_pass_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        write_source(&s, "a.md", "---\ntitle: A\ndatePublished: 2024-01-01\n---\nText\n");
        write_source(&s, "b.md", "---\ntitle: B\ndatePublished: 2024-01-02\n---\nMore\n");

        build_section(&s, BuildMode::Write, None);
        let first_a = fs::read(s.output.join("a.html")).unwrap();
        let first_index = fs::read(tmp.path().join("index.js")).unwrap();

        build_section(&s, BuildMode::Write, None);
        assert_eq!(fs::read(s.output.join("a.html")).unwrap(), first_a);
        assert_eq!(fs::read(tmp.path().join("index.js")).unwrap(), first_index);
    }

    #[test]
    fn check_mode_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        fs::create_dir_all(&s.output).unwrap();
        fs::write(s.output.join("orphan.html"), "").unwrap();
        write_source(&s, "a.md", "---\ntitle: A\ndatePublished: 2024-01-01\n---\n");

        let report = build_section(&s, BuildMode::Check, None);

        assert_eq!(report.built(), 1);
        assert!(!s.output.join("a.html").exists());
        assert!(s.output.join("orphan.html").exists());
        assert!(!tmp.path().join("index.js").exists());
    }

    #[test]
    fn events_follow_processing_order() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        write_source(&s, "b.md", "---\ntitle: B\ndatePublished: 2024-01-01\n---\n");
        write_source(&s, "a.md", "---\ntitle: A\ndatePublished: 2024-01-01\n---\n");

        let (tx, rx) = mpsc::channel();
        build_section(&s, BuildMode::Write, Some(&tx));
        let events = collect(rx);

        assert!(matches!(
            events.first(),
            Some(Event::SectionStarted { document_count: 2, .. })
        ));
        let built: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Event::DocumentBuilt { file_name, .. } => Some(file_name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(built, vec!["a.md", "b.md"]);
        assert!(matches!(
            events.last(),
            Some(Event::SectionFinished { built: 2, skipped: 0, failed: 0, .. })
        ));
    }

    #[test]
    fn build_all_runs_every_section() {
        let tmp = TempDir::new().unwrap();
        let s = section(&tmp);
        write_source(&s, "a.md", "---\ntitle: A\ndatePublished: 2024-01-01\n---\n");
        let mut other = s.clone();
        other.name = "notes".to_string();
        other.source = tmp.path().join("missing");
        other.output = tmp.path().join("notes");
        other.generate_index = false;

        let config = SiteConfig {
            sections: vec![s, other],
            ..SiteConfig::default()
        };
        let reports = build_all(&config, BuildMode::Write, None);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].built(), 1);
        assert!(matches!(
            reports[1].aborted,
            Some(SectionAbort::SourceDirMissing(_))
        ));
    }

    // =========================================================================
    // Fixture site
    // =========================================================================

    #[test]
    fn fixture_site_builds_valid_documents() {
        use crate::test_helpers::*;

        let tmp = setup_fixtures();
        let config = load_fixture_config(&tmp);
        let reports = build_all(&config, BuildMode::Write, None);

        let articles = find_report(&reports, "articles");
        assert_eq!(
            built_names(articles),
            vec!["first-post.md", "index.md", "second-post.md"]
        );
        assert_eq!(skipped_names(articles), vec!["draft.md"]);
        assert_eq!(built_names(find_report(&reports, "about")), vec!["index.md"]);

        assert!(tmp.path().join("articles/first-post.html").exists());
        assert!(!tmp.path().join("articles/draft.html").exists());
        assert!(tmp.path().join("about/index.html").exists());
        assert_eq!(
            fs::read_to_string(tmp.path().join("articles-list-index.js")).unwrap(),
            "export const ARTICLE_FILE_NAMES = [\n  \"/articles/first-post.html\",\n  \"/articles/second-post.html\"\n]\n"
        );
    }

    #[test]
    fn fixture_pages_carry_front_matter() {
        use crate::test_helpers::*;

        let tmp = setup_fixtures();
        let config = load_fixture_config(&tmp);
        build_all(&config, BuildMode::Write, None);

        let html = fs::read_to_string(tmp.path().join("articles/second-post.html")).unwrap();
        assert!(html.contains("<title>Second Post: Fish & Chips</title>"));
        assert!(html.contains(r#"content="2025-06-01T10:00:00Z""#));
        assert!(html.contains(r#"<link rel="canonical" href="/articles/second-post.html">"#));
        assert!(html.contains("<table>"));
        assert!(!html.contains("{{"));

        let about = fs::read_to_string(tmp.path().join("about/index.html")).unwrap();
        assert!(about.contains(r#"href="/about/""#));
    }
}
