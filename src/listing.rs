//! Article listings built from generated pages.
//!
//! The browser widget imports the Index Artifact, fetches every listed page,
//! reads a few metadata tags and renders the pages newest first. This module
//! does the same on disk so the result can be printed (`list`) or emitted as
//! a static HTML fragment.
//!
//! Metadata read from each page:
//!
//! | Field | Source | Fallback |
//! |-------|--------|----------|
//! | title | `<title>` text | the page path |
//! | description | `<meta name="description" content>` | `""` |
//! | published | `<meta property="article:published_time" content>` | undated |
//!
//! Undated pages, and pages whose date does not parse, sort as the oldest
//! possible date, so they always come last.

use crate::config::SiteConfig;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};
use maud::html;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Number of entries in the "recent" list.
pub const RECENT_COUNT: usize = 5;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("index artifact is not an `export const NAME = [...]` module")]
    MalformedArtifact,
    #[error("index artifact array is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown section {0:?}")]
    UnknownSection(String),
    #[error("section {0:?} does not publish an index")]
    NoIndex(String),
}

/// One listed page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingEntry {
    /// Site-relative path, as found in the Index Artifact.
    pub path: String,
    pub title: String,
    pub description: String,
    /// Parsed publication time; `None` when absent or unparseable.
    pub published: Option<DateTime<FixedOffset>>,
}

impl ListingEntry {
    /// Human-readable publication date, e.g. `February 1st, 2026`.
    pub fn display_date(&self) -> Option<String> {
        self.published.map(|dt| format_date(dt.date_naive()))
    }
}

/// A section listing plus the pages that could not be read.
#[derive(Debug, Default)]
pub struct Listing {
    /// Entries sorted newest first.
    pub entries: Vec<ListingEntry>,
    /// `(path, error)` for every listed page that could not be read.
    pub unreadable: Vec<(String, String)>,
}

impl Listing {
    /// The most recent `n` entries.
    pub fn recent(&self, n: usize) -> &[ListingEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}

// =============================================================================
// Index Artifact parsing
// =============================================================================

/// Extract the path list from `export const NAME = [...]`.
pub fn parse_index_artifact(text: &str) -> Result<Vec<String>, ListingError> {
    let rest = text
        .trim_start()
        .strip_prefix("export const")
        .ok_or(ListingError::MalformedArtifact)?;
    let (_, array) = rest.split_once('=').ok_or(ListingError::MalformedArtifact)?;
    let array = array.trim().trim_end_matches(';').trim_end();
    Ok(serde_json::from_str(array)?)
}

// =============================================================================
// Metadata extraction
// =============================================================================

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("title pattern must compile")
});

static META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("meta pattern must compile"));

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("attribute pattern must compile")
});

/// Attributes of one tag as `(lowercased name, raw value)` pairs.
fn tag_attributes(tag: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(tag)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

/// `content` of the first `<meta>` whose `key` attribute equals `value`.
fn meta_content(html: &str, key: &str, value: &str) -> Option<String> {
    META_RE.find_iter(html).find_map(|tag| {
        let attrs = tag_attributes(tag.as_str());
        let matches = attrs.iter().any(|(k, v)| k == key && v == value);
        if !matches {
            return None;
        }
        attrs
            .into_iter()
            .find(|(k, _)| k == "content")
            .map(|(_, v)| decode_entities(&v))
    })
}

/// Read listing metadata from a generated page.
pub fn extract_metadata(html: &str, path: &str) -> ListingEntry {
    let title = TITLE_RE
        .captures(html)
        .map(|caps| decode_entities(caps[1].trim()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| path.to_string());

    let description = meta_content(html, "name", "description").unwrap_or_default();
    let published = meta_content(html, "property", "article:published_time")
        .and_then(|s| parse_date(s.trim()));

    ListingEntry {
        path: path.to_string(),
        title,
        description,
        published,
    }
}

/// Decode the handful of HTML entities that appear in titles and attributes.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos..];
        match after.find(';').filter(|&end| end <= 10) {
            Some(end) => {
                let entity = &after[1..end];
                match decode_entity(entity) {
                    Some(c) => out.push(c),
                    None => out.push_str(&after[..=end]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

// =============================================================================
// Dates
// =============================================================================

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM[:SS]`, or a plain
/// `YYYY-MM-DD`. Naive values are taken as UTC.
pub fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// English ordinal suffix for a day of the month.
pub fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Format as `February 1st, 2026`.
pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{} {}{}, {}",
        date.format("%B"),
        date.day(),
        ordinal_suffix(date.day()),
        date.year()
    )
}

// =============================================================================
// Sorting and rendering
// =============================================================================

/// Sort newest first. Undated entries go last; ties keep their order.
pub fn sort_newest_first(entries: &mut [ListingEntry]) {
    entries.sort_by(|a, b| b.published.cmp(&a.published));
}

/// Render entries as a `<ul>` fragment mirroring the browser widget.
pub fn render_list_html(entries: &[ListingEntry]) -> String {
    html! {
        ul.article-list {
            @for entry in entries {
                li {
                    a href=(entry.path) { (entry.title) }
                    @if let Some(date) = entry.display_date() {
                        div.article-date { (date) }
                    }
                    @if !entry.description.is_empty() {
                        div.article-description { (entry.description) }
                    }
                }
            }
        }
    }
    .into_string()
}

// =============================================================================
// Loading
// =============================================================================

/// Map a site-relative path onto the file under `site_root`.
pub fn page_file(site_root: &Path, path: &str) -> PathBuf {
    site_root.join(path.trim_start_matches('/'))
}

/// Build the listing for a section from its Index Artifact.
pub fn load_listing(config: &SiteConfig, section_name: &str) -> Result<Listing, ListingError> {
    let section = config
        .section(section_name)
        .ok_or_else(|| ListingError::UnknownSection(section_name.to_string()))?;
    let (artifact, _) = section
        .index_target()
        .ok_or_else(|| ListingError::NoIndex(section_name.to_string()))?;

    let text = fs::read_to_string(artifact).map_err(|source| ListingError::Io {
        path: artifact.to_path_buf(),
        source,
    })?;
    let paths = parse_index_artifact(&text)?;

    let mut listing = Listing::default();
    for path in paths {
        match fs::read_to_string(page_file(&config.site_root, &path)) {
            Ok(html) => listing.entries.push(extract_metadata(&html, &path)),
            Err(e) => listing.unreadable.push((path, e.to_string())),
        }
    }
    sort_newest_first(&mut listing.entries);
    Ok(listing)
}
