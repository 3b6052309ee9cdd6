//! # mdsections
//!
//! A small static site generator for sites organised into sections. Each
//! section is a directory of Markdown files with YAML front-matter, a plain
//! HTML template with `{{PLACEHOLDER}}` tokens, and an output directory.
//!
//! # Architecture: One Pass Per Section
//!
//! Every build, whether one-shot or triggered by the watcher, runs the same
//! pass over a section:
//!
//! ```text
//! 1. Reconcile   out/*.html  −  src/*.md  →  deleted orphans
//! 2. Build       src/*.md    →  out/*.html   (validate, render, compose)
//! 3. Publish     built paths →  index.js     (sections with an index only)
//! ```
//!
//! Outputs are a pure function of source, template and config, so a pass can
//! be repeated at any time and yields byte-identical files. Sections share no
//! output files; rebuilding one never touches another.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `site.toml` loading, defaults, validation, path resolution |
//! | [`content`] | Front-matter splitting and parsing into a [`content::ContentUnit`] |
//! | [`validate`] | Required-field checks, with the index-document date exemption |
//! | [`render`] | Markdown body → HTML fragment |
//! | [`template`] | Literal placeholder substitution into the section template |
//! | [`reconcile`] | Deletes generated pages whose source is gone |
//! | [`index`] | Writes the `export const NAME = [...]` index artifact |
//! | [`pipeline`] | Section pass orchestration and per-document outcomes |
//! | [`watch`] | Debounced per-section rebuilds on source changes |
//! | [`serve`] | Spawns and supervises the preview HTTP server |
//! | [`listing`] | Reads the index artifact back into a newest-first page list |
//! | [`naming`] | Source/output file naming and site-relative paths |
//! | [`event`] | Progress events shared by the build, watcher and server |
//! | [`output`] | CLI output formatting for events, summaries and listings |
//!
//! # Design Decisions
//!
//! ## Templates Are Plain Text
//!
//! A template is any text file. Placeholders are replaced literally, every
//! occurrence, with no escaping and no template language. The rendered body
//! is substituted last so Markdown that happens to contain `{{TITLE}}` is
//! left alone.
//!
//! ## Skip, Don't Stop
//!
//! A document with missing fields or broken front-matter is reported and
//! skipped; its siblings still build. A section whose source directory is
//! missing or empty is reported and skipped; other sections still build.
//! Only a broken `site.toml` stops the program.
//!
//! ## Events Instead of Printing
//!
//! Library code never writes to the terminal. It sends [`event::Event`]s to
//! an optional channel and the binary prints them, which keeps every message
//! assertable in tests.

pub mod config;
pub mod content;
pub mod event;
pub mod index;
pub mod listing;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod serve;
pub mod template;
pub mod validate;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
