//! Source document loading.
//!
//! A source document is an optional YAML front-matter block followed by the
//! Markdown body:
//!
//! ```text
//! ---
//! title: Hello
//! description: A first post
//! hero: /images/hello.avif
//! datePublished: 2024-01-01
//! dateModified: 2024-02-01
//! ---
//! # Hello
//!
//! Body text.
//! ```
//!
//! The block must start on the first line and ends at the next `---` (or
//! `...`) line. A document without a well-formed block has no attributes
//! and its whole text is the body.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("front-matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front-matter must be a mapping of field names to values")]
    NotAMapping,
}

/// One source document: front-matter attributes plus Markdown body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentUnit {
    /// Front-matter fields. Scalars are kept as their string form;
    /// nulls, lists and nested mappings are dropped.
    pub attributes: BTreeMap<String, String>,
    /// Markdown text following the front-matter block.
    pub body: String,
}

impl ContentUnit {
    /// Read and parse a source document.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let raw = fs::read_to_string(path)?;
        parse(&raw)
    }

    /// Attribute value, or `""` when absent.
    pub fn attr(&self, key: &str) -> &str {
        self.attributes.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Split raw document text into attributes and body.
pub fn parse(raw: &str) -> Result<ContentUnit, ContentError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some((yaml, body)) = split_front_matter(raw) else {
        return Ok(ContentUnit {
            attributes: BTreeMap::new(),
            body: raw.to_string(),
        });
    };

    Ok(ContentUnit {
        attributes: parse_attributes(yaml)?,
        body: body.to_string(),
    })
}

/// Locate the front-matter block. Returns `(yaml, body)` on success.
fn split_front_matter(raw: &str) -> Option<(&str, &str)> {
    let (first, rest) = split_line(raw)?;
    if first.trim_end() != "---" {
        return None;
    }

    let mut offset = 0;
    let mut remaining = rest;
    while let Some((line, after)) = split_line(remaining) {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            let yaml = &rest[..offset];
            return Some((yaml, after));
        }
        offset += remaining.len() - after.len();
        remaining = after;
    }
    None
}

/// Split off the first line. The returned line excludes its terminator.
fn split_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    match text.find('\n') {
        Some(pos) => Some((&text[..pos], &text[pos + 1..])),
        None => Some((text, "")),
    }
}

fn parse_attributes(yaml: &str) -> Result<BTreeMap<String, String>, ContentError> {
    if yaml.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    let mapping = match value {
        serde_yaml::Value::Mapping(m) => m,
        serde_yaml::Value::Null => return Ok(BTreeMap::new()),
        _ => return Err(ContentError::NotAMapping),
    };

    let mut attributes = BTreeMap::new();
    for (key, value) in mapping {
        let (Some(key), Some(value)) = (scalar_to_string(&key), scalar_to_string(&value)) else {
            continue;
        };
        attributes.insert(key, value);
    }
    Ok(attributes)
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}
