//! Template composition.
//!
//! Templates are plain text files with a fixed set of placeholder tokens.
//! Every occurrence of every token is replaced; any other text passes
//! through unchanged.
//!
//! | Token | Value |
//! |-------|-------|
//! | `{{TITLE}}` | `title` front-matter field |
//! | `{{DESCRIPTION}}` | `description` front-matter field |
//! | `{{HERO}}` | `hero` front-matter field |
//! | `{{DATE_PUBLISHED}}` | `datePublished` front-matter field |
//! | `{{DATE_MODIFIED}}` | `dateModified` front-matter field |
//! | `{{URL}}` | canonical URL of the page |
//! | `{{ARTICLE_CONTENT}}` | rendered Markdown body |
//!
//! Tokens are matched literally: each is passed through [`regex::escape`]
//! before it becomes a pattern, and values are inserted with
//! [`regex::NoExpand`] so `$` in a value is never read as a capture group.

use crate::content::ContentUnit;
use crate::validate::{DATE_MODIFIED, DATE_PUBLISHED};
use regex::{NoExpand, Regex};
use std::sync::LazyLock;

/// The fixed placeholder set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Title,
    Description,
    Hero,
    DatePublished,
    DateModified,
    Url,
    Content,
}

impl Placeholder {
    pub const ALL: [Placeholder; 7] = [
        Placeholder::Title,
        Placeholder::Description,
        Placeholder::Hero,
        Placeholder::DatePublished,
        Placeholder::DateModified,
        Placeholder::Url,
        Placeholder::Content,
    ];

    /// Literal token as it appears in templates.
    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Title => "{{TITLE}}",
            Placeholder::Description => "{{DESCRIPTION}}",
            Placeholder::Hero => "{{HERO}}",
            Placeholder::DatePublished => "{{DATE_PUBLISHED}}",
            Placeholder::DateModified => "{{DATE_MODIFIED}}",
            Placeholder::Url => "{{URL}}",
            Placeholder::Content => "{{ARTICLE_CONTENT}}",
        }
    }

    /// Front-matter key feeding this placeholder, if any.
    pub fn attribute(self) -> Option<&'static str> {
        match self {
            Placeholder::Title => Some("title"),
            Placeholder::Description => Some("description"),
            Placeholder::Hero => Some("hero"),
            Placeholder::DatePublished => Some(DATE_PUBLISHED),
            Placeholder::DateModified => Some(DATE_MODIFIED),
            Placeholder::Url | Placeholder::Content => None,
        }
    }
}

/// Build a pattern that matches `token` literally.
pub fn literal_pattern(token: &str) -> Result<Regex, regex::Error> {
    Regex::new(&regex::escape(token))
}

/// Replace every occurrence of `token` in `text` with `value`, literally.
pub fn replace_literal(text: &str, token: &str, value: &str) -> Result<String, regex::Error> {
    let pattern = literal_pattern(token)?;
    Ok(pattern.replace_all(text, NoExpand(value)).into_owned())
}

static PATTERNS: LazyLock<Vec<(Placeholder, Regex)>> = LazyLock::new(|| {
    Placeholder::ALL
        .iter()
        .map(|&p| {
            let pattern = literal_pattern(p.token()).expect("escaped token must compile");
            (p, pattern)
        })
        .collect()
});

/// Values for every placeholder of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitutions {
    values: Vec<(Placeholder, String)>,
}

impl Substitutions {
    /// Collect values from a document's attributes, its canonical URL and
    /// its rendered body. Every value is trimmed; absent attributes are `""`.
    pub fn for_document(unit: &ContentUnit, url: &str, content_html: &str) -> Self {
        let values = Placeholder::ALL
            .iter()
            .map(|&p| {
                let value = match p {
                    Placeholder::Url => url,
                    Placeholder::Content => content_html,
                    _ => p.attribute().map(|key| unit.attr(key)).unwrap_or(""),
                };
                (p, value.trim().to_string())
            })
            .collect();
        Self { values }
    }

    /// Set one placeholder's value (trimmed).
    pub fn set(&mut self, placeholder: Placeholder, value: &str) {
        let value = value.trim().to_string();
        match self.values.iter_mut().find(|(p, _)| *p == placeholder) {
            Some(slot) => slot.1 = value,
            None => self.values.push((placeholder, value)),
        }
    }

    /// Value for a placeholder; unset placeholders substitute as `""`.
    pub fn get(&self, placeholder: Placeholder) -> &str {
        self.values
            .iter()
            .find(|(p, _)| *p == placeholder)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }
}

/// Replace every placeholder token in `template`.
pub fn compose(template: &str, substitutions: &Substitutions) -> String {
    let mut document = template.to_string();
    for (placeholder, pattern) in PATTERNS.iter() {
        let value = substitutions.get(*placeholder);
        document = pattern.replace_all(&document, NoExpand(value)).into_owned();
    }
    document
}
