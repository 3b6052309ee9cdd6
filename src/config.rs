//! Site configuration module.
//!
//! Handles loading and validating `site.toml`. The file lives in the project
//! root; every relative path inside it is resolved against that directory.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All top-level tables are optional - defaults shown below
//!
//! site_root = "."               # Directory served in live mode
//!
//! [[sections]]
//! name = "articles"             # URL segment: /articles/...
//! source = "articles-markdown"  # Directory of .md sources
//! output = "articles"           # Directory receiving .html pages
//! template = "build-template-articles.html.txt"
//! required_fields = ["title", "description", "hero", "datePublished", "dateModified"]
//! generate_index = true
//! index_output = "articles-list-index.js"
//! index_variable = "ARTICLE_FILE_NAMES"
//! index_document = "index"      # Stem of the section's entry page
//!
//! [serve]
//! host = "127.0.0.1"
//! port = 8000
//! command = ["python3", "-m", "http.server", "{port}", "-b", "{host}"]
//!
//! [watch]
//! debounce_ms = 250
//! ```
//!
//! Declaring any `[[sections]]` replaces the stock section list entirely.
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the project root.
pub const CONFIG_FILE: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
///
/// Immutable once loaded; the build pipeline and the watcher receive it by
/// reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Project root every relative path is resolved against.
    #[serde(skip)]
    pub root: PathBuf,
    /// Directory served by the preview server, and the base that
    /// site-relative index paths (`/articles/x.html`) map onto.
    pub site_root: PathBuf,
    /// Content sections, built in declaration order.
    pub sections: Vec<SectionConfig>,
    /// Preview server settings (live mode only).
    pub serve: ServeConfig,
    /// Rebuild loop settings (live mode only).
    pub watch: WatchConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            site_root: PathBuf::from("."),
            sections: default_sections(),
            serve: ServeConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

/// One content category with its own source, output and template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    /// Section name, also the first URL segment of its pages.
    pub name: String,
    /// Directory holding the section's `.md` documents.
    pub source: PathBuf,
    /// Directory receiving the generated `.html` documents.
    pub output: PathBuf,
    /// Template document with the `{{...}}` placeholders.
    pub template: PathBuf,
    /// Front-matter fields every document must carry.
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Whether to publish the Index Artifact for this section.
    #[serde(default)]
    pub generate_index: bool,
    /// Where the Index Artifact is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_output: Option<PathBuf>,
    /// Exported JavaScript constant name inside the Index Artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_variable: Option<String>,
    /// File stem of the section's entry document.
    #[serde(default = "default_index_document")]
    pub index_document: String,
}

fn default_index_document() -> String {
    "index".to_string()
}

impl SectionConfig {
    /// Whether `stem` names this section's index document.
    pub fn is_index_document(&self, stem: &str) -> bool {
        stem == self.index_document
    }

    /// Index output path and variable name, when an index should be published.
    pub fn index_target(&self) -> Option<(&Path, &str)> {
        if !self.generate_index {
            return None;
        }
        match (&self.index_output, &self.index_variable) {
            (Some(path), Some(var)) => Some((path.as_path(), var.as_str())),
            _ => None,
        }
    }
}

fn default_sections() -> Vec<SectionConfig> {
    vec![
        SectionConfig {
            name: "articles".to_string(),
            source: PathBuf::from("articles-markdown"),
            output: PathBuf::from("articles"),
            template: PathBuf::from("build-template-articles.html.txt"),
            required_fields: ["title", "description", "hero", "datePublished", "dateModified"]
                .into_iter()
                .map(String::from)
                .collect(),
            generate_index: true,
            index_output: Some(PathBuf::from("articles-list-index.js")),
            index_variable: Some("ARTICLE_FILE_NAMES".to_string()),
            index_document: default_index_document(),
        },
        SectionConfig {
            name: "about".to_string(),
            source: PathBuf::from("about-markdown"),
            output: PathBuf::from("about"),
            template: PathBuf::from("build-template-articles.html.txt"),
            required_fields: ["title", "description", "hero"]
                .into_iter()
                .map(String::from)
                .collect(),
            generate_index: false,
            index_output: None,
            index_variable: None,
            index_document: default_index_document(),
        },
    ]
}

/// Preview server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    /// Address the server binds to.
    pub host: String,
    /// Port the server listens on.
    pub port: u16,
    /// Program and arguments. `{host}` and `{port}` are substituted.
    pub command: Vec<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            command: ["python3", "-m", "http.server", "{port}", "-b", "{host}"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ServeConfig {
    /// The command line with `{host}` and `{port}` filled in.
    pub fn command_line(&self) -> Vec<String> {
        let port = self.port.to_string();
        self.command
            .iter()
            .map(|arg| arg.replace("{host}", &self.host).replace("{port}", &port))
            .collect()
    }

    /// URL printed when live mode starts.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Rebuild loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet period after the last change before a section is rebuilt.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 250 }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl SiteConfig {
    /// Validate config values are consistent and usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sections.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[sections]] entry is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for section in &self.sections {
            if !is_path_segment(&section.name) {
                return Err(ConfigError::Validation(format!(
                    "section name {:?} must be a single non-empty path segment",
                    section.name
                )));
            }
            if !seen.insert(section.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate section name {:?}",
                    section.name
                )));
            }
            if section.index_document.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "sections.{}.index_document must not be empty",
                    section.name
                )));
            }
            if section.generate_index {
                if section.index_output.is_none() {
                    return Err(ConfigError::Validation(format!(
                        "sections.{}.index_output is required when generate_index = true",
                        section.name
                    )));
                }
                match &section.index_variable {
                    Some(var) if is_js_identifier(var) => {}
                    Some(var) => {
                        return Err(ConfigError::Validation(format!(
                            "sections.{}.index_variable {var:?} is not a valid identifier",
                            section.name
                        )));
                    }
                    None => {
                        return Err(ConfigError::Validation(format!(
                            "sections.{}.index_variable is required when generate_index = true",
                            section.name
                        )));
                    }
                }
            }
        }

        if self.serve.port == 0 {
            return Err(ConfigError::Validation("serve.port must be non-zero".into()));
        }
        if self.serve.command.is_empty() {
            return Err(ConfigError::Validation(
                "serve.command must not be empty".into(),
            ));
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.debounce_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Return a copy with every relative path joined onto `root`.
    pub fn resolved(mut self, root: &Path) -> Self {
        self.root = root.to_path_buf();
        self.site_root = root.join(&self.site_root);
        for section in &mut self.sections {
            section.source = root.join(&section.source);
            section.output = root.join(&section.output);
            section.template = root.join(&section.template);
            section.index_output = section.index_output.as_ref().map(|p| root.join(p));
        }
        self
    }

    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&SectionConfig> {
        self.sections.iter().find(|s| s.name == name)
    }
}

fn is_path_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_whitespace)
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

// =============================================================================
// Config loading
// =============================================================================

/// Load `site.toml` from the given project root.
///
/// A missing file yields the stock configuration. Unknown keys are rejected,
/// values are validated, and relative paths are resolved against `root`.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    let config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        toml::from_str::<SiteConfig>(&content)?
    } else {
        SiteConfig::default()
    };
    config.validate()?;
    Ok(config.resolved(root))
}

/// Returns a fully-commented stock `site.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# mdsections configuration
# ========================
# Relative paths are resolved against the directory holding this file.
# Unknown keys will cause an error.

# Directory served by the preview server in live mode. Index entries such as
# "/articles/foo.html" are relative to it.
site_root = "."

# ---------------------------------------------------------------------------
# Sections
# ---------------------------------------------------------------------------
# Each section turns <source>/*.md into <output>/*.html through <template>.
# Declaring any [[sections]] replaces this stock list.

[[sections]]
name = "articles"
source = "articles-markdown"
output = "articles"
template = "build-template-articles.html.txt"
# Documents missing any of these are skipped with a warning. The index
# document is never required to carry datePublished / dateModified.
required_fields = ["title", "description", "hero", "datePublished", "dateModified"]
# Publish `export const ARTICLE_FILE_NAMES = [...]` for the listing widget.
generate_index = true
index_output = "articles-list-index.js"
index_variable = "ARTICLE_FILE_NAMES"
# File stem of the section entry page (served at /articles/).
index_document = "index"

[[sections]]
name = "about"
source = "about-markdown"
output = "about"
template = "build-template-articles.html.txt"
required_fields = ["title", "description", "hero"]
generate_index = false
index_document = "index"

# ---------------------------------------------------------------------------
# Live mode
# ---------------------------------------------------------------------------
[serve]
host = "127.0.0.1"
port = 8000
# Spawned in the project root. {host} and {port} are substituted.
command = ["python3", "-m", "http.server", "{port}", "-b", "{host}"]

[watch]
# Quiet period before a changed section is rebuilt.
debounce_ms = 250
"##
}
