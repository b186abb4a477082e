//! Build configuration.
//!
//! Every field has a default, so an empty file (or no file at all) builds
//! the Effective Go book. Command-line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dom::NodeSelector;
use crate::error::{Error, Result};
use crate::section::SectionOptions;

pub const DEFAULT_SOURCE_URL: &str = "https://golang.org/doc/effective_go.html";

/// Configuration for one book build.
///
/// Loaded from TOML:
///
/// ```toml
/// source_url = "https://golang.org/doc/effective_go.html"
/// title = "Effective Go"
/// boundary_tag = "h2"
///
/// [[container]]
/// tag = "div"
/// attr = "id"
/// value = "page"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Page to fetch.
    pub source_url: String,

    /// Book title.
    pub title: String,

    pub language: String,

    pub author: Option<String>,

    /// Package identifier; a `urn:uuid:` is generated when absent.
    pub identifier: Option<String>,

    /// Tag name that starts a new section.
    pub boundary_tag: String,

    /// Filename of the untitled first section.
    pub title_filename: String,

    /// Where the finished EPUB is written.
    pub output_path: PathBuf,

    pub cover_image_path: Option<PathBuf>,

    pub stylesheet_path: Option<PathBuf>,

    pub font_paths: Vec<PathBuf>,

    /// Applied in order, each searching inside the previous match.
    pub container: Vec<NodeSelector>,

    /// Searched inside the container. Must be present when set.
    pub footer: Option<NodeSelector>,

    /// Nodes detached from the container before sectioning.
    pub remove: Vec<NodeSelector>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            title: "Effective Go".to_string(),
            language: "en".to_string(),
            author: None,
            identifier: None,
            boundary_tag: "h2".to_string(),
            title_filename: "title.xhtml".to_string(),
            output_path: PathBuf::from("Effective Go.epub"),
            cover_image_path: None,
            stylesheet_path: None,
            font_paths: Vec::new(),
            container: vec![
                NodeSelector::new("div", "id", "page"),
                NodeSelector::new("div", "class", "container"),
            ],
            footer: Some(NodeSelector::new("div", "id", "footer")),
            remove: Vec::new(),
        }
    }
}

impl BuildConfig {
    /// Load a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid TOML: {e}")))
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.source_url.trim().is_empty() {
            errors.push("source_url is empty".to_string());
        }
        if self.boundary_tag.trim().is_empty() {
            errors.push("boundary_tag is empty".to_string());
        }
        if !self.title_filename.ends_with(".xhtml") || self.title_filename.len() <= ".xhtml".len()
        {
            errors.push(format!(
                "title_filename {:?} must be a name ending in .xhtml",
                self.title_filename
            ));
        }
        if crate::section::RESERVED_FILENAMES.contains(&self.title_filename.as_str()) {
            errors.push(format!(
                "title_filename {:?} is reserved for the package",
                self.title_filename
            ));
        }
        if self.container.is_empty() {
            errors.push("container needs at least one selector".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(errors.join("; ")))
        }
    }

    /// Sectioning parameters derived from this configuration.
    pub fn section_options(&self) -> SectionOptions {
        SectionOptions {
            boundary_tag: self.boundary_tag.to_ascii_lowercase(),
            title_filename: self.title_filename.clone(),
        }
    }
}
