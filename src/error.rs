//! Error types for folio operations.

use std::fmt;

use thiserror::Error;

/// Errors that can abort a build.
///
/// Every variant is fatal. Dangling internal links are not errors; they are
/// reported through [`crate::links::RewriteReport`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("expected structure not found: {0}")]
    StructureNotFound(String),

    #[error("malformed section: {0}")]
    MalformedSection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("packaging error: {0}")]
    Packaging(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error belongs to, for the one-line failure summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Fetch,
    Parse,
    Structure,
    Sectioning,
    Serialization,
    Packaging,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "configuration",
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::Structure => "structure lookup",
            Stage::Sectioning => "sectioning",
            Stage::Serialization => "serialization",
            Stage::Packaging => "packaging",
        };
        f.write_str(name)
    }
}

impl Error {
    /// The stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Fetch { .. } => Stage::Fetch,
            Error::Parse(_) => Stage::Parse,
            Error::StructureNotFound(_) => Stage::Structure,
            Error::MalformedSection(_) => Stage::Sectioning,
            Error::Serialization(_) => Stage::Serialization,
            Error::Packaging(_) | Error::Io(_) => Stage::Packaging,
            Error::Config(_) => Stage::Config,
        }
    }

    /// One-line summary naming the failed stage.
    pub fn summary(&self) -> String {
        format!("{} failed: {}", self.stage(), self)
    }
}
