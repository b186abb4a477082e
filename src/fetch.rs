//! Retrieving the source document.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Where the source document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Fetched over HTTP(S).
    Url(String),
    /// A saved copy of the page.
    File(PathBuf),
}

impl Source {
    /// Read the whole document into memory.
    pub fn load(&self) -> Result<Vec<u8>> {
        match self {
            Source::Url(url) => fetch_document(url),
            Source::File(path) => std::fs::read(path).map_err(|e| Error::Fetch {
                url: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch `url` with a single blocking GET.
///
/// Any non-success status is an error; redirects are followed by the client.
pub fn fetch_document(url: &str) -> Result<Vec<u8>> {
    let fail = |reason: String| Error::Fetch {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| fail(format!("cannot build HTTP client: {e}")))?;

    log::info!("fetching {url}");
    let response = client.get(url).send().map_err(|e| fail(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fail(format!("server returned {status}")));
    }

    let body = response
        .bytes()
        .map_err(|e| fail(format!("cannot read response body: {e}")))?;
    log::debug!("fetched {} bytes from {url}", body.len());
    Ok(body.to_vec())
}
