//! In-memory e-book assembled from rendered sections.
//!
//! The [`Book`] is what the packaging step writes out: metadata, an ordered
//! spine of content documents, a flat table of contents, and the embedded
//! resources (stylesheet, fonts, cover image).

use std::path::Path;

use crate::dom::{escape_attr_into, escape_text_into};
use crate::error::{Error, Result};
use crate::util::detect_media_format;

pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

/// In-memory book.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub metadata: Metadata,
    pub spine: Vec<SpineItem>,
    pub toc: Vec<TocEntry>,
    /// Resources in insertion order; hrefs are unique.
    pub resources: Vec<Resource>,
}

/// Book metadata (Dublin Core subset).
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    pub identifier: String,
    /// `dcterms:modified` value; generated at write time when absent.
    pub modified: Option<String>,
    /// Href of the cover image resource.
    pub cover_image: Option<String>,
}

/// An item in the reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub id: String,
    pub href: String,
}

/// A table of contents entry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TocEntry {
    pub title: String,
    pub href: String,
}

/// A packaged file (content document, image, CSS, font).
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: String,
    /// Path relative to the package document.
    pub href: String,
    pub data: Vec<u8>,
    pub media_type: String,
}

impl Book {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    /// Add or replace a resource. Returns its manifest id.
    pub fn add_resource(
        &mut self,
        href: impl Into<String>,
        data: Vec<u8>,
        media_type: impl Into<String>,
    ) -> String {
        let href = href.into();
        let media_type = media_type.into();

        if let Some(existing) = self.resources.iter_mut().find(|r| r.href == href) {
            existing.data = data;
            existing.media_type = media_type;
            return existing.id.clone();
        }

        let base = href_to_id(&href);
        let mut id = base.clone();
        let mut n = 2;
        while self.resources.iter().any(|r| r.id == id) {
            id = format!("{base}_{n}");
            n += 1;
        }

        self.resources.push(Resource {
            id: id.clone(),
            href,
            data,
            media_type,
        });
        id
    }

    /// Get a resource by href
    pub fn get_resource(&self, href: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.href == href)
    }

    /// Add a content section.
    ///
    /// `content` is body markup; it is wrapped in an XHTML document linking
    /// `stylesheet_href`. Sections with an empty `title` stay out of the
    /// table of contents.
    pub fn add_section(
        &mut self,
        content: &str,
        title: &str,
        filename: &str,
        stylesheet_href: Option<&str>,
    ) -> Result<()> {
        if self.get_resource(filename).is_some() {
            return Err(Error::Packaging(format!(
                "section filename {filename} is already in use"
            )));
        }

        let doc_title = if title.is_empty() {
            self.metadata.title.as_str()
        } else {
            title
        };
        let document = xhtml_document(doc_title, content, stylesheet_href);
        let id = self.add_resource(filename, document.into_bytes(), XHTML_MEDIA_TYPE);

        self.spine.push(SpineItem {
            id,
            href: filename.to_string(),
        });
        if !title.is_empty() {
            self.toc.push(TocEntry {
                title: title.to_string(),
                href: filename.to_string(),
            });
        }
        Ok(())
    }

    /// Embed a stylesheet from disk. Returns the href sections should link.
    pub fn add_css(&mut self, path: &Path) -> Result<String> {
        self.add_file(path, "css", "stylesheet")
    }

    /// Embed a font file from disk. Returns its href within the package.
    pub fn add_font(&mut self, path: &Path) -> Result<String> {
        self.add_file(path, "fonts", "font")
    }

    /// Embed a cover image and a cover page placed first in the spine.
    pub fn set_cover(&mut self, path: &Path) -> Result<String> {
        let (name, data) = read_file(path, "cover image")?;
        let format = detect_media_format(&name, &data);
        if !format.is_image() {
            return Err(Error::Packaging(format!(
                "cover {} is not a recognized image",
                path.display()
            )));
        }
        let href = format!("images/{name}");
        self.add_resource(href.clone(), data, format.mime_type());

        let mut body = String::from("<div class=\"cover\"><img src=\"");
        escape_attr_into(&href, &mut body);
        body.push_str("\" alt=\"Cover\"/></div>");
        let document = xhtml_document(&self.metadata.title, &body, None);
        let id = self.add_resource("cover.xhtml", document.into_bytes(), XHTML_MEDIA_TYPE);

        self.spine.retain(|item| item.href != "cover.xhtml");
        self.spine.insert(
            0,
            SpineItem {
                id,
                href: "cover.xhtml".to_string(),
            },
        );
        self.metadata.cover_image = Some(href.clone());
        Ok(href)
    }

    fn add_file(&mut self, path: &Path, dir: &str, what: &str) -> Result<String> {
        let (name, data) = read_file(path, what)?;
        let href = format!("{dir}/{name}");
        let media_type = detect_media_format(&name, &data).mime_type();
        self.add_resource(href.clone(), data, media_type);
        log::debug!("embedded {what} {} as {href}", path.display());
        Ok(href)
    }
}

fn read_file(path: &Path, what: &str) -> Result<(String, Vec<u8>)> {
    let data = std::fs::read(path)
        .map_err(|e| Error::Packaging(format!("cannot read {what} {}: {e}", path.display())))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::Packaging(format!("{what} path {} has no file name", path.display()))
        })?;
    Ok((name.to_string(), data))
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }
}

/// Wrap body markup in a complete XHTML document.
pub fn xhtml_document(title: &str, body: &str, stylesheet_href: Option<&str>) -> String {
    let mut doc = String::with_capacity(body.len() + 512);
    doc.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <meta charset="utf-8"/>
  <title>"#,
    );
    escape_text_into(title, &mut doc);
    doc.push_str("</title>\n");

    if let Some(href) = stylesheet_href {
        doc.push_str("  <link rel=\"stylesheet\" type=\"text/css\" href=\"");
        escape_attr_into(href, &mut doc);
        doc.push_str("\"/>\n");
    }

    doc.push_str("</head>\n<body>\n");
    doc.push_str(body);
    doc.push_str("\n</body>\n</html>\n");
    doc
}

/// Manifest id for an href: XML NCName-safe.
fn href_to_id(href: &str) -> String {
    let cleaned: String = href
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("item_{cleaned}")
}
