//! Splitting a container's children into chapters on heading boundaries.
//!
//! Every top-level child of the container lands in exactly one [`Section`].
//! The first section is the untitled title page: it collects everything
//! before the first boundary heading, plus the footer wherever the footer
//! appears. Each boundary heading opens a new section named after it.

use std::collections::HashSet;

use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use crate::links::LinkMap;

/// Filenames the package writer generates itself.
pub const RESERVED_FILENAMES: &[&str] = &["nav.xhtml", "cover.xhtml"];

/// One output chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Human-readable title. Empty for the title page, which keeps it out of
    /// the table of contents.
    pub title: String,
    /// Output file name and link-rewrite target.
    pub filename: String,
    /// Container children claimed by this section, in acquisition order.
    pub nodes: Vec<NodeId>,
}

impl Section {
    fn new(title: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            filename: filename.into(),
            nodes: Vec::new(),
        }
    }

    /// True for the untitled title page.
    pub fn is_title_page(&self) -> bool {
        self.title.is_empty()
    }
}

/// Sections plus the identifier map built during the same walk.
#[derive(Debug, Clone)]
pub struct Sectioned {
    pub sections: Vec<Section>,
    pub links: LinkMap,
    /// Whether the footer was claimed by the title page. False when no
    /// footer was given or it is not a direct child of the container.
    pub footer_on_title_page: bool,
}

/// Splitting parameters.
#[derive(Debug, Clone)]
pub struct SectionOptions {
    /// Tag name that starts a new section, e.g. `h2`.
    pub boundary_tag: String,
    /// Filename of the title page.
    pub title_filename: String,
}

impl Default for SectionOptions {
    fn default() -> Self {
        Self {
            boundary_tag: "h2".to_string(),
            title_filename: "title.xhtml".to_string(),
        }
    }
}

/// Split `container`'s children into sections.
///
/// `footer`, when given and a direct child of `container`, is routed to the
/// title page regardless of its position. It carries the attribution and
/// license text, which belongs on the first page of the book even though the
/// source prints it last. A footer nested deeper is logged and left with its
/// ancestor.
pub fn sectionize(
    dom: &Dom,
    container: NodeId,
    footer: Option<NodeId>,
    options: &SectionOptions,
) -> Result<Sectioned> {
    let boundary_tag = options.boundary_tag.to_ascii_lowercase();
    let footer = footer.filter(|&node| {
        let direct = dom.parent(node) == Some(container);
        if !direct {
            log::warn!(
                "footer node {} is nested below the container's children; \
                 it stays with the section holding its ancestor",
                node.0
            );
        }
        direct
    });

    let mut names = FilenameAllocator::new(&options.title_filename);
    let mut links = LinkMap::new();
    // The open section is always the last one; the title page is index 0.
    let mut sections = vec![Section::new("", options.title_filename.clone())];

    for (position, child) in dom.children(container).enumerate() {
        if dom.is_element_named(child, &boundary_tag) {
            let title = dom.collect_text(child);
            if title.is_empty() {
                return Err(Error::MalformedSection(format!(
                    "<{}> at child position {} has no title text",
                    boundary_tag, position
                )));
            }
            let filename = names.allocate(&title, sections.len());
            log::debug!("section {:?} -> {}", title, filename);
            sections.push(Section::new(title, filename));
        }

        let index = if Some(child) == footer {
            0
        } else {
            sections.len() - 1
        };
        let owner = &mut sections[index];
        owner.nodes.push(child);
        links.record_subtree(dom, child, &owner.filename);
    }

    log::info!(
        "split container into {} sections, {} identifiers",
        sections.len(),
        links.len()
    );
    Ok(Sectioned {
        sections,
        links,
        footer_on_title_page: footer.is_some(),
    })
}

/// Hands out unique `.xhtml` filenames derived from section titles.
#[derive(Debug)]
pub struct FilenameAllocator {
    used: HashSet<String>,
}

impl FilenameAllocator {
    pub fn new(title_filename: &str) -> Self {
        let mut used: HashSet<String> = RESERVED_FILENAMES.iter().map(|s| s.to_string()).collect();
        used.insert(title_filename.to_string());
        Self { used }
    }

    /// Filename for a section titled `title`; `ordinal` is the section's
    /// position, used when the title has no usable characters.
    pub fn allocate(&mut self, title: &str, ordinal: usize) -> String {
        let slug = slugify(title);
        let stem = if slug.is_empty() {
            format!("section-{ordinal}")
        } else {
            slug
        };

        let mut candidate = format!("{stem}.xhtml");
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{stem}-{n}.xhtml");
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Lower-case ASCII alphanumerics joined by single hyphens.
///
/// ```
/// use folio::section::slugify;
///
/// assert_eq!(slugify("Control structures"), "control-structures");
/// assert_eq!(slugify("Errors: Panic & Recover"), "errors-panic-recover");
/// ```
pub fn slugify(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
