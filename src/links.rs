//! Internal link resolution across sections.
//!
//! Splitting one page into several files breaks every `href="#id"` whose
//! target ends up in a different file. While sections are assembled, each
//! `id` is recorded against the file it lands in; afterwards every fragment
//! link is rewritten to `file.xhtml#id`.

use std::collections::HashMap;

use crate::dom::{Dom, Matcher, NodeId, find_all};
use crate::section::Section;

/// Identifier → `filename#identifier`.
#[derive(Debug, Clone, Default)]
pub struct LinkMap {
    targets: HashMap<String, String>,
}

impl LinkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` lives in `filename`. The first record for an id wins;
    /// returns `false` for a duplicate.
    pub fn record(&mut self, id: &str, filename: &str) -> bool {
        if self.targets.contains_key(id) {
            return false;
        }
        self.targets
            .insert(id.to_string(), format!("{filename}#{id}"));
        true
    }

    /// Record every `id` attribute in the subtree rooted at `node`.
    pub fn record_subtree(&mut self, dom: &Dom, node: NodeId, filename: &str) {
        let with_id = Matcher::any().with_attr("id");
        for id_node in find_all(dom, node, &with_id) {
            if let Some(id) = dom.element_id(id_node)
                && !self.record(id, filename)
            {
                log::debug!("duplicate id {id:?}; keeping first occurrence");
            }
        }
    }

    /// Resolved target for an identifier (without the leading `#`).
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.targets.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A fragment link whose identifier exists nowhere in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingLink {
    /// The original `href`, left unchanged.
    pub href: String,
    /// Filename of the section containing the anchor.
    pub section: String,
}

/// Outcome of [`rewrite_links`].
#[derive(Debug, Clone, Default)]
pub struct RewriteReport {
    pub rewritten: usize,
    pub dangling: Vec<DanglingLink>,
}

/// Point every `<a href="#id">` inside the sections at the file holding `id`.
///
/// Hrefs that don't start with `#` are left alone. Unknown identifiers are
/// logged, collected in the report, and left unchanged.
pub fn rewrite_links(dom: &mut Dom, sections: &[Section], links: &LinkMap) -> RewriteReport {
    let mut report = RewriteReport::default();
    let anchors = Matcher::tag("a").with_attr("href");

    for section in sections {
        for &node in &section.nodes {
            let found: Vec<NodeId> = find_all(dom, node, &anchors).collect();
            for anchor in found {
                let Some(href) = dom.get_attr(anchor, "href").map(str::to_string) else {
                    continue;
                };
                let Some(fragment) = href.strip_prefix('#') else {
                    continue;
                };

                match links.resolve(fragment) {
                    Some(target) if !fragment.is_empty() => {
                        let target = target.to_string();
                        dom.set_attr(anchor, "href", target);
                        report.rewritten += 1;
                    }
                    _ => {
                        log::warn!(
                            "dangling link {href:?} in {}; leaving it unchanged",
                            section.filename
                        );
                        report.dangling.push(DanglingLink {
                            href: href.clone(),
                            section: section.filename.clone(),
                        });
                    }
                }
            }
        }
    }

    log::info!(
        "rewrote {} internal links ({} dangling)",
        report.rewritten,
        report.dangling.len()
    );
    report
}
