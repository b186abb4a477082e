//! Section serialization.

use crate::dom::{Dom, serialize_into};
use crate::error::Result;
use crate::section::Section;

/// Markup for one section, ready for packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub title: String,
    pub filename: String,
    /// Concatenated markup of the section's nodes, in acquisition order.
    pub content: String,
}

/// Serialize every section's nodes into one content string per section.
///
/// Any node failing to serialize aborts the whole render; a half-written
/// book is worse than none.
pub fn render_sections(dom: &Dom, sections: &[Section]) -> Result<Vec<RenderedSection>> {
    sections
        .iter()
        .map(|section| {
            let mut content = String::new();
            for &node in &section.nodes {
                serialize_into(dom, node, &mut content)?;
            }
            log::debug!("rendered {} ({} bytes)", section.filename, content.len());
            Ok(RenderedSection {
                title: section.title.clone(),
                filename: section.filename.clone(),
                content,
            })
        })
        .collect()
}
