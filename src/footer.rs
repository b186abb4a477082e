//! Footer rewriting for the title page.
//!
//! The source page ends with a license/attribution footer written for a web
//! page. On the title page of a book it gets double line spacing, "page"
//! becomes "book", and a `Source: <url>` header is placed above it.

use crate::dom::{Attribute, Dom, NodeId};

/// Rewrite the footer's children in place and return the same node.
///
/// For each direct child: a `<br>` gets a second `<br>` inserted before it,
/// and every "page" in a text node becomes "book". Then the footer is
/// prefixed with `Source: `, a link to `source_url`, and two `<br>`s.
pub fn reformat_footer(dom: &mut Dom, footer: NodeId, source_url: &str) -> NodeId {
    let children: Vec<NodeId> = dom.children(footer).collect();

    for child in children {
        if dom.is_element_named(child, "br") {
            let br = dom.create_html_element("br", vec![]);
            dom.insert_before(child, br);
        } else if let Some(text) = dom.text_mut(child)
            && text.contains("page")
        {
            *text = text.replace("page", "book");
        }
    }

    // Prepended in reverse so they read in order.
    for _ in 0..2 {
        let br = dom.create_html_element("br", vec![]);
        dom.prepend(footer, br);
    }

    let link = dom.create_html_element("a", vec![Attribute::new("href", source_url)]);
    let link_text = dom.create_text(source_url);
    dom.append(link, link_text);
    dom.prepend(footer, link);

    let label = dom.create_text("Source: ");
    dom.prepend(footer, label);

    log::debug!("reformatted footer node {}", footer.0);
    footer
}
