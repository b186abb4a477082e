//! Document tree: parsing, search, and serialization.
//!
//! # Example
//!
//! ```
//! use folio::dom::{Matcher, find_first, parse_html, serialize};
//!
//! let dom = parse_html(b"<div id='page'><p class='lead'>Hello</p></div>").unwrap();
//! let p = find_first(&dom, dom.document(), &Matcher::tag("p").with_class("lead")).unwrap();
//! assert_eq!(serialize(&dom, p).unwrap(), r#"<p class="lead">Hello</p>"#);
//! ```

mod arena;
mod matcher;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, Children, Descendants, Dom, Node, NodeData, NodeId};
pub use matcher::{AttrMatch, Matcher, NodeSelector};
pub use serialize::{escape_attr_into, escape_text_into, serialize, serialize_into};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use crate::error::{Error, Result};
use tree_sink::DomSink;

/// Parse raw document bytes into a [`Dom`].
///
/// The bytes are decoded first (see [`crate::util::decode_text`]). html5ever
/// recovers from almost anything, so the only rejected inputs are those with
/// no markup at all.
pub fn parse_html(bytes: &[u8]) -> Result<Dom> {
    let hint = crate::util::extract_meta_charset(bytes);
    let text = crate::util::decode_text(bytes, hint.as_deref());
    parse_html_str(&text)
}

/// Parse an already-decoded document.
pub fn parse_html_str(html: &str) -> Result<Dom> {
    if html.trim().is_empty() {
        return Err(Error::Parse("document is empty".to_string()));
    }
    if !html.contains('<') {
        return Err(Error::Parse("document contains no markup".to_string()));
    }

    let sink = parse_document(DomSink::new(), ParseOpts::default()).one(html);
    if sink.error_count() > 0 {
        log::debug!("recovered from {} html parse errors", sink.error_count());
    }
    let dom = sink.into_dom();

    if find_first(&dom, dom.document(), &Matcher::tag("html")).is_none() {
        return Err(Error::Parse("document has no root element".to_string()));
    }
    Ok(dom)
}

/// First node under `root` (root included) matching `matcher`, depth-first.
pub fn find_first(dom: &Dom, root: NodeId, matcher: &Matcher) -> Option<NodeId> {
    dom.descendants(root).find(|&id| matcher.matches(dom, id))
}

/// All nodes under `root` (root included) matching `matcher`, in document
/// order. The iterator is lazy; call again to restart.
pub fn find_all<'a>(
    dom: &'a Dom,
    root: NodeId,
    matcher: &'a Matcher,
) -> impl Iterator<Item = NodeId> + Clone + 'a {
    dom.descendants(root).filter(move |&id| matcher.matches(dom, id))
}

/// Detach the first match under `root` from its parent.
///
/// Returns the removed node, or `None` when nothing matched. The root itself
/// is never removed.
pub fn remove(dom: &mut Dom, root: NodeId, matcher: &Matcher) -> Option<NodeId> {
    let target = dom
        .descendants(root)
        .skip(1)
        .find(|&id| matcher.matches(dom, id))?;
    dom.detach(target);
    Some(target)
}
