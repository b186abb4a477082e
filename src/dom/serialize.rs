//! Subtree serialization to XHTML-compatible markup.
//!
//! Output must survive an XML parser inside an EPUB reader, so void elements
//! self-close and every text run and attribute value is escaped.

use html5ever::{QualName, ns};

use super::arena::{Dom, NodeData, NodeId};
use crate::error::{Error, Result};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Serialize a node and its subtree.
pub fn serialize(dom: &Dom, id: NodeId) -> Result<String> {
    let mut out = String::new();
    serialize_into(dom, id, &mut out)?;
    Ok(out)
}

/// Serialize a node and its subtree, appending to `out`.
///
/// The walk keeps its own stack, so nesting depth is bounded by memory
/// rather than by the thread's stack. Fails on a node id outside the arena,
/// on a child whose parent link does not point back at the node being
/// serialized, or on a walk visiting more nodes than the arena holds (a
/// cycle).
pub fn serialize_into(dom: &Dom, id: NodeId, out: &mut String) -> Result<()> {
    let mut serializer = Serializer {
        dom,
        out,
        stack: vec![Frame::Open(id)],
        limit: dom.len(),
        visited: 0,
    };
    serializer.run()
}

enum Frame {
    Open(NodeId),
    Close(String),
}

struct Serializer<'a> {
    dom: &'a Dom,
    out: &'a mut String,
    stack: Vec<Frame>,
    limit: usize,
    visited: usize,
}

impl Serializer<'_> {
    fn run(&mut self) -> Result<()> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Open(id) => self.open(id)?,
                Frame::Close(tag) => {
                    self.out.push_str("</");
                    self.out.push_str(&tag);
                    self.out.push('>');
                }
            }
        }
        Ok(())
    }

    fn open(&mut self, id: NodeId) -> Result<()> {
        self.visited += 1;
        if self.visited > self.limit {
            return Err(Error::Serialization(format!(
                "tree below node {} is cyclic",
                id.0
            )));
        }
        let node = self
            .dom
            .get(id)
            .ok_or_else(|| Error::Serialization(format!("dangling node reference {}", id.0)))?;

        match &node.data {
            NodeData::Document => self.push_children(id),
            NodeData::Doctype { .. } => Ok(()),
            NodeData::Text(text) => {
                escape_text_into(text, self.out);
                Ok(())
            }
            NodeData::Comment(text) => {
                self.out.push_str("<!--");
                self.out.push_str(&text.replace("--", "- -"));
                self.out.push_str("-->");
                Ok(())
            }
            NodeData::Element { name, attrs } => {
                let tag = qualified(name);
                self.out.push('<');
                self.out.push_str(&tag);

                if needs_xmlns(name, self.dom, node.parent) {
                    self.out.push_str(" xmlns=\"");
                    self.out.push_str(&name.ns);
                    self.out.push('"');
                }

                for attr in attrs {
                    self.out.push(' ');
                    self.out.push_str(&qualified(&attr.name));
                    self.out.push_str("=\"");
                    escape_attr_into(&attr.value, self.out);
                    self.out.push('"');
                }

                let is_html = name.ns == ns!(html);
                if is_html && VOID_ELEMENTS.contains(&name.local.as_ref()) {
                    self.out.push_str("/>");
                    return Ok(());
                }
                if !is_html && node.first_child.is_none() {
                    self.out.push_str("/>");
                    return Ok(());
                }

                self.out.push('>');
                self.stack.push(Frame::Close(tag));
                self.push_children(id)
            }
        }
    }

    /// Queue `id`'s children so the first one is popped next.
    fn push_children(&mut self, id: NodeId) -> Result<()> {
        let mark = self.stack.len();
        for child in self.dom.children(id) {
            if self.stack.len() - mark > self.limit {
                return Err(Error::Serialization(format!(
                    "sibling list under node {} is cyclic",
                    id.0
                )));
            }
            let parent = self.dom.get(child).map(|n| n.parent);
            if parent != Some(id) {
                return Err(Error::Serialization(format!(
                    "node {} is linked under {} but claims a different parent",
                    child.0, id.0
                )));
            }
            self.stack.push(Frame::Open(child));
        }
        self.stack[mark..].reverse();
        Ok(())
    }
}

fn qualified(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    }
}

/// Foreign content roots (`<svg>`, `<math>`) need their namespace declared
/// once they sit inside an XHTML document.
fn needs_xmlns(name: &QualName, dom: &Dom, parent: NodeId) -> bool {
    if name.ns == ns!(html) || name.ns == ns!() {
        return false;
    }
    match dom.get(parent).map(|p| &p.data) {
        Some(NodeData::Element { name: parent_name, .. }) => parent_name.ns != name.ns,
        _ => true,
    }
}

/// Escape character data.
pub fn escape_text_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Escape a double-quoted attribute value.
pub fn escape_attr_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
