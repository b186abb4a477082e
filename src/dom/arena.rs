//! Arena-based DOM for the fetched document.
//!
//! Nodes live in one vector and link to each other by index, so passes can
//! hand node ids around freely without borrowing the tree.

use html5ever::{LocalName, QualName, ns};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with name and attributes.
    Element { name: QualName, attrs: Vec<Attribute> },
    /// Text content.
    Text(String),
    Comment(String),
    /// Document type declaration.
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// Attribute in the null namespace, as HTML attributes are.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }
}

/// A node in the arena DOM.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-based DOM tree.
///
/// Detached nodes stay allocated; they are simply unreachable from the
/// document root.
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Dom {
    /// Create a new empty DOM with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        dom.document = dom.alloc(Node::new(NodeData::Document));
        dom
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a new element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(Node::new(NodeData::Element { name, attrs }))
    }

    /// Create an element in the HTML namespace.
    pub fn create_html_element(&mut self, tag: &str, attrs: Vec<Attribute>) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(tag));
        self.create_element(name, attrs)
    }

    /// Create a new text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text.into())))
    }

    /// Create a new comment node.
    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    /// Create a doctype node.
    pub fn create_doctype(&mut self, name: String, public_id: String, system_id: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    /// Append a child to a parent node, detaching it from any previous parent.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);

        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if last_child.is_some()
            && let Some(last_node) = self.get_mut(last_child)
        {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        self.detach(new_node);

        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Insert a node as the first child of `parent`.
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
        match self.get(parent).map(|n| n.first_child) {
            Some(first) if first.is_some() => self.insert_before(first, child),
            _ => self.append(parent, child),
        }
    }

    /// Append text to an existing text node, or create new if last child isn't text.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text);
        self.append(parent, text_node);
    }

    /// Unlink a node from its parent and siblings. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = match self.get(id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Get the number of allocated nodes, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the DOM is empty (only has document root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let first = self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children {
            dom: self,
            current: first,
        }
    }

    /// Iterate over `root` and all of its descendants in document order.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let next = if self.get(root).is_some() {
            root
        } else {
            NodeId::NONE
        };
        Descendants {
            dom: self,
            root,
            next,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(NodeId::is_some)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.first_child).filter(NodeId::is_some)
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct Children<'a> {
    dom: &'a Dom,
    current: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self.dom.get(id).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order walk of a subtree, root included.
///
/// Cloning the iterator restarts nothing; it forks the walk from the current
/// position. Call [`Dom::descendants`] again to start over.
#[derive(Clone)]
pub struct Descendants<'a> {
    dom: &'a Dom,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        let node = self.dom.get(current)?;

        if node.first_child.is_some() {
            self.next = node.first_child;
            return Some(current);
        }

        // Climb until a next sibling exists, without leaving the subtree.
        let mut cursor = current;
        self.next = NodeId::NONE;
        while cursor != self.root {
            let Some(n) = self.dom.get(cursor) else {
                break;
            };
            if n.next_sibling.is_some() {
                self.next = n.next_sibling;
                break;
            }
            cursor = n.parent;
        }
        Some(current)
    }
}

/// Convenience methods for element and text nodes.
impl Dom {
    /// Get element's local name (tag).
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Check if node is an element with the given tag name.
    pub fn is_element_named(&self, id: NodeId, tag: &str) -> bool {
        self.element_name(id).is_some_and(|n| n.as_ref() == tag)
    }

    /// Get element's attributes in source order.
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Get an attribute value.
    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.local.as_ref() == attr_name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing value with the same key.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: impl Into<String>) {
        if let Some(node) = self.get_mut(id)
            && let NodeData::Element { attrs, .. } = &mut node.data
        {
            let value = value.into();
            match attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name) {
                Some(existing) => existing.value = value,
                None => attrs.push(Attribute::new(attr_name, value)),
            }
        }
    }

    /// Get element's id attribute.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.get_attr(id, "id")
    }

    /// Iterate over the element's class tokens.
    pub fn element_classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.get_attr(id, "class")
            .unwrap_or("")
            .split_whitespace()
    }

    /// Get text content of a text node.
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Mutable access to a text node's content.
    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        self.get_mut(id).and_then(|n| match &mut n.data {
            NodeData::Text(s) => Some(s),
            _ => None,
        })
    }

    /// Concatenated text of a subtree with runs of whitespace collapsed.
    pub fn collect_text(&self, id: NodeId) -> String {
        let mut words: Vec<&str> = Vec::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text_content(node) {
                words.extend(text.split_whitespace());
            }
        }
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_elements() {
        let mut dom = Dom::new();

        let div = dom.create_html_element("div", vec![Attribute::new("id", "main")]);
        dom.append(dom.document(), div);

        assert_eq!(dom.element_name(div).unwrap().as_ref(), "div");
        assert_eq!(dom.element_id(div), Some("main"));
        assert_eq!(dom.parent(div), Some(dom.document()));
    }

    #[test]
    fn test_append_children() {
        let mut dom = Dom::new();

        let parent = dom.create_html_element("div", vec![]);
        let child1 = dom.create_html_element("p", vec![]);
        let child2 = dom.create_html_element("p", vec![]);

        dom.append(dom.document(), parent);
        dom.append(parent, child1);
        dom.append(parent, child2);

        let children: Vec<_> = dom.children(parent).collect();
        assert_eq!(children, vec![child1, child2]);
    }

    #[test]
    fn test_text_merging() {
        let mut dom = Dom::new();

        let p = dom.create_html_element("p", vec![]);
        dom.append(dom.document(), p);

        dom.append_text(p, "Hello, ");
        dom.append_text(p, "World!");

        let children: Vec<_> = dom.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(dom.text_content(children[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_prepend_and_insert_before() {
        let mut dom = Dom::new();
        let div = dom.create_html_element("div", vec![]);
        let b = dom.create_text("b");
        let a = dom.create_text("a");
        let c = dom.create_text("c");

        dom.prepend(div, b);
        dom.prepend(div, a);
        dom.append(div, c);

        let texts: Vec<_> = dom
            .children(div)
            .filter_map(|id| dom.text_content(id))
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert_eq!(dom.get(div).unwrap().last_child, c);
    }

    #[test]
    fn test_detach_middle_child() {
        let mut dom = Dom::new();
        let div = dom.create_html_element("div", vec![]);
        let ids: Vec<_> = (0..3).map(|i| dom.create_text(i.to_string())).collect();
        for &id in &ids {
            dom.append(div, id);
        }

        dom.detach(ids[1]);

        assert_eq!(dom.children(div).collect::<Vec<_>>(), vec![ids[0], ids[2]]);
        assert_eq!(dom.parent(ids[1]), None);
    }

    #[test]
    fn test_append_moves_node() {
        let mut dom = Dom::new();
        let first = dom.create_html_element("div", vec![]);
        let second = dom.create_html_element("div", vec![]);
        let p = dom.create_html_element("p", vec![]);

        dom.append(first, p);
        dom.append(second, p);

        assert_eq!(dom.children(first).count(), 0);
        assert_eq!(dom.children(second).collect::<Vec<_>>(), vec![p]);
    }

    #[test]
    fn test_descendants_preorder_stays_in_subtree() {
        let mut dom = Dom::new();
        let root = dom.document();
        let a = dom.create_html_element("a", vec![]);
        let b = dom.create_html_element("b", vec![]);
        let c = dom.create_html_element("c", vec![]);
        let d = dom.create_html_element("d", vec![]);
        dom.append(root, a);
        dom.append(a, b);
        dom.append(b, c);
        dom.append(root, d);

        let all: Vec<_> = dom.descendants(root).collect();
        assert_eq!(all, vec![root, a, b, c, d]);

        let sub: Vec<_> = dom.descendants(a).collect();
        assert_eq!(sub, vec![a, b, c]);
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut dom = Dom::new();
        let a = dom.create_html_element("a", vec![Attribute::new("href", "#x")]);
        dom.set_attr(a, "href", "ch.xhtml#x");
        dom.set_attr(a, "title", "t");

        assert_eq!(dom.get_attr(a, "href"), Some("ch.xhtml#x"));
        assert_eq!(dom.attrs(a).len(), 2);
    }

    #[test]
    fn test_collect_text_normalizes_whitespace() {
        let mut dom = Dom::new();
        let h = dom.create_html_element("h2", vec![]);
        let em = dom.create_html_element("em", vec![]);
        dom.append_text(h, "  Control\n ");
        dom.append(h, em);
        dom.append_text(em, "structures ");

        assert_eq!(dom.collect_text(h), "Control structures");
    }
}
