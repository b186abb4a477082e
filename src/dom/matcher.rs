//! Tag and attribute predicates for tree search.
//!
//! A [`Matcher`] combines an optional tag name with an optional attribute
//! test. Leaving either side unset matches anything.

use serde::Deserialize;

use super::arena::{Dom, NodeId};

/// Attribute half of a [`Matcher`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttrMatch {
    /// No attribute constraint.
    #[default]
    Any,
    /// Attribute must be present, any value.
    Present(String),
    /// Attribute must equal the value. For `class`, any one class token.
    Equals(String, String),
}

impl AttrMatch {
    fn matches(&self, dom: &Dom, id: NodeId) -> bool {
        match self {
            AttrMatch::Any => true,
            AttrMatch::Present(key) => dom.get_attr(id, key).is_some(),
            AttrMatch::Equals(key, value) if key == "class" => {
                dom.element_classes(id).any(|c| c == value)
            }
            AttrMatch::Equals(key, value) => dom.get_attr(id, key) == Some(value.as_str()),
        }
    }
}

/// Element predicate: optional tag plus an attribute test.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Matcher {
    tag: Option<String>,
    attr: AttrMatch,
}

impl Matcher {
    /// Match any element.
    pub fn any() -> Self {
        Self::default()
    }

    /// Match elements with the given tag name.
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            attr: AttrMatch::Any,
        }
    }

    /// Build a matcher from the three loose filters, treating empty strings
    /// as wildcards.
    pub fn from_parts(tag: &str, attr_key: &str, attr_val: &str) -> Self {
        let tag = (!tag.is_empty()).then(|| tag.to_string());
        let attr = match (attr_key.is_empty(), attr_val.is_empty()) {
            (true, _) => AttrMatch::Any,
            (false, true) => AttrMatch::Present(attr_key.to_string()),
            (false, false) => AttrMatch::Equals(attr_key.to_string(), attr_val.to_string()),
        };
        Self { tag, attr }
    }

    /// Require an attribute to be present.
    pub fn with_attr(mut self, key: impl Into<String>) -> Self {
        self.attr = AttrMatch::Present(key.into());
        self
    }

    /// Require an attribute to have a value.
    pub fn with_attr_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attr = AttrMatch::Equals(key.into(), value.into());
        self
    }

    /// Shorthand for `with_attr_value("id", id)`.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attr_value("id", id)
    }

    /// Shorthand for `with_attr_value("class", class)`.
    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.with_attr_value("class", class)
    }

    /// Test a node. Only elements can match.
    pub fn matches(&self, dom: &Dom, id: NodeId) -> bool {
        let Some(name) = dom.element_name(id) else {
            return false;
        };
        if let Some(tag) = &self.tag
            && name.as_ref() != tag
        {
            return false;
        }
        self.attr.matches(dom, id)
    }
}

/// Serializable form of a [`Matcher`], used in configuration files.
///
/// ```toml
/// [[container]]
/// tag = "div"
/// attr = "id"
/// value = "page"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct NodeSelector {
    pub tag: Option<String>,
    pub attr: Option<String>,
    pub value: Option<String>,
}

impl NodeSelector {
    pub fn new(tag: &str, attr: &str, value: &str) -> Self {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            tag: opt(tag),
            attr: opt(attr),
            value: opt(value),
        }
    }

    pub fn matcher(&self) -> Matcher {
        Matcher::from_parts(
            self.tag.as_deref().unwrap_or(""),
            self.attr.as_deref().unwrap_or(""),
            self.value.as_deref().unwrap_or(""),
        )
    }
}

impl std::fmt::Display for NodeSelector {
    /// CSS-like rendering for log and error messages: `div#page`, `div.container`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag.as_deref().unwrap_or("*"))?;
        match (self.attr.as_deref(), self.value.as_deref()) {
            (Some("id"), Some(v)) => write!(f, "#{v}"),
            (Some("class"), Some(v)) => write!(f, ".{v}"),
            (Some(k), Some(v)) => write!(f, "[{k}=\"{v}\"]"),
            (Some(k), None) => write!(f, "[{k}]"),
            (None, _) => Ok(()),
        }
    }
}
