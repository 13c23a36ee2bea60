//! Node structures for XML tree representation.
//!
//! A document is held in a [`Tree`], an arena of [`Node`]s addressed by
//! [`NodeId`]. Elements own their attributes, text segments and child
//! elements as arena children; the kind of each child is told apart by
//! [`NodeKind`]. Parent links come from the arena; the cross-tree
//! "matching partner" is an `Option<NodeId>` into the *other* tree's arena.

mod digest;
mod tree;

pub use digest::{subtree_digests, Digest, DigestMap};
pub use indextree::NodeId;
pub use tree::Tree;

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An element with a qualified name.
    Element,
    /// An attribute of its parent element.
    Attribute,
    /// A text segment of its parent element.
    Text,
}

/// How a node relates to the other tree after matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchState {
    /// Not yet visited by the matcher.
    #[default]
    Unmatched,
    /// Node and its whole subtree are identical in both trees.
    Match,
    /// Node exists in both trees but something in it differs.
    Change,
    /// Node exists in only one of the trees.
    NoMatch,
}

/// The data of one node in a [`Tree`].
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    /// Qualified name; empty for text.
    name: String,
    /// Attribute value or text content; empty for elements.
    value: String,
    state: MatchState,
    /// Corresponding node in the other tree.
    partner: Option<NodeId>,
}

impl Node {
    /// Creates an element node.
    pub fn element(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Element, name.into(), String::new())
    }

    /// Creates an attribute node.
    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(NodeKind::Attribute, name.into(), value.into())
    }

    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Text, String::new(), value.into())
    }

    fn new(kind: NodeKind, name: String, value: String) -> Self {
        Node {
            kind,
            name,
            value,
            state: MatchState::Unmatched,
            partner: None,
        }
    }

    /// Returns the node kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the qualified name (empty for text).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value (empty for elements).
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Returns the match state.
    pub fn state(&self) -> MatchState {
        self.state
    }

    /// Sets the match state.
    pub fn set_state(&mut self, state: MatchState) {
        self.state = state;
    }

    /// Returns the matching partner in the other tree.
    pub fn partner(&self) -> Option<NodeId> {
        self.partner
    }

    /// Sets the matching partner.
    pub fn set_partner(&mut self, partner: Option<NodeId>) {
        self.partner = partner;
    }

    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Returns true if this is an attribute node.
    pub fn is_attribute(&self) -> bool {
        self.kind == NodeKind::Attribute
    }

    /// Returns true if this is a text node.
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_constructors() {
        let element = Node::element("add");
        assert!(element.is_element());
        assert_eq!(element.name(), "add");
        assert_eq!(element.value(), "");

        let attr = Node::attribute("key", "A");
        assert!(attr.is_attribute());
        assert_eq!(attr.value(), "A");

        let text = Node::text("hello");
        assert!(text.is_text());
        assert_eq!(text.name(), "");
    }

    #[test]
    fn test_new_node_is_unmatched() {
        let node = Node::element("root");
        assert_eq!(node.state(), MatchState::Unmatched);
        assert!(node.partner().is_none());
    }
}
