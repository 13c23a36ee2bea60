//! Arena-backed document tree.

use indextree::{Arena, NodeId};

use super::{MatchState, Node, NodeKind};

/// A parsed document: one root element plus everything below it.
///
/// All nodes live in a single [`Arena`]; ids stay valid for the lifetime of
/// the tree unless the node is explicitly removed.
#[derive(Debug, Clone)]
pub struct Tree {
    arena: Arena<Node>,
    root: NodeId,
    /// Where the document came from (file path or a placeholder).
    source: String,
}

impl Tree {
    /// Creates a tree holding a single root element.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::with_source(root_name, "<memory>")
    }

    /// Creates a tree holding a single root element, tagged with its source.
    pub fn with_source(root_name: impl Into<String>, source: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(Node::element(root_name));
        Tree {
            arena,
            root,
            source: source.into(),
        }
    }

    /// Creates a standalone tree from a copy of `src_id` and its descendants.
    pub fn from_subtree(src: &Tree, src_id: NodeId) -> Self {
        let mut tree = Tree::with_source(src.name(src_id), src.source());
        let root = tree.root;
        tree.copy_children(root, src, src_id);
        tree
    }

    /// Returns the root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the originating document name.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the data of a node.
    pub fn node(&self, id: NodeId) -> &Node {
        self.arena[id].get()
    }

    /// Returns mutable data of a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.arena[id].get_mut()
    }

    /// Returns the kind of a node.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind()
    }

    /// Returns the qualified name of a node.
    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).name()
    }

    /// Returns the value of a node.
    pub fn value(&self, id: NodeId) -> &str {
        self.node(id).value()
    }

    /// Returns the match state of a node.
    pub fn state(&self, id: NodeId) -> MatchState {
        self.node(id).state()
    }

    /// Returns the matching partner of a node.
    pub fn partner(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).partner()
    }

    /// Returns the parent element of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// Iterates all children (attributes, texts and elements) in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Iterates child elements in document order.
    pub fn elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_of_kind(id, NodeKind::Element)
    }

    /// Iterates attributes in declaration order.
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_of_kind(id, NodeKind::Attribute)
    }

    /// Iterates text segments in document order.
    pub fn texts(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_of_kind(id, NodeKind::Text)
    }

    fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
            .filter(move |&child| self.arena[child].get().kind() == kind)
    }

    /// Iterates a node and all its descendants in pre-order.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
    }

    /// Returns the number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.descendants(self.root).count()
    }

    /// Finds an attribute of `element` by name.
    pub fn attribute(&self, element: NodeId, name: &str) -> Option<NodeId> {
        self.attributes(element).find(|&attr| self.name(attr) == name)
    }

    /// Returns the value of the named attribute of `element`.
    pub fn attribute_value(&self, element: NodeId, name: &str) -> Option<&str> {
        self.attribute(element, name).map(|attr| self.value(attr))
    }

    /// Concatenated text content directly under `element`.
    pub fn text_content(&self, element: NodeId) -> String {
        self.texts(element).map(|t| self.value(t)).collect()
    }

    /// Returns true if the element has child elements or text.
    pub fn has_content(&self, id: NodeId) -> bool {
        self.children(id).any(|child| !self.node(child).is_attribute())
    }

    /// Appends a new child element.
    pub fn append_element(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let id = self.arena.new_node(Node::element(name));
        parent.append(id, &mut self.arena);
        id
    }

    /// Appends a text segment.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        let id = self.arena.new_node(Node::text(text));
        parent.append(id, &mut self.arena);
        id
    }

    /// Sets an attribute, replacing the value if the name already exists.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        let name = name.into();
        if let Some(existing) = self.attribute(element, &name) {
            self.node_mut(existing).set_value(value);
            return existing;
        }
        let id = self.arena.new_node(Node::attribute(name, value));
        element.append(id, &mut self.arena);
        id
    }

    /// Appends a copy of `src_id` (with descendants) from another tree.
    ///
    /// The copies start out unmatched.
    pub fn copy_subtree(&mut self, parent: NodeId, src: &Tree, src_id: NodeId) -> NodeId {
        let copy = self.arena.new_node(src.node(src_id).fresh_copy());
        parent.append(copy, &mut self.arena);
        self.copy_children(copy, src, src_id);
        copy
    }

    /// Copies the attributes, texts and elements below `src_id` into `target`.
    pub fn copy_children(&mut self, target: NodeId, src: &Tree, src_id: NodeId) {
        let mut stack = vec![(src_id, target)];
        while let Some((from, to)) = stack.pop() {
            for child in src.children(from) {
                let copy = self.arena.new_node(src.node(child).fresh_copy());
                to.append(copy, &mut self.arena);
                stack.push((child, copy));
            }
        }
    }

    /// Removes every attribute, text and element below `id`.
    pub fn clear(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).collect();
        for child in children {
            child.remove_subtree(&mut self.arena);
        }
    }

    /// Removes a node and its descendants. Removing the root only clears it.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            self.clear(id);
        } else {
            id.remove_subtree(&mut self.arena);
        }
    }

    /// Detaches a node from its parent, keeping it in the arena.
    pub fn detach(&mut self, id: NodeId) {
        id.detach(&mut self.arena);
    }

    /// Appends a previously detached node under `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        parent.append(child, &mut self.arena);
    }

    /// Resolves an absolute element path such as `/configuration/appSettings`.
    ///
    /// Segments may carry a 1-based ordinal, e.g. `/a/b[2]`. The first
    /// matching element is taken at every level.
    pub fn select_path(&self, path: &str) -> Option<NodeId> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let (root_name, root_ordinal) = parse_segment(segments.next()?)?;
        if root_name != self.name(self.root) || root_ordinal != 1 {
            return None;
        }

        let mut current = self.root;
        for segment in segments {
            let (name, ordinal) = parse_segment(segment)?;
            current = self
                .elements(current)
                .filter(|&child| self.name(child) == name)
                .nth(ordinal - 1)?;
        }
        Some(current)
    }

    /// Absolute path of element names from the root, without predicates.
    pub fn plain_path(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = id
            .ancestors(&self.arena)
            .filter(|&a| self.node(a).is_element())
            .map(|a| self.name(a))
            .collect();
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Resets every node to unmatched with no partner.
    pub fn clear_matching(&mut self) {
        let ids: Vec<NodeId> = self.descendants(self.root).collect();
        for id in ids {
            let node = self.node_mut(id);
            node.set_state(MatchState::Unmatched);
            node.set_partner(None);
        }
    }
}

impl Node {
    /// Copy of the node's content without matching bookkeeping.
    fn fresh_copy(&self) -> Node {
        match self.kind() {
            NodeKind::Element => Node::element(self.name()),
            NodeKind::Attribute => Node::attribute(self.name(), self.value()),
            NodeKind::Text => Node::text(self.value()),
        }
    }
}

/// Splits `name[3]` into `("name", 3)`; a bare name has ordinal 1.
fn parse_segment(segment: &str) -> Option<(&str, usize)> {
    match segment.find('[') {
        Some(open) => {
            let ordinal = segment[open + 1..].strip_suffix(']')?.trim().parse().ok()?;
            if ordinal == 0 {
                return None;
            }
            Some((&segment[..open], ordinal))
        }
        None => Some((segment, 1)),
    }
}
