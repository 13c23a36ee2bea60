//! Choice of a single transform per element from its change counts.

use tracing::trace;

use super::{Counts, ElementSides, Transform};
use crate::node::Tree;

/// Decides which operation turns the old side of `sides` into the new side.
///
/// The trees must have been matched.
pub fn classify(old: &Tree, new: &Tree, sides: ElementSides) -> Transform {
    let (o, n) = match sides {
        ElementSides::Old(_) => return Transform::Remove,
        ElementSides::New(_) => return Transform::Insert,
        ElementSides::Both { old, new } => (old, new),
    };

    // Text is never patched piecemeal.
    let texts = Counts::tally(old, new, old.texts(o), new.texts(n));
    if texts.has_changes() {
        trace!(element = new.name(n), "text changed, replacing");
        return Transform::Replace;
    }

    let attributes = Counts::tally(old, new, old.attributes(o), new.attributes(n));
    let elements = Counts::tally(old, new, old.elements(o), new.elements(n));

    // Every old child was dropped. Appending to an element that had no
    // children is left to the child inserts.
    if elements.deletes > 0
        && elements.unchanged + elements.updates == 0
        && attributes.unchanged < elements.total_changes()
    {
        return Transform::Replace;
    }

    if attributes.has_changes() {
        if attributes.unchanged == 0 && elements.total() == 0 && texts.total() == 0 {
            return Transform::Replace;
        }
        if attributes.is_deletes_only() {
            return Transform::RemoveAttributes;
        }
        if attributes.deletes > 0 {
            return Transform::RemoveAndSetAttributes;
        }
        return Transform::SetAttributes;
    }

    Transform::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{Matching, StructuralMatching};
    use crate::node::NodeId;

    /// Matches `old` against `new` and classifies the first child of the roots.
    fn classify_child(mut old: Tree, mut new: Tree) -> Transform {
        StructuralMatching::new().build_matching(&mut old, &mut new);
        let o: NodeId = old.elements(old.root()).next().unwrap();
        let n = old.partner(o).unwrap();
        classify(&old, &new, ElementSides::Both { old: o, new: n })
    }

    fn single(attrs: &[(&str, &str)], children: &[&str], text: Option<&str>) -> Tree {
        let mut tree = Tree::new("root");
        let root = tree.root();
        let item = tree.append_element(root, "item");
        for (name, value) in attrs {
            tree.set_attribute(item, *name, *value);
        }
        for child in children {
            tree.append_element(item, *child);
        }
        if let Some(text) = text {
            tree.append_text(item, text);
        }
        tree
    }

    #[test]
    fn test_one_sided() {
        let tree = Tree::new("root");
        let root = tree.root();
        assert_eq!(classify(&tree, &tree, ElementSides::Old(root)), Transform::Remove);
        assert_eq!(classify(&tree, &tree, ElementSides::New(root)), Transform::Insert);
    }

    #[test]
    fn test_unchanged_is_none() {
        let old = single(&[("id", "1")], &["a"], None);
        let new = single(&[("id", "1")], &["a"], None);
        assert_eq!(classify_child(old, new), Transform::None);
    }

    #[test]
    fn test_text_change_replaces() {
        let old = single(&[("id", "1")], &[], Some("old"));
        let new = single(&[("id", "1")], &[], Some("new"));
        assert_eq!(classify_child(old, new), Transform::Replace);
    }

    #[test]
    fn test_set_attributes() {
        let old = single(&[("key", "A"), ("value", "1")], &[], None);
        let new = single(&[("key", "A"), ("value", "2")], &[], None);
        assert_eq!(classify_child(old, new), Transform::SetAttributes);
    }

    #[test]
    fn test_remove_attributes() {
        let old = single(&[("key", "A"), ("extra", "x")], &[], None);
        let new = single(&[("key", "A")], &[], None);
        assert_eq!(classify_child(old, new), Transform::RemoveAttributes);
    }

    #[test]
    fn test_remove_and_set_attributes() {
        let old = single(&[("key", "A"), ("extra", "x"), ("value", "1")], &[], None);
        let new = single(&[("key", "A"), ("value", "2")], &[], None);
        assert_eq!(classify_child(old, new), Transform::RemoveAndSetAttributes);
    }

    #[test]
    fn test_all_attributes_changed_leaf_replaces() {
        let old = single(&[("value", "1")], &[], None);
        let new = single(&[("value", "2")], &[], None);
        assert_eq!(classify_child(old, new), Transform::Replace);
    }

    #[test]
    fn test_children_swapped_replaces() {
        let old = single(&[], &["a"], None);
        let new = single(&[], &["b"], None);
        assert_eq!(classify_child(old, new), Transform::Replace);
    }

    #[test]
    fn test_children_added_to_empty_element() {
        let old = single(&[], &[], None);
        let new = single(&[], &["a", "b"], None);
        assert_eq!(classify_child(old, new), Transform::None);
    }

    #[test]
    fn test_children_added_with_attribute_change() {
        let old = single(&[("id", "1"), ("mode", "x")], &[], None);
        let new = single(&[("id", "1"), ("mode", "y")], &["a"], None);
        assert_eq!(classify_child(old, new), Transform::SetAttributes);
    }

    #[test]
    fn test_children_swapped_with_stable_attributes() {
        let old = single(&[("id", "1"), ("mode", "x")], &["a"], None);
        let new = single(&[("id", "1"), ("mode", "x")], &["b"], None);
        assert_eq!(classify_child(old, new), Transform::None);
    }
}
