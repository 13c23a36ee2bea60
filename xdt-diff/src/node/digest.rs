//! Content digests of element subtrees.
//!
//! Two elements with equal digests have the same name, the same attribute
//! set, the same text and digest-equal children in the same order. Attribute
//! declaration order does not contribute.

use md5::{Digest as _, Md5};
use rustc_hash::FxHashMap;

use super::{NodeId, NodeKind, Tree};

/// MD5 of an element subtree.
pub type Digest = [u8; 16];

/// Digest of every element in a tree.
pub type DigestMap = FxHashMap<NodeId, Digest>;

const TAG_ELEMENT: u8 = 1;
const TAG_ATTRIBUTE: u8 = 2;
const TAG_TEXT: u8 = 3;
const TAG_CHILD: u8 = 4;

/// Computes the digest of every element in `tree`, children before parents.
pub fn subtree_digests(tree: &Tree) -> DigestMap {
    let elements: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| tree.kind(id) == NodeKind::Element)
        .collect();

    let mut digests = DigestMap::default();
    digests.reserve(elements.len());
    for &element in elements.iter().rev() {
        let digest = element_digest(tree, element, &digests);
        digests.insert(element, digest);
    }
    digests
}

fn element_digest(tree: &Tree, element: NodeId, digests: &DigestMap) -> Digest {
    let mut hasher = Md5::new();
    hasher.update([TAG_ELEMENT]);
    feed(&mut hasher, tree.name(element));

    let mut attributes: Vec<(&str, &str)> = tree
        .attributes(element)
        .map(|attr| (tree.name(attr), tree.value(attr)))
        .collect();
    attributes.sort_unstable();
    for (name, value) in attributes {
        hasher.update([TAG_ATTRIBUTE]);
        feed(&mut hasher, name);
        feed(&mut hasher, value);
    }

    for child in tree.children(element) {
        match tree.kind(child) {
            NodeKind::Text => {
                hasher.update([TAG_TEXT]);
                feed(&mut hasher, tree.value(child));
            }
            NodeKind::Element => {
                hasher.update([TAG_CHILD]);
                if let Some(digest) = digests.get(&child) {
                    hasher.update(digest);
                }
            }
            NodeKind::Attribute => {}
        }
    }

    let mut out = [0u8; 16];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Length-prefixed so that adjacent strings cannot run together.
fn feed(hasher: &mut Md5, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_of_root(tree: &Tree) -> Digest {
        subtree_digests(tree)[&tree.root()]
    }

    #[test]
    fn test_attribute_order_ignored() {
        let mut a = Tree::new("add");
        let root = a.root();
        a.set_attribute(root, "key", "A");
        a.set_attribute(root, "value", "1");

        let mut b = Tree::new("add");
        let root = b.root();
        b.set_attribute(root, "value", "1");
        b.set_attribute(root, "key", "A");

        assert_eq!(digest_of_root(&a), digest_of_root(&b));
    }

    #[test]
    fn test_value_change_detected() {
        let mut a = Tree::new("add");
        let root = a.root();
        a.set_attribute(root, "value", "1");

        let mut b = Tree::new("add");
        let root = b.root();
        b.set_attribute(root, "value", "2");

        assert_ne!(digest_of_root(&a), digest_of_root(&b));
    }

    #[test]
    fn test_child_order_matters() {
        let mut a = Tree::new("root");
        let root = a.root();
        a.append_element(root, "x");
        a.append_element(root, "y");

        let mut b = Tree::new("root");
        let root = b.root();
        b.append_element(root, "y");
        b.append_element(root, "x");

        assert_ne!(digest_of_root(&a), digest_of_root(&b));
    }

    #[test]
    fn test_no_concatenation_collision() {
        let mut a = Tree::new("root");
        let root = a.root();
        a.append_text(root, "ab");
        a.append_element(root, "c");

        let mut b = Tree::new("root");
        let root = b.root();
        b.append_text(root, "a");
        b.append_element(root, "bc");

        assert_ne!(digest_of_root(&a), digest_of_root(&b));
    }

    #[test]
    fn test_every_element_has_digest() {
        let mut tree = Tree::new("root");
        let root = tree.root();
        let child = tree.append_element(root, "child");
        tree.append_element(child, "leaf");
        tree.set_attribute(child, "id", "1");

        let digests = subtree_digests(&tree);
        assert_eq!(digests.len(), 3);
    }
}
