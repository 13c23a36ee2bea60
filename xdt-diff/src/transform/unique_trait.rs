//! Identifying traits used to address an element after the patch is applied.

use crate::node::{MatchState, NodeId, Tree};

/// How an element can be told apart from its same-named siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueTrait {
    /// 1-based ordinal among same-named siblings.
    pub index: usize,
    /// An attribute whose value no same-named sibling shares.
    pub attribute: Option<NodeId>,
    /// Whether `attribute` is also unique among the same-named children of
    /// the parent's partner in the other tree.
    pub unique_in_both: bool,
    /// Whether the element has same-named siblings in its own tree.
    pub has_siblings: bool,
}

/// Resolves the identifying trait of `element` (in `tree`).
///
/// Returns `None` when a plain name path is enough: the element has no
/// same-named siblings, and the parent's partner in `other` has no
/// same-named children besides the element's own partner.
pub fn unique_trait(tree: &Tree, other: &Tree, element: NodeId) -> Option<UniqueTrait> {
    let parent = tree.parent(element)?;
    let name = tree.name(element);

    let candidates: Vec<NodeId> = tree
        .elements(parent)
        .filter(|&sibling| tree.name(sibling) == name)
        .collect();
    let index = candidates.iter().position(|&c| c == element)? + 1;

    let own_partner = tree.partner(element);
    let paired: Vec<NodeId> = match tree.partner(parent) {
        Some(parent_partner) => other
            .elements(parent_partner)
            .filter(|&c| other.name(c) == name && Some(c) != own_partner)
            .collect(),
        None => Vec::new(),
    };

    let has_siblings = candidates.len() > 1;
    if !has_siblings && paired.is_empty() {
        return None;
    }

    let mut chosen = None;
    for attr in tree.attributes(element) {
        if !is_unique(tree, &candidates, element, attr) {
            continue;
        }
        if tree.state(attr) == MatchState::Match {
            chosen = Some(attr);
            break;
        }
        chosen = chosen.or(Some(attr));
    }

    let unique_in_both = chosen.is_some_and(|attr| {
        let (attr_name, value) = (tree.name(attr), tree.value(attr));
        paired
            .iter()
            .all(|&c| other.attribute_value(c, attr_name) != Some(value))
    });

    Some(UniqueTrait {
        index,
        attribute: chosen,
        unique_in_both,
        has_siblings,
    })
}

/// No other candidate carries the same attribute with the same value.
fn is_unique(tree: &Tree, candidates: &[NodeId], element: NodeId, attr: NodeId) -> bool {
    let (name, value) = (tree.name(attr), tree.value(attr));
    candidates
        .iter()
        .filter(|&&c| c != element)
        .all(|&c| tree.attribute_value(c, name) != Some(value))
}
