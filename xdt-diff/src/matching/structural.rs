//! Top-down structural matching of two trees.
//!
//! Roots are paired by name. Below each paired element, attributes are
//! matched by name, text segments by position, and child elements through
//! the sibling pairing rules in [`pairing`](super::pairing). Everything left
//! unpaired becomes `NoMatch` together with its descendants. Finally the
//! states of paired elements are settled bottom-up.

use tracing::{debug, warn};

use super::pairing::{pair_elements, PairRule};
use super::{Comparison, Matching};
use crate::node::{subtree_digests, MatchState, NodeId, Tree};

/// Counters collected while matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Element pairs with identical subtrees.
    pub identical: usize,
    /// Element pairs found through an identifying attribute.
    pub keyed: usize,
    /// Element pairs found by sibling ordinal.
    pub ordinal: usize,
    /// Element pairs that took the first free candidate.
    pub first_available: usize,
    /// Old-side elements left without partner (deletions).
    pub deleted: usize,
    /// New-side elements left without partner (insertions).
    pub inserted: usize,
}

impl MatchStats {
    fn record(&mut self, rule: PairRule) {
        match rule {
            PairRule::Identical => self.identical += 1,
            PairRule::Key => self.keyed += 1,
            PairRule::Ordinal => self.ordinal += 1,
            PairRule::FirstAvailable => self.first_available += 1,
        }
    }

    /// Total number of paired child elements.
    pub fn paired(&self) -> usize {
        self.identical + self.keyed + self.ordinal + self.first_available
    }
}

/// The default matcher: pairs elements top-down, never across parents.
#[derive(Debug, Default)]
pub struct StructuralMatching {
    stats: MatchStats,
}

impl StructuralMatching {
    /// Creates a new matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters of the last [`build_matching`](Matching::build_matching) call.
    pub fn stats(&self) -> MatchStats {
        self.stats
    }
}

impl Matching for StructuralMatching {
    fn build_matching(&mut self, old: &mut Tree, new: &mut Tree) -> Comparison {
        self.stats = MatchStats::default();
        old.clear_matching();
        new.clear_matching();

        let (old_root, new_root) = (old.root(), new.root());
        if old.name(old_root) != new.name(new_root) {
            let comparison = Comparison::RootMismatch {
                old: old.name(old_root).to_string(),
                new: new.name(new_root).to_string(),
            };
            warn!(old = old.source(), new = new.source(), ?comparison, "root elements differ");
            mark_unpaired(old, old_root);
            mark_unpaired(new, new_root);
            return comparison;
        }

        let old_digests = subtree_digests(old);
        let new_digests = subtree_digests(new);

        link(old, new, old_root, new_root);
        let mut stack = vec![(old_root, new_root)];
        let mut visited = Vec::new();

        while let Some((o, n)) = stack.pop() {
            visited.push((o, n));
            match_attributes(old, new, o, n);
            match_texts(old, new, o, n);

            let pairings = pair_elements(old, new, o, n, &old_digests, &new_digests);
            for pairing in &pairings {
                link(old, new, pairing.old, pairing.new);
                self.stats.record(pairing.rule);
            }

            let old_orphans: Vec<NodeId> =
                old.elements(o).filter(|&c| old.partner(c).is_none()).collect();
            let new_orphans: Vec<NodeId> =
                new.elements(n).filter(|&c| new.partner(c).is_none()).collect();
            self.stats.deleted += old_orphans.len();
            self.stats.inserted += new_orphans.len();
            for orphan in old_orphans {
                mark_unpaired(old, orphan);
            }
            for orphan in new_orphans {
                mark_unpaired(new, orphan);
            }

            // Reverse so pairs pop in document order.
            stack.extend(pairings.iter().rev().map(|p| (p.old, p.new)));
        }

        // Pre-order reversed: children settle before their parents.
        for &(o, n) in visited.iter().rev() {
            settle(old, new, o, n);
        }

        debug!(
            old = old.source(),
            new = new.source(),
            stats = ?self.stats,
            "matching complete"
        );

        if old.state(old_root) == MatchState::Match {
            Comparison::Identical
        } else {
            Comparison::Changed
        }
    }
}

/// Sets mutual partner links.
fn link(old: &mut Tree, new: &mut Tree, o: NodeId, n: NodeId) {
    old.node_mut(o).set_partner(Some(n));
    new.node_mut(n).set_partner(Some(o));
}

/// Links two nodes and gives both the same state.
fn link_with_state(old: &mut Tree, new: &mut Tree, o: NodeId, n: NodeId, state: MatchState) {
    link(old, new, o, n);
    old.node_mut(o).set_state(state);
    new.node_mut(n).set_state(state);
}

/// Marks a node and all its descendants as present on one side only.
fn mark_unpaired(tree: &mut Tree, id: NodeId) {
    let ids: Vec<NodeId> = tree.descendants(id).collect();
    for id in ids {
        let node = tree.node_mut(id);
        node.set_state(MatchState::NoMatch);
        node.set_partner(None);
    }
}

fn match_attributes(old: &mut Tree, new: &mut Tree, o: NodeId, n: NodeId) {
    let old_attrs: Vec<NodeId> = old.attributes(o).collect();
    for attr in old_attrs {
        match new.attribute(n, old.name(attr)) {
            Some(other) => {
                let state = if old.value(attr) == new.value(other) {
                    MatchState::Match
                } else {
                    MatchState::Change
                };
                link_with_state(old, new, attr, other, state);
            }
            None => old.node_mut(attr).set_state(MatchState::NoMatch),
        }
    }

    let new_attrs: Vec<NodeId> = new
        .attributes(n)
        .filter(|&attr| new.partner(attr).is_none())
        .collect();
    for attr in new_attrs {
        new.node_mut(attr).set_state(MatchState::NoMatch);
    }
}

fn match_texts(old: &mut Tree, new: &mut Tree, o: NodeId, n: NodeId) {
    let old_texts: Vec<NodeId> = old.texts(o).collect();
    let new_texts: Vec<NodeId> = new.texts(n).collect();

    for (&a, &b) in old_texts.iter().zip(&new_texts) {
        let state = if old.value(a) == new.value(b) {
            MatchState::Match
        } else {
            MatchState::Change
        };
        link_with_state(old, new, a, b, state);
    }
    for &surplus in old_texts.iter().skip(new_texts.len()) {
        old.node_mut(surplus).set_state(MatchState::NoMatch);
    }
    for &surplus in new_texts.iter().skip(old_texts.len()) {
        new.node_mut(surplus).set_state(MatchState::NoMatch);
    }
}

/// A pair is `Match` iff every child on both sides is `Match`.
fn settle(old: &mut Tree, new: &mut Tree, o: NodeId, n: NodeId) {
    let all_match = old.children(o).all(|c| old.state(c) == MatchState::Match)
        && new.children(n).all(|c| new.state(c) == MatchState::Match);
    let state = if all_match {
        MatchState::Match
    } else {
        MatchState::Change
    };
    old.node_mut(o).set_state(state);
    new.node_mut(n).set_state(state);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_settings(entries: &[(&str, &str)]) -> Tree {
        let mut tree = Tree::new("configuration");
        let root = tree.root();
        let settings = tree.append_element(root, "appSettings");
        for (key, value) in entries {
            let add = tree.append_element(settings, "add");
            tree.set_attribute(add, "key", *key);
            tree.set_attribute(add, "value", *value);
        }
        tree
    }

    fn assert_partners_mutual(a: &Tree, b: &Tree) {
        for id in a.descendants(a.root()) {
            if let Some(partner) = a.partner(id) {
                assert_eq!(b.partner(partner), Some(id));
            }
        }
    }

    #[test]
    fn test_identical_trees() {
        let mut old = app_settings(&[("A", "1"), ("B", "2")]);
        let mut new = app_settings(&[("A", "1"), ("B", "2")]);
        let mut matcher = StructuralMatching::new();

        assert_eq!(matcher.build_matching(&mut old, &mut new), Comparison::Identical);
        assert!(old
            .descendants(old.root())
            .all(|id| old.state(id) == MatchState::Match));
        assert_partners_mutual(&old, &new);
        assert_partners_mutual(&new, &old);
    }

    #[test]
    fn test_root_mismatch() {
        let mut old = Tree::new("A");
        let mut new = Tree::new("B");
        let mut matcher = StructuralMatching::new();

        let result = matcher.build_matching(&mut old, &mut new);
        assert_eq!(
            result,
            Comparison::RootMismatch {
                old: "A".to_string(),
                new: "B".to_string()
            }
        );
        assert_eq!(old.state(old.root()), MatchState::NoMatch);
        assert_eq!(new.state(new.root()), MatchState::NoMatch);
    }

    #[test]
    fn test_changed_value_and_insert() {
        let mut old = app_settings(&[("A", "1")]);
        let mut new = app_settings(&[("A", "2"), ("B", "3")]);
        let mut matcher = StructuralMatching::new();

        assert_eq!(matcher.build_matching(&mut old, &mut new), Comparison::Changed);

        let old_a = old.select_path("/configuration/appSettings/add").unwrap();
        let new_a = new.select_path("/configuration/appSettings/add[1]").unwrap();
        let new_b = new.select_path("/configuration/appSettings/add[2]").unwrap();

        assert_eq!(old.partner(old_a), Some(new_a));
        assert_eq!(old.state(old_a), MatchState::Change);
        assert_eq!(new.state(new_b), MatchState::NoMatch);
        assert!(new.partner(new_b).is_none());

        let key = old.attribute(old_a, "key").unwrap();
        let value = old.attribute(old_a, "value").unwrap();
        assert_eq!(old.state(key), MatchState::Match);
        assert_eq!(old.state(value), MatchState::Change);

        assert_eq!(old.state(old.root()), MatchState::Change);
        assert_eq!(matcher.stats().keyed, 1);
        assert_eq!(matcher.stats().inserted, 1);
        assert_partners_mutual(&old, &new);
    }

    #[test]
    fn test_unpaired_subtree_is_nomatch() {
        let mut old = Tree::new("root");
        let mut new = Tree::new("root");
        let root = new.root();
        let extra = new.append_element(root, "extra");
        new.set_attribute(extra, "id", "1");
        new.append_text(extra, "body");

        let mut matcher = StructuralMatching::new();
        matcher.build_matching(&mut old, &mut new);

        assert!(new
            .descendants(extra)
            .all(|id| new.state(id) == MatchState::NoMatch && new.partner(id).is_none()));
        assert_eq!(new.state(root), MatchState::Change);
    }

    #[test]
    fn test_text_change_and_surplus() {
        let mut old = Tree::new("root");
        let root = old.root();
        old.append_text(root, "one");
        let mut new = Tree::new("root");
        let root = new.root();
        new.append_text(root, "uno");
        let surplus = new.append_text(root, "dos");

        let mut matcher = StructuralMatching::new();
        matcher.build_matching(&mut old, &mut new);

        let old_text = old.texts(old.root()).next().unwrap();
        assert_eq!(old.state(old_text), MatchState::Change);
        assert_eq!(new.state(surplus), MatchState::NoMatch);
    }

    #[test]
    fn test_rematching_resets_state() {
        let mut old = app_settings(&[("A", "1")]);
        let mut new = app_settings(&[("A", "2")]);
        let mut matcher = StructuralMatching::new();
        matcher.build_matching(&mut old, &mut new);

        let mut same = app_settings(&[("A", "1")]);
        assert_eq!(matcher.build_matching(&mut old, &mut same), Comparison::Identical);
        assert_eq!(matcher.stats().identical, 2);
    }

    #[test]
    fn test_no_unmatched_left() {
        let mut old = app_settings(&[("A", "1"), ("C", "4")]);
        let mut new = app_settings(&[("B", "2"), ("A", "1")]);
        let mut matcher = StructuralMatching::new();
        matcher.build_matching(&mut old, &mut new);

        assert!(old
            .descendants(old.root())
            .all(|id| old.state(id) != MatchState::Unmatched));
        assert!(new
            .descendants(new.root())
            .all(|id| new.state(id) != MatchState::Unmatched));
    }
}
