//! Per-kind change tallies feeding the transform classifier.

use crate::node::{MatchState, NodeId, Tree};

/// Change counts over one kind of child (attributes, elements or texts).
///
/// Updates, inserts and unchanged nodes are counted on the new side, deletes
/// on the old side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Children present in both trees but different.
    pub updates: usize,
    /// Children only in the new tree.
    pub inserts: usize,
    /// Children only in the old tree.
    pub deletes: usize,
    /// Children identical in both trees.
    pub unchanged: usize,
}

impl Counts {
    /// Counts the states of `old_children` (in `old`) and `new_children` (in `new`).
    pub fn tally(
        old: &Tree,
        new: &Tree,
        old_children: impl IntoIterator<Item = NodeId>,
        new_children: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        let mut counts = Counts::default();
        for child in new_children {
            match new.state(child) {
                MatchState::Change => counts.updates += 1,
                MatchState::NoMatch => counts.inserts += 1,
                MatchState::Match => counts.unchanged += 1,
                MatchState::Unmatched => {}
            }
        }
        counts.deletes = old_children
            .into_iter()
            .filter(|&child| old.state(child) == MatchState::NoMatch)
            .count();
        counts
    }

    /// Returns true if anything was updated, inserted or deleted.
    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }

    /// Number of updates, inserts and deletes.
    pub fn total_changes(&self) -> usize {
        self.updates + self.inserts + self.deletes
    }

    /// Number of counted children, changed or not.
    pub fn total(&self) -> usize {
        self.total_changes() + self.unchanged
    }

    /// Returns true if deletions are the only changes.
    pub fn is_deletes_only(&self) -> bool {
        self.deletes > 0 && self.updates == 0 && self.inserts == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let counts = Counts {
            updates: 1,
            inserts: 2,
            deletes: 3,
            unchanged: 4,
        };
        assert_eq!(counts.total_changes(), 6);
        assert_eq!(counts.total(), 10);
        assert!(counts.has_changes());
        assert!(!counts.is_deletes_only());
    }

    #[test]
    fn test_deletes_only_ignores_unchanged() {
        let counts = Counts {
            deletes: 1,
            unchanged: 2,
            ..Counts::default()
        };
        assert!(counts.is_deletes_only());
        assert!(!Counts::default().has_changes());
    }

    #[test]
    fn test_tally() {
        let mut old = Tree::new("root");
        let root = old.root();
        let gone = old.set_attribute(root, "gone", "1");
        let kept = old.set_attribute(root, "kept", "1");
        old.node_mut(gone).set_state(MatchState::NoMatch);
        old.node_mut(kept).set_state(MatchState::Match);

        let mut new = Tree::new("root");
        let root = new.root();
        let kept = new.set_attribute(root, "kept", "1");
        let added = new.set_attribute(root, "added", "2");
        new.node_mut(kept).set_state(MatchState::Match);
        new.node_mut(added).set_state(MatchState::NoMatch);

        let counts = Counts::tally(&old, &new, old.attributes(old.root()), new.attributes(new.root()));
        assert_eq!(
            counts,
            Counts {
                updates: 0,
                inserts: 1,
                deletes: 1,
                unchanged: 1
            }
        );
    }
}
