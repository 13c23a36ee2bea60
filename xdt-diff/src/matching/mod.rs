//! Tree matching algorithms.
//!
//! This module establishes correspondences between the nodes of an "old" and
//! a "new" tree. After matching, every node carries a definitive
//! [`MatchState`](crate::node::MatchState) and, when it exists in both trees,
//! a partner id pointing into the other tree's arena.

mod pairing;
mod structural;

pub use pairing::PairRule;
pub use structural::{MatchStats, StructuralMatching};

use crate::node::Tree;

/// Trait for tree matching algorithms.
///
/// The matchings are stored in the nodes themselves (state and partner
/// fields), so both trees are taken mutably.
pub trait Matching {
    /// Builds a matching between an old tree and a new tree.
    ///
    /// Any previous matching stored in the trees is discarded first.
    fn build_matching(&mut self, old: &mut Tree, new: &mut Tree) -> Comparison;
}

/// Overall outcome of matching two trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// Every node has an identical partner.
    Identical,
    /// The roots correspond but something below them differs.
    Changed,
    /// The root elements have different names; no patch can be produced.
    RootMismatch {
        /// Root element name of the old tree.
        old: String,
        /// Root element name of the new tree.
        new: String,
    },
}

impl Comparison {
    /// Returns true if the trees are identical.
    pub fn is_identical(&self) -> bool {
        matches!(self, Comparison::Identical)
    }

    /// Returns true if the trees correspond but differ.
    pub fn has_changes(&self) -> bool {
        matches!(self, Comparison::Changed)
    }

    /// Returns true if the root elements differ.
    pub fn is_root_mismatch(&self) -> bool {
        matches!(self, Comparison::RootMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_helpers() {
        assert!(Comparison::Identical.is_identical());
        assert!(Comparison::Changed.has_changes());
        let mismatch = Comparison::RootMismatch {
            old: "a".to_string(),
            new: "b".to_string(),
        };
        assert!(mismatch.is_root_mismatch());
        assert!(!mismatch.has_changes());
    }
}
