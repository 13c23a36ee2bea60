//! Pairing of same-named child elements.
//!
//! Children of a paired element pair are grouped by name. Within a group the
//! rules below run in priority order, each as a full pass over the new-side
//! siblings before the next one is tried.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::node::{DigestMap, NodeId, Tree};

/// The rule that paired two elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairRule {
    /// Identical subtree digests.
    Identical,
    /// Same value of an identifying attribute.
    Key,
    /// Same ordinal among same-named siblings.
    Ordinal,
    /// First remaining candidate in document order.
    FirstAvailable,
}

/// One old/new element pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pairing {
    pub old: NodeId,
    pub new: NodeId,
    pub rule: PairRule,
}

/// Pairs the child elements of `old_parent` with those of `new_parent`.
///
/// The returned pairings are ordered by name group (first appearance on the
/// new side), then by new-side document order.
pub(crate) fn pair_elements(
    old: &Tree,
    new: &Tree,
    old_parent: NodeId,
    new_parent: NodeId,
    old_digests: &DigestMap,
    new_digests: &DigestMap,
) -> Vec<Pairing> {
    let old_groups = group_by_name(old, old_parent);
    let index: FxHashMap<&str, usize> = old_groups
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (*name, i))
        .collect();

    let mut pairings = Vec::new();
    for (name, new_ids) in group_by_name(new, new_parent) {
        let Some(&i) = index.get(name) else {
            continue;
        };
        let group = SiblingGroup {
            old,
            new,
            old_ids: &old_groups[i].1,
            new_ids: &new_ids,
        };
        pairings.extend(group.pair(old_digests, new_digests));
    }
    pairings
}

/// Groups child elements by name, in order of first appearance.
fn group_by_name(tree: &Tree, parent: NodeId) -> Vec<(&str, Vec<NodeId>)> {
    let mut groups: Vec<(&str, Vec<NodeId>)> = Vec::new();
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    for child in tree.elements(parent) {
        let name = tree.name(child);
        match index.get(name) {
            Some(&i) => groups[i].1.push(child),
            None => {
                index.insert(name, groups.len());
                groups.push((name, vec![child]));
            }
        }
    }
    groups
}

/// Same-named siblings on both sides.
struct SiblingGroup<'a> {
    old: &'a Tree,
    new: &'a Tree,
    old_ids: &'a [NodeId],
    new_ids: &'a [NodeId],
}

/// Pairing progress within one group, by position in the group.
struct Progress {
    old_taken: Vec<bool>,
    new_partner: Vec<Option<(usize, PairRule)>>,
}

impl Progress {
    fn take(&mut self, new_index: usize, old_index: usize, rule: PairRule) {
        self.old_taken[old_index] = true;
        self.new_partner[new_index] = Some((old_index, rule));
    }

    fn unpaired_new(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.new_partner.len()).filter(|&i| self.new_partner[i].is_none())
    }

    fn first_free_old(&self) -> Option<usize> {
        self.old_taken.iter().position(|&taken| !taken)
    }
}

impl SiblingGroup<'_> {
    fn pair(&self, old_digests: &DigestMap, new_digests: &DigestMap) -> Vec<Pairing> {
        let mut progress = Progress {
            old_taken: vec![false; self.old_ids.len()],
            new_partner: vec![None; self.new_ids.len()],
        };

        self.pair_identical(&mut progress, old_digests, new_digests);
        self.pair_by_key(&mut progress);
        self.pair_by_ordinal(&mut progress);
        self.pair_first_available(&mut progress);

        progress
            .new_partner
            .iter()
            .enumerate()
            .filter_map(|(ni, partner)| {
                partner.map(|(oi, rule)| Pairing {
                    old: self.old_ids[oi],
                    new: self.new_ids[ni],
                    rule,
                })
            })
            .inspect(|p| trace!(old = ?p.old, new = ?p.new, rule = ?p.rule, "paired element"))
            .collect()
    }

    fn pair_identical(&self, progress: &mut Progress, old_digests: &DigestMap, new_digests: &DigestMap) {
        for ni in 0..self.new_ids.len() {
            let Some(digest) = new_digests.get(&self.new_ids[ni]) else {
                continue;
            };
            let found = (0..self.old_ids.len()).find(|&oi| {
                !progress.old_taken[oi] && old_digests.get(&self.old_ids[oi]) == Some(digest)
            });
            if let Some(oi) = found {
                progress.take(ni, oi, PairRule::Identical);
            }
        }
    }

    /// The identifying attribute of a new element is the first one whose value
    /// is unique among the new siblings and held by exactly one free old
    /// candidate.
    fn pair_by_key(&self, progress: &mut Progress) {
        let pending: Vec<usize> = progress.unpaired_new().collect();
        for ni in pending {
            let element = self.new_ids[ni];
            for attr in self.new.attributes(element) {
                let (name, value) = (self.new.name(attr), self.new.value(attr));
                let new_holders = self
                    .new_ids
                    .iter()
                    .filter(|&&sibling| self.new.attribute_value(sibling, name) == Some(value))
                    .count();
                if new_holders != 1 {
                    continue;
                }

                let holder = {
                    let mut old_holders = (0..self.old_ids.len()).filter(|&oi| {
                        !progress.old_taken[oi]
                            && self.old.attribute_value(self.old_ids[oi], name) == Some(value)
                    });
                    match (old_holders.next(), old_holders.next()) {
                        (Some(oi), None) => Some(oi),
                        _ => None,
                    }
                };
                if let Some(oi) = holder {
                    progress.take(ni, oi, PairRule::Key);
                    break;
                }
            }
        }
    }

    fn pair_by_ordinal(&self, progress: &mut Progress) {
        let pending: Vec<usize> = progress.unpaired_new().collect();
        for ni in pending {
            if ni < self.old_ids.len() && !progress.old_taken[ni] {
                progress.take(ni, ni, PairRule::Ordinal);
            }
        }
    }

    fn pair_first_available(&self, progress: &mut Progress) {
        let pending: Vec<usize> = progress.unpaired_new().collect();
        for ni in pending {
            match progress.first_free_old() {
                Some(oi) => progress.take(ni, oi, PairRule::FirstAvailable),
                None => break,
            }
        }
    }
}
