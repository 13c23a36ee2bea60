//! Alignment of keyed collections before diffing.
//!
//! Collections such as `/configuration/appSettings` hold children identified
//! by a key attribute. Their order carries no meaning, and entries that only
//! exist in the new document are reported to the operator instead of being
//! patched in.

use tracing::debug;

use crate::node::{NodeId, Tree};

/// Aligns the children of the collection at `path` in `new` with `old`.
///
/// The new collection is reordered to follow the old key order. Keys compare
/// case-insensitively; when several new children share a key the last one
/// is kept. Children whose key does not occur in the old collection are
/// removed from `new` and returned as a report rooted at the collection's
/// name. Children without the key attribute stay, after the aligned ones.
///
/// Returns `None` if either document lacks the collection or nothing is
/// missing.
pub fn align_keyed_children(old: &Tree, new: &mut Tree, path: &str, key: &str) -> Option<Tree> {
    let old_collection = old.select_path(path)?;
    let new_collection = new.select_path(path)?;

    let old_keys: Vec<String> = old
        .elements(old_collection)
        .filter_map(|c| old.attribute_value(c, key))
        .map(str::to_lowercase)
        .collect();
    let children: Vec<NodeId> = new.elements(new_collection).collect();
    let key_of = |tree: &Tree, id: NodeId| tree.attribute_value(id, key).map(str::to_lowercase);

    let mut report = Tree::with_source(new.name(new_collection), new.source());
    let report_root = report.root();
    let mut missing = Vec::new();
    for &child in &children {
        if let Some(k) = key_of(new, child) {
            if !old_keys.contains(&k) {
                report.copy_subtree(report_root, new, child);
                missing.push(child);
            }
        }
    }

    let mut aligned: Vec<NodeId> = Vec::new();
    for k in &old_keys {
        let found = children
            .iter()
            .rev()
            .find(|&&c| key_of(new, c).as_ref() == Some(k));
        if let Some(&child) = found {
            if !aligned.contains(&child) {
                aligned.push(child);
            }
        }
    }
    let keyless: Vec<NodeId> = children
        .iter()
        .copied()
        .filter(|&c| key_of(new, c).is_none())
        .collect();

    let shadowed = children.len() - aligned.len() - keyless.len() - missing.len();
    for &child in &children {
        new.detach(child);
    }
    for &child in aligned.iter().chain(&keyless) {
        new.append_child(new_collection, child);
    }
    for &child in children
        .iter()
        .filter(|&&c| !aligned.contains(&c) && !keyless.contains(&c))
    {
        new.remove(child);
    }

    debug!(
        path,
        aligned = aligned.len(),
        missing = missing.len(),
        shadowed,
        "aligned keyed collection"
    );

    if missing.is_empty() {
        None
    } else {
        Some(report)
    }
}
