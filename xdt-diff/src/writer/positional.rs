//! Positional insert directives (`InsertBefore` / `InsertAfter`).
//!
//! Inserted siblings are written from the last slot to the first, so the
//! following sibling of an insertion is already in place when it is used as
//! the anchor.

use super::directive::{attribute_predicate, index_predicate, Directive};
use crate::node::{MatchState, NodeId, Tree};
use crate::transform::unique_trait;

/// Chooses how to insert `element` (in `new`), the `index`-th child element
/// of its parent, below the container addressed by `path`.
pub(super) fn insert_directive(
    old: &Tree,
    new: &Tree,
    element: NodeId,
    path: &str,
    index: usize,
) -> Directive {
    let Some(parent) = new.parent(element) else {
        return Directive::Insert;
    };
    let siblings: Vec<NodeId> = new.elements(parent).collect();
    if siblings.len() < 2 || index + 1 >= siblings.len() {
        return Directive::Insert;
    }

    let next = siblings[index + 1];
    match unique_trait(new, old, next) {
        None => return Directive::InsertBefore(format!("{path}/{}", new.name(next))),
        Some(found) => {
            if let Some(attr) = found.attribute {
                let predicate = attribute_predicate(new.name(attr), new.value(attr));
                return Directive::InsertBefore(format!("{path}/{}{predicate}", new.name(next)));
            }
        }
    }

    let previous = siblings[..index]
        .iter()
        .rev()
        .find(|&&s| new.state(s) != MatchState::NoMatch);
    let Some(&previous) = previous else {
        return Directive::InsertBefore(format!("{path}/*[1]"));
    };

    let name = new.name(previous);
    match unique_trait(new, old, previous) {
        None => Directive::InsertAfter(format!("{path}/{name}")),
        Some(found) => match found.attribute {
            Some(attr) => {
                let predicate = attribute_predicate(new.name(attr), new.value(attr));
                Directive::InsertAfter(format!("{path}/{name}{predicate}"))
            }
            None => Directive::InsertAfter(format!("{path}/{name}{}", index_predicate(found.index))),
        },
    }
}
