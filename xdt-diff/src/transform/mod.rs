//! Classification of element changes into patch operations.
//!
//! The classifier looks at aggregated change counts of an element pair
//! ([`Counts`]); the trait resolver finds a stable way to address an
//! element among its siblings ([`UniqueTrait`]).

mod classify;
mod counts;
mod unique_trait;

pub use classify::classify;
pub use counts::Counts;
pub use unique_trait::{unique_trait, UniqueTrait};

use crate::node::NodeId;

/// Which sides of an element pair exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSides {
    /// Only in the old tree (a deletion).
    Old(NodeId),
    /// Only in the new tree (an insertion).
    New(NodeId),
    /// Paired elements present in both trees.
    Both {
        /// Element in the old tree.
        old: NodeId,
        /// Element in the new tree.
        new: NodeId,
    },
}

impl ElementSides {
    /// The old-side element, if present.
    pub fn old(&self) -> Option<NodeId> {
        match *self {
            ElementSides::Old(old) | ElementSides::Both { old, .. } => Some(old),
            ElementSides::New(_) => None,
        }
    }

    /// The new-side element, if present.
    pub fn new(&self) -> Option<NodeId> {
        match *self {
            ElementSides::New(new) | ElementSides::Both { new, .. } => Some(new),
            ElementSides::Old(_) => None,
        }
    }
}

/// The operation needed to turn an old element into its new counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    /// Nothing to do at this element (children may still change).
    None,
    /// Delete the element.
    Remove,
    /// Add the element.
    Insert,
    /// Swap the element for a full copy of the new one.
    Replace,
    /// Overwrite changed and added attributes.
    SetAttributes,
    /// Drop attributes that no longer exist.
    RemoveAttributes,
    /// Drop some attributes and overwrite others.
    RemoveAndSetAttributes,
}

impl Transform {
    /// Returns true for operations that only touch attributes.
    pub fn is_attribute_only(&self) -> bool {
        matches!(
            self,
            Transform::SetAttributes | Transform::RemoveAttributes | Transform::RemoveAndSetAttributes
        )
    }
}
