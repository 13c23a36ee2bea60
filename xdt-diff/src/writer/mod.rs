//! XDT patch writer.
//!
//! Walks a matched pair of trees and emits a patch document: a tree rooted
//! at the new document's root name whose elements carry `xdt:Transform` and
//! `xdt:Locator` attributes describing how to turn the old document into the
//! new one.
//!
//! Changed child elements are written first, in document order. Removed and
//! inserted children follow, walking the child slots of both trees from the
//! last to the first.

mod directive;
mod positional;

pub use directive::{attribute_predicate, index_predicate, Directive, Locator};

use std::fs;
use std::path::Path;

use tracing::{debug, trace};

use crate::constants::{is_xmlns_attr, XDT_LOCATOR, XDT_NAMESPACE, XDT_NAMESPACE_DECL, XDT_TRANSFORM};
use crate::error::{Error, Result};
use crate::node::{MatchState, NodeId, Tree};
use crate::settings::Settings;
use crate::transform::{classify, unique_trait, ElementSides, Transform, UniqueTrait};
use crate::xml::{print_to_string, print_to_string_pretty};

/// How inserted elements are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertStrategy {
    /// Plain `Insert`, appending to the parent.
    #[default]
    Append,
    /// `InsertBefore`/`InsertAfter` relative to a neighbouring sibling.
    Positional,
}

/// Options for patch writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Placement of inserted elements.
    pub insert_strategy: InsertStrategy,
    /// Whether the serialized patch is indented.
    pub pretty_print: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            insert_strategy: InsertStrategy::Append,
            pretty_print: true,
        }
    }
}

/// A generated patch document.
#[derive(Debug, Clone)]
pub struct Patch {
    tree: Tree,
    pretty_print: bool,
}

impl Patch {
    /// Returns the patch tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Consumes the patch, returning its tree.
    pub fn into_tree(self) -> Tree {
        self.tree
    }

    /// Values of all `xdt:Transform` attributes, in document order.
    pub fn transforms(&self) -> Vec<&str> {
        self.attribute_values(XDT_TRANSFORM)
    }

    /// Values of all `xdt:Locator` attributes, in document order.
    pub fn locators(&self) -> Vec<&str> {
        self.attribute_values(XDT_LOCATOR)
    }

    fn attribute_values(&self, name: &str) -> Vec<&str> {
        self.tree
            .descendants(self.tree.root())
            .filter(|&id| self.tree.node(id).is_attribute() && self.tree.name(id) == name)
            .map(|id| self.tree.value(id))
            .collect()
    }

    /// Returns true if the patch contains any transform.
    pub fn has_changes(&self) -> bool {
        !self.transforms().is_empty()
    }

    /// Serializes the patch to XML text.
    pub fn to_xml_string(&self) -> Result<String> {
        let xml = if self.pretty_print {
            print_to_string_pretty(&self.tree)?
        } else {
            print_to_string(&self.tree)?
        };
        Ok(xml)
    }

    /// Writes the serialized patch to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_xml_string()?)?;
        Ok(())
    }
}

/// Writes XDT patches for matched tree pairs.
#[derive(Debug, Clone)]
pub struct XdtWriter<'s> {
    settings: &'s Settings,
    options: WriterOptions,
}

impl<'s> XdtWriter<'s> {
    /// Creates a writer with default options.
    pub fn new(settings: &'s Settings) -> Self {
        Self::with_options(settings, WriterOptions::default())
    }

    /// Creates a writer with the given options.
    pub fn with_options(settings: &'s Settings, options: WriterOptions) -> Self {
        XdtWriter { settings, options }
    }

    /// Returns the writer options.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Writes the patch turning `old` into `new`.
    ///
    /// Both trees must have been matched against each other.
    pub fn write(&self, old: &Tree, new: &Tree) -> Result<Patch> {
        let (old_root, new_root) = (old.root(), new.root());
        match (old.state(old_root), new.state(new_root)) {
            (MatchState::Unmatched, _) | (_, MatchState::Unmatched) => return Err(Error::NotMatched),
            (MatchState::NoMatch, _) | (_, MatchState::NoMatch) => {
                return Err(Error::RootMismatch {
                    old: old.name(old_root).to_string(),
                    new: new.name(new_root).to_string(),
                })
            }
            _ => {}
        }
        if old.partner(old_root) != Some(new_root) {
            return Err(Error::NotMatched);
        }

        let mut ctx = Context {
            old,
            new,
            out: Tree::with_source(new.name(new_root), new.source()),
            settings: self.settings,
            options: &self.options,
        };
        ctx.write_element(
            Slot::Root,
            ElementSides::Both {
                old: old_root,
                new: new_root,
            },
            "",
            0,
        );

        let root = ctx.out.root();
        ctx.out.set_attribute(root, XDT_NAMESPACE_DECL, XDT_NAMESPACE);
        ctx.strip_paths();

        let patch = Patch {
            tree: ctx.out,
            pretty_print: self.options.pretty_print,
        };
        debug!(
            old = old.source(),
            new = new.source(),
            transforms = patch.transforms().len(),
            "patch written"
        );
        Ok(patch)
    }
}

/// Where an element of the patch goes.
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// The patch root itself.
    Root,
    /// A new child of the given patch element.
    Child(NodeId),
}

/// State of one `write` call.
struct Context<'a> {
    old: &'a Tree,
    new: &'a Tree,
    out: Tree,
    settings: &'a Settings,
    options: &'a WriterOptions,
}

impl Context<'_> {
    /// Writes one element and, for paired elements, its changed children.
    ///
    /// `path` addresses the container in the patched document; `index` is
    /// the element's position among the new parent's child elements.
    fn write_element(&mut self, slot: Slot, sides: ElementSides, path: &str, index: usize) -> NodeId {
        let (old, new) = (self.old, self.new);
        let mut transform = classify(old, new, sides);

        // The root cannot be split into two stand-ins.
        if matches!(slot, Slot::Root) && transform == Transform::RemoveAndSetAttributes {
            transform = Transform::Replace;
        }

        if let (Slot::Child(_), ElementSides::Both { old: o, .. }) = (slot, sides) {
            if self.in_reset_container(o) && old.has_content(o) {
                trace!(element = old.name(o), "resetting element");
                let stand_in = self.stand_in(slot, o);
                self.set_transform(stand_in, Directive::RemoveAll);
                transform = Transform::Insert;
            }
        }

        if transform == Transform::Insert {
            if let Some(n) = sides.new() {
                let directive = match self.options.insert_strategy {
                    InsertStrategy::Append => Directive::Insert,
                    InsertStrategy::Positional => positional::insert_directive(old, new, n, path, index),
                };
                let copy = self.place_copy(slot, n);
                self.set_transform(copy, directive);
                return copy;
            }
        }

        let (o, n) = match sides {
            ElementSides::Old(o) => {
                let old_trait = unique_trait(old, new, o);
                let stand_in = self.stand_in(slot, o);
                self.add_locator(stand_in, o, old_trait, true, transform);
                self.set_transform(stand_in, Directive::Remove);
                return stand_in;
            }
            ElementSides::New(n) => {
                let copy = self.place_copy(slot, n);
                self.set_transform(copy, Directive::Insert);
                return copy;
            }
            ElementSides::Both { old, new } => (old, new),
        };

        let old_trait = unique_trait(old, new, o);
        trace!(element = old.name(o), ?transform, ?old_trait, "writing element");

        if transform == Transform::Replace {
            let copy = self.place_copy(slot, n);
            self.set_transform(copy, Directive::Replace);
            self.add_locator(copy, o, old_trait, false, transform);
            return copy;
        }

        let element = self.stand_in(slot, o);
        self.add_locator(element, o, old_trait, true, transform);

        match transform {
            Transform::RemoveAttributes | Transform::RemoveAndSetAttributes => {
                let removed: Vec<String> = old
                    .attributes(o)
                    .filter(|&a| old.state(a) == MatchState::NoMatch)
                    .map(|a| old.name(a).to_string())
                    .collect();
                self.set_transform(element, Directive::RemoveAttributes(removed));

                if transform == Transform::RemoveAndSetAttributes {
                    let second = self.stand_in(slot, o);
                    self.add_locator(second, o, old_trait, true, transform);
                    let names = self.copy_changed_attributes(n, second);
                    self.set_transform(second, Directive::SetAttributes(names));
                }
            }
            Transform::SetAttributes => {
                let names = self.copy_changed_attributes(n, element);
                self.set_transform(element, Directive::SetAttributes(names));
            }
            _ => {}
        }

        let child_path = self.child_path(path, o, n, old_trait);
        self.write_children(element, o, n, &child_path);
        element
    }

    fn write_children(&mut self, element: NodeId, o: NodeId, n: NodeId, path: &str) {
        let (old, new) = (self.old, self.new);
        let new_children: Vec<NodeId> = new.elements(n).collect();
        let old_children: Vec<NodeId> = old.elements(o).collect();

        for (i, &child) in new_children.iter().enumerate() {
            if new.state(child) != MatchState::Change {
                continue;
            }
            if let Some(partner) = new.partner(child) {
                let sides = ElementSides::Both {
                    old: partner,
                    new: child,
                };
                self.write_element(Slot::Child(element), sides, path, i);
            }
        }

        let max = new_children.len().max(old_children.len());
        for i in (0..max).rev() {
            if let Some(&removed) = old_children.get(i) {
                if old.state(removed) == MatchState::NoMatch {
                    self.write_element(Slot::Child(element), ElementSides::Old(removed), path, 0);
                }
            }
            if let Some(&inserted) = new_children.get(i) {
                if new.state(inserted) == MatchState::NoMatch {
                    self.write_element(Slot::Child(element), ElementSides::New(inserted), path, i);
                }
            }
        }
    }

    /// Whether the parent of old element `o` is a configured reset container.
    fn in_reset_container(&self, o: NodeId) -> bool {
        self.old
            .parent(o)
            .is_some_and(|parent| self.settings.is_reset_path(&self.old.plain_path(parent)))
    }

    /// Emits an element carrying only the name and namespace declarations
    /// of old element `o`.
    fn stand_in(&mut self, slot: Slot, o: NodeId) -> NodeId {
        let old = self.old;
        let element = match slot {
            Slot::Root => self.out.root(),
            Slot::Child(parent) => self.out.append_element(parent, old.name(o)),
        };
        for attr in old.attributes(o) {
            if is_xmlns_attr(old.name(attr)) {
                self.out.set_attribute(element, old.name(attr), old.value(attr));
            }
        }
        element
    }

    /// Emits a full copy of new element `n`.
    fn place_copy(&mut self, slot: Slot, n: NodeId) -> NodeId {
        let new = self.new;
        match slot {
            Slot::Root => {
                let root = self.out.root();
                self.out.copy_children(root, new, n);
                root
            }
            Slot::Child(parent) => self.out.copy_subtree(parent, new, n),
        }
    }

    /// Copies changed and added attributes of `n` onto `target`, returning
    /// their names.
    fn copy_changed_attributes(&mut self, n: NodeId, target: NodeId) -> Vec<String> {
        let new = self.new;
        let mut names = Vec::new();
        for attr in new.attributes(n) {
            if matches!(new.state(attr), MatchState::Change | MatchState::NoMatch) {
                self.out.set_attribute(target, new.name(attr), new.value(attr));
                names.push(new.name(attr).to_string());
            }
        }
        names
    }

    fn set_transform(&mut self, element: NodeId, directive: Directive) {
        self.out.set_attribute(element, XDT_TRANSFORM, directive.to_string());
    }

    /// Adds an `xdt:Locator` for old element `o`, if its trait calls for one.
    fn add_locator(
        &mut self,
        target: NodeId,
        o: NodeId,
        old_trait: Option<UniqueTrait>,
        copy_attribute: bool,
        transform: Transform,
    ) {
        let Some(found) = old_trait else {
            return;
        };
        let old = self.old;

        let locator = match found.attribute {
            Some(attr) if old.state(attr) == MatchState::Match && found.has_siblings => {
                if copy_attribute {
                    self.out.set_attribute(target, old.name(attr), old.value(attr));
                }
                Locator::Match(old.name(attr).to_string())
            }
            Some(attr) if !transform.is_attribute_only() || !self.has_child_changes(o) => {
                Locator::Condition(attribute_predicate(old.name(attr), old.value(attr)))
            }
            _ => {
                debug!(element = old.name(o), index = found.index, "using positional locator");
                Locator::Condition(found.index.to_string())
            }
        };
        self.out.set_attribute(target, XDT_LOCATOR, locator.to_string());
    }

    /// Whether any child element of `o` or of its partner is not `Match`.
    fn has_child_changes(&self, o: NodeId) -> bool {
        let (old, new) = (self.old, self.new);
        old.elements(o).any(|c| old.state(c) != MatchState::Match)
            || old
                .partner(o)
                .is_some_and(|n| new.elements(n).any(|c| new.state(c) != MatchState::Match))
    }

    /// XPath of the paired element below `path`, as it reads once this
    /// element's own transform has been applied.
    fn child_path(&self, path: &str, o: NodeId, n: NodeId, old_trait: Option<UniqueTrait>) -> String {
        let (old, new) = (self.old, self.new);
        let base = format!("{path}/{}", old.name(o));
        let Some(found) = old_trait else {
            return base;
        };

        let predicate = match found.attribute {
            Some(attr) if old.state(attr) == MatchState::Match => {
                Some(attribute_predicate(old.name(attr), old.value(attr)))
            }
            Some(_) => unique_trait(new, old, n)
                .filter(|t| t.unique_in_both)
                .and_then(|t| t.attribute)
                .map(|attr| attribute_predicate(new.name(attr), new.value(attr))),
            None => None,
        };
        base + &predicate.unwrap_or_else(|| index_predicate(found.index))
    }

    /// Clears every configured strip path found in the patch.
    fn strip_paths(&mut self) {
        for path in &self.settings.remove_node_path {
            if let Some(id) = self.out.select_path(path) {
                if self.out.has_content(id) {
                    debug!(path, "stripping subtree from patch");
                    self.out.clear(id);
                }
            }
        }
    }
}
