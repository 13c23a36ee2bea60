//! xdt-diff - XML config diff to XML-Document-Transform patches
//!
//! This library compares two versions of an XML configuration document and
//! writes a patch in the Microsoft XML-Document-Transform (XDT) vocabulary
//! that turns the first into the second.
//!
//! # Overview
//!
//! 1. Both documents are parsed into arena trees ([`xml`], [`node`]).
//! 2. The trees are matched top-down ([`matching`]): attributes by name,
//!    text by position, child elements by subtree digest, identifying
//!    attribute, ordinal or first availability. Every node ends up `Match`,
//!    `Change` or `NoMatch`, with mutual partner links across the trees.
//! 3. The patch writer ([`writer`]) walks the matched trees, picks an
//!    operation per element ([`transform`]) and emits the patch document.
//!
//! # Example
//!
//! ```
//! use xdt_diff::{diff_str, Settings};
//!
//! let old = r#"<configuration><appSettings><add key="A" value="1"/></appSettings></configuration>"#;
//! let new = r#"<configuration><appSettings><add key="A" value="2"/></appSettings></configuration>"#;
//!
//! let patch = diff_str(old, new, &Settings::default()).unwrap();
//! assert_eq!(patch.transforms(), vec!["SetAttributes(value)"]);
//! ```

pub mod constants;
pub mod error;
pub mod keyed;
pub mod matching;
pub mod node;
pub mod settings;
pub mod transform;
pub mod writer;
pub mod xml;

// Re-export commonly used types
pub use constants::*;
pub use error::{Error, Result};
pub use keyed::align_keyed_children;
pub use matching::{Comparison, MatchStats, Matching, PairRule, StructuralMatching};
pub use node::{MatchState, Node, NodeId, NodeKind, Tree};
pub use settings::Settings;
pub use transform::{classify, unique_trait, Counts, ElementSides, Transform, UniqueTrait};
pub use writer::{Directive, InsertStrategy, Locator, Patch, WriterOptions, XdtWriter};
pub use xml::{parse_file, parse_str, ParseOptions, XmlParser, XmlPrinter};

/// Matches `old` against `new` and writes the patch with default options.
pub fn diff(old: &mut Tree, new: &mut Tree, settings: &Settings) -> Result<Patch> {
    diff_with_options(old, new, settings, WriterOptions::default())
}

/// Matches `old` against `new` and writes the patch.
///
/// Fails with [`Error::RootMismatch`] when the root elements differ.
pub fn diff_with_options(
    old: &mut Tree,
    new: &mut Tree,
    settings: &Settings,
    options: WriterOptions,
) -> Result<Patch> {
    if let Comparison::RootMismatch { old, new } = StructuralMatching::new().build_matching(old, new) {
        return Err(Error::RootMismatch { old, new });
    }
    XdtWriter::with_options(settings, options).write(old, new)
}

/// Parses two documents and writes the patch with default options.
pub fn diff_str(old: &str, new: &str, settings: &Settings) -> Result<Patch> {
    let mut old = parse_str(old)?;
    let mut new = parse_str(new)?;
    diff(&mut old, &mut new, settings)
}
