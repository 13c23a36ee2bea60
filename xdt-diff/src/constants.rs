//! Constants used throughout xdt-diff.
//!
//! Names and value templates of the XML-Document-Transform vocabulary.

/// Namespace URI of the XDT vocabulary.
pub const XDT_NAMESPACE: &str = "http://schemas.microsoft.com/XML-Document-Transform";

/// Prefix bound to [`XDT_NAMESPACE`] in generated patches.
pub const XDT_PREFIX: &str = "xdt";

/// Qualified name of the namespace declaration added to the patch root.
pub const XDT_NAMESPACE_DECL: &str = "xmlns:xdt";

/// Qualified name of the transform attribute.
pub const XDT_TRANSFORM: &str = "xdt:Transform";

/// Qualified name of the locator attribute.
pub const XDT_LOCATOR: &str = "xdt:Locator";

/// Attribute name (or prefix) of namespace declarations.
pub const XMLNS: &str = "xmlns";

/// Default maximum element nesting accepted by the parser.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Returns true if the attribute name declares a namespace.
pub fn is_xmlns_attr(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == XMLNS || lower.starts_with("xmlns:")
}
