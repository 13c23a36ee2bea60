//! Values of the `xdt:Transform` and `xdt:Locator` attributes.

use std::fmt;

/// Value of an `xdt:Transform` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Append the element to its parent.
    Insert,
    /// Insert before the element addressed by the XPath.
    InsertBefore(String),
    /// Insert after the element addressed by the XPath.
    InsertAfter(String),
    /// Delete the located element.
    Remove,
    /// Delete everything inside the located element.
    RemoveAll,
    /// Swap the located element for this one.
    Replace,
    /// Overwrite the named attributes.
    SetAttributes(Vec<String>),
    /// Delete the named attributes.
    RemoveAttributes(Vec<String>),
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Insert => f.write_str("Insert"),
            Directive::InsertBefore(xpath) => write!(f, "InsertBefore({xpath})"),
            Directive::InsertAfter(xpath) => write!(f, "InsertAfter({xpath})"),
            Directive::Remove => f.write_str("Remove"),
            Directive::RemoveAll => f.write_str("RemoveAll"),
            Directive::Replace => f.write_str("Replace"),
            Directive::SetAttributes(names) => write!(f, "SetAttributes({})", names.join(",")),
            Directive::RemoveAttributes(names) => {
                write!(f, "RemoveAttributes({})", names.join(","))
            }
        }
    }
}

/// Value of an `xdt:Locator` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Select by equal value of the named attribute.
    Match(String),
    /// Select by an XPath predicate.
    Condition(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Match(name) => write!(f, "Match({name})"),
            Locator::Condition(predicate) => write!(f, "Condition({predicate})"),
        }
    }
}

/// XPath predicate selecting by attribute value: `[(@name='value')]`.
///
/// Values containing `'` are quoted with `"` instead; values containing
/// both quote characters become a `concat(...)` of single-quoted pieces.
pub fn attribute_predicate(name: &str, value: &str) -> String {
    format!("[(@{name}={})]", string_literal(value))
}

/// XPath string literal for `value`.
fn string_literal(value: &str) -> String {
    match (value.contains('\''), value.contains('"')) {
        (false, _) => format!("'{value}'"),
        (true, false) => format!("\"{value}\""),
        (true, true) => {
            let pieces: Vec<String> = value.split('\'').map(|piece| format!("'{piece}'")).collect();
            format!("concat({})", pieces.join(",\"'\","))
        }
    }
}

/// XPath predicate selecting by position: `[n]`.
pub fn index_predicate(index: usize) -> String {
    format!("[{index}]")
}
