//! Error types for xdt-diff.

use thiserror::Error;

/// Result type alias for xdt-diff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, comparing or patching documents.
#[derive(Error, Debug)]
pub enum Error {
    /// XML parse error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// The document nests elements deeper than the parser allows.
    #[error("element nesting exceeds the maximum depth of {0}")]
    NestingTooDeep(usize),

    /// The root elements of the two documents have different names.
    ///
    /// No patch can describe this difference.
    #[error("root elements differ: <{old}> vs <{new}>")]
    RootMismatch {
        /// Root element name of the old document.
        old: String,
        /// Root element name of the new document.
        new: String,
    },

    /// The writer was handed trees that were never matched.
    #[error("trees must be matched before a patch can be written")]
    NotMatched,

    /// Settings document could not be read.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}
