//! XML parsing and output.
//!
//! The parser turns markup into a [`Tree`](crate::node::Tree), keeping only
//! elements, attributes and non-blank text. The printer writes a tree back
//! out, with attributes in insertion order.

mod parser;
mod printer;

pub use parser::{parse_file, parse_str, ParseOptions, XmlParser};
pub use printer::{print_to_string, print_to_string_pretty, XmlPrinter, XmlPrinterOptions};
