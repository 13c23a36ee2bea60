//! XML printer that outputs document trees.

use std::io::Write;

use crate::node::{NodeId, Tree};

/// Options for XML printing.
#[derive(Debug, Clone, Default)]
pub struct XmlPrinterOptions {
    /// Whether to pretty-print with two-space indentation.
    pub pretty_print: bool,
}

/// XML printer that outputs document trees.
pub struct XmlPrinter<W: Write> {
    writer: W,
    options: XmlPrinterOptions,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a new XML printer.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, XmlPrinterOptions::default())
    }

    /// Creates a new XML printer with the given options.
    pub fn with_options(writer: W, options: XmlPrinterOptions) -> Self {
        XmlPrinter { writer, options }
    }

    /// Prints a whole document, starting with the XML declaration.
    pub fn print(&mut self, tree: &Tree) -> std::io::Result<()> {
        writeln!(self.writer, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
        self.print_element(tree, tree.root(), 0)?;
        if !self.options.pretty_print {
            writeln!(self.writer)?;
        }
        self.writer.flush()
    }

    /// Prints the element `id` and its descendants (no XML declaration).
    pub fn print_fragment(&mut self, tree: &Tree, id: NodeId) -> std::io::Result<()> {
        self.print_element(tree, id, 0)?;
        self.writer.flush()
    }

    fn print_element(&mut self, tree: &Tree, id: NodeId, depth: usize) -> std::io::Result<()> {
        let name = tree.name(id);
        self.indent(depth)?;
        write!(self.writer, "<{}", name)?;
        for attr in tree.attributes(id) {
            write!(
                self.writer,
                " {}=\"{}\"",
                tree.name(attr),
                to_entities(tree.value(attr))
            )?;
        }

        let content: Vec<NodeId> = tree
            .children(id)
            .filter(|&c| !tree.node(c).is_attribute())
            .collect();

        if content.is_empty() {
            write!(self.writer, " />")?;
            return self.newline();
        }

        // Text-only elements stay on one line.
        if content.iter().all(|&c| tree.node(c).is_text()) {
            write!(self.writer, ">")?;
            for &text in &content {
                write!(self.writer, "{}", to_entities(tree.value(text)))?;
            }
            write!(self.writer, "</{}>", name)?;
            return self.newline();
        }

        write!(self.writer, ">")?;
        self.newline()?;
        for child in content {
            if tree.node(child).is_text() {
                self.indent(depth + 1)?;
                write!(self.writer, "{}", to_entities(tree.value(child)))?;
                self.newline()?;
            } else {
                self.print_element(tree, child, depth + 1)?;
            }
        }
        self.indent(depth)?;
        write!(self.writer, "</{}>", name)?;
        self.newline()
    }

    fn indent(&mut self, depth: usize) -> std::io::Result<()> {
        if self.options.pretty_print {
            write!(self.writer, "{}", "  ".repeat(depth))?;
        }
        Ok(())
    }

    fn newline(&mut self) -> std::io::Result<()> {
        if self.options.pretty_print {
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

/// Converts special characters to XML entities.
///
/// Apostrophes are left alone: attribute values are always double-quoted and
/// XPath predicates read better unescaped.
fn to_entities(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Prints a document to a string without indentation.
pub fn print_to_string(tree: &Tree) -> std::io::Result<String> {
    let mut output = Vec::new();
    XmlPrinter::new(&mut output).print(tree)?;
    Ok(String::from_utf8_lossy(&output).to_string())
}

/// Prints a document to a string with pretty printing.
pub fn print_to_string_pretty(tree: &Tree) -> std::io::Result<String> {
    let mut output = Vec::new();
    let options = XmlPrinterOptions { pretty_print: true };
    XmlPrinter::with_options(&mut output, options).print(tree)?;
    Ok(String::from_utf8_lossy(&output).to_string())
}
