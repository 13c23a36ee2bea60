//! XML parser that builds document trees.
//!
//! This parser uses quick-xml's streaming API. Comments, processing
//! instructions and the doctype are dropped; text is trimmed and blank
//! segments are discarded.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::constants::DEFAULT_MAX_DEPTH;
use crate::error::{Error, Result};
use crate::node::{NodeId, Tree};

/// Options for XML parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest element nesting accepted; deeper documents are rejected.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// XML parser that builds document trees.
#[derive(Debug, Clone, Default)]
pub struct XmlParser {
    options: ParseOptions,
}

impl XmlParser {
    /// Creates a new parser with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new parser with the given options.
    pub fn with_options(options: ParseOptions) -> Self {
        XmlParser { options }
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<Tree> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        self.parse_reader(&mut reader, "<string>")
    }

    /// Parses XML from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Tree> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        self.parse_reader(&mut reader, &path.display().to_string())
    }

    fn parse_reader<R: BufRead>(&self, reader: &mut Reader<R>, source: &str) -> Result<Tree> {
        let mut builder = TreeBuilder::new(source, self.options.max_depth);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    builder.flush_text()?;
                    let (name, attributes) = read_element(e, reader)?;
                    builder.open(name, attributes)?;
                }
                Ok(Event::Empty(ref e)) => {
                    builder.flush_text()?;
                    let (name, attributes) = read_element(e, reader)?;
                    builder.open(name, attributes)?;
                    builder.close()?;
                }
                Ok(Event::End(_)) => {
                    builder.flush_text()?;
                    builder.close()?;
                }
                Ok(Event::Text(e)) => {
                    let raw =
                        std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                    let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                    builder.text.push_str(&text);
                }
                Ok(Event::CData(ref e)) => {
                    builder.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
                Ok(Event::GeneralRef(ref e)) => {
                    builder.text.push_str(&resolve_reference(e)?);
                }
                Ok(Event::Eof) => break,
                Ok(Event::Comment(_)) | Ok(Event::Decl(_)) | Ok(Event::PI(_)) => {}
                Ok(Event::DocType(_)) => {}
                Err(e) => {
                    return Err(Error::Parse(format!(
                        "{source} at byte {}: {e}",
                        reader.error_position()
                    )))
                }
            }
            buf.clear();
        }

        let tree = builder.finish()?;
        debug!(source, nodes = tree.node_count(), "parsed document");
        Ok(tree)
    }
}

/// Reads an element's name and attributes, in declaration order.
fn read_element<R>(e: &BytesStart, reader: &Reader<R>) -> Result<(String, Vec<(String, String)>)> {
    let name = reader
        .decoder()
        .decode(e.name().as_ref())
        .map_err(|e| Error::Parse(e.to_string()))?
        .to_string();

    let mut attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
        let key = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        attributes.push((key, value));
    }

    Ok((name, attributes))
}

/// Resolves `&#NN;`, `&#xNN;` and the predefined entities.
fn resolve_reference(e: &BytesRef) -> Result<String> {
    if let Some(ch) = e
        .resolve_char_ref()
        .map_err(|err| Error::Parse(err.to_string()))?
    {
        return Ok(ch.to_string());
    }
    let name = std::str::from_utf8(e.as_ref()).map_err(|err| Error::Parse(err.to_string()))?;
    resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| Error::Parse(format!("unknown entity &{name};")))
}

/// Incrementally assembles a [`Tree`] from parser events.
struct TreeBuilder<'s> {
    source: &'s str,
    max_depth: usize,
    tree: Option<Tree>,
    /// Open elements, innermost last.
    stack: Vec<NodeId>,
    /// Text collected since the last tag.
    text: String,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str, max_depth: usize) -> Self {
        TreeBuilder {
            source,
            max_depth,
            tree: None,
            stack: Vec::new(),
            text: String::new(),
        }
    }

    fn open(&mut self, name: String, attributes: Vec<(String, String)>) -> Result<()> {
        if self.stack.len() >= self.max_depth {
            return Err(Error::NestingTooDeep(self.max_depth));
        }

        let id = if let Some(tree) = self.tree.as_mut() {
            let parent = *self.stack.last().ok_or_else(|| {
                Error::Parse(format!("{}: more than one root element", self.source))
            })?;
            let id = tree.append_element(parent, name);
            for (key, value) in attributes {
                tree.set_attribute(id, key, value);
            }
            id
        } else {
            let mut tree = Tree::with_source(name, self.source);
            let root = tree.root();
            for (key, value) in attributes {
                tree.set_attribute(root, key, value);
            }
            self.tree = Some(tree);
            root
        };
        self.stack.push(id);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.stack
            .pop()
            .map(|_| ())
            .ok_or_else(|| Error::Parse(format!("{}: unexpected closing tag", self.source)))
    }

    fn flush_text(&mut self) -> Result<()> {
        let text = std::mem::take(&mut self.text);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        match (self.tree.as_mut(), self.stack.last()) {
            (Some(tree), Some(&parent)) => {
                tree.append_text(parent, trimmed);
                Ok(())
            }
            _ => Err(Error::Parse(format!(
                "{}: text outside the root element",
                self.source
            ))),
        }
    }

    fn finish(mut self) -> Result<Tree> {
        self.flush_text()?;
        if let (Some(tree), Some(&open)) = (self.tree.as_ref(), self.stack.last()) {
            return Err(Error::Parse(format!(
                "{}: unclosed element <{}>",
                self.source,
                tree.name(open)
            )));
        }
        self.tree
            .ok_or_else(|| Error::Parse(format!("{}: no root element", self.source)))
    }
}

/// Parses XML from a file with default options.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Tree> {
    XmlParser::new().parse_file(path)
}

/// Parses XML from a string with default options.
pub fn parse_str(xml: &str) -> Result<Tree> {
    XmlParser::new().parse_str(xml)
}
