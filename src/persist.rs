//! Element-tree persistence.
//!
//! Coordinates, shapes and attribute lists write themselves through the
//! [`Writer`] trait and read back through [`Reader`]. The crate ships an
//! in-memory [`Element`] tree with a matching writer and reader; hosts plug
//! in their own document format by implementing the two traits.

use std::fmt::Write as _;

/// Streaming sink for nested elements with string attributes
pub trait Writer {
    fn write_start_element(&mut self, name: &str);
    fn write_attribute_string(&mut self, name: &str, value: &str);
    fn write_attribute_number(&mut self, name: &str, value: f64) {
        self.write_attribute_string(name, &value.to_string());
    }
    fn write_end_element(&mut self);
}

/// Random-access view over a parsed element tree
pub trait Reader {
    type Node;

    fn tag<'a>(&self, node: &'a Self::Node) -> &'a str;
    fn attribute<'a>(&self, node: &'a Self::Node, name: &str) -> Option<&'a str>;
    /// All attributes of a node in document order
    fn attributes<'a>(&self, node: &'a Self::Node) -> Vec<(&'a str, &'a str)>;
    fn children<'a>(&self, node: &'a Self::Node) -> Vec<&'a Self::Node>;

    /// First child with the given tag
    fn child<'a>(&self, node: &'a Self::Node, tag: &str) -> Option<&'a Self::Node> {
        self.children(node).into_iter().find(|c| self.tag(c) == tag)
    }

    fn number<'a>(&self, node: &'a Self::Node, name: &str) -> Option<f64> {
        self.attribute(node, name).and_then(|v| v.trim().parse().ok())
    }
}

/// In-memory element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Compact XML rendering, used for snapshots and debugging
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write_xml(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Builds an [`Element`] tree from writer calls
#[derive(Debug, Default)]
pub struct ElementWriter {
    stack: Vec<Element>,
    roots: Vec<Element>,
}

impl ElementWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed top-level elements; unbalanced open elements are closed first
    pub fn finish(mut self) -> Vec<Element> {
        while !self.stack.is_empty() {
            self.write_end_element();
        }
        self.roots
    }

    /// The single top-level element, if exactly one was written
    pub fn into_element(self) -> Option<Element> {
        let mut roots = self.finish();
        if roots.len() == 1 { roots.pop() } else { None }
    }
}

impl Writer for ElementWriter {
    fn write_start_element(&mut self, name: &str) {
        self.stack.push(Element::new(name));
    }

    fn write_attribute_string(&mut self, name: &str, value: &str) {
        if let Some(current) = self.stack.last_mut() {
            current.attributes.push((name.to_string(), value.to_string()));
        }
    }

    fn write_end_element(&mut self) {
        let Some(done) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => self.roots.push(done),
        }
    }
}

/// [`Reader`] over in-memory [`Element`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct ElementReader;

impl Reader for ElementReader {
    type Node = Element;

    fn tag<'a>(&self, node: &'a Element) -> &'a str {
        &node.tag
    }

    fn attribute<'a>(&self, node: &'a Element, name: &str) -> Option<&'a str> {
        node.attribute(name)
    }

    fn attributes<'a>(&self, node: &'a Element) -> Vec<(&'a str, &'a str)> {
        node.attributes
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect()
    }

    fn children<'a>(&self, node: &'a Element) -> Vec<&'a Element> {
        node.children.iter().collect()
    }
}
