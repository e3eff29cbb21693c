//! XML document trees and the read-only navigation capability
//!
//! The validation engine never owns or mutates the instance. It reads it
//! through [`XmlNode`], which is implemented here for two trees:
//!
//! - the owned [`Node`]/[`Element`] tree built by [`Document::parse`]
//!   with quick-xml (namespace-resolved, mixed content preserved), and
//! - borrowed [`roxmltree::Node`]s, for callers that already parsed
//!   their input with roxmltree.

use crate::error::{Error, Result};
use crate::namespaces::{split_prefixed, NamespaceScope, QName, XMLNS_NAMESPACE};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::fmt;

/// Node kind classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// Document node
    Document,
    /// Element node
    Element,
    /// Attribute node
    Attribute,
    /// Text node
    Text,
    /// Comment node
    Comment,
    /// Processing instruction
    ProcessingInstruction,
    /// Namespace node
    Namespace,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let test = match self {
            NodeKind::Document => "document-node()",
            NodeKind::Element => "element()",
            NodeKind::Attribute => "attribute()",
            NodeKind::Text => "text()",
            NodeKind::Comment => "comment()",
            NodeKind::ProcessingInstruction => "processing-instruction()",
            NodeKind::Namespace => "namespace-node()",
        };
        f.write_str(test)
    }
}

/// Whether a string consists solely of XML whitespace
pub fn is_xml_whitespace(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}

/// Read-only navigation over an XML tree.
///
/// Handles are cheap to clone (typically a reference or an index pair).
pub trait XmlNode: Clone {
    /// Kind of this node
    fn kind(&self) -> NodeKind;

    /// Expanded name for elements, attributes and PIs
    fn name(&self) -> Option<QName>;

    /// Ordered children (elements, text, comments, PIs)
    fn children(&self) -> Vec<Self>;

    /// Attributes by expanded name, namespace declarations excluded
    fn attributes(&self) -> Vec<(QName, String)>;

    /// XPath string value
    fn string_value(&self) -> String;

    /// Namespace URI bound to `prefix` in scope of this node
    /// (`None` prefix asks for the default namespace)
    fn lookup_namespace(&self, prefix: Option<&str>) -> Option<String>;

    /// Value of an attribute by expanded name
    fn attribute(&self, name: &QName) -> Option<String> {
        self.attributes()
            .into_iter()
            .find(|(qname, _)| qname == name)
            .map(|(_, value)| value)
    }

    /// Whether this is a text node containing only whitespace
    fn is_whitespace_text(&self) -> bool {
        self.kind() == NodeKind::Text && is_xml_whitespace(&self.string_value())
    }
}

// =============================================================================
// Owned tree
// =============================================================================

/// A node of the owned document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Element node
    Element(Element),
    /// Character data (text and CDATA sections are merged)
    Text(String),
    /// Comment
    Comment(String),
    /// Processing instruction
    ProcessingInstruction {
        /// PI target
        target: String,
        /// PI content after the target
        data: String,
    },
}

impl Node {
    /// The element, if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Element attributes in document order
    pub attributes: IndexMap<QName, String>,
    /// Child nodes in document order
    pub children: Vec<Node>,
    /// In-scope namespaces of this element
    pub namespaces: NamespaceScope,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: IndexMap::new(),
            children: Vec::new(),
            namespaces: NamespaceScope::new(),
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Get an attribute value by qualified name
    pub fn get_attribute(&self, qname: &QName) -> Option<&str> {
        self.attributes.get(qname).map(|s| s.as_str())
    }

    /// Set an attribute
    pub fn with_attribute(mut self, qname: QName, value: impl Into<String>) -> Self {
        self.attributes.insert(qname, value.into());
        self
    }

    /// Append a child node
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Append a child element (builder style)
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append character data (builder style)
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(&text.into());
        self
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    /// Concatenated character data of the direct children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.child_elements()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    fn descendant_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.descendant_text(out),
                _ => {}
            }
        }
    }
}

/// XML Document representation
#[derive(Debug, Default)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Node>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document around an already built element
    pub fn from_element(root: Element) -> Self {
        Self {
            root: Some(Node::Element(root)),
        }
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(false);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let scope = element_stack.last().map(|p| &p.namespaces);
                    let element = Self::parse_element(&e, scope)?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        Self::attach(&mut doc, &mut element_stack, Node::Element(current))?;
                    }
                }
                Ok(Event::Empty(e)) => {
                    let scope = element_stack.last().map(|p| &p.namespaces);
                    let element = Self::parse_element(&e, scope)?;
                    Self::attach(&mut doc, &mut element_stack, Node::Element(element))?;
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        current.push_text(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        current.push_text(&utf8(&e.into_inner())?);
                    }
                }
                Ok(Event::Comment(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        current.add_child(Node::Comment(utf8(&e)?));
                    }
                }
                Ok(Event::PI(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let content = utf8(&e)?;
                        let (target, data) = match content.split_once(char::is_whitespace) {
                            Some((t, d)) => (t.to_string(), d.trim_start().to_string()),
                            None => (content.clone(), String::new()),
                        };
                        current.add_child(Node::ProcessingInstruction { target, data });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // XML declaration, DOCTYPE
            }
            buf.clear();
        }

        if !element_stack.is_empty() {
            return Err(Error::Xml("unexpected end of document".to_string()));
        }
        if doc.root.is_none() {
            return Err(Error::Xml("document has no root element".to_string()));
        }
        Ok(doc)
    }

    fn attach(doc: &mut Document, stack: &mut [Element], node: Node) -> Result<()> {
        if let Some(parent) = stack.last_mut() {
            parent.add_child(node);
        } else if doc.root.is_none() {
            doc.root = Some(node);
        } else {
            return Err(Error::Xml("document has more than one root element".to_string()));
        }
        Ok(())
    }

    /// Parse element from BytesStart event, resolving names against `parent`
    fn parse_element(start: &BytesStart, parent: Option<&NamespaceScope>) -> Result<Element> {
        let name = utf8(start.name().as_ref())?;

        let mut declared = NamespaceScope::new();
        let mut raw_attributes = Vec::new();
        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;
            let attr_name = utf8(attr.key.as_ref())?;
            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                declared.declare(None, attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                declared.declare(Some(prefix), attr_value);
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        let namespaces = match parent {
            Some(scope) => scope.inherit(&declared),
            None => declared,
        };

        let qname = namespaces.resolve(&name)?;
        let mut element = Element::new(qname);
        for (attr_name, attr_value) in raw_attributes {
            // unprefixed attributes are in no namespace
            let attr_qname = match split_prefixed(&attr_name) {
                (Some("xmlns"), _) => continue,
                (Some(prefix), local) => {
                    let uri = namespaces.lookup(Some(prefix)).ok_or_else(|| {
                        Error::Namespace(format!("Unknown prefix: {}", prefix))
                    })?;
                    if uri == XMLNS_NAMESPACE {
                        continue;
                    }
                    QName::namespaced(uri, local)
                }
                (None, local) => QName::local(local),
            };
            element.attributes.insert(attr_qname, attr_value);
        }
        element.namespaces = namespaces;
        Ok(element)
    }

    /// Get the root node
    pub fn root_node(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref().and_then(Node::as_element)
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| Error::Xml(format!("invalid UTF-8: {}", e)))
}

impl<'a> XmlNode for &'a Node {
    fn kind(&self) -> NodeKind {
        match self {
            Node::Element(_) => NodeKind::Element,
            Node::Text(_) => NodeKind::Text,
            Node::Comment(_) => NodeKind::Comment,
            Node::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
        }
    }

    fn name(&self) -> Option<QName> {
        match self {
            Node::Element(e) => Some(e.qname.clone()),
            Node::ProcessingInstruction { target, .. } => Some(QName::local(target.clone())),
            _ => None,
        }
    }

    fn children(&self) -> Vec<Self> {
        match *self {
            Node::Element(e) => e.children.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn attributes(&self) -> Vec<(QName, String)> {
        match self {
            Node::Element(e) => e
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn string_value(&self) -> String {
        match self {
            Node::Element(e) => {
                let mut out = String::new();
                e.descendant_text(&mut out);
                out
            }
            Node::Text(t) | Node::Comment(t) => t.clone(),
            Node::ProcessingInstruction { data, .. } => data.clone(),
        }
    }

    fn lookup_namespace(&self, prefix: Option<&str>) -> Option<String> {
        match self {
            Node::Element(e) => e.namespaces.lookup(prefix).map(str::to_string),
            _ => None,
        }
    }

    fn attribute(&self, name: &QName) -> Option<String> {
        match self {
            Node::Element(e) => e.get_attribute(name).map(str::to_string),
            _ => None,
        }
    }
}

// =============================================================================
// roxmltree adapter
// =============================================================================

impl<'a, 'input: 'a> XmlNode for roxmltree::Node<'a, 'input> {
    fn kind(&self) -> NodeKind {
        match self.node_type() {
            roxmltree::NodeType::Root => NodeKind::Document,
            roxmltree::NodeType::Element => NodeKind::Element,
            roxmltree::NodeType::Text => NodeKind::Text,
            roxmltree::NodeType::Comment => NodeKind::Comment,
            roxmltree::NodeType::PI => NodeKind::ProcessingInstruction,
        }
    }

    fn name(&self) -> Option<QName> {
        if self.is_element() {
            let tag = self.tag_name();
            Some(QName::new(tag.namespace(), tag.name()))
        } else {
            self.pi().map(|pi| QName::local(pi.target))
        }
    }

    fn children(&self) -> Vec<Self> {
        roxmltree::Node::children(self).collect()
    }

    fn attributes(&self) -> Vec<(QName, String)> {
        roxmltree::Node::attributes(self)
            .map(|a| (QName::new(a.namespace(), a.name()), a.value().to_string()))
            .collect()
    }

    fn string_value(&self) -> String {
        match self.node_type() {
            roxmltree::NodeType::Root | roxmltree::NodeType::Element => self
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect(),
            roxmltree::NodeType::PI => self
                .pi()
                .and_then(|pi| pi.value)
                .unwrap_or_default()
                .to_string(),
            _ => self.text().unwrap_or_default().to_string(),
        }
    }

    fn lookup_namespace(&self, prefix: Option<&str>) -> Option<String> {
        self.lookup_namespace_uri(prefix).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert!(doc.root.is_none());
    }

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root().unwrap();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children.len(), 1);
        let child = root.child_elements().next().unwrap();
        assert_eq!(child.local_name(), "child");
        assert_eq!(child.text(), "text");
    }

    #[test]
    fn test_parse_resolves_namespaces() {
        let xml = r#"<p:root xmlns:p="urn:p" xmlns="urn:d" p:a="1" b="2"><child/></p:root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root().unwrap();
        assert_eq!(root.qname, QName::namespaced("urn:p", "root"));
        assert_eq!(root.get_attribute(&QName::namespaced("urn:p", "a")), Some("1"));
        assert_eq!(root.get_attribute(&QName::local("b")), Some("2"));
        assert_eq!(root.attributes.len(), 2);

        let child = root.child_elements().next().unwrap();
        assert_eq!(child.qname, QName::namespaced("urn:d", "child"));
    }

    #[test]
    fn test_parse_keeps_mixed_content() {
        let xml = "<r>one<!--c--><b/>two<?pi data?></r>";
        let doc = Document::from_string(xml).unwrap();
        let node = doc.root_node().unwrap();

        let kinds: Vec<NodeKind> = node.children().iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Text,
                NodeKind::Comment,
                NodeKind::Element,
                NodeKind::Text,
                NodeKind::ProcessingInstruction
            ]
        );
        assert_eq!(node.string_value(), "onetwo");
    }

    #[test]
    fn test_parse_rejects_unclosed() {
        assert!(Document::from_string("<a><b></a>").is_err());
        assert!(Document::from_string("").is_err());
    }

    #[test]
    fn test_whitespace_text() {
        let doc = Document::from_string("<r>\n  <a/>\n</r>").unwrap();
        let children = doc.root_node().unwrap().children();
        assert!(children[0].is_whitespace_text());
        assert!(!children[1].is_whitespace_text());
    }

    #[test]
    fn test_roxmltree_adapter() {
        let xml = r#"<r xmlns="urn:r" a="1"><x>hi</x><!--c--></r>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let root = doc.root_element();

        assert_eq!(root.kind(), NodeKind::Element);
        assert_eq!(XmlNode::name(&root), Some(QName::namespaced("urn:r", "r")));
        assert_eq!(
            XmlNode::attribute(&root, &QName::local("a")),
            Some("1".to_string())
        );
        let children = XmlNode::children(&root);
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].kind(), NodeKind::Comment);
        assert_eq!(XmlNode::string_value(&root), "hi");
        assert_eq!(
            XmlNode::lookup_namespace(&root, None),
            Some("urn:r".to_string())
        );
    }

    #[test]
    fn test_node_kind_display() {
        assert_eq!(NodeKind::Text.to_string(), "text()");
        assert_eq!(
            NodeKind::ProcessingInstruction.to_string(),
            "processing-instruction()"
        );
    }
}
