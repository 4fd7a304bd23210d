//! Response body codecs.
//!
//! JSON and XML decoding are host capabilities. They are injected through the
//! [`JsonCodec`] and [`XmlCodec`] traits and bundled in [`Codecs`]. The two
//! follow different failure conventions: a JSON codec fails with an error, an
//! XML codec always produces a document and marks parse failures inside it.

use crate::base::neterror::NetError;
use crate::http::digest::{ResponseKind, ResponseType};
use std::rc::Rc;

/// Error raised by a JSON codec.
pub type CodecError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Parses JSON response bodies.
pub trait JsonCodec {
    fn parse(&self, text: &str) -> Result<serde_json::Value, CodecError>;
}

/// Parses XML response bodies.
pub trait XmlCodec {
    /// Parse `text`. Invalid input yields a document whose
    /// [`XmlDocument::parse_error`] is set.
    fn parse(&self, text: &str) -> XmlDocument;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonCodec;

impl JsonCodec for SerdeJsonCodec {
    fn parse(&self, text: &str) -> Result<serde_json::Value, CodecError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// An owned XML document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlDocument {
    root: Option<XmlElement>,
    parse_error: Option<String>,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self {
            root: Some(root),
            parse_error: None,
        }
    }

    /// A document describing a parse failure.
    pub fn with_parse_error(message: impl Into<String>) -> Self {
        Self {
            root: None,
            parse_error: Some(message.into()),
        }
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.root.as_ref()
    }

    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    pub fn is_well_formed(&self) -> bool {
        self.parse_error.is_none()
    }
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// A child of an [`XmlElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First descendant element (depth-first) with the given local name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text content of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// XML codec backed by `roxmltree`.
#[cfg(feature = "xml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RoxmlCodec;

#[cfg(feature = "xml")]
impl XmlCodec for RoxmlCodec {
    fn parse(&self, text: &str) -> XmlDocument {
        match roxmltree::Document::parse(text) {
            Ok(doc) => XmlDocument::new(convert_element(doc.root_element())),
            Err(e) => XmlDocument::with_parse_error(e.to_string()),
        }
    }
}

#[cfg(feature = "xml")]
fn convert_element(node: roxmltree::Node<'_, '_>) -> XmlElement {
    let tag = node.tag_name();
    let mut element = XmlElement::new(tag.name());
    element.namespace = tag.namespace().map(str::to_owned);
    element.attributes = node
        .attributes()
        .map(|a| (a.name().to_owned(), a.value().to_owned()))
        .collect();

    for child in node.children() {
        if child.is_element() {
            element.children.push(XmlNode::Element(convert_element(child)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.children.push(XmlNode::Text(text.to_owned()));
            }
        }
    }

    element
}

/// The decoding capabilities available to a client.
#[derive(Clone)]
pub struct Codecs {
    json: Option<Rc<dyn JsonCodec>>,
    xml: Option<Rc<dyn XmlCodec>>,
}

impl Default for Codecs {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Codecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codecs")
            .field("json", &self.json.is_some())
            .field("xml", &self.xml.is_some())
            .finish()
    }
}

impl Codecs {
    /// `serde_json` for JSON and, with the `xml` feature, `roxmltree` for XML.
    ///
    /// Without the `xml` feature there is no XML codec, so requests using
    /// [`ResponseType::Auto`] fail with `CodecUnavailable(Xml)` until one is
    /// supplied with [`with_xml`](Self::with_xml).
    pub fn standard() -> Self {
        #[cfg(feature = "xml")]
        let xml: Option<Rc<dyn XmlCodec>> = Some(Rc::new(RoxmlCodec));
        #[cfg(not(feature = "xml"))]
        let xml: Option<Rc<dyn XmlCodec>> = None;

        Self {
            json: Some(Rc::new(SerdeJsonCodec)),
            xml,
        }
    }

    /// No decoding capability at all; only text responses can be handled.
    pub fn none() -> Self {
        Self {
            json: None,
            xml: None,
        }
    }

    pub fn with_json(mut self, codec: impl JsonCodec + 'static) -> Self {
        self.json = Some(Rc::new(codec));
        self
    }

    pub fn with_xml(mut self, codec: impl XmlCodec + 'static) -> Self {
        self.xml = Some(Rc::new(codec));
        self
    }

    pub fn without_json(mut self) -> Self {
        self.json = None;
        self
    }

    pub fn without_xml(mut self) -> Self {
        self.xml = None;
        self
    }

    pub fn json(&self) -> Option<&dyn JsonCodec> {
        self.json.as_deref()
    }

    pub fn xml(&self) -> Option<&dyn XmlCodec> {
        self.xml.as_deref()
    }

    /// Check that every codec `response_type` may need is present.
    ///
    /// `Auto` may resolve to either JSON or XML, so it needs both. The check
    /// runs before any transport is created, whatever the response turns out
    /// to be.
    pub fn ensure_available(&self, response_type: ResponseType) -> Result<(), NetError> {
        let needs_json = matches!(response_type, ResponseType::Auto | ResponseType::Json);
        let needs_xml = matches!(response_type, ResponseType::Auto | ResponseType::Xml);

        if needs_json && self.json.is_none() {
            return Err(NetError::CodecUnavailable(ResponseKind::Json));
        }
        if needs_xml && self.xml.is_none() {
            return Err(NetError::CodecUnavailable(ResponseKind::Xml));
        }
        Ok(())
    }
}
