//! Minimal XML element tree.
//!
//! Content descriptors only use elements and attributes, so the tree keeps
//! exactly that: a name, attributes in document order, and child elements.
//! Text nodes, comments and processing instructions are dropped on parse.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::util::{Error, Result};

/// One XML element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute that must be present.
    pub fn required_attribute(&self, name: &str) -> Result<&str> {
        self.attribute(name).ok_or_else(|| {
            Error::invalid(format!("<{}> is missing attribute '{}'", self.name, name))
        })
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Builder-style [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn add_child(&mut self, child: XmlNode) -> &mut XmlNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// First child with the given element name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Children with the given element name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Parse a document and return its root element.
    pub fn parse(text: &str) -> Result<XmlNode> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event().map_err(Error::xml)? {
                Event::Start(ref e) => stack.push(element_from(e)?),
                Event::Empty(ref e) => {
                    let node = element_from(e)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| Error::xml("unbalanced closing tag"))?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::xml(format!("unclosed element <{}>", stack[stack.len() - 1].name)));
        }
        root.ok_or_else(|| Error::xml("document has no root element"))
    }

    /// Parse UTF-8 bytes.
    pub fn parse_bytes(bytes: &[u8]) -> Result<XmlNode> {
        let text = std::str::from_utf8(bytes).map_err(Error::xml)?;
        Self::parse(text.trim_start_matches('\u{feff}'))
    }

    /// Write as an indented document with an XML declaration.
    pub fn write<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(Error::xml)?;
        self.write_element(&mut writer)
    }

    /// Serialize to a string.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    fn write_element<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start)).map_err(Error::xml)?;
            return Ok(());
        }

        writer.write_event(Event::Start(start)).map_err(Error::xml)?;
        for child in &self.children {
            child.write_element(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(Error::xml)?;
        Ok(())
    }
}

fn element_from(e: &BytesStart<'_>) -> Result<XmlNode> {
    let mut node = XmlNode::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(Error::xml)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(Error::xml)?.into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(Error::xml("multiple root elements")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let doc = r#"<?xml version="1.0"?>
            <Skeleton bonesCount="2">
              <!-- comment -->
              <Bone name="Root" parentIndex="0">
                <Children><Child index="1"/></Children>
              </Bone>
              <Bone name="Spine" parentIndex="0"/>
            </Skeleton>"#;
        let root = XmlNode::parse(doc).unwrap();
        assert_eq!(root.name, "Skeleton");
        assert_eq!(root.attribute("bonesCount"), Some("2"));
        assert_eq!(root.children_named("Bone").count(), 2);

        let first = &root.children[0];
        let child = first.child("Children").unwrap().child("Child").unwrap();
        assert_eq!(child.attribute("index"), Some("1"));
        assert!(root.attribute("missing").is_none());
        assert!(root.required_attribute("missing").is_err());
    }

    #[test]
    fn test_write_and_reparse() {
        let mut root = XmlNode::new("Strings");
        root.add_child(
            XmlNode::new("String")
                .with_attribute("id", "greeting")
                .with_attribute("text", "Fish & \"Chips\" <now>"),
        );
        let text = root.to_xml_string().unwrap();
        assert!(text.starts_with("<?xml"));

        let back = XmlNode::parse(&text).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn test_malformed() {
        assert!(XmlNode::parse("<a><b></a>").is_err());
        assert!(XmlNode::parse("").is_err());
        assert!(XmlNode::parse("<a/><b/>").is_err());
    }

    #[test]
    fn test_set_attribute_replaces() {
        let mut node = XmlNode::new("Material").with_attribute("name", "a");
        node.set_attribute("name", "b");
        assert_eq!(node.attributes.len(), 1);
        assert_eq!(node.attribute("name"), Some("b"));
    }
}
