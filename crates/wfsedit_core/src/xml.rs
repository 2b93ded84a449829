//! Minimal element tree serialized once through `quick_xml`.

use crate::error::{Result, WfsError};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// A node inside an [`XmlElement`].
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = XmlElement>) -> Self {
        self.children
            .extend(children.into_iter().map(XmlNode::Element));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Serialize the tree. Text and attribute values are escaped.
    ///
    /// # Errors
    /// Returns [`WfsError::Xml`] when the writer fails.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner()).map_err(xml_error)
    }
}

fn xml_error<E: std::fmt::Display>(err: E) -> WfsError {
    WfsError::Xml(err.to_string())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }
    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    for child in &element.children {
        match child {
            XmlNode::Element(inner) => write_element(writer, inner)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)
}

#[cfg(test)]
mod tests {
    use super::XmlElement;

    #[test]
    fn empty_elements_self_close() {
        let xml = XmlElement::new("ogc:FeatureId")
            .attr("fid", "roads.7")
            .to_xml_string()
            .expect("serialize");
        assert_eq!(xml, r#"<ogc:FeatureId fid="roads.7"/>"#);
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let xml = XmlElement::new("ne:name")
            .attr("note", "a\"b")
            .text("Fish & <Chips>")
            .to_xml_string()
            .expect("serialize");
        assert!(xml.contains("Fish &amp; &lt;Chips&gt;"), "{}", xml);
        assert!(xml.contains("a&quot;b"), "{}", xml);
    }
}
