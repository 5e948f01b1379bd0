//! XML input
//!
//! Parses a document with roxmltree and rebuilds it through the content
//! engine, so every child lands in a slot of its parent's content model.

use roxmltree::{Document, Node};
use std::sync::Arc;

use crate::registry::Registry;
use crate::xsd::tree::strip_doctype;

use super::element::XmlElement;
use super::errors::{DocumentError, Result};

impl XmlElement {
    /// Parse `xml` and build the element tree rooted at its document element
    pub fn parse_xml(registry: &Arc<Registry>, xml: &str) -> Result<XmlElement> {
        let text = strip_doctype(xml);
        let doc = Document::parse(&text).map_err(|e| DocumentError::Xml(e.to_string()))?;
        let root = doc.root_element();

        let mut element = XmlElement::with_registry(registry, root.tag_name().name())?;
        fill(&mut element, root)?;
        log::debug!("read <{}> with {} children", element.tag(), element.child_count());
        Ok(element)
    }
}

fn fill(element: &mut XmlElement, node: Node) -> Result<()> {
    for attribute in node.attributes() {
        // namespaced attributes (xml:lang, xlink:href, ...) are not modelled
        if attribute.namespace().is_some() {
            continue;
        }
        element.set_attribute(attribute.name(), attribute.value())?;
    }

    let mut has_elements = false;
    for child in node.children().filter(Node::is_element) {
        has_elements = true;
        let mut built = element.new_child(child.tag_name().name())?;
        fill(&mut built, child)?;
        element.attach_child(built)?;
    }

    if !has_elements {
        if let Some(text) = node.text().map(str::trim).filter(|t| !t.is_empty()) {
            element.set_value(text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::errors::ContentError;

    const XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:complexType name="pitch">
            <xs:sequence>
                <xs:element name="step" type="xs:string"/>
                <xs:element name="octave" type="xs:integer"/>
            </xs:sequence>
        </xs:complexType>
        <xs:complexType name="note">
            <xs:sequence>
                <xs:element name="pitch" type="pitch"/>
                <xs:element name="duration" type="xs:positiveInteger"/>
            </xs:sequence>
            <xs:attribute name="default-x" type="xs:decimal"/>
        </xs:complexType>
        <xs:element name="note" type="note"/>
    </xs:schema>"#;

    fn registry() -> Arc<Registry> {
        Arc::new(Registry::from_xsd(XSD).unwrap())
    }

    #[test]
    fn test_strip_doctype() {
        let xml = "<?xml version=\"1.0\"?>\n<!DOCTYPE note PUBLIC \"x\" \"y\">\n<note/>";
        assert_eq!(strip_doctype(xml), "<?xml version=\"1.0\"?>\n<note/>");
        assert_eq!(strip_doctype("<note/>"), "<note/>");
    }

    #[test]
    fn test_parse_builds_tree() {
        let xml = r#"<!DOCTYPE note PUBLIC "-//Recordare//DTD MusicXML 4.0 Partwise//EN" "x.dtd">
            <note default-x="10"><pitch><step>C</step><octave>4</octave></pitch><duration> 2 </duration></note>"#;
        let note = XmlElement::parse_xml(&registry(), xml).unwrap();

        assert_eq!(note.attribute("default-x"), Some("10"));
        assert_eq!(note.find_child("duration").and_then(|d| d.value()), Some("2"));
        let pitch = note.find_child("pitch").unwrap();
        assert_eq!(pitch.type_name(), "pitch");
        assert_eq!(pitch.find_child("octave").and_then(|o| o.value()), Some("4"));
        assert!(note.required_child_names(false).is_empty());
    }

    #[test]
    fn test_parse_rejects_misplaced_child() {
        let xml = "<note><pitch><step>C</step><step>D</step></pitch></note>";
        assert!(matches!(
            XmlElement::parse_xml(&registry(), xml),
            Err(DocumentError::Content(ContentError::SlotSaturated { .. }))
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            XmlElement::parse_xml(&registry(), "<note>"),
            Err(DocumentError::Xml(_))
        ));
        assert!(matches!(
            XmlElement::parse_xml(&registry(), "<rest/>"),
            Err(DocumentError::UnknownElement(_))
        ));
        assert!(matches!(
            XmlElement::parse_xml(&registry(), r#"<note color="red"/>"#),
            Err(DocumentError::UnknownAttribute { .. })
        ));
    }
}
