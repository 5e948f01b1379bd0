//! XML output
//!
//! Elements are written in content-model order. Before writing, every
//! element gets a chance to fix greedy choice commitments; an element still
//! missing required children afterwards is refused.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use super::element::XmlElement;
use super::errors::{DocumentError, Result};

fn write_error(error: impl std::fmt::Display) -> DocumentError {
    DocumentError::Write(error.to_string())
}

impl XmlElement {
    /// Resolve choices in the whole subtree and check that it is complete
    pub fn finalize(&mut self) -> Result<()> {
        for child in self.children_mut() {
            child.finalize()?;
        }
        if !self.resolve_choices() {
            let missing = self.required_child_names(false);
            log::warn!("<{}> is incomplete: missing {:?}", self.tag(), missing);
            return Err(DocumentError::IncompleteContent {
                element: self.tag().to_string(),
                missing,
            });
        }
        Ok(())
    }

    /// Check the subtree without changing it
    pub fn validate(&self) -> Result<()> {
        let missing = self.required_child_names(false);
        if !missing.is_empty() {
            return Err(DocumentError::IncompleteContent {
                element: self.tag().to_string(),
                missing,
            });
        }
        if self.registry().settings().check_required_attributes {
            let missing = self.missing_required_attributes();
            if !missing.is_empty() {
                return Err(DocumentError::MissingAttributes {
                    element: self.tag().to_string(),
                    missing,
                });
            }
        }
        self.children().into_iter().try_for_each(XmlElement::validate)
    }

    /// Finalize and serialize this element and its subtree
    pub fn to_xml_string(&mut self) -> Result<String> {
        self.finalize()?;
        let mut out = Vec::new();
        self.write_xml(&mut out)?;
        String::from_utf8(out).map_err(write_error)
    }

    /// `to_xml_string` with an XML declaration in front
    pub fn to_document_string(&mut self) -> Result<String> {
        self.finalize()?;
        self.validate()?;
        let mut out = Vec::new();
        {
            let mut writer = self.xml_writer(&mut out);
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))
                .map_err(write_error)?;
            self.write_element(&mut writer)?;
        }
        String::from_utf8(out).map_err(write_error)
    }

    /// Serialize an already complete subtree
    pub fn write_xml<W: Write>(&self, out: W) -> Result<()> {
        self.validate()?;
        let mut writer = self.xml_writer(out);
        self.write_element(&mut writer)
    }

    fn xml_writer<W: Write>(&self, out: W) -> Writer<W> {
        match self.registry().settings().indent {
            0 => Writer::new(out),
            indent => Writer::new_with_indent(out, b' ', indent),
        }
    }

    fn write_element<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.tag());
        for (name, value) in self.attributes() {
            start.push_attribute((name, value));
        }

        let children = self.children();
        if children.is_empty() && self.value().is_none() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if let Some(value) = self.value() {
            writer
                .write_event(Event::Text(BytesText::new(value)))
                .map_err(write_error)?;
        }
        for child in children {
            child.write_element(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.tag())))
            .map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::settings::EngineSettings;
    use std::sync::Arc;

    const XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:complexType name="note">
            <xs:sequence>
                <xs:choice>
                    <xs:sequence>
                        <xs:element name="grace" type="empty"/>
                        <xs:element name="step" type="xs:string"/>
                    </xs:sequence>
                    <xs:sequence>
                        <xs:element name="step" type="xs:string"/>
                        <xs:element name="duration" type="xs:positiveInteger"/>
                    </xs:sequence>
                </xs:choice>
                <xs:element name="lyric" type="xs:string" minOccurs="0"/>
            </xs:sequence>
            <xs:attribute name="id" type="xs:ID" use="required"/>
        </xs:complexType>
        <xs:complexType name="empty"/>
        <xs:element name="note" type="note"/>
    </xs:schema>"#;

    fn registry(settings: EngineSettings) -> Arc<Registry> {
        Arc::new(Registry::from_xsd(XSD).unwrap().with_settings(settings))
    }

    #[test]
    fn test_write_resolves_greedy_choice() {
        let registry = registry(EngineSettings::default());
        let mut note = XmlElement::with_registry(&registry, "note").unwrap();
        let step = note.new_child("step").unwrap().with_value("C");
        note.add_child(step, None).unwrap();
        // greedy placement chose the grace branch
        assert_eq!(note.required_child_names(false), vec!["grace"]);

        let duration = note.new_child("duration").unwrap().with_value(2);
        note.attach_child(duration).unwrap();
        let xml = note.to_xml_string().unwrap();
        assert!(xml.contains("<step>C</step>"));
        assert!(xml.find("<step>").unwrap() < xml.find("<duration>").unwrap());
    }

    #[test]
    fn test_incomplete_content_is_refused() {
        let registry = registry(EngineSettings::default());
        let mut note = XmlElement::with_registry(&registry, "note").unwrap();
        note.append_value("lyric", "la").unwrap();

        match note.to_xml_string() {
            Err(DocumentError::IncompleteContent { element, missing }) => {
                assert_eq!(element, "note");
                assert_eq!(missing, vec!["grace", "step"]);
            }
            other => panic!("expected incomplete content, got {:?}", other),
        }
    }

    #[test]
    fn test_escaping_and_empty_elements() {
        let registry = registry(EngineSettings {
            indent: 0,
            ..EngineSettings::default()
        });
        let mut note = XmlElement::with_registry(&registry, "note").unwrap();
        note.set_attribute("id", "a&b").unwrap();
        note.append("grace").unwrap();
        note.append_value("step", "<C>").unwrap();

        let xml = note.to_xml_string().unwrap();
        assert_eq!(xml, r#"<note id="a&amp;b"><grace/><step>&lt;C&gt;</step></note>"#);
    }

    #[test]
    fn test_required_attributes_checked_when_enabled() {
        let registry = registry(EngineSettings {
            check_required_attributes: true,
            ..EngineSettings::default()
        });
        let mut note = XmlElement::with_registry(&registry, "note").unwrap();
        note.append("grace").unwrap();
        note.append_value("step", "D").unwrap();

        assert!(matches!(
            note.to_xml_string(),
            Err(DocumentError::MissingAttributes { .. })
        ));
        note.set_attribute("id", "n1").unwrap();
        assert!(note.to_xml_string().is_ok());
    }

    #[test]
    fn test_document_declaration() {
        let registry = registry(EngineSettings::default());
        let mut note = XmlElement::with_registry(&registry, "note").unwrap();
        note.append("grace").unwrap();
        note.append_value("step", "E").unwrap();
        let xml = note.to_document_string().unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#));
    }
}
