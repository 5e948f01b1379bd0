//! Schema index over an `XsdTree`
//!
//! Collects the named complex types, groups, attribute groups and global
//! elements of one schema document and serves them to the grammar compiler
//! as `SchemaFragment`s. Anonymous complex types (an `xs:complexType` nested
//! directly in an `xs:element`, as MusicXML does for `part` and `measure`)
//! are hoisted under a synthetic name built from the element path, e.g.
//! `score-partwise/part/measure`; a `/` can never clash with a declared name.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::content::compiler::{FragmentKind, FragmentSource, SchemaFragment};
use crate::content::errors::{CompileError, CompileResult};
use crate::models::Bound;

use super::tree::{is_builtin_type, local_name, XsdTree};

/// One attribute a type declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDecl {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// `use="required"`
    pub required: bool,
}

/// Index of one parsed schema document
#[derive(Debug, Clone, Default)]
pub struct XsdSchema {
    complex_types: HashMap<String, Arc<XsdTree>>,
    simple_types: HashSet<String>,
    groups: HashMap<String, Arc<XsdTree>>,
    attribute_groups: HashMap<String, Arc<XsdTree>>,
    elements: BTreeMap<String, Option<String>>,
}

impl XsdSchema {
    /// Parse XSD text
    pub fn parse(text: &str) -> CompileResult<Self> {
        let root = XsdTree::parse(text)?;
        Ok(Self::from_tree(&root))
    }

    /// Read and parse an XSD file
    pub fn from_path(path: impl AsRef<Path>) -> CompileResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CompileError::Xml(format!("cannot read {}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    /// Index an already parsed `xs:schema` tree
    pub fn from_tree(root: &XsdTree) -> Self {
        let mut schema = XsdSchema::default();

        for child in &root.children {
            let name = child.name().map(str::to_string);
            match (child.tag.as_str(), name) {
                ("complexType", Some(name)) => {
                    let hoisted = schema.hoist(child, &name);
                    schema.complex_types.insert(name, Arc::new(hoisted));
                }
                ("simpleType", Some(name)) => {
                    schema.simple_types.insert(name);
                }
                ("group", Some(name)) => {
                    let hoisted = schema.hoist(child, &name);
                    schema.groups.insert(name, Arc::new(hoisted));
                }
                ("attributeGroup", Some(name)) => {
                    schema.attribute_groups.insert(name, child.clone());
                }
                ("element", Some(name)) => {
                    let hoisted = schema.hoist(child, "");
                    let type_name = hoisted.attribute("type").map(type_reference);
                    schema.elements.insert(name, type_name);
                }
                (tag, _) => log::trace!("skipping top-level xs:{}", tag),
            }
        }

        log::debug!(
            "indexed schema: {} complex types, {} groups, {} attribute groups, {} global elements",
            schema.complex_types.len(),
            schema.groups.len(),
            schema.attribute_groups.len(),
            schema.elements.len()
        );
        schema
    }

    /// Copy `node`, moving inline complex types of elements into the type
    /// index and pointing the element at the synthetic type name
    fn hoist(&mut self, node: &XsdTree, scope: &str) -> XsdTree {
        let mut copy = XsdTree::new(node.tag.clone());
        copy.attributes = node.attributes.clone();

        let element_scope = match (node.tag.as_str(), node.name()) {
            ("element", Some(name)) if scope.is_empty() => Some(name.to_string()),
            ("element", Some(name)) => Some(format!("{}/{}", scope, name)),
            _ => None,
        };

        for child in &node.children {
            match (&element_scope, child.tag.as_str()) {
                (Some(type_name), "complexType") => {
                    let hoisted = self.hoist(child, type_name);
                    self.complex_types.insert(type_name.clone(), Arc::new(hoisted));
                    copy.attributes.insert("type".to_string(), type_name.clone());
                }
                (Some(_), "simpleType") => {}
                _ => {
                    let inner = element_scope.as_deref().unwrap_or(scope);
                    copy.children.push(Arc::new(self.hoist(child, inner)));
                }
            }
        }
        copy
    }

    /// Declared type of a global element
    pub fn element_type(&self, tag: &str) -> Option<&str> {
        self.elements.get(tag).and_then(|t| t.as_deref())
    }

    /// Global element names with their types
    pub fn global_elements(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.elements.iter().map(|(name, t)| (name.as_str(), t.as_deref()))
    }

    /// Names of all complex types, including hoisted anonymous ones
    pub fn complex_type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.complex_types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn has_type(&self, type_name: &str) -> bool {
        is_builtin_type(type_name)
            || self.complex_types.contains_key(type_reference(type_name).as_str())
            || self.simple_types.contains(local_name(type_name))
    }

    /// Attribute declarations of a type, with attribute groups and simple
    /// content extensions expanded
    pub fn attributes(&self, type_name: &str) -> Vec<AttributeDecl> {
        let mut out = Vec::new();
        if let Some(node) = self.complex_types.get(type_reference(type_name).as_str()) {
            let mut visited = HashSet::new();
            self.collect_attributes(node, &mut out, &mut visited);
        }
        out
    }

    fn collect_attributes(&self, node: &XsdTree, out: &mut Vec<AttributeDecl>, visited: &mut HashSet<String>) {
        for child in &node.children {
            match child.tag.as_str() {
                "attribute" => {
                    let name = child.name().or_else(|| child.attribute("ref"));
                    if let Some(name) = name {
                        if child.attribute("use") == Some("prohibited") {
                            continue;
                        }
                        out.push(AttributeDecl {
                            name: name.to_string(),
                            type_name: child.attribute("type").map(str::to_string),
                            required: child.attribute("use") == Some("required"),
                        });
                    }
                }
                "attributeGroup" => {
                    let Some(reference) = child.attribute("ref").map(local_name) else {
                        continue;
                    };
                    if !visited.insert(reference.to_string()) {
                        continue;
                    }
                    match self.attribute_groups.get(reference) {
                        Some(group) => self.collect_attributes(group, out, visited),
                        None => log::warn!("unresolved attribute group '{}'", reference),
                    }
                }
                "simpleContent" | "complexContent" | "extension" | "restriction" => {
                    self.collect_attributes(child, out, visited);
                }
                _ => {}
            }
        }
    }
}

/// Normalize a `type=` reference to the key used in the type index
fn type_reference(qualified: &str) -> String {
    if is_builtin_type(qualified) || qualified.contains('/') {
        qualified.to_string()
    } else {
        local_name(qualified).to_string()
    }
}

impl FragmentSource for XsdSchema {
    type Fragment = Arc<XsdTree>;

    fn content_model(&self, type_name: &str) -> CompileResult<Option<Arc<XsdTree>>> {
        if is_builtin_type(type_name) {
            return Ok(None);
        }

        let key = type_reference(type_name);
        let Some(node) = self.complex_types.get(key.as_str()) else {
            if self.simple_types.contains(key.as_str()) {
                return Ok(None);
            }
            return Err(CompileError::UnresolvedType(key));
        };

        for child in &node.children {
            match child.tag.as_str() {
                "sequence" | "choice" | "group" => return Ok(Some(child.clone())),
                "all" | "complexContent" => {
                    return Err(CompileError::UnsupportedConstruct(format!(
                        "xs:{} in type '{}'",
                        child.tag, key
                    )))
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn group_definition(&self, name: &str) -> Option<Arc<XsdTree>> {
        let group = self.groups.get(local_name(name))?;
        group
            .children
            .iter()
            .find(|c| matches!(c.tag.as_str(), "sequence" | "choice" | "all"))
            .cloned()
    }
}

impl SchemaFragment for Arc<XsdTree> {
    fn kind(&self) -> CompileResult<FragmentKind> {
        match self.tag.as_str() {
            "sequence" => Ok(FragmentKind::Sequence),
            "choice" => Ok(FragmentKind::Choice),
            "group" => Ok(FragmentKind::Group),
            "element" => Ok(FragmentKind::Element),
            other => Err(CompileError::UnsupportedConstruct(format!("xs:{}", other))),
        }
    }

    fn bound(&self) -> CompileResult<Bound> {
        Bound::from_attributes(self.attribute("minOccurs"), self.attribute("maxOccurs"))
    }

    fn children(&self) -> Vec<Self> {
        self.children
            .iter()
            .filter(|c| matches!(c.tag.as_str(), "sequence" | "choice" | "group" | "element" | "any" | "all"))
            .cloned()
            .collect()
    }

    fn group_ref(&self) -> Option<String> {
        self.attribute("ref").map(|r| local_name(r).to_string())
    }

    fn element_name(&self) -> Option<String> {
        self.name()
            .or_else(|| self.attribute("ref").map(local_name))
            .map(str::to_string)
    }

    fn type_name(&self) -> Option<String> {
        self.attribute("type").map(type_reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:attributeGroup name="position">
            <xs:attribute name="default-x" type="tenths"/>
            <xs:attribute name="default-y" type="tenths"/>
        </xs:attributeGroup>
        <xs:simpleType name="tenths">
            <xs:restriction base="xs:decimal"/>
        </xs:simpleType>
        <xs:complexType name="empty-placement">
            <xs:attributeGroup ref="position"/>
            <xs:attribute name="placement" type="above-below"/>
        </xs:complexType>
        <xs:complexType name="beam">
            <xs:simpleContent>
                <xs:extension base="beam-value">
                    <xs:attribute name="number" type="beam-level" default="1"/>
                    <xs:attribute name="repeater" type="yes-no"/>
                </xs:extension>
            </xs:simpleContent>
        </xs:complexType>
        <xs:complexType name="tie">
            <xs:attribute name="type" type="start-stop" use="required"/>
        </xs:complexType>
        <xs:element name="score-partwise">
            <xs:complexType>
                <xs:sequence>
                    <xs:element name="part" maxOccurs="unbounded">
                        <xs:complexType>
                            <xs:sequence>
                                <xs:element name="measure" maxOccurs="unbounded">
                                    <xs:complexType>
                                        <xs:sequence>
                                            <xs:element name="note" type="xs:string" minOccurs="0" maxOccurs="unbounded"/>
                                        </xs:sequence>
                                        <xs:attribute name="number" type="xs:token" use="required"/>
                                    </xs:complexType>
                                </xs:element>
                            </xs:sequence>
                            <xs:attribute name="id" type="xs:IDREF" use="required"/>
                        </xs:complexType>
                    </xs:element>
                </xs:sequence>
                <xs:attribute name="version" type="xs:token" default="1.0"/>
            </xs:complexType>
        </xs:element>
    </xs:schema>"#;

    #[test]
    fn test_anonymous_types_are_hoisted() {
        let schema = XsdSchema::parse(XSD).unwrap();
        assert_eq!(schema.element_type("score-partwise"), Some("score-partwise"));
        let names = schema.complex_type_names();
        assert!(names.contains(&"score-partwise/part"));
        assert!(names.contains(&"score-partwise/part/measure"));

        let part = schema.content_model("score-partwise/part").unwrap().unwrap();
        let measure_decl = &SchemaFragment::children(&part)[0];
        assert_eq!(measure_decl.type_name().as_deref(), Some("score-partwise/part/measure"));
    }

    #[test]
    fn test_attribute_groups_are_expanded() {
        let schema = XsdSchema::parse(XSD).unwrap();
        let names: Vec<_> = schema
            .attributes("empty-placement")
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["default-x", "default-y", "placement"]);
    }

    #[test]
    fn test_simple_content_attributes() {
        let schema = XsdSchema::parse(XSD).unwrap();
        let attributes = schema.attributes("beam");
        assert_eq!(attributes.len(), 2);
        assert!(!attributes[0].required);
        assert!(schema.content_model("beam").unwrap().is_none());
    }

    #[test]
    fn test_required_attributes() {
        let schema = XsdSchema::parse(XSD).unwrap();
        let tie = schema.attributes("tie");
        assert_eq!(tie[0].name, "type");
        assert!(tie[0].required);

        let measure = schema.attributes("score-partwise/part/measure");
        assert_eq!(measure[0].name, "number");
        assert!(measure[0].required);
    }

    #[test]
    fn test_simple_types_have_no_content() {
        let schema = XsdSchema::parse(XSD).unwrap();
        assert!(schema.content_model("tenths").unwrap().is_none());
        assert!(schema.has_type("tenths"));
        assert!(schema.has_type("xs:string"));
        assert!(!schema.has_type("harmony"));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subset.xsd");
        std::fs::write(&path, XSD).unwrap();

        let schema = XsdSchema::from_path(&path).unwrap();
        assert!(schema.has_type("tie"));

        let missing = XsdSchema::from_path(dir.path().join("missing.xsd")).unwrap_err();
        assert!(matches!(missing, CompileError::Xml(_)));
    }
}
