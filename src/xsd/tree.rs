//! Owned, attributed XSD tree
//!
//! roxmltree documents borrow their source text. The schema has to outlive
//! the text it was loaded from (compiled grammars are process-wide), so the
//! parsed document is copied into a small owned tree of
//! `(tag, attributes, children)` triples.

use std::collections::BTreeMap;
use std::sync::Arc;

use roxmltree::Node;

use crate::content::errors::{CompileError, CompileResult};

pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Drop `<!DOCTYPE` lines; roxmltree rejects DTDs
pub(crate) fn strip_doctype(xml: &str) -> String {
    if !xml.contains("<!DOCTYPE") {
        return xml.to_string();
    }
    xml.lines()
        .filter(|line| !line.trim_start().starts_with("<!DOCTYPE"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One schema element: local tag name, attributes and element children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsdTree {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Arc<XsdTree>>,
}

impl XsdTree {
    /// Parse schema text and return the `xs:schema` root
    pub fn parse(text: &str) -> CompileResult<XsdTree> {
        let text = strip_doctype(text);
        let doc = roxmltree::Document::parse(&text)
            .map_err(|e| CompileError::Xml(format!("XML parse error: {}", e)))?;
        let root = doc.root_element();

        if root.tag_name().name() != "schema" {
            return Err(CompileError::Xml(format!(
                "Expected xs:schema root, found {}",
                root.tag_name().name()
            )));
        }

        Ok(Self::from_node(&root))
    }

    /// Copy a roxmltree element (and its element descendants in the XSD
    /// namespace, or without namespace) into an owned tree
    pub fn from_node(node: &Node) -> XsdTree {
        let attributes = node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();

        let children = node
            .children()
            .filter(|n| n.is_element())
            .filter(|n| matches!(n.tag_name().namespace(), None | Some(XS_NAMESPACE)))
            .map(|n| Arc::new(Self::from_node(&n)))
            .collect();

        XsdTree {
            tag: node.tag_name().name().to_string(),
            attributes,
            children,
        }
    }

    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_child(mut self, child: XsdTree) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// `name` attribute
    pub fn name(&self) -> Option<&str> {
        self.attribute("name")
    }

    pub fn find_child(&self, tag: &str) -> Option<&Arc<XsdTree>> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn find_children<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Arc<XsdTree>> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

/// Drop a namespace prefix (`xs:string` → `string`)
pub fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

/// True for references into the XML Schema namespace (`xs:token`)
pub fn is_builtin_type(qualified: &str) -> bool {
    matches!(qualified.split_once(':'), Some(("xs", _)) | Some(("xsd", _)))
}
