//! Element registry
//!
//! Maps tag names and type names to descriptors (compiled content model and
//! attribute declarations). A registry is built once from a schema and is
//! read-only afterwards; it can be passed around explicitly or installed as
//! the process-wide registry used by `XmlElement::new`.

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::content::compiler::GrammarCompiler;
use crate::content::errors::CompileResult;
use crate::document::errors::{DocumentError, Result};
use crate::models::GrammarNode;
use crate::settings::EngineSettings;
use crate::xsd::{AttributeDecl, XsdSchema};

static GLOBAL: OnceCell<Arc<Registry>> = OnceCell::new();

/// Everything a document node needs to know about its declared type
#[derive(Debug, Clone, Serialize)]
pub struct TypeDescriptor {
    pub name: String,
    /// Element-only content model; `None` for simple and empty types
    pub content: Option<Arc<GrammarNode>>,
    pub attributes: Vec<AttributeDecl>,
}

impl TypeDescriptor {
    /// Descriptor for an untyped or simple-typed element
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: None,
            attributes: Vec::new(),
        }
    }

    pub fn declares_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    pub fn required_attributes(&self) -> impl Iterator<Item = &AttributeDecl> {
        self.attributes.iter().filter(|a| a.required)
    }
}

/// Compiled schema: tag → type, type → descriptor
#[derive(Debug, Default)]
pub struct Registry {
    types: HashMap<String, Arc<TypeDescriptor>>,
    elements: BTreeMap<String, Option<String>>,
    settings: EngineSettings,
}

impl Registry {
    /// Compile every complex type of `schema` and index all element
    /// declarations; the first compile error aborts loading
    pub fn from_schema(schema: &XsdSchema) -> CompileResult<Self> {
        let mut compiler = GrammarCompiler::new(schema);
        let mut registry = Registry::default();

        for type_name in schema.complex_type_names() {
            let content = compiler.compile_type(type_name)?;
            registry.types.insert(
                type_name.to_string(),
                Arc::new(TypeDescriptor {
                    name: type_name.to_string(),
                    content,
                    attributes: schema.attributes(type_name),
                }),
            );
        }

        for (tag, type_name) in schema.global_elements() {
            registry.elements.insert(tag.to_string(), type_name.map(str::to_string));
        }

        let grammars: Vec<Arc<GrammarNode>> = registry
            .types
            .values()
            .filter_map(|t| t.content.clone())
            .collect();
        for grammar in &grammars {
            registry.index_local_elements(grammar);
        }

        log::info!(
            "element registry ready: {} types, {} element names",
            registry.types.len(),
            registry.elements.len()
        );
        Ok(registry)
    }

    /// Parse XSD text and build a registry from it
    pub fn from_xsd(text: &str) -> CompileResult<Self> {
        Self::from_schema(&XsdSchema::parse(text)?)
    }

    fn index_local_elements(&mut self, grammar: &GrammarNode) {
        match grammar {
            GrammarNode::Element { name, type_name, .. } => match self.elements.get(name) {
                None => {
                    self.elements.insert(name.clone(), type_name.clone());
                }
                Some(existing) if existing != type_name => {
                    log::debug!(
                        "<{}> declared with types {:?} and {:?}; tag lookup keeps the first",
                        name,
                        existing,
                        type_name
                    );
                }
                Some(_) => {}
            },
            _ => {
                for child in grammar.children() {
                    self.index_local_elements(child);
                }
            }
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Descriptor of a type; simple and builtin types get an empty one
    pub fn type_descriptor(&self, type_name: Option<&str>) -> Arc<TypeDescriptor> {
        match type_name.and_then(|t| self.types.get(t)) {
            Some(descriptor) => descriptor.clone(),
            None => Arc::new(TypeDescriptor::simple(type_name.unwrap_or("anyType"))),
        }
    }

    /// Descriptor for a tag looked up by name
    pub fn element(&self, tag: &str) -> Option<Arc<TypeDescriptor>> {
        let type_name = self.elements.get(tag)?;
        Some(self.type_descriptor(type_name.as_deref()))
    }

    /// Descriptor for `tag` declared inside a parent of type `parent`;
    /// falls back to the tag lookup
    pub fn child_element(&self, parent: &TypeDescriptor, tag: &str) -> Option<Arc<TypeDescriptor>> {
        let declared = parent
            .content
            .as_ref()
            .filter(|grammar| grammar.contains_element(tag))
            .map(|grammar| grammar.element_type(tag).map(str::to_string));

        match declared {
            Some(Some(type_name)) => Some(self.type_descriptor(Some(&type_name))),
            // `ref=` declarations carry no type of their own
            Some(None) => Some(self.element(tag).unwrap_or_else(|| self.type_descriptor(None))),
            None => self.element(tag),
        }
    }

    pub fn knows_element(&self, tag: &str) -> bool {
        self.elements.contains_key(tag)
    }

    /// Compiled content model of a type
    pub fn content_model(&self, type_name: &str) -> Option<Arc<GrammarNode>> {
        self.types.get(type_name).and_then(|t| t.content.clone())
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

/// Install the process-wide registry (once)
pub fn install(registry: Registry) -> Result<Arc<Registry>> {
    let registry = Arc::new(registry);
    GLOBAL
        .set(registry.clone())
        .map_err(|_| DocumentError::AlreadyInstalled)?;
    Ok(registry)
}

/// Install the registry built by `build` unless one is already installed
pub fn install_with<F>(build: F) -> Result<Arc<Registry>>
where
    F: FnOnce() -> CompileResult<Registry>,
{
    GLOBAL
        .get_or_try_init(|| build().map(Arc::new))
        .cloned()
        .map_err(DocumentError::from)
}

/// The process-wide registry
pub fn global() -> Result<Arc<Registry>> {
    GLOBAL.get().cloned().ok_or(DocumentError::RegistryNotInstalled)
}
