//! Grammar compiler
//!
//! Translates a schema fragment (a complex type's sequence / choice / group
//! content) into an immutable `GrammarNode` tree. Group references are
//! resolved once and their compiled expansion is shared by every reference.
//! Results are memoized by type name, so compiling a type twice returns the
//! same `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Bound, GrammarNode};

use super::errors::{CompileError, CompileResult};

/// Kind of a content-model fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Sequence,
    Choice,
    Group,
    Element,
}

/// One node of a raw content model, as exposed by the schema reader
pub trait SchemaFragment: Sized {
    /// Indicator or element kind; unsupported constructs are an error
    fn kind(&self) -> CompileResult<FragmentKind>;
    /// Occurrence bound from `minOccurs` / `maxOccurs`
    fn bound(&self) -> CompileResult<Bound>;
    /// Child fragments in declared order
    fn children(&self) -> Vec<Self>;
    /// Referenced group name (for `Group` fragments)
    fn group_ref(&self) -> Option<String>;
    /// Tag name (for `Element` fragments)
    fn element_name(&self) -> Option<String>;
    /// Declared type of an element, if any
    fn type_name(&self) -> Option<String>;
}

/// Lookup of named content models and groups
pub trait FragmentSource {
    type Fragment: SchemaFragment;

    /// Content-model fragment of a type; `Ok(None)` if the type has no
    /// element content (simple or empty types)
    fn content_model(&self, type_name: &str) -> CompileResult<Option<Self::Fragment>>;

    /// The indicator inside a named `xs:group` definition
    fn group_definition(&self, name: &str) -> Option<Self::Fragment>;
}

/// Memoizing compiler over one fragment source
pub struct GrammarCompiler<'s, S: FragmentSource> {
    source: &'s S,
    types: HashMap<String, Option<Arc<GrammarNode>>>,
    groups: HashMap<String, Arc<GrammarNode>>,
    active_groups: Vec<String>,
}

impl<'s, S: FragmentSource> GrammarCompiler<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self {
            source,
            types: HashMap::new(),
            groups: HashMap::new(),
            active_groups: Vec::new(),
        }
    }

    /// Compile (or fetch from the cache) the content model of `type_name`
    pub fn compile_type(&mut self, type_name: &str) -> CompileResult<Option<Arc<GrammarNode>>> {
        if let Some(cached) = self.types.get(type_name) {
            return Ok(cached.clone());
        }

        let compiled = match self.source.content_model(type_name)? {
            Some(fragment) => Some(self.compile_fragment(&fragment)?),
            None => None,
        };

        match &compiled {
            Some(grammar) => log::debug!(
                "compiled content model of '{}' ({} element names, depth {})",
                type_name,
                grammar.element_names().len(),
                grammar.depth()
            ),
            None => log::trace!("type '{}' has no element content", type_name),
        }

        self.types.insert(type_name.to_string(), compiled.clone());
        Ok(compiled)
    }

    /// Compile one fragment and everything below it
    pub fn compile_fragment(&mut self, fragment: &S::Fragment) -> CompileResult<Arc<GrammarNode>> {
        let bound = fragment.bound()?;

        match fragment.kind()? {
            FragmentKind::Element => {
                let name = fragment.element_name().ok_or(CompileError::MissingElementName)?;
                Ok(Arc::new(GrammarNode::Element {
                    name,
                    type_name: fragment.type_name(),
                    bound,
                }))
            }
            FragmentKind::Sequence => {
                let members = self.compile_children(fragment)?;
                Ok(GrammarNode::sequence(members, bound))
            }
            FragmentKind::Choice => {
                let alternatives = self.compile_children(fragment)?;
                Ok(GrammarNode::choice(alternatives, bound))
            }
            FragmentKind::Group => {
                let name = fragment
                    .group_ref()
                    .ok_or_else(|| CompileError::UnsupportedConstruct("group without ref".to_string()))?;
                let expansion = self.compile_group(&name)?;
                Ok(GrammarNode::group(name, expansion, bound))
            }
        }
    }

    fn compile_children(&mut self, fragment: &S::Fragment) -> CompileResult<Vec<Arc<GrammarNode>>> {
        fragment
            .children()
            .iter()
            .map(|child| self.compile_fragment(child))
            .collect()
    }

    fn compile_group(&mut self, name: &str) -> CompileResult<Arc<GrammarNode>> {
        if self.active_groups.iter().any(|g| g == name) {
            let mut path = self.active_groups.clone();
            path.push(name.to_string());
            return Err(CompileError::CyclicGroup(path));
        }

        if let Some(cached) = self.groups.get(name) {
            return Ok(cached.clone());
        }

        let definition = self
            .source
            .group_definition(name)
            .ok_or_else(|| CompileError::UnresolvedGroup(name.to_string()))?;

        self.active_groups.push(name.to_string());
        let result = self.compile_fragment(&definition);
        self.active_groups.pop();

        let expansion = result?;
        self.groups.insert(name.to_string(), expansion.clone());
        Ok(expansion)
    }

    /// Number of types compiled so far
    pub fn cached_types(&self) -> usize {
        self.types.len()
    }

    /// Hand over the type cache
    pub fn into_cache(self) -> HashMap<String, Option<Arc<GrammarNode>>> {
        self.types
    }
}
