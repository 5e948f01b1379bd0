//! Document nodes
//!
//! An `XmlElement` owns its children and a `ContainerTree` that decides
//! where each child sits in the element's content model. The tree only
//! stores `ChildHandle`s; the children themselves live in a map on the
//! element, so the tree never holds references into the document.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::content::errors::ContentError;
use crate::content::tree::{ContainerTree, LeafId};
use crate::registry::{self, Registry, TypeDescriptor};

use super::errors::{DocumentError, Result};

/// Identifies a child within its parent element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChildHandle(u32);

#[derive(Debug, Clone)]
pub struct XmlElement {
    tag: String,
    descriptor: Arc<TypeDescriptor>,
    registry: Arc<Registry>,
    value: Option<String>,
    attributes: BTreeMap<String, String>,
    content: Option<ContainerTree<ChildHandle>>,
    children: BTreeMap<ChildHandle, XmlElement>,
    next_handle: u32,
}

impl XmlElement {
    /// New element looked up in the process-wide registry
    pub fn new(tag: &str) -> Result<Self> {
        let registry = registry::global()?;
        Self::with_registry(&registry, tag)
    }

    /// New element looked up in `registry`
    pub fn with_registry(registry: &Arc<Registry>, tag: &str) -> Result<Self> {
        let descriptor = registry
            .element(tag)
            .ok_or_else(|| DocumentError::UnknownElement(tag.to_string()))?;
        Ok(Self::from_descriptor(registry, tag, descriptor))
    }

    fn from_descriptor(registry: &Arc<Registry>, tag: &str, descriptor: Arc<TypeDescriptor>) -> Self {
        let content = descriptor.content.clone().map(ContainerTree::instantiate);
        Self {
            tag: tag.to_string(),
            descriptor,
            registry: registry.clone(),
            value: None,
            attributes: BTreeMap::new(),
            content,
            children: BTreeMap::new(),
            next_handle: 0,
        }
    }

    /// New element typed the way this element's content model declares `tag`
    pub fn new_child(&self, tag: &str) -> Result<XmlElement> {
        let descriptor = self
            .registry
            .child_element(&self.descriptor, tag)
            .ok_or_else(|| DocumentError::UnknownElement(tag.to_string()))?;
        Ok(Self::from_descriptor(&self.registry, tag, descriptor))
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// True when the element's type has element-only content
    pub fn has_content_model(&self) -> bool {
        self.content.is_some()
    }

    // Value

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: impl ToString) -> &mut Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_value(mut self, value: impl ToString) -> Self {
        self.set_value(value);
        self
    }

    pub fn clear_value(&mut self) -> Option<String> {
        self.value.take()
    }

    // Attributes

    /// Set a declared attribute; undeclared names are rejected
    pub fn set_attribute(&mut self, name: &str, value: impl ToString) -> Result<&mut Self> {
        if !self.descriptor.declares_attribute(name) {
            return Err(DocumentError::UnknownAttribute {
                element: self.tag.clone(),
                attribute: name.to_string(),
            });
        }
        self.attributes.insert(name.to_string(), value.to_string());
        Ok(self)
    }

    pub fn with_attribute(mut self, name: &str, value: impl ToString) -> Result<Self> {
        self.set_attribute(name, value)?;
        Ok(self)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> Vec<(&str, &str)> {
        self.descriptor
            .attributes
            .iter()
            .filter_map(|decl| {
                self.attributes
                    .get_key_value(&decl.name)
                    .map(|(k, v)| (k.as_str(), v.as_str()))
            })
            .collect()
    }

    /// Names of required attributes that are not set
    pub fn missing_required_attributes(&self) -> Vec<String> {
        self.descriptor
            .required_attributes()
            .filter(|decl| !self.attributes.contains_key(&decl.name))
            .map(|decl| decl.name.clone())
            .collect()
    }

    // Children

    fn allocate_handle(&mut self) -> ChildHandle {
        let handle = ChildHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Attach `child` at the first slot that accepts it (or the
    /// `forward_hint`-th candidate); fails without side effects
    pub fn add_child(&mut self, child: XmlElement, forward_hint: Option<usize>) -> Result<ChildHandle> {
        let handle = self.allocate_handle();
        let content = self.content.as_mut().ok_or_else(|| ContentError::NoMatchingSlot {
            tag: child.tag.clone(),
        })?;
        content.add(&child.tag, handle, forward_hint)?;
        self.children.insert(handle, child);
        Ok(handle)
    }

    /// `add_child`, re-laying out existing children when a greedy choice
    /// leaves no room
    pub fn attach_child(&mut self, child: XmlElement) -> Result<ChildHandle> {
        let handle = self.allocate_handle();
        let settings = self.registry.settings().clone();
        let content = self.content.as_mut().ok_or_else(|| ContentError::NoMatchingSlot {
            tag: child.tag.clone(),
        })?;
        content.add_or_reflow(&child.tag, handle, None, &settings)?;
        self.children.insert(handle, child);
        Ok(handle)
    }

    /// Create a child typed by this element's content model, attach it and
    /// return it for further building
    pub fn append(&mut self, tag: &str) -> Result<&mut XmlElement> {
        let child = self.new_child(tag)?;
        let handle = self.attach_child(child)?;
        self.children.get_mut(&handle).ok_or(DocumentError::NoSuchChild)
    }

    /// `append` with a text value
    pub fn append_value(&mut self, tag: &str, value: impl ToString) -> Result<&mut XmlElement> {
        let child = self.append(tag)?;
        child.set_value(value);
        Ok(child)
    }

    /// Detach and return a child
    pub fn remove_child(&mut self, handle: ChildHandle) -> Result<XmlElement> {
        let content = self.content.as_mut().ok_or(ContentError::NotAttached)?;
        content.remove(&handle)?;
        self.children.remove(&handle).ok_or(DocumentError::NoSuchChild)
    }

    /// Put `new` in place of the child at `handle`; returns the old child
    pub fn replace_child(&mut self, handle: ChildHandle, new: XmlElement) -> Result<(ChildHandle, XmlElement)> {
        let old_tag = self
            .children
            .get(&handle)
            .map(|c| c.tag.clone())
            .ok_or(ContentError::NotFound)?;
        if old_tag != new.tag {
            return Err(ContentError::NoMatchingSlot { tag: new.tag }.into());
        }

        let replacement = self.allocate_handle();
        let content = self.content.as_mut().ok_or(ContentError::NotFound)?;
        content.replace(&handle, replacement)?;
        let old = self.children.remove(&handle).ok_or(DocumentError::NoSuchChild)?;
        self.children.insert(replacement, new);
        Ok((replacement, old))
    }

    /// Replace the first child with the same tag, or attach a new one
    pub fn set_child(&mut self, child: XmlElement) -> Result<ChildHandle> {
        match self.find_handle(&child.tag) {
            Some(handle) => self.replace_child(handle, child).map(|(handle, _)| handle),
            None => self.attach_child(child),
        }
    }

    /// Tags that `add_child` would currently accept
    pub fn possible_child_names(&self) -> BTreeSet<String> {
        self.content
            .as_ref()
            .map(|content| content.possible_names())
            .unwrap_or_default()
    }

    /// Required children still missing, document order
    pub fn required_child_names(&self, backtrack: bool) -> Vec<String> {
        self.content
            .as_ref()
            .map(|content| content.required_names(backtrack))
            .unwrap_or_default()
    }

    /// Re-lay out children if greedy choices left required content
    /// missing; true when nothing is missing afterwards
    pub fn resolve_choices(&mut self) -> bool {
        let settings = self.registry.settings().clone();
        match self.content.as_mut() {
            Some(content) => content.resolve_choices(&settings),
            None => true,
        }
    }

    /// Leaf slot currently holding the child
    pub fn leaf_of(&self, handle: ChildHandle) -> Option<LeafId> {
        self.content.as_ref().and_then(|content| content.leaf_of(&handle))
    }

    pub fn content(&self) -> Option<&ContainerTree<ChildHandle>> {
        self.content.as_ref()
    }

    /// Child handles in document order
    pub fn child_handles(&self) -> Vec<ChildHandle> {
        self.content.as_ref().map(|c| c.items()).unwrap_or_default()
    }

    /// Children in document order
    pub fn children(&self) -> Vec<&XmlElement> {
        self.child_handles()
            .iter()
            .filter_map(|handle| self.children.get(handle))
            .collect()
    }

    pub fn child(&self, handle: ChildHandle) -> Option<&XmlElement> {
        self.children.get(&handle)
    }

    pub fn child_mut(&mut self, handle: ChildHandle) -> Option<&mut XmlElement> {
        self.children.get_mut(&handle)
    }

    pub(crate) fn children_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.values_mut()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    fn find_handle(&self, tag: &str) -> Option<ChildHandle> {
        self.child_handles()
            .into_iter()
            .find(|handle| self.children.get(handle).map_or(false, |c| c.tag == tag))
    }

    /// First child with `tag`, document order
    pub fn find_child(&self, tag: &str) -> Option<&XmlElement> {
        self.find_handle(tag).and_then(|handle| self.children.get(&handle))
    }

    pub fn find_child_mut(&mut self, tag: &str) -> Option<&mut XmlElement> {
        let handle = self.find_handle(tag)?;
        self.children.get_mut(&handle)
    }

    /// All children with `tag`, document order
    pub fn find_children(&self, tag: &str) -> Vec<&XmlElement> {
        self.children().into_iter().filter(|c| c.tag == tag).collect()
    }
}
