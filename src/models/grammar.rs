//! Compiled content-model grammar
//!
//! A `GrammarNode` tree is the immutable form of one complex type's content
//! model. It is built once by the compiler, shared through `Arc`, and cloned
//! into a fresh `ContainerTree` for every document node of that type.

use serde::Serialize;
use std::sync::Arc;

use super::bound::Bound;

/// One compiled indicator or element declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GrammarNode {
    /// Terminal slot accepting children whose tag equals `name`
    Element {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        type_name: Option<String>,
        bound: Bound,
    },
    /// Members satisfied left to right
    Sequence {
        members: Vec<Arc<GrammarNode>>,
        bound: Bound,
    },
    /// One alternative per repetition
    Choice {
        alternatives: Vec<Arc<GrammarNode>>,
        bound: Bound,
    },
    /// Named group reference, expansion inlined at compile time
    Group {
        name: String,
        expansion: Arc<GrammarNode>,
        bound: Bound,
    },
}

impl GrammarNode {
    pub fn element(name: impl Into<String>, bound: Bound) -> Arc<Self> {
        Arc::new(GrammarNode::Element { name: name.into(), type_name: None, bound })
    }

    pub fn typed_element(name: impl Into<String>, type_name: impl Into<String>, bound: Bound) -> Arc<Self> {
        Arc::new(GrammarNode::Element {
            name: name.into(),
            type_name: Some(type_name.into()),
            bound,
        })
    }

    pub fn sequence(members: Vec<Arc<GrammarNode>>, bound: Bound) -> Arc<Self> {
        Arc::new(GrammarNode::Sequence { members, bound })
    }

    pub fn choice(alternatives: Vec<Arc<GrammarNode>>, bound: Bound) -> Arc<Self> {
        Arc::new(GrammarNode::Choice { alternatives, bound })
    }

    pub fn group(name: impl Into<String>, expansion: Arc<GrammarNode>, bound: Bound) -> Arc<Self> {
        Arc::new(GrammarNode::Group { name: name.into(), expansion, bound })
    }

    /// Occurrence bound of this node
    pub fn bound(&self) -> Bound {
        match self {
            GrammarNode::Element { bound, .. }
            | GrammarNode::Sequence { bound, .. }
            | GrammarNode::Choice { bound, .. }
            | GrammarNode::Group { bound, .. } => *bound,
        }
    }

    /// Short label for logs ("element pitch", "choice", "group full-note")
    pub fn label(&self) -> String {
        match self {
            GrammarNode::Element { name, .. } => format!("element {}", name),
            GrammarNode::Sequence { .. } => "sequence".to_string(),
            GrammarNode::Choice { .. } => "choice".to_string(),
            GrammarNode::Group { name, .. } => format!("group {}", name),
        }
    }

    /// Direct children (members, alternatives or the group expansion)
    pub fn children(&self) -> &[Arc<GrammarNode>] {
        match self {
            GrammarNode::Element { .. } => &[],
            GrammarNode::Sequence { members, .. } => members,
            GrammarNode::Choice { alternatives, .. } => alternatives,
            GrammarNode::Group { expansion, .. } => std::slice::from_ref(expansion),
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, GrammarNode::Element { .. })
    }

    /// All element names in the subtree, declared order, without duplicates
    pub fn element_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        match self {
            GrammarNode::Element { name, .. } => {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
            _ => {
                for child in self.children() {
                    child.collect_names(names);
                }
            }
        }
    }

    /// True if an element named `tag` occurs anywhere in the subtree
    pub fn contains_element(&self, tag: &str) -> bool {
        match self {
            GrammarNode::Element { name, .. } => name == tag,
            _ => self.children().iter().any(|c| c.contains_element(tag)),
        }
    }

    /// Declared type of the first element named `tag` in the subtree
    pub fn element_type(&self, tag: &str) -> Option<&str> {
        match self {
            GrammarNode::Element { name, type_name, .. } if name == tag => type_name.as_deref(),
            GrammarNode::Element { .. } => None,
            _ => self.children().iter().find_map(|c| c.element_type(tag)),
        }
    }

    /// Number of levels below and including this node
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(|c| c.depth()).max().unwrap_or(0)
    }

    /// Required leaf names of a fresh, empty instance of this node
    pub fn fresh_required_names(&self) -> Vec<String> {
        let bound = self.bound();
        if let GrammarNode::Element { name, .. } = self {
            return if bound.min >= 1 { vec![name.clone()] } else { Vec::new() };
        }
        let once = self.fresh_repetition_requirements();
        let mut names = Vec::with_capacity(once.len() * bound.min as usize);
        for _ in 0..bound.min {
            names.extend(once.iter().cloned());
        }
        names
    }

    /// Requirements of a single empty repetition, ignoring this node's own min
    pub(crate) fn fresh_repetition_requirements(&self) -> Vec<String> {
        match self {
            GrammarNode::Element { name, .. } => vec![name.clone()],
            GrammarNode::Sequence { members, .. } => {
                members.iter().flat_map(|m| m.fresh_required_names()).collect()
            }
            GrammarNode::Choice { alternatives, .. } => {
                let mut best: Option<Vec<String>> = None;
                for alternative in alternatives {
                    let names = alternative.fresh_required_names();
                    if best.as_ref().map_or(true, |b| names.len() < b.len()) {
                        let done = names.is_empty();
                        best = Some(names);
                        if done {
                            break;
                        }
                    }
                }
                best.unwrap_or_default()
            }
            GrammarNode::Group { expansion, .. } => expansion.fresh_required_names(),
        }
    }
}
