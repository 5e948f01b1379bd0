//! Container trees
//!
//! A `ContainerTree` is the live, per-document-node instance of a compiled
//! grammar. Slots live in one owned arena and refer to each other by index;
//! pruning a repetition clears its slots instead of freeing pointers.
//!
//! Every indicator owns a list of repetitions. The first repetition is
//! always materialized; further ones are appended when a repeatable
//! indicator runs out of room (duplication) and pruned again once emptied.

use serde::Serialize;
use std::sync::Arc;

use crate::models::{Bound, GrammarNode};

/// Index of a slot in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

/// Index of a leaf slot, returned by `add` for bookkeeping
pub type LeafId = NodeId;

/// Terminal slot holding attached children in order
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<R> {
    pub name: String,
    pub bound: Bound,
    pub attached: Vec<R>,
}

impl<R> Leaf<R> {
    pub fn is_saturated(&self) -> bool {
        !self.bound.allows_more(self.attached.len() as u32)
    }
}

/// One materialized repetition of an indicator
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Repetition {
    Sequence(Vec<NodeId>),
    Choice { alternatives: Vec<NodeId>, chosen: Option<usize> },
    Group(NodeId),
}

impl Repetition {
    pub(crate) fn children(&self) -> &[NodeId] {
        match self {
            Repetition::Sequence(members) => members,
            Repetition::Choice { alternatives, .. } => alternatives,
            Repetition::Group(expansion) => std::slice::from_ref(expansion),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Indicator {
    pub(crate) grammar: Arc<GrammarNode>,
    pub(crate) repetitions: Vec<Repetition>,
}

#[derive(Debug, Clone)]
pub(crate) enum Slot<R> {
    Leaf(Leaf<R>),
    Indicator(Indicator),
}

#[derive(Debug, Clone)]
pub(crate) struct Node<R> {
    pub(crate) slot: Slot<R>,
    pub(crate) parent: Option<NodeId>,
}

/// Live content-model instance owned by one document node
#[derive(Debug, Clone)]
pub struct ContainerTree<R> {
    pub(crate) grammar: Arc<GrammarNode>,
    pub(crate) nodes: Vec<Option<Node<R>>>,
    pub(crate) root: NodeId,
}

/// Structural summary of a tree: attachment counts and chosen alternatives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeSnapshot {
    Leaf { name: String, attached: usize },
    Indicator { label: String, repetitions: Vec<RepetitionSnapshot> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepetitionSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen: Option<usize>,
    pub children: Vec<TreeSnapshot>,
}

impl<R: Clone + PartialEq> ContainerTree<R> {
    /// Structural clone of `grammar` with no attachments
    pub fn instantiate(grammar: Arc<GrammarNode>) -> Self {
        let mut tree = ContainerTree {
            grammar: grammar.clone(),
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.build(&grammar, None);
        tree
    }

    pub(crate) fn build(&mut self, grammar: &Arc<GrammarNode>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        match &**grammar {
            GrammarNode::Element { name, bound, .. } => {
                self.nodes.push(Some(Node {
                    slot: Slot::Leaf(Leaf {
                        name: name.clone(),
                        bound: *bound,
                        attached: Vec::new(),
                    }),
                    parent,
                }));
            }
            _ => {
                self.nodes.push(Some(Node {
                    slot: Slot::Indicator(Indicator {
                        grammar: grammar.clone(),
                        repetitions: Vec::new(),
                    }),
                    parent,
                }));
                let first = self.build_repetition(grammar, id);
                if let Some(indicator) = self.indicator_mut(id) {
                    indicator.repetitions.push(first);
                }
            }
        }
        id
    }

    /// Fresh repetition of an indicator grammar, children owned by `owner`
    pub(crate) fn build_repetition(&mut self, grammar: &Arc<GrammarNode>, owner: NodeId) -> Repetition {
        match &**grammar {
            GrammarNode::Sequence { members, .. } => {
                Repetition::Sequence(members.iter().map(|m| self.build(m, Some(owner))).collect())
            }
            GrammarNode::Choice { alternatives, .. } => Repetition::Choice {
                alternatives: alternatives.iter().map(|a| self.build(a, Some(owner))).collect(),
                chosen: None,
            },
            GrammarNode::Group { expansion, .. } => Repetition::Group(self.build(expansion, Some(owner))),
            GrammarNode::Element { .. } => Repetition::Group(self.build(grammar, Some(owner))),
        }
    }

    pub fn grammar(&self) -> &Arc<GrammarNode> {
        &self.grammar
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node<R>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn slot(&self, id: NodeId) -> Option<&Slot<R>> {
        self.node(id).map(|n| &n.slot)
    }

    pub(crate) fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub(crate) fn indicator_mut(&mut self, id: NodeId) -> Option<&mut Indicator> {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(Node { slot: Slot::Indicator(indicator), .. }) => Some(indicator),
            _ => None,
        }
    }

    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> Option<&mut Leaf<R>> {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(Node { slot: Slot::Leaf(leaf), .. }) => Some(leaf),
            _ => None,
        }
    }

    /// Leaf slot by id
    pub fn leaf(&self, id: LeafId) -> Option<&Leaf<R>> {
        match self.slot(id) {
            Some(Slot::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    /// Number of materialized repetitions of an indicator (1 for leaves)
    pub fn repetitions(&self, id: NodeId) -> usize {
        match self.slot(id) {
            Some(Slot::Indicator(indicator)) => indicator.repetitions.len(),
            Some(Slot::Leaf(_)) => 1,
            None => 0,
        }
    }

    /// Position of `child` in its parent: (parent, repetition, index)
    pub(crate) fn position_of(&self, child: NodeId) -> Option<(NodeId, usize, usize)> {
        let parent = self.parent_of(child)?;
        let Some(Slot::Indicator(indicator)) = self.slot(parent) else {
            return None;
        };
        indicator.repetitions.iter().enumerate().find_map(|(r, rep)| {
            rep.children()
                .iter()
                .position(|c| *c == child)
                .map(|i| (parent, r, i))
        })
    }

    /// Attachments in the subtree of `id`
    pub(crate) fn count_under(&self, id: NodeId) -> usize {
        match self.slot(id) {
            Some(Slot::Leaf(leaf)) => leaf.attached.len(),
            Some(Slot::Indicator(indicator)) => {
                indicator.repetitions.iter().map(|r| self.count_in(r)).sum()
            }
            None => 0,
        }
    }

    pub(crate) fn count_in(&self, repetition: &Repetition) -> usize {
        repetition.children().iter().map(|c| self.count_under(*c)).sum()
    }

    /// Free a subtree's slots
    pub(crate) fn release(&mut self, id: NodeId) {
        let children: Vec<NodeId> = match self.slot(id) {
            Some(Slot::Indicator(indicator)) => indicator
                .repetitions
                .iter()
                .flat_map(|r| r.children().iter().copied())
                .collect(),
            _ => Vec::new(),
        };
        for child in children {
            self.release(child);
        }
        if let Some(entry) = self.nodes.get_mut(id.0) {
            *entry = None;
        }
    }

    /// Live leaves in document order
    pub(crate) fn leaves_in_order(&self) -> Vec<LeafId> {
        let mut out = Vec::new();
        self.collect_leaves(self.root, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<LeafId>) {
        match self.slot(id) {
            Some(Slot::Leaf(_)) => out.push(id),
            Some(Slot::Indicator(indicator)) => {
                for repetition in &indicator.repetitions {
                    for child in repetition.children() {
                        self.collect_leaves(*child, out);
                    }
                }
            }
            None => {}
        }
    }

    /// Attached children in document order
    pub fn items(&self) -> Vec<R> {
        self.entries().into_iter().map(|(_, item)| item).collect()
    }

    /// `(tag, child)` pairs in document order
    pub fn entries(&self) -> Vec<(String, R)> {
        self.leaves_in_order()
            .into_iter()
            .filter_map(|id| self.leaf(id))
            .flat_map(|leaf| leaf.attached.iter().map(move |item| (leaf.name.clone(), item.clone())))
            .collect()
    }

    /// Leaf currently holding `item`
    pub fn leaf_of(&self, item: &R) -> Option<LeafId> {
        self.leaves_in_order()
            .into_iter()
            .find(|id| self.leaf(*id).map_or(false, |leaf| leaf.attached.contains(item)))
    }

    /// Total number of attachments
    pub fn attached_count(&self) -> usize {
        self.count_under(self.root)
    }

    /// Number of attached children with tag `tag`
    pub fn count_of(&self, tag: &str) -> usize {
        self.leaves_in_order()
            .into_iter()
            .filter_map(|id| self.leaf(id))
            .filter(|leaf| leaf.name == tag)
            .map(|leaf| leaf.attached.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.attached_count() == 0
    }

    /// Slots still alive in the arena
    pub fn live_slots(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Structural summary for comparisons and debugging dumps
    pub fn snapshot(&self) -> TreeSnapshot {
        self.snapshot_of(self.root)
    }

    fn snapshot_of(&self, id: NodeId) -> TreeSnapshot {
        match self.slot(id) {
            Some(Slot::Leaf(leaf)) => TreeSnapshot::Leaf {
                name: leaf.name.clone(),
                attached: leaf.attached.len(),
            },
            Some(Slot::Indicator(indicator)) => TreeSnapshot::Indicator {
                label: indicator.grammar.label(),
                repetitions: indicator
                    .repetitions
                    .iter()
                    .map(|rep| RepetitionSnapshot {
                        chosen: match rep {
                            Repetition::Choice { chosen, .. } => *chosen,
                            _ => None,
                        },
                        children: rep.children().iter().map(|c| self.snapshot_of(*c)).collect(),
                    })
                    .collect(),
            },
            None => TreeSnapshot::Leaf {
                name: String::new(),
                attached: 0,
            },
        }
    }
}
