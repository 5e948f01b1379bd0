//! Attachment engine: add, remove, replace, possible names
//!
//! Reachability of a leaf for a tag:
//! - the leaf's name equals the tag and it is not saturated,
//! - every enclosing choice repetition is uncommitted or committed to the
//!   branch holding the leaf,
//! - the leaf is not behind a closed position. Inside a sequence a member
//!   closes once a later member holds attachments and the member itself is
//!   satisfied; across the repetitions of an indicator an earlier
//!   repetition closes the same way, and so does an empty one.
//!
//! When nothing is reachable, the innermost open repeatable indicator whose
//! grammar declares the tag gets a fresh repetition (duplication).

use std::collections::BTreeSet;

use super::errors::{ContentError, ContentResult};
use super::tree::{ContainerTree, LeafId, NodeId, Repetition, Slot};

/// Where `add` may put a child with a given tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Candidates {
    /// Reachable, unsaturated leaves in declared order
    pub(crate) leaves: Vec<LeafId>,
    /// Repeatable indicators that could take a fresh repetition, innermost first
    pub(crate) duplications: Vec<NodeId>,
}

impl Candidates {
    /// Number of distinct placements `add` can choose between
    pub(crate) fn options(&self) -> usize {
        if self.leaves.is_empty() {
            self.duplications.len()
        } else {
            self.leaves.len()
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.leaves.is_empty() && self.duplications.is_empty()
    }
}

impl<R: Clone + PartialEq> ContainerTree<R> {
    pub(crate) fn candidates(&self, tag: &str) -> Candidates {
        let mut candidates = Candidates::default();
        self.walk(self.root, tag, &mut candidates);
        candidates
    }

    fn walk(&self, id: NodeId, tag: &str, out: &mut Candidates) {
        match self.slot(id) {
            Some(Slot::Leaf(leaf)) => {
                if leaf.name == tag && !leaf.is_saturated() {
                    out.leaves.push(id);
                }
            }
            Some(Slot::Indicator(indicator)) => {
                let repetitions = &indicator.repetitions;
                let last_filled = repetitions.iter().rposition(|r| self.count_in(r) > 0);

                for (index, repetition) in repetitions.iter().enumerate() {
                    let behind = matches!(last_filled, Some(last) if last > index);
                    if behind && (self.repetition_satisfied(repetition) || self.count_in(repetition) == 0) {
                        continue;
                    }
                    self.walk_repetition(repetition, tag, out);
                }

                let bound = indicator.grammar.bound();
                if bound.allows_more(repetitions.len() as u32) && indicator.grammar.contains_element(tag) {
                    out.duplications.push(id);
                }
            }
            None => {}
        }
    }

    fn walk_repetition(&self, repetition: &Repetition, tag: &str, out: &mut Candidates) {
        match repetition {
            Repetition::Sequence(members) => {
                let last_filled = members.iter().rposition(|m| self.count_under(*m) > 0);
                for (index, member) in members.iter().enumerate() {
                    let behind = matches!(last_filled, Some(last) if last > index);
                    if behind && self.is_satisfied(*member) {
                        continue;
                    }
                    self.walk(*member, tag, out);
                }
            }
            Repetition::Choice { alternatives, chosen } => match chosen {
                Some(index) => {
                    if let Some(alternative) = alternatives.get(*index) {
                        self.walk(*alternative, tag, out);
                    }
                }
                None => {
                    for alternative in alternatives {
                        self.walk(*alternative, tag, out);
                    }
                }
            },
            Repetition::Group(expansion) => self.walk(*expansion, tag, out),
        }
    }

    /// Attach `item` under the leaf for `tag`
    ///
    /// With several reachable leaves, `forward_hint` picks the i-th one in
    /// declared order (default: the first). Fails without touching the tree.
    pub fn add(&mut self, tag: &str, item: R, forward_hint: Option<usize>) -> ContentResult<LeafId> {
        let candidates = self.candidates(tag);
        let hint = forward_hint.unwrap_or(0);

        if !candidates.leaves.is_empty() {
            let leaf = *candidates
                .leaves
                .get(hint)
                .ok_or_else(|| ContentError::NoMatchingSlot { tag: tag.to_string() })?;
            self.attach(leaf, item);
            return Ok(leaf);
        }

        let Some(&indicator) = candidates.duplications.get(hint) else {
            return Err(self.no_slot_error(tag));
        };

        let mark = self.nodes.len();
        let Some(repetition) = self.duplicate(indicator) else {
            return Err(self.no_slot_error(tag));
        };

        let mut inner = Candidates::default();
        if let Some(Slot::Indicator(ind)) = self.slot(indicator) {
            if let Some(fresh) = ind.repetitions.get(repetition) {
                self.walk_repetition(fresh, tag, &mut inner);
            }
        }

        match inner.leaves.first().copied() {
            Some(leaf) => {
                log::trace!(
                    "duplicated {} for <{}> (now {} repetitions)",
                    self.describe(indicator),
                    tag,
                    repetition + 1
                );
                self.attach(leaf, item);
                Ok(leaf)
            }
            None => {
                if let Some(ind) = self.indicator_mut(indicator) {
                    ind.repetitions.truncate(repetition);
                }
                self.nodes.truncate(mark);
                Err(self.no_slot_error(tag))
            }
        }
    }

    /// Append a fresh repetition to an indicator; returns its index
    fn duplicate(&mut self, indicator: NodeId) -> Option<usize> {
        let grammar = match self.slot(indicator) {
            Some(Slot::Indicator(ind)) => ind.grammar.clone(),
            _ => return None,
        };
        let repetition = self.build_repetition(&grammar, indicator);
        let ind = self.indicator_mut(indicator)?;
        ind.repetitions.push(repetition);
        Some(ind.repetitions.len() - 1)
    }

    fn no_slot_error(&self, tag: &str) -> ContentError {
        let matching: Vec<_> = self
            .leaves_in_order()
            .into_iter()
            .filter_map(|id| self.leaf(id))
            .filter(|leaf| leaf.name == tag)
            .collect();

        if !matching.is_empty() && matching.iter().all(|leaf| leaf.is_saturated()) {
            let max = matching[0].bound.max.as_finite().unwrap_or(u32::MAX);
            return ContentError::SlotSaturated { tag: tag.to_string(), max };
        }
        ContentError::NoMatchingSlot { tag: tag.to_string() }
    }

    fn describe(&self, id: NodeId) -> String {
        match self.slot(id) {
            Some(Slot::Indicator(ind)) => ind.grammar.label(),
            Some(Slot::Leaf(leaf)) => format!("element {}", leaf.name),
            None => "released slot".to_string(),
        }
    }

    /// Push `item` and commit every uncommitted choice on the way up
    fn attach(&mut self, leaf: LeafId, item: R) {
        if let Some(slot) = self.leaf_mut(leaf) {
            slot.attached.push(item);
        }

        let mut child = leaf;
        while let Some((parent, rep, index)) = self.position_of(child) {
            if let Some(indicator) = self.indicator_mut(parent) {
                if let Some(Repetition::Choice { chosen, .. }) = indicator.repetitions.get_mut(rep) {
                    if chosen.is_none() {
                        *chosen = Some(index);
                    }
                }
            }
            child = parent;
        }
    }

    /// Detach `item`; reopens emptied choices and prunes emptied repetitions
    /// other than the only one
    pub fn remove(&mut self, item: &R) -> ContentResult<LeafId> {
        let leaf = self.leaf_of(item).ok_or(ContentError::NotAttached)?;
        if let Some(slot) = self.leaf_mut(leaf) {
            if let Some(position) = slot.attached.iter().position(|a| a == item) {
                slot.attached.remove(position);
            }
        }
        self.settle(leaf);
        Ok(leaf)
    }

    fn settle(&mut self, leaf: LeafId) {
        let mut child = leaf;
        while let Some((parent, rep, _)) = self.position_of(child) {
            let empty = match self.slot(parent) {
                Some(Slot::Indicator(ind)) => ind.repetitions.get(rep).map_or(false, |r| self.count_in(r) == 0),
                _ => false,
            };

            if empty {
                let mut pruned = None;
                if let Some(indicator) = self.indicator_mut(parent) {
                    if let Some(Repetition::Choice { chosen, .. }) = indicator.repetitions.get_mut(rep) {
                        *chosen = None;
                    }
                    // the first live repetition takes over when the first one empties
                    if indicator.repetitions.len() > 1 {
                        pruned = Some(indicator.repetitions.remove(rep));
                    }
                }
                if let Some(repetition) = pruned {
                    log::trace!("pruned empty repetition {} of {}", rep, self.describe(parent));
                    for released in repetition.children() {
                        self.release(*released);
                    }
                }
            }
            child = parent;
        }
    }

    /// Swap `old` for `new` in place; repetitions and choices are untouched
    pub fn replace(&mut self, old: &R, new: R) -> ContentResult<LeafId> {
        let leaf = self.leaf_of(old).ok_or(ContentError::NotFound)?;
        let slot = self.leaf_mut(leaf).ok_or(ContentError::NotFound)?;
        let position = slot
            .attached
            .iter()
            .position(|a| a == old)
            .ok_or(ContentError::NotFound)?;
        slot.attached[position] = new;
        Ok(leaf)
    }

    /// Tags `add` would currently accept
    pub fn possible_names(&self) -> BTreeSet<String> {
        self.grammar
            .element_names()
            .into_iter()
            .filter(|tag| !self.candidates(tag).is_empty())
            .collect()
    }
}
