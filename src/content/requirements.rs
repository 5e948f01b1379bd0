//! Required names and the read-only "intelligent choice" search
//!
//! An indicator needs, per repetition holding attachments, whatever that
//! repetition still lacks, plus the fresh-instance requirements of every
//! repetition missing below its `min`. A committed choice repetition needs
//! what its chosen alternative lacks; with backtracking enabled the other
//! alternatives are tried on scratch trees first, so the real tree is never
//! modified.

use std::sync::Arc;

use crate::models::GrammarNode;

use super::tree::{ContainerTree, NodeId, Repetition, Slot};

impl<R: Clone + PartialEq> ContainerTree<R> {
    /// Unsatisfied required leaf names in document order; empty when complete
    pub fn required_names(&self, backtrack: bool) -> Vec<String> {
        let mut out = Vec::new();
        self.requirements_of(self.root, backtrack, &mut out);
        out
    }

    /// True when nothing below `id` is missing
    pub fn is_satisfied(&self, id: NodeId) -> bool {
        let mut out = Vec::new();
        self.requirements_of(id, false, &mut out);
        out.is_empty()
    }

    pub(crate) fn repetition_satisfied(&self, repetition: &Repetition) -> bool {
        let mut out = Vec::new();
        self.repetition_requirements(repetition, false, &mut out);
        out.is_empty()
    }

    fn requirements_of(&self, id: NodeId, backtrack: bool, out: &mut Vec<String>) {
        match self.slot(id) {
            Some(Slot::Leaf(leaf)) => {
                if !leaf.bound.is_satisfied_by(leaf.attached.len() as u32) {
                    out.push(leaf.name.clone());
                }
            }
            Some(Slot::Indicator(indicator)) => {
                let mut filled = 0u32;
                for repetition in &indicator.repetitions {
                    if self.count_in(repetition) > 0 {
                        filled += 1;
                        self.repetition_requirements(repetition, backtrack, out);
                    }
                }

                let missing = indicator.grammar.bound().min.saturating_sub(filled);
                if missing > 0 {
                    let once = indicator.grammar.fresh_repetition_requirements();
                    for _ in 0..missing {
                        out.extend(once.iter().cloned());
                    }
                }
            }
            None => {}
        }
    }

    fn repetition_requirements(&self, repetition: &Repetition, backtrack: bool, out: &mut Vec<String>) {
        match repetition {
            Repetition::Sequence(members) => {
                for member in members {
                    self.requirements_of(*member, backtrack, out);
                }
            }
            Repetition::Group(expansion) => self.requirements_of(*expansion, backtrack, out),
            Repetition::Choice { alternatives, chosen } => {
                let Some(index) = *chosen else {
                    return;
                };
                let Some(&alternative) = alternatives.get(index) else {
                    return;
                };

                let mut current = Vec::new();
                self.requirements_of(alternative, backtrack, &mut current);
                if current.is_empty() || !backtrack {
                    out.extend(current);
                    return;
                }

                out.extend(self.best_alternative(repetition, index, current));
            }
        }
    }

    /// Remaining requirements of the most promising alternative: the first
    /// one (declared order) that would be complete, else the one missing the
    /// fewest names
    fn best_alternative(&self, repetition: &Repetition, chosen: usize, current: Vec<String>) -> Vec<String> {
        let Some(grammars) = self.choice_grammars(repetition) else {
            return current;
        };
        let tags: Vec<String> = repetition
            .children()
            .iter()
            .flat_map(|c| self.tags_under(*c))
            .collect();

        let mut best: Option<Vec<String>> = None;
        for (index, grammar) in grammars.iter().enumerate() {
            let remaining = if index == chosen {
                current.clone()
            } else {
                match hypothetical_requirements(grammar, &tags) {
                    Some(remaining) => remaining,
                    None => continue,
                }
            };

            if remaining.is_empty() {
                log::trace!("choice alternative {} would complete the content", index);
                return remaining;
            }
            if best.as_ref().map_or(true, |b| remaining.len() < b.len()) {
                best = Some(remaining);
            }
        }
        best.unwrap_or(current)
    }

    /// Alternative grammars of the choice owning `repetition`
    fn choice_grammars(&self, repetition: &Repetition) -> Option<Vec<Arc<GrammarNode>>> {
        let first = *repetition.children().first()?;
        let owner = self.parent_of(first)?;
        match self.slot(owner) {
            Some(Slot::Indicator(indicator)) => match &*indicator.grammar {
                GrammarNode::Choice { alternatives, .. } => Some(alternatives.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Tags attached below `id`, document order
    pub(crate) fn tags_under(&self, id: NodeId) -> Vec<String> {
        match self.slot(id) {
            Some(Slot::Leaf(leaf)) => vec![leaf.name.clone(); leaf.attached.len()],
            Some(Slot::Indicator(indicator)) => indicator
                .repetitions
                .iter()
                .flat_map(|r| r.children().iter().flat_map(|c| self.tags_under(*c)))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Requirements left if `tags` were placed into a fresh instance of
/// `grammar`; `None` when some tag does not fit at all
fn hypothetical_requirements(grammar: &Arc<GrammarNode>, tags: &[String]) -> Option<Vec<String>> {
    let mut scratch: ContainerTree<()> = ContainerTree::instantiate(grammar.clone());
    for tag in tags {
        scratch.add(tag, (), None).ok()?;
    }
    Some(scratch.required_names(true))
}
