//! Intelligent choice: re-laying out a container tree
//!
//! `add` commits greedily to the first reachable leaf, which can put a child
//! into a choice branch that later blocks a sibling (a MusicXML `pitch`
//! landing in the grace-note branch of `note`, so `duration` no longer
//! fits). A reflow rebuilds the tree from scratch and re-attaches every
//! child, exploring the other candidates depth first until a layout works.
//! The search is best effort: it gives up after `reflow_budget` attempts.
//! The original tree is only replaced once a complete layout is found.

use crate::settings::EngineSettings;

use super::errors::ContentResult;
use super::tree::{ContainerTree, LeafId};

struct Search<'a, R> {
    entries: &'a [(String, R)],
    require_complete: bool,
    budget: usize,
    steps: usize,
}

impl<'a, R: Clone + PartialEq> Search<'a, R> {
    fn run(&mut self, tree: ContainerTree<R>, index: usize) -> Option<ContainerTree<R>> {
        if index == self.entries.len() {
            if self.require_complete && !tree.required_names(false).is_empty() {
                return None;
            }
            return Some(tree);
        }

        let entries = self.entries;
        let (tag, item) = &entries[index];
        let options = tree.candidates(tag).options();
        for hint in 0..options {
            self.steps += 1;
            if self.steps > self.budget {
                return None;
            }
            let mut next = tree.clone();
            if next.add(tag, item.clone(), Some(hint)).is_err() {
                continue;
            }
            if let Some(done) = self.run(next, index + 1) {
                return Some(done);
            }
        }
        None
    }
}

impl<R: Clone + PartialEq> ContainerTree<R> {
    /// A fresh layout holding every attached child (and `extra`, tried at
    /// each document position from the end), or `None` if the search fails
    pub fn reflowed(&self, extra: Option<(String, R)>, budget: usize, require_complete: bool) -> Option<Self> {
        let entries = self.entries();
        let mut search_steps = 0;

        let orders: Vec<Vec<(String, R)>> = match extra {
            None => vec![entries],
            Some(extra) => (0..=entries.len())
                .rev()
                .map(|at| {
                    let mut order = entries.clone();
                    order.insert(at, extra.clone());
                    order
                })
                .collect(),
        };

        for order in &orders {
            let mut search = Search {
                entries: order,
                require_complete,
                budget,
                steps: search_steps,
            };
            let fresh = ContainerTree::instantiate(self.grammar.clone());
            if let Some(tree) = search.run(fresh, 0) {
                log::debug!(
                    "reflowed {} children of {} after {} attempts",
                    order.len(),
                    self.grammar.label(),
                    search.steps
                );
                return Some(tree);
            }
            search_steps = search.steps;
            if search_steps > budget {
                log::debug!("reflow budget of {} exhausted", budget);
                break;
            }
        }
        None
    }

    /// `add`, falling back to a reflow that makes room for the new child
    pub fn add_or_reflow(
        &mut self,
        tag: &str,
        item: R,
        forward_hint: Option<usize>,
        settings: &EngineSettings,
    ) -> ContentResult<LeafId> {
        let error = match self.add(tag, item.clone(), forward_hint) {
            Ok(leaf) => return Ok(leaf),
            Err(error) => error,
        };
        if !settings.intelligent_choice || !error.is_no_slot() {
            return Err(error);
        }

        match self.reflowed(Some((tag.to_string(), item.clone())), settings.reflow_budget, false) {
            Some(tree) => {
                *self = tree;
                self.leaf_of(&item).ok_or(error)
            }
            None => Err(error),
        }
    }

    /// Make the tree complete by re-layout if greedy choices left required
    /// content missing; true if the tree is complete afterwards
    pub fn resolve_choices(&mut self, settings: &EngineSettings) -> bool {
        if self.required_names(false).is_empty() {
            return true;
        }
        if !settings.intelligent_choice {
            return false;
        }
        match self.reflowed(None, settings.reflow_budget, true) {
            Some(tree) => {
                *self = tree;
                true
            }
            None => false,
        }
    }
}
