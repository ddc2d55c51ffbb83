//! Bookkeeping of which destinations have a view
//!
//! Folding every executed diff into a [`ShownSet`] reproduces what a view
//! layer holds without talking to one, so offline tools can feed
//! [`TreeDiff::diff_shown`] the same answers the orchestrator would.

use crate::destination::{Destination, DestinationKey};
use crate::diff::{TransitionInstruction, TreeDiff};
use ahash::AHashMap;

/// Destinations with a view, each linked to the destination hosting it
#[derive(Debug, Clone, Default)]
pub struct ShownSet {
    parents: AHashMap<DestinationKey, Option<DestinationKey>>,
}

impl ShownSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains<V>(&self, destination: &Destination<V>) -> bool {
        self.parents.contains_key(&destination.key())
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Apply a diff as if all of its instructions completed
    pub fn record<V>(&mut self, diff: &TreeDiff<V>) {
        for (previous, current) in diff.rekeyed() {
            self.rekey(previous, current);
        }
        for instruction in diff.instructions() {
            self.apply(instruction);
        }
    }

    fn apply<V>(&mut self, instruction: &TransitionInstruction<V>) {
        match instruction {
            TransitionInstruction::Push(target) => {
                let parent = target.parent.as_ref().map(Destination::key);
                self.parents.insert(target.destination.key(), parent);
            }
            TransitionInstruction::Pop(target) => self.remove(target.destination.key()),
            TransitionInstruction::Change { parent, pop, push } => {
                for destination in pop {
                    self.remove(destination.key());
                }
                let parent = parent.as_ref().map(Destination::key);
                for destination in push {
                    self.parents.insert(destination.key(), parent.clone());
                }
            }
            TransitionInstruction::SelectActiveChild(_) | TransitionInstruction::ReselectActiveChild(_) => {}
        }
    }

    fn rekey(&mut self, previous: &DestinationKey, current: &DestinationKey) {
        let Some(parent) = self.parents.remove(previous) else {
            return;
        };
        self.parents.insert(current.clone(), parent);
        for parent in self.parents.values_mut() {
            if parent.as_ref() == Some(previous) {
                *parent = Some(current.clone());
            }
        }
    }

    /// Drop `key` and everything nested under it
    fn remove(&mut self, key: DestinationKey) {
        let mut doomed = vec![key];
        while let Some(key) = doomed.pop() {
            self.parents.remove(&key);
            doomed.extend(
                self.parents
                    .iter()
                    .filter(|(_, parent)| parent.as_ref() == Some(&key))
                    .map(|(child, _)| child.clone()),
            );
        }
    }
}
