//! Navigation tree diffing
//!
//! Compares two snapshots and produces the ordered transitions that take the
//! UI from the first to the second. Only nodes that are on screen, or about
//! to be, are visited: the active path plus every subtree that still has a
//! view from an earlier transition.

use crate::destination::{Destination, DestinationKey};
use crate::tree::{NavigationTree, NodeRef};
use smallvec::SmallVec;
use std::fmt;

/// A node addressed by an instruction, detached from the tree it came from
pub struct TransitionTarget<V> {
    pub destination: Destination<V>,
    /// Absent for a root node
    pub parent: Option<Destination<V>>,
}

impl<V> TransitionTarget<V> {
    fn of(node: NodeRef<'_, V>) -> Self {
        Self {
            destination: node.value().clone(),
            parent: node.parent().map(|parent| parent.value().clone()),
        }
    }

    /// `node` addressed through `parent` of the current snapshot
    fn under(node: NodeRef<'_, V>, parent: NodeRef<'_, V>) -> Self {
        Self {
            destination: node.value().clone(),
            parent: Some(parent.value().clone()),
        }
    }
}

impl<V> Clone for TransitionTarget<V> {
    fn clone(&self) -> Self {
        Self {
            destination: self.destination.clone(),
            parent: self.parent.clone(),
        }
    }
}

impl<V> PartialEq for TransitionTarget<V> {
    fn eq(&self, other: &Self) -> bool {
        self.destination == other.destination && self.parent == other.parent
    }
}

/// One unit of required UI change
pub enum TransitionInstruction<V> {
    /// New node to materialize under its parent's view
    Push(TransitionTarget<V>),
    /// Existing node to remove; its descendants go with it
    Pop(TransitionTarget<V>),
    /// Coordinated replace of siblings under one parent
    Change {
        parent: Option<Destination<V>>,
        pop: Vec<Destination<V>>,
        push: Vec<Destination<V>>,
    },
    /// Only the active child of the target's parent moved
    SelectActiveChild(TransitionTarget<V>),
    /// The active child was selected again while already active
    ReselectActiveChild(TransitionTarget<V>),
}

impl<V> TransitionInstruction<V> {
    /// Short name of the instruction kind
    pub fn kind(&self) -> &'static str {
        match self {
            TransitionInstruction::Push(_) => "push",
            TransitionInstruction::Pop(_) => "pop",
            TransitionInstruction::Change { .. } => "change",
            TransitionInstruction::SelectActiveChild(_) => "select",
            TransitionInstruction::ReselectActiveChild(_) => "reselect",
        }
    }

    /// The destination whose view receives the instruction
    pub fn parent(&self) -> Option<&Destination<V>> {
        match self {
            TransitionInstruction::Push(target)
            | TransitionInstruction::Pop(target)
            | TransitionInstruction::SelectActiveChild(target)
            | TransitionInstruction::ReselectActiveChild(target) => target.parent.as_ref(),
            TransitionInstruction::Change { parent, .. } => parent.as_ref(),
        }
    }
}

impl<V> Clone for TransitionInstruction<V> {
    fn clone(&self) -> Self {
        match self {
            TransitionInstruction::Push(target) => TransitionInstruction::Push(target.clone()),
            TransitionInstruction::Pop(target) => TransitionInstruction::Pop(target.clone()),
            TransitionInstruction::Change { parent, pop, push } => TransitionInstruction::Change {
                parent: parent.clone(),
                pop: pop.clone(),
                push: push.clone(),
            },
            TransitionInstruction::SelectActiveChild(target) => {
                TransitionInstruction::SelectActiveChild(target.clone())
            }
            TransitionInstruction::ReselectActiveChild(target) => {
                TransitionInstruction::ReselectActiveChild(target.clone())
            }
        }
    }
}

impl<V> PartialEq for TransitionInstruction<V> {
    fn eq(&self, other: &Self) -> bool {
        use TransitionInstruction::*;
        match (self, other) {
            (Push(a), Push(b))
            | (Pop(a), Pop(b))
            | (SelectActiveChild(a), SelectActiveChild(b))
            | (ReselectActiveChild(a), ReselectActiveChild(b)) => a == b,
            (
                Change { parent: pa, pop: oa, push: ua },
                Change { parent: pb, pop: ob, push: ub },
            ) => pa == pb && oa == ob && ua == ub,
            _ => false,
        }
    }
}

/// Compact form used in logs: `push detail`, `change [a] -> [c]`
impl<V> fmt::Display for TransitionInstruction<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn keys<V>(destinations: &[Destination<V>]) -> String {
            destinations
                .iter()
                .map(|d| d.key().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            TransitionInstruction::Push(target)
            | TransitionInstruction::Pop(target)
            | TransitionInstruction::SelectActiveChild(target)
            | TransitionInstruction::ReselectActiveChild(target) => {
                write!(f, "{} {}", self.kind(), target.destination.key())
            }
            TransitionInstruction::Change { pop, push, .. } => {
                write!(f, "change [{}] -> [{}]", keys(pop), keys(push))
            }
        }
    }
}

impl<V> fmt::Debug for TransitionInstruction<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Ordered transitions between two snapshots
pub struct TreeDiff<V> {
    instructions: Vec<TransitionInstruction<V>>,
    rekeyed: Vec<(DestinationKey, DestinationKey)>,
}

impl<V> TreeDiff<V> {
    /// Compute the transitions from `previous` to `current`, assuming every
    /// node of `previous` has a view
    ///
    /// - nothing -> tree: push the active path, root first
    /// - tree -> nothing: pop the previous active path, leaf first
    /// - tree -> tree: compare level by level from the roots
    pub fn diff(previous: Option<&NavigationTree<V>>, current: Option<&NavigationTree<V>>) -> Self {
        Self::diff_shown(previous, current, |_| true)
    }

    /// Like [`diff`](Self::diff), with `shown` telling which destinations of
    /// `previous` actually have a view
    ///
    /// Retained nodes without a view are pushed once they join the active
    /// path. Removed nodes without a view are dropped silently. `shown` must
    /// hold for the parent of anything it holds for.
    pub fn diff_shown<F>(
        previous: Option<&NavigationTree<V>>,
        current: Option<&NavigationTree<V>>,
        shown: F,
    ) -> Self
    where
        F: Fn(&Destination<V>) -> bool,
    {
        let mut diff = Self {
            instructions: Vec::new(),
            rekeyed: Vec::new(),
        };

        match (previous, current) {
            (None, None) => {}
            (None, Some(current)) => {
                let root = current.root();
                diff.instructions.push(TransitionInstruction::Push(TransitionTarget::of(root)));
                push_active_chain_below(root, &mut diff.instructions);
            }
            (Some(previous), None) => {
                for node in previous.active_path().into_iter().rev() {
                    diff.instructions.push(TransitionInstruction::Pop(TransitionTarget::of(node)));
                }
            }
            (Some(previous), Some(current)) => {
                let (old_root, new_root) = (previous.root(), current.root());
                if old_root.value() == new_root.value() {
                    diff.walk(old_root, new_root, &shown);
                } else {
                    diff.instructions.push(TransitionInstruction::Change {
                        parent: None,
                        pop: vec![old_root.value().clone()],
                        push: vec![new_root.value().clone()],
                    });
                    push_active_chain_below(new_root, &mut diff.instructions);
                }
            }
        }

        tracing::debug!("Computed navigation diff: {} instructions", diff.instructions.len());
        diff
    }

    /// Check if there are any changes
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn instructions(&self) -> &[TransitionInstruction<V>] {
        &self.instructions
    }

    /// Retained destinations whose key differs between the snapshots, as
    /// `(previous, current)`
    ///
    /// Happens when a destination with a user identifier and an anonymous
    /// one share an instance identifier. Anything keyed by the previous
    /// form must move to the current one before the instructions run.
    pub fn rekeyed(&self) -> &[(DestinationKey, DestinationKey)] {
        &self.rekeyed
    }

    pub fn into_instructions(self) -> Vec<TransitionInstruction<V>> {
        self.instructions
    }

    /// Compare matched, shown nodes level by level
    ///
    /// Per level:
    /// - one shown child removed, none added: `Pop`
    /// - one child added, none removed: `Push`, plus its active chain when it is active
    /// - anything else structural: a single `Change` carrying both sets
    /// - active child moved to a retained sibling: `SelectActiveChild`
    /// - active child selected again: `ReselectActiveChild`
    /// - retained active child without a view: `Push` with its active chain
    ///
    /// The retained active child is visited first, then every other retained
    /// child that still has a view.
    fn walk<F>(&mut self, previous: NodeRef<'_, V>, current: NodeRef<'_, V>, shown: &F)
    where
        F: Fn(&Destination<V>) -> bool,
    {
        let out = &mut self.instructions;
        let mut pending = vec![(previous, current)];

        while let Some((previous, current)) = pending.pop() {
            if previous.value().key() != current.value().key() {
                self.rekeyed.push((previous.value().key(), current.value().key()));
            }

            let removed: SmallVec<[NodeRef<'_, V>; 4]> = previous
                .children()
                .filter(|old| shown(old.value()))
                .filter(|old| !current.children().any(|new| new.value() == old.value()))
                .collect();
            let added: SmallVec<[NodeRef<'_, V>; 4]> = current
                .children()
                .filter(|new| !previous.children().any(|old| old.value() == new.value()))
                .collect();

            match (removed.len(), added.len()) {
                (0, 0) => {}
                (1, 0) => out.push(TransitionInstruction::Pop(TransitionTarget::under(removed[0], current))),
                (0, 1) => out.push(TransitionInstruction::Push(TransitionTarget::of(added[0]))),
                _ => out.push(TransitionInstruction::Change {
                    parent: Some(current.value().clone()),
                    pop: removed.iter().map(|node| node.value().clone()).collect(),
                    push: added.iter().map(|node| node.value().clone()).collect(),
                }),
            }

            let active = current.active_child();
            let retained = |new: NodeRef<'_, V>| previous.children().find(|old| old.value() == new.value());

            let mut inactive: SmallVec<[(NodeRef<'_, V>, NodeRef<'_, V>); 4]> = SmallVec::new();
            for child in current.children() {
                if active.is_some_and(|active| active.id() == child.id()) {
                    continue;
                }
                if let Some(old) = retained(child).filter(|old| shown(old.value())) {
                    inactive.push((old, child));
                }
            }
            pending.extend(inactive.into_iter().rev());

            let Some(active) = active else {
                continue;
            };
            let Some(matched) = retained(active) else {
                // Added above; bring its active chain along
                push_active_chain_below(active, out);
                continue;
            };

            let was_active = previous
                .active_child()
                .is_some_and(|old| old.value() == active.value());

            if !shown(matched.value()) {
                out.push(TransitionInstruction::Push(TransitionTarget::of(active)));
                if !was_active {
                    out.push(TransitionInstruction::SelectActiveChild(TransitionTarget::of(active)));
                }
                push_active_chain_below(active, out);
                continue;
            }

            if !was_active {
                out.push(TransitionInstruction::SelectActiveChild(TransitionTarget::of(active)));
            } else if current.reselections() > previous.reselections() {
                out.push(TransitionInstruction::ReselectActiveChild(TransitionTarget::of(active)));
            }
            pending.push((matched, active));
        }
    }
}

impl<V> IntoIterator for TreeDiff<V> {
    type Item = TransitionInstruction<V>;
    type IntoIter = std::vec::IntoIter<TransitionInstruction<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.into_iter()
    }
}

/// Push every node on the active path strictly below `node`, top first
fn push_active_chain_below<V>(node: NodeRef<'_, V>, out: &mut Vec<TransitionInstruction<V>>) {
    let mut current = node;
    while let Some(next) = current.active_child() {
        out.push(TransitionInstruction::Push(TransitionTarget::of(next)));
        current = next;
    }
}
