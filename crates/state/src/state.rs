//! Navigation state snapshots and the reducer
//!
//! Every transformation deep-copies the tree first and returns a new state,
//! so a snapshot handed out earlier never changes underneath its reader.

use crate::action::NavigationAction;
use nav_core::{Destination, NavigationTree, TreeError};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors that reject an action
///
/// Lookup failures are not errors: they are logged and leave the state
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("navigation tree rejected the action: {0}")]
    Tree(#[from] TreeError),
}

/// Immutable navigation snapshot
pub struct NavigationState<V> {
    root: Option<NavigationTree<V>>,
}

impl<V> NavigationState<V> {
    /// Empty state (no tree yet)
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(tree: NavigationTree<V>) -> Self {
        Self { root: Some(tree) }
    }

    /// The current tree, if any
    pub fn tree(&self) -> Option<&NavigationTree<V>> {
        self.root.as_ref()
    }

    /// Apply `action`, returning the new state
    ///
    /// Returns `Err` only when the tree rejects the mutation (duplicate
    /// identifiers). Unknown identifiers, removing the root and selecting a
    /// node that is not a child are reported and produce an unchanged copy.
    pub fn reduce(&self, action: NavigationAction<V>) -> crate::Result<Self> {
        debug!(%action, "reducing navigation action");
        match action {
            NavigationAction::SetRoot(destination) => Ok(Self::with_root(NavigationTree::new(destination))),
            NavigationAction::AddNewDestination(destination) => self.add_new_destination(destination),
            NavigationAction::RemoveDestination(instance_identifier) => {
                self.remove_destination(instance_identifier)
            }
            NavigationAction::RemoveCurrentDestination => self.remove_current_destination(),
            NavigationAction::AddChildren {
                parent,
                destinations,
                active,
            } => self.add_children(&parent, destinations, active),
            NavigationAction::ReplaceActiveChild { parent, destination } => {
                self.replace_active_child(&parent, destination)
            }
            NavigationAction::SelectChild { parent, child } => self.select_child(&parent, &child),
        }
    }

    /// Infallible form of [`reduce`](Self::reduce) for stores
    ///
    /// A rejected action is logged and the state is returned unchanged.
    pub fn apply(&self, action: NavigationAction<V>) -> Self {
        let name = action.name();
        match self.reduce(action) {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(action = name, error = %e, "navigation action rejected");
                self.clone()
            }
        }
    }

    fn add_new_destination(&self, destination: Destination<V>) -> crate::Result<Self> {
        let Some(mut tree) = self.copy_tree() else {
            return Ok(Self::with_root(NavigationTree::new(destination)));
        };
        tree.add_active_leaf(destination)?;
        Ok(Self::with_root(tree))
    }

    fn remove_destination(&self, instance_identifier: Uuid) -> crate::Result<Self> {
        let Some(mut tree) = self.copy_tree() else {
            warn!(%instance_identifier, "cannot remove destination from an empty navigation state");
            return Ok(Self::new());
        };
        let Some(node) = tree.find_by_instance_identifier(instance_identifier).map(|n| n.id()) else {
            warn!(%instance_identifier, "destination to remove was not found");
            return Ok(self.clone());
        };
        self.settle(tree.remove_node(node).map(|_| ()), tree)
    }

    fn remove_current_destination(&self) -> crate::Result<Self> {
        let Some(mut tree) = self.copy_tree() else {
            return Ok(Self::new());
        };
        let leaf = tree.active_leaf().id();
        self.settle(tree.remove_node(leaf).map(|_| ()), tree)
    }

    fn add_children(
        &self,
        parent: &str,
        destinations: Vec<Destination<V>>,
        active: Option<Destination<V>>,
    ) -> crate::Result<Self> {
        let Some((mut tree, parent_id)) = self.locate(parent) else {
            return Ok(self.clone());
        };
        let active_index = active.and_then(|active| {
            let index = destinations.iter().position(|d| *d == active);
            if index.is_none() {
                warn!(%parent, %active, "active destination is not among the added children");
            }
            index
        });
        tree.add_children(parent_id, destinations, active_index)?;
        Ok(Self::with_root(tree))
    }

    fn replace_active_child(&self, parent: &str, destination: Destination<V>) -> crate::Result<Self> {
        let Some((mut tree, parent_id)) = self.locate(parent) else {
            return Ok(self.clone());
        };
        tree.replace_active_child(parent_id, destination)?;
        Ok(Self::with_root(tree))
    }

    fn select_child(&self, parent: &str, child: &str) -> crate::Result<Self> {
        let Some((mut tree, parent_id)) = self.locate(parent) else {
            return Ok(self.clone());
        };
        let child_id = tree
            .get(parent_id)
            .and_then(|node| node.find(|n| n.value().user_identifier() == Some(child)))
            .map(|node| node.id());
        let Some(child_id) = child_id else {
            warn!(%parent, %child, "unable to find child to select");
            return Ok(self.clone());
        };
        self.settle(tree.select_active_child(parent_id, child_id), tree)
    }

    fn copy_tree(&self) -> Option<NavigationTree<V>> {
        self.root.as_ref().map(NavigationTree::deep_copy)
    }

    /// Copy of the tree plus the id of the node named `user_identifier`
    fn locate(&self, user_identifier: &str) -> Option<(NavigationTree<V>, nav_core::NodeId)> {
        let tree = self.copy_tree()?;
        let found = tree.find_by_user_identifier(user_identifier).map(|node| node.id());
        match found {
            Some(id) => Some((tree, id)),
            None => {
                warn!(identifier = user_identifier, "navigation destination not found");
                None
            }
        }
    }

    /// Turn a tree mutation result into the next state
    ///
    /// Caller errors (removing the root, selecting a non-child) are reported
    /// and leave the state unchanged; anything else rejects the action.
    fn settle(&self, result: Result<(), TreeError>, tree: NavigationTree<V>) -> crate::Result<Self> {
        match result {
            Ok(()) => Ok(Self::with_root(tree)),
            Err(e @ (TreeError::CannotRemoveRoot | TreeError::NotAChild { .. })) => {
                warn!(error = %e, "navigation action ignored");
                Ok(self.clone())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<V> Default for NavigationState<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for NavigationState<V> {
    fn clone(&self) -> Self {
        Self {
            root: self.copy_tree(),
        }
    }
}

impl<V> std::fmt::Debug for NavigationState<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationState").field("root", &self.root).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_core::TreeDiff;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    fn dest(name: &str) -> Destination<()> {
        Destination::named(name, |_| Arc::new(()))
    }

    fn active_path(state: &NavigationState<()>) -> Vec<String> {
        match state.tree() {
            Some(tree) => tree.active_path().iter().map(|n| n.label()).collect(),
            None => Vec::new(),
        }
    }

    fn diff(before: &NavigationState<()>, after: &NavigationState<()>) -> Vec<String> {
        TreeDiff::diff(before.tree(), after.tree())
            .into_iter()
            .map(|i| i.to_string())
            .collect()
    }

    fn tabs() -> NavigationState<()> {
        NavigationState::new()
            .apply(NavigationAction::SetRoot(dest("tabs")))
            .apply(NavigationAction::AddChildren {
                parent: "tabs".into(),
                destinations: vec![dest("home"), dest("search")],
                active: Some(dest("home")),
            })
    }

    #[test]
    fn test_push_then_pop_detail() {
        let root = NavigationState::new().apply(NavigationAction::SetRoot(dest("root")));

        let pushed = root.reduce(NavigationAction::AddNewDestination(dest("detail"))).unwrap();
        assert_eq!(active_path(&pushed), vec!["root", "detail"]);
        assert_eq!(diff(&root, &pushed), vec!["push detail"]);

        let popped = pushed.reduce(NavigationAction::RemoveCurrentDestination).unwrap();
        assert_eq!(active_path(&popped), vec!["root"]);
        assert_eq!(diff(&pushed, &popped), vec!["pop detail"]);
    }

    #[test]
    fn test_reduce_leaves_input_untouched() {
        let before = tabs();
        let after = before.apply(NavigationAction::AddNewDestination(dest("detail")));
        assert_eq!(active_path(&before), vec!["tabs", "home"]);
        assert_eq!(active_path(&after), vec!["tabs", "home", "detail"]);
    }

    #[test]
    fn test_add_new_destination_to_empty_state_sets_root() {
        let state = NavigationState::new().apply(NavigationAction::AddNewDestination(dest("first")));
        assert_eq!(active_path(&state), vec!["first"]);
    }

    #[test]
    fn test_remove_destination_by_instance() {
        let state = tabs();
        let search = state
            .tree()
            .unwrap()
            .find_by_user_identifier("search")
            .unwrap()
            .value()
            .instance_identifier();
        let after = state.reduce(NavigationAction::RemoveDestination(search)).unwrap();
        assert!(after.tree().unwrap().find_by_user_identifier("search").is_none());
        assert_eq!(active_path(&after), vec!["tabs", "home"]);
    }

    #[test]
    fn test_lookup_failures_are_noops() {
        let state = tabs();
        let cases = vec![
            NavigationAction::RemoveDestination(Uuid::new_v4()),
            NavigationAction::select("missing", "home"),
            NavigationAction::select("tabs", "missing"),
            NavigationAction::add_child("missing", dest("x")),
            NavigationAction::ReplaceActiveChild {
                parent: "missing".into(),
                destination: dest("x"),
            },
        ];
        for action in cases {
            let after = state.reduce(action).unwrap();
            assert!(after.tree().unwrap().structurally_eq(state.tree().unwrap()));
        }
    }

    #[test]
    fn test_removing_root_is_ignored() {
        let root = NavigationState::new().apply(NavigationAction::SetRoot(dest("root")));
        let after = root.reduce(NavigationAction::RemoveCurrentDestination).unwrap();
        assert_eq!(active_path(&after), vec!["root"]);

        let empty = NavigationState::<()>::new()
            .reduce(NavigationAction::RemoveCurrentDestination)
            .unwrap();
        assert!(empty.tree().is_none());
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let state = tabs();
        let err = state
            .reduce(NavigationAction::AddNewDestination(dest("search")))
            .unwrap_err();
        assert!(matches!(err, StateError::Tree(TreeError::DuplicateIdentifier(_))));

        let unchanged = state.apply(NavigationAction::AddNewDestination(dest("search")));
        assert!(unchanged.tree().unwrap().structurally_eq(state.tree().unwrap()));
    }

    #[test]
    fn test_select_child() {
        let state = tabs();
        let after = state.reduce(NavigationAction::select("tabs", "search")).unwrap();
        assert_eq!(active_path(&after), vec!["tabs", "search"]);
        assert_eq!(diff(&state, &after), vec!["select search"]);
    }

    #[test]
    fn test_selecting_active_child_again_is_a_reselection() {
        let state = tabs();
        let after = state.reduce(NavigationAction::select("tabs", "home")).unwrap();
        assert!(after.tree().unwrap().structurally_eq(state.tree().unwrap()));
        assert_eq!(diff(&state, &after), vec!["reselect home"]);
    }

    #[test]
    fn test_select_grandchild_is_not_a_child() {
        let state = tabs().apply(NavigationAction::AddNewDestination(dest("detail")));
        let after = state.reduce(NavigationAction::select("tabs", "detail")).unwrap();
        assert_eq!(active_path(&after), vec!["tabs", "home", "detail"]);
    }

    #[test]
    fn test_replace_active_child() {
        let state = tabs().apply(NavigationAction::AddNewDestination(dest("detail")));
        let after = state
            .reduce(NavigationAction::ReplaceActiveChild {
                parent: "tabs".into(),
                destination: dest("settings"),
            })
            .unwrap();
        assert_eq!(active_path(&after), vec!["tabs", "settings"]);
        assert_eq!(diff(&state, &after), vec!["change [home] -> [settings]"]);
    }

    #[test]
    fn test_add_children_with_foreign_active() {
        let state = NavigationState::new().apply(NavigationAction::SetRoot(dest("root")));
        let after = state
            .reduce(NavigationAction::AddChildren {
                parent: "root".into(),
                destinations: vec![dest("a"), dest("b")],
                active: Some(dest("zzz")),
            })
            .unwrap();
        let tree = after.tree().unwrap();
        assert_eq!(tree.root().child_count(), 2);
        assert_eq!(tree.root().active_child_index(), None);
    }

    /// Random action streams never break the one-active-path invariant
    #[test]
    fn test_random_actions_keep_tree_consistent() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut state = NavigationState::new().apply(NavigationAction::SetRoot(dest("root")));
        let mut names: Vec<String> = vec!["root".into()];

        for i in 0..300 {
            let pick = names[rng.gen_range(0..names.len())].clone();
            let action = match rng.gen_range(0..5) {
                0 => NavigationAction::AddNewDestination(dest(&format!("n{}", i))),
                1 => NavigationAction::RemoveCurrentDestination,
                2 => NavigationAction::add_child(pick, dest(&format!("n{}", i))),
                3 => {
                    let child = names[rng.gen_range(0..names.len())].clone();
                    NavigationAction::select(pick, child)
                }
                _ => NavigationAction::ReplaceActiveChild {
                    parent: pick,
                    destination: dest(&format!("n{}", i)),
                },
            };
            let next = state.reduce(action).unwrap();

            let tree = next.tree().unwrap();
            names = tree.root().descendants().iter().map(|n| n.label()).collect();
            let copy = next.clone();
            assert!(TreeDiff::diff(next.tree(), copy.tree()).is_empty());
            state = next;
        }
    }
}
