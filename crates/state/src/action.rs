//! Navigation actions

use nav_core::Destination;
use std::fmt;
use uuid::Uuid;

/// Every mutation the navigation state supports
///
/// Parents and children are addressed by user identifier, except
/// `RemoveDestination` which targets one exact instance.
pub enum NavigationAction<V> {
    /// Replace the whole tree with a single root
    SetRoot(Destination<V>),

    /// Add a destination on top of the active route
    AddNewDestination(Destination<V>),

    /// Remove the destination with this instance identifier (and its subtree)
    ///
    /// Useful for mirroring navigation the UI performed on its own, e.g. a
    /// back gesture.
    RemoveDestination(Uuid),

    /// Remove the active leaf
    RemoveCurrentDestination,

    /// Append children to a node; `active` must be one of `destinations`
    AddChildren {
        parent: String,
        destinations: Vec<Destination<V>>,
        active: Option<Destination<V>>,
    },

    /// Replace the active child of a node with a new destination
    ReplaceActiveChild {
        parent: String,
        destination: Destination<V>,
    },

    /// Make an existing child of a node active
    SelectChild { parent: String, child: String },
}

impl<V> NavigationAction<V> {
    /// Single active child added to `parent`
    pub fn add_child(parent: impl Into<String>, child: Destination<V>) -> Self {
        NavigationAction::AddChildren {
            parent: parent.into(),
            destinations: vec![child.clone()],
            active: Some(child),
        }
    }

    pub fn select(parent: impl Into<String>, child: impl Into<String>) -> Self {
        NavigationAction::SelectChild {
            parent: parent.into(),
            child: child.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NavigationAction::SetRoot(_) => "set_root",
            NavigationAction::AddNewDestination(_) => "add_new_destination",
            NavigationAction::RemoveDestination(_) => "remove_destination",
            NavigationAction::RemoveCurrentDestination => "remove_current_destination",
            NavigationAction::AddChildren { .. } => "add_children",
            NavigationAction::ReplaceActiveChild { .. } => "replace_active_child",
            NavigationAction::SelectChild { .. } => "select_child",
        }
    }
}

impl<V> Clone for NavigationAction<V> {
    fn clone(&self) -> Self {
        match self {
            NavigationAction::SetRoot(d) => NavigationAction::SetRoot(d.clone()),
            NavigationAction::AddNewDestination(d) => NavigationAction::AddNewDestination(d.clone()),
            NavigationAction::RemoveDestination(id) => NavigationAction::RemoveDestination(*id),
            NavigationAction::RemoveCurrentDestination => NavigationAction::RemoveCurrentDestination,
            NavigationAction::AddChildren {
                parent,
                destinations,
                active,
            } => NavigationAction::AddChildren {
                parent: parent.clone(),
                destinations: destinations.clone(),
                active: active.clone(),
            },
            NavigationAction::ReplaceActiveChild { parent, destination } => {
                NavigationAction::ReplaceActiveChild {
                    parent: parent.clone(),
                    destination: destination.clone(),
                }
            }
            NavigationAction::SelectChild { parent, child } => NavigationAction::SelectChild {
                parent: parent.clone(),
                child: child.clone(),
            },
        }
    }
}

impl<V> fmt::Display for NavigationAction<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationAction::SetRoot(d) | NavigationAction::AddNewDestination(d) => {
                write!(f, "{}({})", self.name(), d.key())
            }
            NavigationAction::RemoveDestination(id) => write!(f, "{}({})", self.name(), id),
            NavigationAction::RemoveCurrentDestination => write!(f, "{}", self.name()),
            NavigationAction::AddChildren {
                parent,
                destinations,
                ..
            } => write!(f, "{}({}, {} children)", self.name(), parent, destinations.len()),
            NavigationAction::ReplaceActiveChild { parent, destination } => {
                write!(f, "{}({}, {})", self.name(), parent, destination.key())
            }
            NavigationAction::SelectChild { parent, child } => {
                write!(f, "{}({}, {})", self.name(), parent, child)
            }
        }
    }
}

impl<V> fmt::Debug for NavigationAction<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
