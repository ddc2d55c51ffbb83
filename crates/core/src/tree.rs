//! Navigation tree
//!
//! Nodes live in an arena owned by [`NavigationTree`] and are addressed by
//! [`NodeId`]. Every node stores its parent's id, so parent lookup is O(1)
//! without reference cycles, and a deep copy is an arena rebuild with the
//! ids remapped.

use crate::destination::Destination;
use smallvec::SmallVec;
use std::fmt::{self, Write as _};
use thiserror::Error;
use uuid::Uuid;

/// Stable handle to a node inside one [`NavigationTree`]
///
/// Ids are only meaningful for the tree that issued them. Slots of removed
/// nodes are recycled, so an id must not be kept across a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors produced by tree mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0:?} is not part of this tree")]
    UnknownNode(NodeId),

    #[error("the root node cannot be removed")]
    CannotRemoveRoot,

    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    #[error("{0} collides with a destination already in the tree")]
    DuplicateIdentifier(String),

    #[error("active index {index} is out of range for {len} new children")]
    ActiveIndexOutOfRange { index: usize, len: usize },
}

struct Node<V> {
    value: Destination<V>,
    children: Vec<NodeId>,
    /// Position of the active child inside `children`
    active_child: Option<usize>,
    /// Times the active child was selected again while already active
    reselections: u64,
    parent: Option<NodeId>,
}

impl<V> Node<V> {
    fn leaf(value: Destination<V>, parent: Option<NodeId>) -> Self {
        Self {
            value,
            children: Vec::new(),
            active_child: None,
            reselections: 0,
            parent,
        }
    }
}

/// A navigation hierarchy with exactly one active path
pub struct NavigationTree<V> {
    nodes: Vec<Option<Node<V>>>,
    /// Recycled slots
    free: Vec<usize>,
    root: NodeId,
    live: usize,
}

impl<V> NavigationTree<V> {
    /// Create a tree holding only `root`
    pub fn new(root: Destination<V>) -> Self {
        Self {
            nodes: vec![Some(Node::leaf(root, None))],
            free: Vec::new(),
            root: NodeId(0),
            live: 1,
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.live
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> NodeRef<'_, V> {
        self.node_ref(self.root)
    }

    /// Look up a node by id
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_, V>> {
        self.slot(id).map(|node| NodeRef { tree: self, id, node })
    }

    /// Depth-first (pre-order) search over the whole tree
    pub fn find<P>(&self, predicate: P) -> Option<NodeRef<'_, V>>
    where
        P: FnMut(NodeRef<'_, V>) -> bool,
    {
        self.root().find(predicate)
    }

    pub fn find_by_user_identifier(&self, user_identifier: &str) -> Option<NodeRef<'_, V>> {
        self.find(|node| node.value().user_identifier() == Some(user_identifier))
    }

    pub fn find_by_instance_identifier(&self, instance_identifier: Uuid) -> Option<NodeRef<'_, V>> {
        self.find(|node| node.value().instance_identifier() == instance_identifier)
    }

    /// The node reached by following active children from the root
    pub fn active_leaf(&self) -> NodeRef<'_, V> {
        self.root().active_leaf()
    }

    /// Nodes on the active path, root first
    pub fn active_path(&self) -> Vec<NodeRef<'_, V>> {
        let mut path = vec![self.root()];
        while let Some(next) = path[path.len() - 1].active_child() {
            path.push(next);
        }
        path
    }

    /// Append `destinations` as children of `parent`
    ///
    /// `active_index` indexes into `destinations`; when given, that child
    /// becomes the active child of `parent`, replacing any previous selection.
    /// Nothing is modified when an error is returned.
    pub fn add_children(
        &mut self,
        parent: NodeId,
        destinations: Vec<Destination<V>>,
        active_index: Option<usize>,
    ) -> Result<Vec<NodeId>, TreeError> {
        let base = self.node(parent)?.children.len();
        if let Some(index) = active_index {
            if index >= destinations.len() {
                return Err(TreeError::ActiveIndexOutOfRange {
                    index,
                    len: destinations.len(),
                });
            }
        }
        self.check_unique(&destinations, &[])?;

        let ids: Vec<NodeId> = destinations
            .into_iter()
            .map(|value| self.alloc(Node::leaf(value, Some(parent))))
            .collect();

        let node = self.node_mut(parent)?;
        node.children.extend_from_slice(&ids);
        if let Some(index) = active_index {
            node.active_child = Some(base + index);
        }
        Ok(ids)
    }

    /// Append `destination` under the active leaf and make it active
    pub fn add_active_leaf(&mut self, destination: Destination<V>) -> Result<NodeId, TreeError> {
        let leaf = self.active_leaf().id();
        let ids = self.add_children(leaf, vec![destination], Some(0))?;
        Ok(ids[0])
    }

    /// Replace the active child of `parent` (and its subtree) with `destination`
    ///
    /// Without an active child the destination is simply appended as active.
    pub fn replace_active_child(
        &mut self,
        parent: NodeId,
        destination: Destination<V>,
    ) -> Result<NodeId, TreeError> {
        let current = self.get(parent).ok_or(TreeError::UnknownNode(parent))?;
        let replaced = current.active_child().map(|child| child.id());
        let ignored = match replaced {
            Some(id) => self.subtree_ids(id),
            None => Vec::new(),
        };
        self.check_unique(std::slice::from_ref(&destination), &ignored)?;

        if let Some(id) = replaced {
            self.remove_node(id)?;
        }
        let ids = self.add_children(parent, vec![destination], Some(0))?;
        Ok(ids[0])
    }

    /// Detach `id` from its parent and drop its whole subtree
    ///
    /// If the node was the active child, the parent is left without an
    /// active child. If it sat before the active child, the selection is
    /// shifted so the same sibling stays active.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Destination<V>, TreeError> {
        let parent = self.node(id)?.parent.ok_or(TreeError::CannotRemoveRoot)?;

        let parent_node = self.node_mut(parent)?;
        let position = parent_node
            .children
            .iter()
            .position(|child| *child == id)
            .ok_or(TreeError::UnknownNode(id))?;
        parent_node.children.remove(position);
        parent_node.active_child = match parent_node.active_child {
            Some(active) if active == position => None,
            Some(active) if active > position => Some(active - 1),
            other => other,
        };

        let removed = self.release(id).ok_or(TreeError::UnknownNode(id))?;
        let mut pending: Vec<NodeId> = removed.children;
        while let Some(next) = pending.pop() {
            if let Some(node) = self.release(next) {
                pending.extend(node.children);
            }
        }
        Ok(removed.value)
    }

    /// Make `child` the active child of `parent`
    ///
    /// Selecting the child that is already active counts as a re-selection
    /// (see [`NodeRef::reselections`]).
    pub fn select_active_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let child_value = self.node(child)?.value.to_string();
        let parent_node = self.node_mut(parent)?;
        match parent_node.children.iter().position(|c| *c == child) {
            Some(position) => {
                if parent_node.active_child == Some(position) {
                    parent_node.reselections = parent_node.reselections.wrapping_add(1);
                } else {
                    parent_node.active_child = Some(position);
                }
                Ok(())
            }
            None => Err(TreeError::NotAChild {
                parent: parent_node.value.to_string(),
                child: child_value,
            }),
        }
    }

    /// Fully independent copy with identical destinations and active structure
    ///
    /// The arena is compacted; ids of the copy do not match ids of `self`.
    pub fn deep_copy(&self) -> Self {
        let order = self.root().descendants();
        let mut remap = vec![None; self.nodes.len()];
        for (new_index, node) in order.iter().enumerate() {
            remap[node.id().0] = Some(NodeId(new_index));
        }
        let map = |id: NodeId| remap[id.0].unwrap_or(id);

        let nodes = order
            .iter()
            .map(|node| {
                Some(Node {
                    value: node.value().clone(),
                    children: node.node.children.iter().copied().map(map).collect(),
                    active_child: node.node.active_child,
                    reselections: node.node.reselections,
                    parent: node.node.parent.map(map),
                })
            })
            .collect();

        Self {
            nodes,
            free: Vec::new(),
            root: NodeId(0),
            live: order.len(),
        }
    }

    /// Same destinations, same child order and same active selections
    pub fn structurally_eq(&self, other: &NavigationTree<V>) -> bool {
        let mut pending = vec![(self.root(), other.root())];
        while let Some((a, b)) = pending.pop() {
            if a.value() != b.value()
                || a.active_child_index() != b.active_child_index()
                || a.child_count() != b.child_count()
            {
                return false;
            }
            pending.extend(a.children().zip(b.children()));
        }
        true
    }

    /// Indented rendering of the tree; active children are marked with `*`
    pub fn outline(&self) -> String {
        let mut out = String::new();
        let mut pending = vec![(self.root(), 0usize, true)];
        while let Some((node, depth, active)) = pending.pop() {
            let marker = if active { '*' } else { '-' };
            let _ = writeln!(out, "{:indent$}{} {}", "", marker, node.label(), indent = depth * 2);
            let active_child = node.active_child().map(|child| child.id());
            let children: SmallVec<[NodeRef<'_, V>; 8]> = node.children().collect();
            for child in children.into_iter().rev() {
                pending.push((child, depth + 1, active && Some(child.id()) == active_child));
            }
        }
        out
    }

    fn node_ref(&self, id: NodeId) -> NodeRef<'_, V> {
        NodeRef {
            tree: self,
            id,
            node: self.live_node(id),
        }
    }

    fn slot(&self, id: NodeId) -> Option<&Node<V>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node(&self, id: NodeId) -> Result<&Node<V>, TreeError> {
        self.slot(id).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<V>, TreeError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownNode(id))
    }

    /// Node behind an id taken from the tree's own links
    fn live_node(&self, id: NodeId) -> &Node<V> {
        match self.slot(id) {
            Some(node) => node,
            None => unreachable!("tree link {:?} points at a freed slot", id),
        }
    }

    fn alloc(&mut self, node: Node<V>) -> NodeId {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Option<Node<V>> {
        let node = self.nodes.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        self.live -= 1;
        Some(node)
    }

    fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        match self.get(id) {
            Some(node) => node.descendants().iter().map(|n| n.id()).collect(),
            None => Vec::new(),
        }
    }

    /// Reject destinations that collide with the tree or with each other
    ///
    /// Nodes listed in `ignored` are about to be removed and do not count.
    fn check_unique(&self, destinations: &[Destination<V>], ignored: &[NodeId]) -> Result<(), TreeError> {
        for (i, destination) in destinations.iter().enumerate() {
            let in_tree = self.nodes.iter().enumerate().any(|(index, slot)| {
                slot.as_ref().is_some_and(|node| {
                    !ignored.contains(&NodeId(index)) && node.value.collides_with(destination)
                })
            });
            let in_batch = destinations[..i].iter().any(|other| other.collides_with(destination));
            if in_tree || in_batch {
                return Err(TreeError::DuplicateIdentifier(destination.to_string()));
            }
        }
        Ok(())
    }
}

impl<V> Clone for NavigationTree<V> {
    fn clone(&self) -> Self {
        self.deep_copy()
    }
}

impl<V> fmt::Debug for NavigationTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationTree")
            .field("nodes", &self.live)
            .field("root", &self.root().value())
            .field("active_leaf", &self.active_leaf().value())
            .finish()
    }
}

/// Borrowed view of one node
pub struct NodeRef<'a, V> {
    tree: &'a NavigationTree<V>,
    id: NodeId,
    node: &'a Node<V>,
}

impl<V> Clone for NodeRef<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for NodeRef<'_, V> {}

impl<'a, V> NodeRef<'a, V> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn value(&self) -> &'a Destination<V> {
        &self.node.value
    }

    pub fn tree(&self) -> &'a NavigationTree<V> {
        self.tree
    }

    pub fn is_root(&self) -> bool {
        self.node.parent.is_none()
    }

    pub fn parent(&self) -> Option<NodeRef<'a, V>> {
        self.node.parent.map(|id| self.tree.node_ref(id))
    }

    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a, V>> + 'a {
        let tree = self.tree;
        self.node.children.iter().map(move |id| tree.node_ref(*id))
    }

    pub fn active_child_index(&self) -> Option<usize> {
        self.node.active_child
    }

    /// Running count of re-selections of the active child
    ///
    /// Compared between snapshots to notice a tap on the current tab.
    pub fn reselections(&self) -> u64 {
        self.node.reselections
    }

    pub fn active_child(&self) -> Option<NodeRef<'a, V>> {
        let index = self.node.active_child?;
        self.node.children.get(index).map(|id| self.tree.node_ref(*id))
    }

    /// Follow active children down to a node without one
    pub fn active_leaf(&self) -> NodeRef<'a, V> {
        let mut current = *self;
        while let Some(next) = current.active_child() {
            current = next;
        }
        current
    }

    /// Depth-first (pre-order) search of this subtree, the node itself included
    pub fn find<P>(&self, mut predicate: P) -> Option<NodeRef<'a, V>>
    where
        P: FnMut(NodeRef<'_, V>) -> bool,
    {
        let mut pending = vec![*self];
        while let Some(node) = pending.pop() {
            if predicate(node) {
                return Some(node);
            }
            let children: SmallVec<[NodeRef<'a, V>; 8]> = node.children().collect();
            pending.extend(children.into_iter().rev());
        }
        None
    }

    /// This node and all of its descendants in pre-order
    pub fn descendants(&self) -> Vec<NodeRef<'a, V>> {
        let mut out = Vec::new();
        let mut pending = vec![*self];
        while let Some(node) = pending.pop() {
            out.push(node);
            let children: SmallVec<[NodeRef<'a, V>; 8]> = node.children().collect();
            pending.extend(children.into_iter().rev());
        }
        out
    }

    /// Short name for logs: the user identifier, else the instance identifier
    pub fn label(&self) -> String {
        self.node.value.key().to_string()
    }
}

impl<V> fmt::Debug for NodeRef<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("value", self.value())
            .finish()
    }
}
