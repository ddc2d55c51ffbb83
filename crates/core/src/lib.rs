//! navtree core - navigation tree primitives
//!
//! This crate provides:
//! - `Destination`: immutable identity plus a lazy view factory
//! - `NavigationTree`: arena-backed tree with one active path
//! - `TreeDiff`: ordered transitions between two tree snapshots
//! - `ShownSet`: which destinations have a view after a run of diffs

pub mod destination;
pub mod diff;
pub mod shown;
pub mod tree;

// Re-export main types for convenience
pub use destination::{Destination, DestinationKey};
pub use diff::{TransitionInstruction, TransitionTarget, TreeDiff};
pub use shown::ShownSet;
pub use tree::{NavigationTree, NodeId, NodeRef, TreeError};
