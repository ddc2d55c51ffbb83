//! Navigation destinations
//!
//! A `Destination` is the immutable identity of one place in the navigation
//! tree, plus a lazy factory for the view that represents it on screen.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

type Factory<V> = dyn Fn(Uuid) -> Arc<V> + Send + Sync;

/// Hashable identity of a destination
///
/// The user identifier when present, otherwise the instance identifier.
/// Inside one tree this agrees with `==`, since colliding identifiers are
/// rejected there. Across snapshots a destination can gain or lose its user
/// identifier while staying equal; `TreeDiff::rekeyed` reports those.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DestinationKey {
    /// Caller-assigned identifier
    User(String),
    /// Generated identifier
    Instance(Uuid),
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationKey::User(name) => write!(f, "{}", name),
            DestinationKey::Instance(uuid) => write!(f, "{}", uuid),
        }
    }
}

/// A unique navigation destination
///
/// Every destination has a unique `instance_identifier`. Optionally it has a
/// `user_identifier`, which takes priority over the instance identifier when
/// comparing: two destinations with the same user identifier are the same
/// place even if they were constructed separately.
///
/// ** user identifiers must be unique within one tree **
pub struct Destination<V> {
    user_identifier: Option<Arc<str>>,
    instance_identifier: Uuid,
    factory: Arc<Factory<V>>,
    /// Last view produced by the factory, shared by all clones
    view: Arc<Mutex<Weak<V>>>,
}

impl<V> Destination<V> {
    /// Create an anonymous destination
    pub fn new<F>(create: F) -> Self
    where
        F: Fn(Uuid) -> Arc<V> + Send + Sync + 'static,
    {
        Self {
            user_identifier: None,
            instance_identifier: Uuid::new_v4(),
            factory: Arc::new(create),
            view: Arc::new(Mutex::new(Weak::new())),
        }
    }

    /// Create a destination addressable by `user_identifier`
    ///
    /// An empty identifier is treated as absent.
    pub fn named<F>(user_identifier: impl Into<String>, create: F) -> Self
    where
        F: Fn(Uuid) -> Arc<V> + Send + Sync + 'static,
    {
        let mut destination = Self::new(create);
        let user_identifier = user_identifier.into();
        if !user_identifier.is_empty() {
            destination.user_identifier = Some(Arc::from(user_identifier));
        }
        destination
    }

    /// Override the generated instance identifier
    pub fn with_instance_identifier(mut self, instance_identifier: Uuid) -> Self {
        self.instance_identifier = instance_identifier;
        self
    }

    pub fn user_identifier(&self) -> Option<&str> {
        self.user_identifier.as_deref()
    }

    pub fn instance_identifier(&self) -> Uuid {
        self.instance_identifier
    }

    /// Identity key for maps (see [`DestinationKey`])
    pub fn key(&self) -> DestinationKey {
        match &self.user_identifier {
            Some(name) => DestinationKey::User(name.to_string()),
            None => DestinationKey::Instance(self.instance_identifier),
        }
    }

    /// Whether `other` shares either identifier with `self`
    ///
    /// Stricter than `==`: used to reject duplicates when inserting into a tree.
    pub fn collides_with(&self, other: &Destination<V>) -> bool {
        if self.instance_identifier == other.instance_identifier {
            return true;
        }
        matches!(
            (&self.user_identifier, &other.user_identifier),
            (Some(a), Some(b)) if a == b
        )
    }

    /// Return the view for this destination, building it if needed
    ///
    /// The factory runs at most once while the produced view is alive. Once
    /// every strong handle is released the next call builds a fresh one.
    pub fn create(&self) -> Arc<V> {
        let mut cached = self.view.lock();
        if let Some(view) = cached.upgrade() {
            return view;
        }
        let view = (self.factory)(self.instance_identifier);
        *cached = Arc::downgrade(&view);
        view
    }

    /// The live view, if one was built and is still held somewhere
    pub fn view(&self) -> Option<Arc<V>> {
        self.view.lock().upgrade()
    }
}

impl<V> Clone for Destination<V> {
    fn clone(&self) -> Self {
        Self {
            user_identifier: self.user_identifier.clone(),
            instance_identifier: self.instance_identifier,
            factory: Arc::clone(&self.factory),
            view: Arc::clone(&self.view),
        }
    }
}

impl<V> PartialEq for Destination<V> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.user_identifier, &other.user_identifier) {
            (Some(a), Some(b)) => a == b,
            _ => self.instance_identifier == other.instance_identifier,
        }
    }
}

impl<V> fmt::Debug for Destination<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<V> fmt::Display for Destination<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user_identifier {
            Some(name) => write!(
                f,
                "Destination(userId: {}, uuid: {})",
                name, self.instance_identifier
            ),
            None => write!(f, "Destination(uuid: {})", self.instance_identifier),
        }
    }
}
