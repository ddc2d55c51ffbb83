//! The view layer contract

use crate::error::ViewError;
use ahash::AHashMap;
use crossbeam_channel::Sender;
use nav_core::{Destination, DestinationKey};
use std::fmt;
use std::sync::Arc;

/// Views produced by a `change`, keyed by the pushed destination
pub type ViewHandles<V> = AHashMap<DestinationKey, Arc<dyn NavigationView<V>>>;

/// One-shot acknowledgment that a transition has finished
///
/// Consumed by `complete`, so it can be signalled at most once. Dropping it
/// unsignalled fails the running cycle.
pub struct Completion {
    done: Sender<()>,
}

impl Completion {
    pub(crate) fn new(done: Sender<()>) -> Self {
        Self { done }
    }

    /// Signal that the transition (including any animation) is finished
    ///
    /// Safe to call from any thread.
    pub fn complete(self) {
        // The orchestrator may already have given up waiting
        let _ = self.done.send(());
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

/// A live UI element that can display children
///
/// All methods run on the main execution context, one at a time. Each must
/// eventually call `completion.complete()`, possibly later and from another
/// thread, e.g. once an animation ends. The orchestrator does not start the
/// next transition until it does.
///
/// `change_active_destination` and `select_active_destination` complete
/// immediately by default. `push`, `pop` and `change` default to failing with `ViewError::Unimplemented`, which stops the
/// orchestrator if that transition is ever requested of this view.
pub trait NavigationView<V>: Send + Sync {
    /// Show `destination` as a new child and return the view that hosts it
    fn push(
        &self,
        destination: &Destination<V>,
        completion: Completion,
    ) -> Result<Arc<dyn NavigationView<V>>, ViewError> {
        let _ = (destination, completion);
        Err(ViewError::Unimplemented("push"))
    }

    /// Remove the child showing `destination`
    fn pop(&self, destination: &Destination<V>, completion: Completion) -> Result<(), ViewError> {
        let _ = (destination, completion);
        Err(ViewError::Unimplemented("pop"))
    }

    /// Remove and add several children in one transition
    ///
    /// Must return a view for every destination in `to_push`.
    fn change(
        &self,
        to_pop: &[Destination<V>],
        to_push: &[Destination<V>],
        completion: Completion,
    ) -> Result<ViewHandles<V>, ViewError> {
        let _ = (to_pop, to_push, completion);
        Err(ViewError::Unimplemented("change"))
    }

    /// Make an already-shown child the active one (e.g. switch tabs)
    fn change_active_destination(&self, destination: &Destination<V>, completion: Completion) {
        let _ = destination;
        completion.complete();
    }

    /// The active child was selected again (e.g. tapping the current tab)
    fn select_active_destination(&self, destination: &Destination<V>, completion: Completion) {
        let _ = destination;
        completion.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, TryRecvError};

    struct Inert;
    impl NavigationView<()> for Inert {}

    #[test]
    fn test_complete_signals_once() {
        let (tx, rx) = bounded(1);
        Completion::new(tx).complete();
        assert!(rx.try_recv().is_ok());
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn test_dropped_completion_disconnects() {
        let (tx, rx) = bounded::<()>(1);
        drop(Completion::new(tx));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn test_complete_after_receiver_gone() {
        let (tx, rx) = bounded::<()>(1);
        drop(rx);
        Completion::new(tx).complete();
    }

    #[test]
    fn test_defaults() {
        let view = Inert;
        let dest = Destination::named("a", |_| Arc::new(()));

        let (tx, _rx) = bounded(1);
        assert_eq!(
            view.push(&dest, Completion::new(tx)).err(),
            Some(ViewError::Unimplemented("push"))
        );
        let (tx, _rx) = bounded(1);
        assert_eq!(view.pop(&dest, Completion::new(tx)), Err(ViewError::Unimplemented("pop")));
        let (tx, _rx) = bounded(1);
        assert_eq!(
            view.change(&[], &[dest.clone()], Completion::new(tx)).err(),
            Some(ViewError::Unimplemented("change"))
        );

        let (tx, rx) = bounded(1);
        view.change_active_destination(&dest, Completion::new(tx));
        assert!(rx.try_recv().is_ok());

        let (tx, rx) = bounded(1);
        view.select_active_destination(&dest, Completion::new(tx));
        assert!(rx.try_recv().is_ok());
    }
}
