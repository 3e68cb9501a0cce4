use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::outcome::Outcome;
use crate::state::Inner;
use crate::{scheduler, Error, Promise, Rejection};

/// The write side of a [`Future`](crate::Future), handed to the initializer
/// passed to `Future::new`. Clones drive the same future; whichever call
/// lands first settles it and every later call fails with
/// [`Error::AlreadyResolved`].
pub struct Resolver<T, E = Rejection> {
    inner: Rc<RefCell<Inner<T, E>>>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Resolver {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("state", &self.inner.borrow().state())
            .finish()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Resolver<T, E> {
    pub(crate) fn new(inner: Rc<RefCell<Inner<T, E>>>) -> Self {
        Resolver { inner }
    }

    fn settle(&self, result: Result<T, E>) -> Result<(), Error> {
        let delivery = self.inner.borrow_mut().settle(result)?;
        debug!(state = %self.inner.borrow().state(), "future settled");
        if !delivery.is_empty() {
            scheduler::schedule(move || delivery.run());
        }
        Ok(())
    }

    /// Settles from a chained result where losing the race is expected.
    pub(crate) fn settle_quietly(&self, result: Result<T, E>) {
        if let Err(err) = self.settle(result) {
            trace!(%err, "dropping late resolution");
        }
    }

    /// Resolves from an [`Outcome`]. A nested future is merged: this future
    /// stays pending until it settles and then adopts its disposition. The
    /// merge is deferred even when the nested future has already settled.
    pub fn resolve(&self, outcome: Outcome<T, E>) -> Result<(), Error> {
        match outcome {
            Outcome::Value(value) => self.accept(value),
            Outcome::Throw(error) => self.reject(error),
            Outcome::Future(nested) => {
                if self.inner.borrow().settled.is_some() {
                    return Err(Error::AlreadyResolved);
                }
                let resolver = self.clone();
                nested.subscribe(move |result| resolver.settle_quietly(result));
                Ok(())
            }
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Promise<T, E> for Resolver<T, E> {
    fn accept(&self, value: T) -> Result<(), Error> {
        self.settle(Ok(value))
    }

    fn reject(&self, error: E) -> Result<(), Error> {
        self.settle(Err(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Future, State};

    #[test]
    fn first_call_wins_across_all_methods() {
        let mut stash = None;
        let future: Future<i32> = Future::new(|resolver| stash = Some(resolver));
        let resolver = stash.unwrap();
        let racer = resolver.clone();

        assert_eq!(resolver.accept(1), Ok(()));
        assert_eq!(racer.accept(2), Err(Error::AlreadyResolved));
        assert_eq!(racer.reject("late".into()), Err(Error::AlreadyResolved));
        assert_eq!(resolver.cancel(), Err(Error::AlreadyResolved));
        assert_eq!(resolver.timeout(), Err(Error::AlreadyResolved));
        assert_eq!(resolver.resolve(Outcome::Value(3)), Err(Error::AlreadyResolved));
        assert_eq!(future.state(), State::Accepted);
        assert_eq!(future.value(), Some(1));
    }

    #[test]
    fn cancel_and_timeout_are_tagged_rejections() {
        let cancelled: Future<()> = Future::new(|resolver| resolver.cancel().unwrap());
        assert_eq!(cancelled.error(), Some(Rejection::Cancel));
        assert_eq!(cancelled.error().map(|e| e.name()), Some("Cancel"));

        let timed_out: Future<()> = Future::new(|resolver| resolver.timeout().unwrap());
        assert_eq!(timed_out.state(), State::Rejected);
        assert_eq!(timed_out.error().map(|e| e.name()), Some("Timeout"));
    }

    #[test]
    fn resolve_merges_nested_future_deferred() {
        let nested: Future<i32> = Future::accepted(5);
        let mut stash = None;
        let future: Future<i32> = Future::new(|resolver| stash = Some(resolver));
        let resolver = stash.unwrap();

        assert_eq!(resolver.resolve(Outcome::Future(nested)), Ok(()));
        assert_eq!(future.state(), State::Pending);
        scheduler::run_pending();
        assert_eq!(future.value(), Some(5));
    }
}
