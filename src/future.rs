use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use tracing::trace;

use crate::diagnostics::report_unhandled;
use crate::event::{Event, EventKind, ListenerId};
use crate::outcome::Outcome;
use crate::resolver::Resolver;
use crate::state::{Inner, State};
use crate::{scheduler, Error, Rejection};

/// A read-only handle to a value or error that is settled exactly once.
///
/// Cloning the handle shares the same underlying future. Callbacks and event
/// listeners are never run inside the call that settles the future or the
/// call that registers them; they run from the [`scheduler`] queue, in
/// registration order.
///
/// # Examples
///
/// ```
/// use resolving_future::{scheduler, Future, Outcome, Promise, Rejection};
///
/// let future: Future<u32> = Future::new(|resolver| resolver.accept(2).unwrap());
/// let doubled = future.then(|v| Outcome::Value(v * 2));
/// let recovered = future
///     .then(|_| Outcome::<u32, _>::Throw(Rejection::from("boom")))
///     .catch(|err| Outcome::Value(err.to_string().len() as u32));
///
/// scheduler::run_pending();
/// assert_eq!(doubled.value(), Some(4));
/// assert_eq!(recovered.value(), Some(4));
/// ```
pub struct Future<T, E = Rejection> {
    inner: Rc<RefCell<Inner<T, E>>>,
}

impl<T, E> Clone for Future<T, E> {
    fn clone(&self) -> Self {
        Future {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("state", &self.inner.borrow().state())
            .finish()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Future<T, E> {
    /// Creates a pending future and runs `init` with its resolver before
    /// returning. The resolver cannot be obtained any other way.
    pub fn new(init: impl FnOnce(Resolver<T, E>)) -> Self {
        let inner = Rc::new(RefCell::new(Inner::new()));
        init(Resolver::new(inner.clone()));
        Future { inner }
    }

    pub fn accepted(value: T) -> Self {
        Future::new(|resolver| resolver.settle_quietly(Ok(value)))
    }

    pub fn rejected(error: E) -> Self {
        Future::new(|resolver| resolver.settle_quietly(Err(error)))
    }

    pub fn state(&self) -> State {
        self.inner.borrow().state()
    }

    pub fn is_pending(&self) -> bool {
        self.state() == State::Pending
    }

    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// The accepted value, if the future has been accepted.
    pub fn value(&self) -> Option<T> {
        match &self.inner.borrow().settled {
            Some(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// The rejection payload, if the future has been rejected.
    pub fn error(&self) -> Option<E> {
        match &self.inner.borrow().settled {
            Some(Err(error)) => Some(error.clone()),
            _ => None,
        }
    }

    /// Whether both handles point at the same future.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Queues `observer` for the settled result. On an already settled
    /// future it gets its own deferred delivery.
    pub(crate) fn subscribe(&self, observer: impl FnOnce(Result<T, E>) + 'static) {
        let settled = {
            let mut inner = self.inner.borrow_mut();
            if inner.settled.is_none() {
                inner.observers.push(Box::new(observer));
                return;
            }
            inner.settled.clone()
        };
        if let Some(result) = settled {
            trace!("observer registered after settlement");
            scheduler::schedule(move || observer(result));
        }
    }

    /// Derives a future resolved from `link`'s outcome once this one settles.
    fn chain<U: Clone + 'static>(
        &self,
        link: impl FnOnce(Result<T, E>) -> Outcome<U, E> + 'static,
    ) -> Future<U, E> {
        Future::new(|resolver: Resolver<U, E>| {
            self.subscribe(move |result| {
                if let Err(err) = resolver.resolve(link(result)) {
                    trace!(%err, "dropping late resolution");
                }
            });
        })
    }

    /// Runs `onaccept` with the accepted value. A rejection skips it and is
    /// forwarded unchanged to the returned future.
    pub fn then<U, A>(&self, onaccept: A) -> Future<U, E>
    where
        U: Clone + 'static,
        A: FnOnce(T) -> Outcome<U, E> + 'static,
    {
        self.chain(move |result| match result {
            Ok(value) => onaccept(value),
            Err(error) => Outcome::Throw(error),
        })
    }

    /// Runs `onreject` with the rejection. An accepted value skips it and is
    /// forwarded unchanged.
    pub fn catch<R>(&self, onreject: R) -> Future<T, E>
    where
        R: FnOnce(E) -> Outcome<T, E> + 'static,
    {
        self.chain(move |result| match result {
            Ok(value) => Outcome::Value(value),
            Err(error) => onreject(error),
        })
    }

    /// Runs whichever callback matches the disposition.
    pub fn then_catch<U, A, R>(&self, onaccept: A, onreject: R) -> Future<U, E>
    where
        U: Clone + 'static,
        A: FnOnce(T) -> Outcome<U, E> + 'static,
        R: FnOnce(E) -> Outcome<U, E> + 'static,
    {
        self.chain(move |result| match result {
            Ok(value) => onaccept(value),
            Err(error) => onreject(error),
        })
    }

    /// Registers an `accept` or `reject` listener. A listener added after
    /// settlement still fires, deferred, if its kind matches.
    pub fn add_event_listener(
        &self,
        kind: EventKind,
        listener: impl FnOnce(Event<'_, T, E>) + 'static,
    ) -> ListenerId {
        let (id, settled) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_listener_id();
            if inner.settled.is_none() {
                inner.listeners.push((id, kind, Box::new(listener)));
                return id;
            }
            (id, inner.settled.clone())
        };
        if let Some(result) = settled {
            if EventKind::of(&result) == kind {
                scheduler::schedule(move || listener(Event::from(&result)));
            }
        }
        id
    }

    /// Removes a listener that has not been taken for delivery yet. The
    /// listener is dropped after the future's cell is released.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let removed: Vec<_> = {
            let mut inner = self.inner.borrow_mut();
            let (removed, kept) = std::mem::take(&mut inner.listeners)
                .into_iter()
                .partition(|(listener, _, _)| *listener == id);
            inner.listeners = kept;
            removed
        };
        !removed.is_empty()
    }

    pub fn on_accept(&self, listener: impl FnOnce(&T) + 'static) -> ListenerId {
        self.add_event_listener(EventKind::Accept, move |event| {
            if let Event::Accept(value) = event {
                listener(value);
            }
        })
    }

    pub fn on_reject(&self, listener: impl FnOnce(&E) + 'static) -> ListenerId {
        self.add_event_listener(EventKind::Reject, move |event| {
            if let Event::Reject(error) = event {
                listener(error);
            }
        })
    }

    /// `accept` and `reject` are only ever fired by the future itself.
    pub fn dispatch_event(&self, kind: EventKind) -> Result<(), Error> {
        Err(Error::NotDispatchable(kind))
    }
}

impl<T: Clone + 'static, E: Clone + Debug + 'static> Future<T, E> {
    fn terminate<U, V, A, R>(&self, onaccept: Option<A>, onreject: Option<R>)
    where
        U: Clone + 'static,
        V: Clone + 'static,
        A: FnOnce(T) -> Outcome<U, E> + 'static,
        R: FnOnce(E) -> Outcome<V, E> + 'static,
    {
        self.subscribe(move |result| match result {
            Ok(value) => {
                if let Some(onaccept) = onaccept {
                    onaccept(value).finish();
                }
            }
            Err(error) => match onreject {
                Some(onreject) => onreject(error).finish(),
                None => report_unhandled(&error),
            },
        });
    }

    /// Ends a chain. Nothing is derived; a rejection that is not handled,
    /// or a handler that throws, is reported to the diagnostic channel.
    pub fn done<U, V, A, R>(&self, onaccept: A, onreject: R)
    where
        U: Clone + 'static,
        V: Clone + 'static,
        A: FnOnce(T) -> Outcome<U, E> + 'static,
        R: FnOnce(E) -> Outcome<V, E> + 'static,
    {
        self.terminate(Some(onaccept), Some(onreject));
    }

    pub fn done_accept<U, A>(&self, onaccept: A)
    where
        U: Clone + 'static,
        A: FnOnce(T) -> Outcome<U, E> + 'static,
    {
        self.terminate(Some(onaccept), None::<fn(E) -> Outcome<(), E>>);
    }

    pub fn done_reject<V, R>(&self, onreject: R)
    where
        V: Clone + 'static,
        R: FnOnce(E) -> Outcome<V, E> + 'static,
    {
        self.terminate(None::<fn(T) -> Outcome<(), E>>, Some(onreject));
    }

    /// Ends a chain with no handlers, only the unhandled-rejection report.
    pub fn done_unobserved(&self) {
        self.terminate(
            None::<fn(T) -> Outcome<(), E>>,
            None::<fn(E) -> Outcome<(), E>>,
        );
    }
}

impl<T: Clone, E: Clone> std::future::Future for Future<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.inner.borrow_mut();
        if let Some(result) = inner.settled.clone() {
            return Poll::Ready(result);
        }
        if !inner.wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
            inner.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
