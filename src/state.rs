use std::fmt;
use std::task::Waker;

use tracing::trace;

use crate::event::{Event, EventKind, Listener, ListenerId};
use crate::Error;

/// Disposition of a future. Only ever moves out of `Pending`, once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Pending => write!(f, "pending"),
            State::Accepted => write!(f, "accepted"),
            State::Rejected => write!(f, "rejected"),
        }
    }
}

pub(crate) type Observer<T, E> = Box<dyn FnOnce(Result<T, E>)>;

/// Shared cell behind a `Future` and its `Resolver`.
pub(crate) struct Inner<T, E> {
    pub(crate) settled: Option<Result<T, E>>,
    pub(crate) observers: Vec<Observer<T, E>>,
    pub(crate) listeners: Vec<(ListenerId, EventKind, Listener<T, E>)>,
    pub(crate) wakers: Vec<Waker>,
    next_listener: u64,
}

impl<T, E> Inner<T, E> {
    pub(crate) fn new() -> Self {
        Inner {
            settled: None,
            observers: vec![],
            listeners: vec![],
            wakers: vec![],
            next_listener: 0,
        }
    }

    pub(crate) fn state(&self) -> State {
        match self.settled {
            None => State::Pending,
            Some(Ok(_)) => State::Accepted,
            Some(Err(_)) => State::Rejected,
        }
    }

    pub(crate) fn next_listener_id(&mut self) -> ListenerId {
        self.next_listener += 1;
        ListenerId(self.next_listener)
    }

    /// Commits the first transition and takes everything queued so far. The
    /// queue is left empty so each entry is delivered at most once.
    pub(crate) fn settle(&mut self, result: Result<T, E>) -> Result<Delivery<T, E>, Error>
    where
        T: Clone,
        E: Clone,
    {
        if self.settled.is_some() {
            return Err(Error::AlreadyResolved);
        }
        self.settled = Some(result.clone());
        Ok(Delivery {
            result,
            observers: std::mem::take(&mut self.observers),
            listeners: std::mem::take(&mut self.listeners),
            wakers: std::mem::take(&mut self.wakers),
        })
    }
}

/// One delivery pass: callbacks first, then event listeners, then wakers
/// of tasks awaiting the future.
pub(crate) struct Delivery<T, E> {
    result: Result<T, E>,
    observers: Vec<Observer<T, E>>,
    listeners: Vec<(ListenerId, EventKind, Listener<T, E>)>,
    wakers: Vec<Waker>,
}

impl<T: Clone, E: Clone> Delivery<T, E> {
    pub(crate) fn is_empty(&self) -> bool {
        self.observers.is_empty() && self.listeners.is_empty() && self.wakers.is_empty()
    }

    pub(crate) fn run(self) {
        let Delivery {
            result,
            observers,
            listeners,
            wakers,
        } = self;
        trace!(
            observers = observers.len(),
            listeners = listeners.len(),
            wakers = wakers.len(),
            "delivering settled future"
        );
        for observer in observers {
            observer(result.clone());
        }
        let kind = EventKind::of(&result);
        for (_, listened, listener) in listeners {
            if listened == kind {
                listener(Event::from(&result));
            }
        }
        for waker in wakers {
            waker.wake();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn settle_only_once() {
        let mut inner = Inner::<i32, String>::new();
        assert_eq!(inner.state(), State::Pending);
        assert!(inner.settle(Ok(1)).is_ok());
        assert_eq!(inner.settle(Err("late".into())).err(), Some(Error::AlreadyResolved));
        assert_eq!(inner.state(), State::Accepted);
        assert_eq!(inner.settled, Some(Ok(1)));
    }

    #[test]
    fn delivery_drains_queue_in_order() {
        let log = Rc::new(RefCell::new(vec![]));
        let mut inner = Inner::<i32, String>::new();
        for name in ["first", "second"] {
            let log = log.clone();
            inner
                .observers
                .push(Box::new(move |result: Result<i32, String>| log.borrow_mut().push(format!("{name} {result:?}"))));
        }
        let id = inner.next_listener_id();
        let sink = log.clone();
        inner.listeners.push((
            id,
            EventKind::Accept,
            Box::new(move |event: Event<'_, i32, String>| sink.borrow_mut().push(format!("event {:?}", event.value()))),
        ));
        let id = inner.next_listener_id();
        let sink = log.clone();
        inner.listeners.push((
            id,
            EventKind::Reject,
            Box::new(move |_: Event<'_, i32, String>| sink.borrow_mut().push("wrong event".to_owned())),
        ));

        let delivery = inner.settle(Ok(7)).unwrap();
        assert!(inner.observers.is_empty());
        assert!(log.borrow().is_empty());
        delivery.run();
        assert_eq!(
            *log.borrow(),
            vec!["first Ok(7)", "second Ok(7)", "event Some(7)"]
        );
    }
}
