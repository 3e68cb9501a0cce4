//! Event-style observation of a future.
//!
//! A future fires at most one event: `accept` carrying its value or `reject`
//! carrying its error. Events do not bubble and cannot be canceled. Listeners
//! share the observer queue with `then()` callbacks and run right after them
//! in the same delivery pass.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Accept,
    Reject,
}

impl EventKind {
    pub(crate) fn of<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => EventKind::Accept,
            Err(_) => EventKind::Reject,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Accept => write!(f, "accept"),
            EventKind::Reject => write!(f, "reject"),
        }
    }
}

/// Handle returned by `add_event_listener`, valid for the future that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

#[derive(Debug)]
pub enum Event<'a, T, E> {
    Accept(&'a T),
    Reject(&'a E),
}

// Manual impls: a derive would require `T: Copy` and `E: Copy`.
impl<T, E> Clone for Event<'_, T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, E> Copy for Event<'_, T, E> {}

impl<'a, T, E> Event<'a, T, E> {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Accept(_) => EventKind::Accept,
            Event::Reject(_) => EventKind::Reject,
        }
    }

    pub fn bubbles(&self) -> bool {
        false
    }

    pub fn cancelable(&self) -> bool {
        false
    }

    pub fn value(&self) -> Option<&'a T> {
        match *self {
            Event::Accept(value) => Some(value),
            Event::Reject(_) => None,
        }
    }

    pub fn error(&self) -> Option<&'a E> {
        match *self {
            Event::Accept(_) => None,
            Event::Reject(error) => Some(error),
        }
    }
}

impl<'a, T, E> From<&'a Result<T, E>> for Event<'a, T, E> {
    fn from(result: &'a Result<T, E>) -> Self {
        match result {
            Ok(value) => Event::Accept(value),
            Err(error) => Event::Reject(error),
        }
    }
}

pub(crate) type Listener<T, E> = Box<dyn FnOnce(Event<'_, T, E>)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_from_result() {
        let accepted: Result<u8, &str> = Ok(3);
        let event = Event::from(&accepted);
        assert_eq!(event.kind(), EventKind::Accept);
        assert_eq!(event.value(), Some(&3));
        assert_eq!(event.error(), None);
        assert!(!event.bubbles());
        assert!(!event.cancelable());

        let rejected: Result<u8, &str> = Err("nope");
        let event = Event::from(&rejected);
        assert_eq!(event.kind(), EventKind::Reject);
        assert_eq!(event.error(), Some(&"nope"));
        assert_eq!(EventKind::of(&rejected).to_string(), "reject");
    }
}
