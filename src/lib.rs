//! A single-resolution `Future` paired with a one-time `Resolver`.
//!
//! The creator hands out the [`Future`] and keeps the [`Resolver`]; the only
//! way to obtain a resolver is as the argument of the initializer passed to
//! [`Future::new`]. Observers chain with [`Future::then`], terminate a chain
//! with [`Future::done`], or listen for the `accept`/`reject` events. Delivery
//! is always deferred to the thread-local [`scheduler`] queue.
//!
//! # Examples
//!
//! ```
//! use resolving_future::{scheduler, Future, Outcome, Promise, Resolver};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut stash: Option<Resolver<i32>> = None;
//! let future: Future<i32> = Future::new(|resolver| stash = Some(resolver));
//! let seen = Rc::new(RefCell::new(None));
//!
//! let sink = seen.clone();
//! future
//!     .then(|v| Outcome::Value(v * 2))
//!     .done_accept(move |v| {
//!         *sink.borrow_mut() = Some(v);
//!         Outcome::Value(())
//!     });
//!
//! stash.unwrap().accept(21).unwrap();
//! assert_eq!(*seen.borrow(), None);
//! scheduler::run_pending();
//! assert_eq!(*seen.borrow(), Some(42));
//! ```

pub mod combinators;
pub mod config;
pub mod diagnostics;
pub mod event;
pub mod future;
pub mod outcome;
pub mod resolver;
pub mod scheduler;
mod state;

pub use combinators::{any, every, some};
pub use config::{Config, UnhandledPolicy};
pub use event::{Event, EventKind, ListenerId};
pub use future::Future;
pub use outcome::Outcome;
pub use resolver::Resolver;
pub use state::State;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A resolution method was called on a future that already settled.
    #[error("future is already resolved")]
    AlreadyResolved,
    #[error("`{0}` events are dispatched only by the future itself")]
    NotDispatchable(EventKind),
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },
}

/// Default rejection payload. `cancel()` and `timeout()` reject with the
/// tagged variants so ordinary reject handlers see them.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Cancel")]
    Cancel,
    #[error("Timeout")]
    Timeout,
    #[error("{0}")]
    Error(String),
}

impl Rejection {
    pub fn name(&self) -> &'static str {
        match self {
            Rejection::Cancel => "Cancel",
            Rejection::Timeout => "Timeout",
            Rejection::Error(_) => "Error",
        }
    }
}

impl From<&str> for Rejection {
    fn from(message: &str) -> Self {
        Rejection::Error(message.to_owned())
    }
}

impl From<String> for Rejection {
    fn from(message: String) -> Self {
        Rejection::Error(message)
    }
}

/// The producer side of a future. Exactly one call among the four methods
/// ever succeeds; every later call fails with [`Error::AlreadyResolved`].
pub trait Promise<T, E> {
    fn accept(&self, value: T) -> Result<(), Error>;

    fn reject(&self, error: E) -> Result<(), Error>;

    fn cancel(&self) -> Result<(), Error>
    where
        E: From<Rejection>,
    {
        self.reject(Rejection::Cancel.into())
    }

    fn timeout(&self) -> Result<(), Error>
    where
        E: From<Rejection>,
    {
        self.reject(Rejection::Timeout.into())
    }
}
