use std::fmt::{self, Debug};

use crate::diagnostics::report_unhandled;
use crate::Future;

/// What a chained callback produced.
///
/// `Throw` is how a callback fails: the derived future rejects with the
/// payload as is. `Future` merges the derived future with a nested one.
pub enum Outcome<U, E> {
    Value(U),
    Throw(E),
    Future(Future<U, E>),
}

impl<U, E> From<Result<U, E>> for Outcome<U, E> {
    fn from(result: Result<U, E>) -> Self {
        match result {
            Ok(value) => Outcome::Value(value),
            Err(error) => Outcome::Throw(error),
        }
    }
}

impl<U, E> From<Future<U, E>> for Outcome<U, E> {
    fn from(future: Future<U, E>) -> Self {
        Outcome::Future(future)
    }
}

impl<U: Debug, E: Debug> Debug for Outcome<U, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Outcome::Throw(error) => f.debug_tuple("Throw").field(error).finish(),
            Outcome::Future(future) => f.debug_tuple("Future").field(future).finish(),
        }
    }
}

impl<U: Clone + 'static, E: Clone + Debug + 'static> Outcome<U, E> {
    /// Terminal handling for `done()`: a throw, or a nested future that
    /// eventually rejects, goes to the diagnostic channel.
    pub(crate) fn finish(self) {
        match self {
            Outcome::Value(_) => {}
            Outcome::Throw(error) => report_unhandled(&error),
            Outcome::Future(nested) => nested.subscribe(|result| {
                if let Err(error) = result {
                    report_unhandled(&error);
                }
            }),
        }
    }
}
