//! Futures built from several others.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{Future, Rejection};

/// Accepts with every value, in input order, once all inputs accept. The
/// first rejection rejects the result. Empty input accepts with an empty Vec.
pub fn every<T, E>(futures: impl IntoIterator<Item = Future<T, E>>) -> Future<Vec<T>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let futures: Vec<_> = futures.into_iter().collect();
    Future::new(|resolver| {
        if futures.is_empty() {
            resolver.settle_quietly(Ok(Vec::new()));
            return;
        }
        let slots = Rc::new(RefCell::new(vec![None; futures.len()]));
        let remaining = Rc::new(Cell::new(futures.len()));
        for (index, future) in futures.iter().enumerate() {
            let resolver = resolver.clone();
            let slots = slots.clone();
            let remaining = remaining.clone();
            future.subscribe(move |result| match result {
                Ok(value) => {
                    slots.borrow_mut()[index] = Some(value);
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        let values = slots.borrow_mut().drain(..).flatten().collect();
                        resolver.settle_quietly(Ok(values));
                    }
                }
                Err(error) => resolver.settle_quietly(Err(error)),
            });
        }
    })
}

/// Accepts with the first acceptance. Rejects with every error, in input
/// order, once all inputs reject. Empty input rejects with an empty Vec.
pub fn some<T, E>(futures: impl IntoIterator<Item = Future<T, E>>) -> Future<T, Vec<E>>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let futures: Vec<_> = futures.into_iter().collect();
    Future::new(|resolver| {
        if futures.is_empty() {
            resolver.settle_quietly(Err(Vec::new()));
            return;
        }
        let slots = Rc::new(RefCell::new(vec![None; futures.len()]));
        let remaining = Rc::new(Cell::new(futures.len()));
        for (index, future) in futures.iter().enumerate() {
            let resolver = resolver.clone();
            let slots = slots.clone();
            let remaining = remaining.clone();
            future.subscribe(move |result| match result {
                Ok(value) => resolver.settle_quietly(Ok(value)),
                Err(error) => {
                    slots.borrow_mut()[index] = Some(error);
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        let errors = slots.borrow_mut().drain(..).flatten().collect();
                        resolver.settle_quietly(Err(errors));
                    }
                }
            });
        }
    })
}

/// Adopts whichever input settles first, accepted or rejected. Empty input
/// rejects, since nothing could ever settle it.
pub fn any<T, E>(futures: impl IntoIterator<Item = Future<T, E>>) -> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + From<Rejection> + 'static,
{
    let futures: Vec<_> = futures.into_iter().collect();
    Future::new(|resolver| {
        if futures.is_empty() {
            resolver.settle_quietly(Err(Rejection::from("no futures passed to any()").into()));
            return;
        }
        for future in futures {
            let resolver = resolver.clone();
            future.subscribe(move |result| resolver.settle_quietly(result));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{scheduler, Promise, Resolver, State};

    fn pending<E: Clone + 'static>() -> (Future<i32, E>, Resolver<i32, E>) {
        let mut stash = None;
        let future = Future::new(|resolver| stash = Some(resolver));
        (future, stash.unwrap())
    }

    #[test]
    fn every_keeps_input_order() {
        let (a, resolve_a) = pending::<String>();
        let (b, resolve_b) = pending::<String>();
        let all = every([a, b]);
        resolve_b.accept(2).unwrap();
        scheduler::run_pending();
        assert_eq!(all.state(), State::Pending);
        resolve_a.accept(1).unwrap();
        scheduler::run_pending();
        assert_eq!(all.value(), Some(vec![1, 2]));
    }

    #[test]
    fn every_rejects_on_first_rejection() {
        let (a, resolve_a) = pending::<String>();
        let (b, resolve_b) = pending::<String>();
        let all = every(vec![a, b]);
        resolve_a.reject("a failed".into()).unwrap();
        resolve_b.reject("b failed".into()).unwrap();
        scheduler::run_pending();
        assert_eq!(all.error(), Some("a failed".to_owned()));
    }

    #[test]
    fn every_of_nothing_accepts_empty() {
        let all = every(Vec::<Future<i32, String>>::new());
        assert_eq!(all.value(), Some(vec![]));
    }

    #[test]
    fn some_takes_first_acceptance_or_all_errors() {
        let (a, resolve_a) = pending::<String>();
        let (b, resolve_b) = pending::<String>();
        let first = some([a, b]);
        resolve_a.reject("a".into()).unwrap();
        resolve_b.accept(7).unwrap();
        scheduler::run_pending();
        assert_eq!(first.value(), Some(7));

        let (c, resolve_c) = pending::<String>();
        let (d, resolve_d) = pending::<String>();
        let none = some([c, d]);
        resolve_d.reject("d".into()).unwrap();
        resolve_c.reject("c".into()).unwrap();
        scheduler::run_pending();
        assert_eq!(none.error(), Some(vec!["c".to_owned(), "d".to_owned()]));

        let empty = some(Vec::<Future<i32, String>>::new());
        assert_eq!(empty.error(), Some(vec![]));
    }

    #[test]
    fn any_adopts_first_settlement() {
        let (a, resolve_a) = pending::<Rejection>();
        let (b, resolve_b) = pending::<Rejection>();
        let race = any([a, b]);
        resolve_b.reject("b".into()).unwrap();
        resolve_a.accept(1).unwrap();
        scheduler::run_pending();
        assert_eq!(race.error(), Some(Rejection::from("b")));
    }

    #[test]
    fn any_of_nothing_rejects() {
        let empty = any(Vec::<Future<i32>>::new());
        assert_eq!(empty.state(), State::Rejected);
        assert_eq!(
            empty.error(),
            Some(Rejection::from("no futures passed to any()"))
        );
    }
}
