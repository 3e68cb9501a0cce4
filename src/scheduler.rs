//! Thread-local deferred task queue.
//!
//! Resolution and registration only ever enqueue work here; nothing is
//! delivered until the host drains the queue with [`run_pending`] (the end
//! of its current synchronous unit) or [`run_turn`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::config;

type Task = Box<dyn FnOnce()>;

thread_local! {
    static QUEUE: RefCell<VecDeque<Task>> = RefCell::new(VecDeque::new());
    static DRAINING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the queue as being drained; cleared on drop so a panicking task
/// does not wedge the scheduler.
struct DrainGuard;

impl DrainGuard {
    fn acquire() -> Option<Self> {
        DRAINING.with(|draining| {
            if draining.replace(true) {
                None
            } else {
                Some(DrainGuard)
            }
        })
    }
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        DRAINING.with(|draining| draining.set(false));
    }
}

pub fn schedule(task: impl FnOnce() + 'static) {
    QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        queue.push_back(Box::new(task));
        trace!(queued = queue.len(), "task scheduled");
    });
}

pub fn pending_tasks() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

fn pop() -> Option<Task> {
    QUEUE.with(|queue| queue.borrow_mut().pop_front())
}

/// Runs queued tasks, including the ones they enqueue, until the queue is
/// empty or the configured drain limit is hit. Returns the number of tasks
/// run. Called from inside a running task it does nothing and returns 0.
pub fn run_pending() -> usize {
    let Some(_guard) = DrainGuard::acquire() else {
        return 0;
    };
    let limit = config::current().drain_limit;
    let mut ran = 0;
    loop {
        if limit.is_some_and(|limit| ran >= limit) {
            let left = pending_tasks();
            if left > 0 {
                warn!(ran, left, "drain limit reached, leaving tasks queued");
            }
            break;
        }
        let Some(task) = pop() else {
            break;
        };
        task();
        ran += 1;
    }
    ran
}

/// Runs only the tasks that were queued when the turn started. Tasks they
/// enqueue wait for the next turn.
pub fn run_turn() -> usize {
    let Some(_guard) = DrainGuard::acquire() else {
        return 0;
    };
    let queued = pending_tasks();
    let mut ran = 0;
    while ran < queued {
        let Some(task) = pop() else {
            break;
        };
        task();
        ran += 1;
    }
    ran
}
