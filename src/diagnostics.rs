//! Diagnostic channel for rejections that reach the end of a chain unobserved.
//!
//! By default a report is a `tracing::error!` event. A thread-local hook can
//! replace it, the same way `std::panic::set_hook` replaces the panic message.
//! Under `UnhandledPolicy::Panic` the report is followed by a panic raised
//! from a separate scheduler task, unwinding out of `scheduler::run_pending`.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use tracing::error;

use crate::config::{self, UnhandledPolicy};
use crate::scheduler;

/// A rejection nobody handled, rendered with `Debug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unhandled {
    pub error: String,
}

pub type Hook = Rc<dyn Fn(&Unhandled)>;

thread_local! {
    static HOOK: RefCell<Option<Hook>> = const { RefCell::new(None) };
}

pub fn set_hook(hook: impl Fn(&Unhandled) + 'static) {
    HOOK.with(|slot| *slot.borrow_mut() = Some(Rc::new(hook)));
}

/// Removes the custom hook, restoring the `tracing` default.
pub fn take_hook() -> Option<Hook> {
    HOOK.with(|slot| slot.borrow_mut().take())
}

pub(crate) fn report_unhandled<E: Debug>(rejection: &E) {
    let unhandled = Unhandled {
        error: format!("{rejection:?}"),
    };
    // Cloned out so the hook may replace itself.
    let hook = HOOK.with(|slot| slot.borrow().clone());
    match hook {
        Some(hook) => hook(&unhandled),
        None => error!(error = %unhandled.error, "unhandled rejection at the end of a future chain"),
    }
    // The current delivery pass finishes before the panic task runs.
    if config::current().unhandled == UnhandledPolicy::Panic {
        scheduler::schedule(move || panic!("unhandled rejection: {}", unhandled.error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    #[test]
    fn hook_receives_report() {
        let seen = Rc::new(RefCell::new(vec![]));
        let sink = seen.clone();
        set_hook(move |unhandled| sink.borrow_mut().push(unhandled.clone()));
        report_unhandled(&"boom");
        assert_eq!(
            *seen.borrow(),
            vec![Unhandled {
                error: "\"boom\"".into()
            }]
        );
        assert!(take_hook().is_some());
        assert!(take_hook().is_none());
        report_unhandled(&"falls back to tracing");
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    #[should_panic(expected = "unhandled rejection: 7")]
    fn panic_policy() {
        config::install(Config {
            unhandled: UnhandledPolicy::Panic,
            drain_limit: None,
        });
        set_hook(|_| {});
        report_unhandled(&7);
        assert_eq!(scheduler::pending_tasks(), 1);
        scheduler::run_pending();
    }
}
