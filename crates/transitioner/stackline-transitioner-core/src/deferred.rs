//! Single-threaded completion signal returned by lifecycle hooks.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Continuation = Box<dyn FnOnce()>;

enum Slot {
    Pending(Vec<Continuation>),
    Resolved,
}

/// A value that resolves once. Clones share the same signal.
///
/// Continuations registered with `then` run when `resolve` is called, or
/// immediately if the signal already resolved.
#[derive(Clone)]
pub struct Deferred {
    slot: Rc<RefCell<Slot>>,
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

impl Deferred {
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot::Pending(Vec::new()))),
        }
    }

    /// An already-resolved signal.
    pub fn resolved() -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot::Resolved)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.slot.borrow(), Slot::Resolved)
    }

    /// Resolve and run pending continuations in registration order.
    /// Resolving twice is a no-op.
    pub fn resolve(&self) {
        let pending = match std::mem::replace(&mut *self.slot.borrow_mut(), Slot::Resolved) {
            Slot::Pending(continuations) => continuations,
            Slot::Resolved => return,
        };
        for continuation in pending {
            continuation();
        }
    }

    pub fn then(&self, continuation: impl FnOnce() + 'static) {
        {
            let mut slot = self.slot.borrow_mut();
            if let Slot::Pending(continuations) = &mut *slot {
                continuations.push(Box::new(continuation));
                return;
            }
        }
        continuation();
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Run `continuation` after `outcome` resolves, or right away when the hook
/// returned nothing.
pub(crate) fn after(outcome: Option<Deferred>, continuation: impl FnOnce() + 'static) {
    match outcome {
        Some(deferred) => deferred.then(continuation),
        None => continuation(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn continuations_wait_for_resolve() {
        let d = Deferred::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        d.then(move || h.set(h.get() + 1));
        assert_eq!(hits.get(), 0);
        d.resolve();
        assert_eq!(hits.get(), 1);
        d.resolve();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn then_after_resolve_runs_immediately() {
        let d = Deferred::resolved();
        let hit = Rc::new(Cell::new(false));
        let h = hit.clone();
        d.then(move || h.set(true));
        assert!(hit.get());
    }

    #[test]
    fn continuation_may_register_more_work() {
        let d = Deferred::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (d2, o) = (d.clone(), order.clone());
        d.then(move || {
            o.borrow_mut().push(1);
            let o2 = o.clone();
            d2.then(move || o2.borrow_mut().push(2));
        });
        d.resolve();
        assert_eq!(*order.borrow(), vec![1, 2]);
    }
}
