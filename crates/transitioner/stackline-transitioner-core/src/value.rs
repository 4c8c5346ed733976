//! Observable animated scalar.
//!
//! `AnimatedValue` is the write capability and stays with its owner (the
//! transitioner, or a host animator acting for it). Renderers and the
//! pointer-events gate receive an `AnimatedValueReader`, which can read and
//! subscribe but never write.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Token returned by `add_listener`, used to unsubscribe.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

type Listener = Rc<dyn Fn(f64)>;

struct ValueCell {
    value: f64,
    next_listener: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl ValueCell {
    fn add(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener = self.next_listener.wrapping_add(1);
        self.listeners.push((id, listener));
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }
}

/// Mutable scalar with change notification.
pub struct AnimatedValue {
    cell: Rc<RefCell<ValueCell>>,
}

impl AnimatedValue {
    pub fn new(value: f64) -> Self {
        Self {
            cell: Rc::new(RefCell::new(ValueCell {
                value,
                next_listener: 0,
                listeners: Vec::new(),
            })),
        }
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.cell.borrow().value
    }

    /// Set the value and notify every listener with it.
    ///
    /// Listeners run after the internal borrow is released, so they may read
    /// the value or (un)subscribe.
    pub fn set_value(&self, value: f64) {
        let listeners: Vec<Listener> = {
            let mut cell = self.cell.borrow_mut();
            cell.value = value;
            cell.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener(value);
        }
    }

    pub fn add_listener(&self, listener: impl Fn(f64) + 'static) -> ListenerId {
        self.cell.borrow_mut().add(Rc::new(listener))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.cell.borrow_mut().remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.cell.borrow().listeners.len()
    }

    /// Read-only handle onto the same value.
    pub fn reader(&self) -> AnimatedValueReader {
        AnimatedValueReader {
            cell: self.cell.clone(),
        }
    }

    /// True when both handles refer to the same underlying value.
    pub fn same_value(&self, other: &AnimatedValue) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Second write handle onto the same value. Only for the value's owner and
    /// the host animator it delegates to.
    pub(crate) fn share(&self) -> AnimatedValue {
        AnimatedValue {
            cell: self.cell.clone(),
        }
    }
}

impl fmt::Debug for AnimatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self.cell.borrow();
        f.debug_struct("AnimatedValue")
            .field("value", &cell.value)
            .field("listeners", &cell.listeners.len())
            .finish()
    }
}

/// Read-and-subscribe view of an `AnimatedValue`.
#[derive(Clone)]
pub struct AnimatedValueReader {
    cell: Rc<RefCell<ValueCell>>,
}

impl AnimatedValueReader {
    #[inline]
    pub fn get(&self) -> f64 {
        self.cell.borrow().value
    }

    pub fn add_listener(&self, listener: impl Fn(f64) + 'static) -> ListenerId {
        self.cell.borrow_mut().add(Rc::new(listener))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.cell.borrow_mut().remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.cell.borrow().listeners.len()
    }

    pub fn reads(&self, value: &AnimatedValue) -> bool {
        Rc::ptr_eq(&self.cell, &value.cell)
    }
}

impl fmt::Debug for AnimatedValueReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnimatedValueReader")
            .field(&self.cell.borrow().value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn listeners_see_every_set() {
        let value = AnimatedValue::new(0.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = value.add_listener(move |v| sink.borrow_mut().push(v));

        value.set_value(0.5);
        value.set_value(1.0);
        assert_eq!(*seen.borrow(), vec![0.5, 1.0]);

        assert!(value.remove_listener(id));
        assert!(!value.remove_listener(id));
        value.set_value(2.0);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(value.get(), 2.0);
    }

    #[test]
    fn reader_shares_the_value() {
        let value = AnimatedValue::new(1.0);
        let reader = value.reader();
        assert!(reader.reads(&value));
        value.set_value(3.0);
        assert_eq!(reader.get(), 3.0);

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = reader.add_listener(move |_| h.set(h.get() + 1));
        assert_eq!(value.listener_count(), 1);
        value.set_value(4.0);
        assert_eq!(hits.get(), 1);
        assert!(reader.remove_listener(id));
        assert_eq!(value.listener_count(), 0);
    }

    #[test]
    fn listener_may_read_and_unsubscribe_during_notification() {
        let value = AnimatedValue::new(0.0);
        let reader = value.reader();
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let observed = Rc::new(Cell::new(0.0));
        let (r, s, o) = (reader.clone(), slot.clone(), observed.clone());
        let id = reader.add_listener(move |_| {
            o.set(r.get());
            if let Some(id) = s.take() {
                r.remove_listener(id);
            }
        });
        slot.set(Some(id));
        value.set_value(7.0);
        assert_eq!(observed.get(), 7.0);
        assert_eq!(value.listener_count(), 0);
    }
}
