//! Copy-on-write listener collections.
//!
//! `current` is what the running notification pass iterates; `next` is what
//! `subscribe`/`unsubscribe` edit. While both point at the same allocation a
//! mutation first forks `next`, so a pass that already took its snapshot
//! never observes the change. Dispatch re-aligns them when it takes the next
//! snapshot.

use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

/// A registered listener. Its `Rc` allocation is its identity.
pub(crate) type Listener = Rc<dyn Fn()>;

/// An immutable, shareable listener sequence.
pub(crate) type Snapshot = Rc<SmallVec<[Listener; 4]>>;

pub(crate) struct ListenerSet {
    current: RefCell<Snapshot>,
    next: RefCell<Snapshot>,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        let empty: Snapshot = Rc::new(SmallVec::new());
        Self {
            current: RefCell::new(Rc::clone(&empty)),
            next: RefCell::new(empty),
        }
    }

    /// Fork `next` away from `current` if they are still the same sequence.
    fn ensure_can_mutate_next(&self) {
        let current = self.current.borrow();
        let mut next = self.next.borrow_mut();
        if Rc::ptr_eq(&current, &next) {
            *next = Rc::new((**current).clone());
        }
    }

    pub(crate) fn add(&self, listener: Listener) {
        self.ensure_can_mutate_next();
        Rc::make_mut(&mut self.next.borrow_mut()).push(listener);
    }

    /// Remove the first registration with the same identity.
    ///
    /// Returns whether a listener was removed.
    pub(crate) fn remove(&self, listener: &Listener) -> bool {
        self.ensure_can_mutate_next();
        let mut next = self.next.borrow_mut();
        let listeners = Rc::make_mut(&mut next);

        match listeners.iter().position(|l| Rc::ptr_eq(l, listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            },
            None => false,
        }
    }

    /// Promote `next` to `current` and return it for iteration.
    pub(crate) fn snapshot(&self) -> Snapshot {
        let next = Rc::clone(&self.next.borrow());
        *self.current.borrow_mut() = Rc::clone(&next);
        next
    }

    /// Number of listeners that the next pass will call.
    pub(crate) fn len(&self) -> usize {
        self.next.borrow().len()
    }
}
