//! Push-style projection of a store.
//!
//! An [`Observer`] receives the current state as soon as it subscribes and
//! again after every dispatch. This is a thin adapter over
//! [`Store::subscribe`]; it keeps no state of its own.

use crate::store::{Store, Unsubscribe};
use std::fmt;
use unistore_core::Action;

/// Receives state values from an [`Observable`].
///
/// `next` has an empty default body, so an observer that only exists for its
/// side effects on subscription needs no code at all. Closures taking `&S`
/// are observers.
pub trait Observer<S> {
    /// Called with the store's state.
    fn next(&self, state: &S) {
        let _ = state;
    }
}

impl<S, F> Observer<S> for F
where
    F: Fn(&S),
{
    fn next(&self, state: &S) {
        self(state);
    }
}

/// Observable view of a [`Store`], returned by [`Store::observable`].
///
/// # Example
///
/// ```
/// use unistore_core::reducer::from_fn;
/// use unistore_runtime::create_store;
/// use serde_json::{Value, json};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let store = create_store(
///     from_fn(|s: Option<&u32>, a: &Value| s.copied().unwrap_or(0) + u32::from(a["type"] == "tick")),
///     None,
/// )?;
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// let subscription = store.observable().subscribe(move |n: &u32| sink.borrow_mut().push(*n));
///
/// store.dispatch(json!({ "type": "tick" }))?;
/// subscription.unsubscribe();
/// store.dispatch(json!({ "type": "tick" }))?;
///
/// assert_eq!(*seen.borrow(), vec![0, 1]);
/// # Ok::<(), unistore_runtime::StoreError>(())
/// ```
pub struct Observable<S, A> {
    store: Store<S, A>,
}

impl<S, A> Clone for Observable<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S, A> fmt::Debug for Observable<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").field("store", &self.store).finish()
    }
}

impl<S, A> Observable<S, A>
where
    S: 'static,
    A: Action + 'static,
{
    pub(crate) const fn new(store: Store<S, A>) -> Self {
        Self { store }
    }

    /// Deliver the current state to `observer` now and after every dispatch.
    pub fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<S> + 'static,
    {
        observer.next(&self.store.get_state());

        // Weak handle: the listener lives inside the store it reads from.
        let store = self.store.downgrade();
        let unsubscribe = self.store.subscribe(move || {
            if let Some(store) = store.upgrade() {
                observer.next(&store.get_state());
            }
        });

        Subscription { unsubscribe }
    }

    /// The observable itself, for interop code that asks any value for its
    /// observable view.
    #[must_use]
    pub const fn observable(&self) -> &Self {
        self
    }
}

/// Handle returned by [`Observable::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    unsubscribe: Unsubscribe,
}

impl Subscription {
    /// Stop delivering states. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        self.unsubscribe.unsubscribe();
    }

    /// Whether the observer still receives states.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.unsubscribe.is_subscribed()
    }
}
