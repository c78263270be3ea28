//! Store module - The runtime for reducers
//!
//! A [`Store`] owns the current state, the current reducer and the listener
//! set. It is a cheap, clonable handle; every clone refers to the same store.

use crate::enhancer::{BoxedEnhancer, Enhancer, StoreCreator};
use crate::error::StoreError;
use crate::listeners::{Listener, ListenerSet};
use crate::observable::Observable;
use crate::StoreConfig;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use unistore_core::{Action, BoxedReducer, Reducer};

/// Create a store from a reducer and optional preloaded state.
///
/// The reducer is immediately called with the reserved `INIT` action so that
/// it can fill in its default state.
///
/// # Errors
///
/// Returns [`StoreError::Reducer`] if the reducer refuses the `INIT` action.
pub fn create_store<S, A, R>(reducer: R, preloaded_state: Option<S>) -> Result<Store<S, A>, StoreError>
where
    S: 'static,
    A: Action + 'static,
    R: Reducer<State = S, Action = A> + 'static,
{
    Store::builder()
        .reducer(reducer)
        .maybe_preloaded_state(preloaded_state)
        .build()
}

/// Create a store through an enhancer.
///
/// The enhancer receives the plain store creator and returns the creator that
/// is actually called with `reducer` and `preloaded_state`.
///
/// # Errors
///
/// Returns whatever the enhanced creator returns; with the plain creator
/// underneath, a [`StoreError::Reducer`] for a refused `INIT` action.
pub fn create_store_with<S, A, R, E>(
    reducer: R,
    preloaded_state: Option<S>,
    enhancer: E,
) -> Result<Store<S, A>, StoreError>
where
    S: 'static,
    A: Action + 'static,
    R: Reducer<State = S, Action = A> + 'static,
    E: Enhancer<S, A> + 'static,
{
    Store::builder()
        .reducer(reducer)
        .maybe_preloaded_state(preloaded_state)
        .enhancer(enhancer)
        .build()
}

struct StoreInner<S, A> {
    config: StoreConfig,
    state: RefCell<Rc<S>>,
    reducer: RefCell<Rc<dyn Reducer<State = S, Action = A>>>,
    listeners: Rc<ListenerSet>,
    is_dispatching: Cell<bool>,
}

/// The Store - owns state and arbitrates every transition
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
///
/// # Example
///
/// ```
/// use unistore_core::{Action, reducer::from_fn};
/// use unistore_runtime::Store;
///
/// #[derive(Debug, Clone)]
/// enum Todo {
///     Init,
///     Add(String),
/// }
///
/// impl Action for Todo {
///     fn init() -> Self {
///         Self::Init
///     }
///     fn is_init(&self) -> bool {
///         matches!(self, Self::Init)
///     }
/// }
///
/// let store = Store::builder()
///     .reducer(from_fn(|todos: Option<&Vec<String>>, action: &Todo| {
///         let mut todos = todos.cloned().unwrap_or_default();
///         if let Todo::Add(text) = action {
///             todos.push(text.clone());
///         }
///         todos
///     }))
///     .build()?;
///
/// store.dispatch(Todo::Add("write tests".into()))?;
/// assert_eq!(store.get_state().as_slice(), ["write tests"]);
/// # Ok::<(), unistore_runtime::StoreError>(())
/// ```
pub struct Store<S, A> {
    inner: Rc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.config.name)
            .field("listeners", &self.inner.listeners.len())
            .field("is_dispatching", &self.inner.is_dispatching.get())
            .finish_non_exhaustive()
    }
}

/// RAII guard for the dispatching flag.
///
/// Clears the flag when dropped, including while unwinding from a panicking
/// reducer, so an aborted transition never leaves the store undispatchable.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl<'a> DispatchGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Result<Self, StoreError> {
        if flag.replace(true) {
            return Err(StoreError::Reentrancy);
        }
        Ok(Self(flag))
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<S, A> Store<S, A>
where
    S: 'static,
    A: Action + 'static,
{
    /// Start building a store
    #[must_use]
    pub fn builder() -> StoreBuilder<S, A> {
        StoreBuilder::new()
    }

    /// The plain store creator handed to enhancers.
    pub(crate) fn creator(config: StoreConfig) -> StoreCreator<S, A> {
        Box::new(move |reducer, preloaded_state| Self::create(config, reducer, preloaded_state))
    }

    fn create(
        config: StoreConfig,
        reducer: BoxedReducer<S, A>,
        preloaded_state: Option<S>,
    ) -> Result<Self, StoreError> {
        let reducer: Rc<dyn Reducer<State = S, Action = A>> = Rc::from(reducer);

        // Bootstrap INIT goes straight to the reducer, outside `dispatch` and
        // its span: no handle exists yet, so there are no listeners to notify
        // and nothing can re-enter. `A::init()` needs no validation.
        let init = A::init();
        let state = reducer.reduce(preloaded_state.as_ref(), &init)?;

        tracing::debug!(
            store = %config.name,
            action = %init.type_name(),
            preloaded = preloaded_state.is_some(),
            "Store created"
        );

        Ok(Self {
            inner: Rc::new(StoreInner {
                config,
                state: RefCell::new(Rc::new(state)),
                reducer: RefCell::new(reducer),
                listeners: Rc::new(ListenerSet::new()),
                is_dispatching: Cell::new(false),
            }),
        })
    }

    /// Current state.
    ///
    /// Inside a running reducer this is the state from before the transition
    /// in progress.
    #[must_use]
    pub fn get_state(&self) -> Rc<S> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Dispatch an action: validate it, run the reducer, store the result and
    /// notify every listener registered when the notification pass starts.
    ///
    /// Returns the action unchanged.
    ///
    /// A panicking listener unwinds out of `dispatch` and skips the listeners
    /// after it; the new state is already in place by then.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidAction`]: the action failed [`Action::validate`]
    /// - [`StoreError::Reentrancy`]: called while a reducer is running
    /// - [`StoreError::Reducer`]: the reducer refused the transition
    ///
    /// In every error case the state is unchanged and no listener is called.
    #[tracing::instrument(
        skip_all,
        name = "store_dispatch",
        fields(store = %self.inner.config.name, action = %action.type_name())
    )]
    pub fn dispatch(&self, action: A) -> Result<A, StoreError> {
        if let Err(error) = action.validate() {
            if self.inner.config.warn_on_rejected {
                tracing::warn!(%error, "Rejected invalid action");
            }
            return Err(error.into());
        }

        let next_state = {
            let _guard = DispatchGuard::acquire(&self.inner.is_dispatching).inspect_err(|_| {
                if self.inner.config.warn_on_rejected {
                    tracing::warn!("Rejected dispatch from inside a reducer");
                }
            })?;

            let reducer = Rc::clone(&self.inner.reducer.borrow());
            let current = self.get_state();
            reducer.reduce(Some(&*current), &action)?
        };

        // Released after the swap so a state's `Drop` may read the store.
        let previous = self.inner.state.replace(Rc::new(next_state));
        drop(previous);

        let listeners = self.inner.listeners.snapshot();
        tracing::trace!(listeners = listeners.len(), "State updated, notifying listeners");

        for listener in listeners.iter() {
            listener();
        }

        Ok(action)
    }

    /// Register a listener called after every successful dispatch.
    ///
    /// A listener added during a notification pass is first called on the
    /// next dispatch. Listeners may dispatch, subscribe and unsubscribe.
    pub fn subscribe<F>(&self, listener: F) -> Unsubscribe
    where
        F: Fn() + 'static,
    {
        let listener: Listener = Rc::new(listener);
        self.inner.listeners.add(Rc::clone(&listener));

        tracing::debug!(
            store = %self.inner.config.name,
            listeners = self.inner.listeners.len(),
            "Listener subscribed"
        );

        Unsubscribe {
            store_name: self.inner.config.name.clone(),
            listeners: Rc::downgrade(&self.inner.listeners),
            listener,
            subscribed: Cell::new(true),
        }
    }

    /// Swap the reducer and re-run `INIT` through it.
    ///
    /// Listeners are kept and are notified of the re-initialised state.
    ///
    /// # Errors
    ///
    /// Returns the error of the `INIT` dispatch. The new reducer stays
    /// installed even when that dispatch fails.
    pub fn replace_reducer<R>(&self, next_reducer: R) -> Result<(), StoreError>
    where
        R: Reducer<State = S, Action = A> + 'static,
    {
        *self.inner.reducer.borrow_mut() = Rc::new(next_reducer);
        tracing::debug!(store = %self.inner.config.name, "Reducer replaced");

        self.dispatch(A::init()).map(drop)
    }

    /// Observable projection of this store.
    #[must_use]
    pub fn observable(&self) -> Observable<S, A> {
        Observable::new(self.clone())
    }

    /// Number of listeners the next dispatch will notify.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Whether a reducer is currently running.
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.inner.is_dispatching.get()
    }

    /// The configuration this store was built with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub(crate) fn downgrade(&self) -> WeakStore<S, A> {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Non-owning store handle for callbacks registered inside the store.
pub(crate) struct WeakStore<S, A> {
    inner: Weak<StoreInner<S, A>>,
}

impl<S, A> WeakStore<S, A> {
    pub(crate) fn upgrade(&self) -> Option<Store<S, A>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Unsubscribe::unsubscribe`].
pub struct Unsubscribe {
    store_name: String,
    listeners: Weak<ListenerSet>,
    listener: Listener,
    subscribed: Cell<bool>,
}

impl Unsubscribe {
    /// Remove the listener from future notification passes.
    ///
    /// Calling it again, or after the store is gone, does nothing. A pass
    /// already in progress still calls the listener if it has not yet done so.
    pub fn unsubscribe(&self) {
        if !self.subscribed.replace(false) {
            return;
        }

        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(&self.listener);
            tracing::debug!(
                store = %self.store_name,
                listeners = listeners.len(),
                "Listener unsubscribed"
            );
        }
    }

    /// Whether [`Unsubscribe::unsubscribe`] has not been called yet.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscribed.get()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("store", &self.store_name)
            .field("subscribed", &self.subscribed.get())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Store`]
///
/// Names the optional parts explicitly, so an enhancer can never be mistaken
/// for preloaded state.
///
/// # Example
///
/// ```
/// use unistore_core::reducer::from_fn;
/// use unistore_runtime::{Store, StoreConfig, StoreError};
/// use serde_json::Value;
///
/// let store = Store::builder()
///     .config(StoreConfig::default().with_name("settings"))
///     .reducer(from_fn(|s: Option<&u32>, _: &Value| s.copied().unwrap_or(0)))
///     .preloaded_state(7)
///     .build()?;
/// assert_eq!(*store.get_state(), 7);
///
/// let missing = Store::<u32, Value>::builder().build();
/// assert!(matches!(missing, Err(StoreError::Configuration(_))));
/// # Ok::<(), StoreError>(())
/// ```
pub struct StoreBuilder<S, A> {
    reducer: Option<BoxedReducer<S, A>>,
    preloaded_state: Option<S>,
    enhancer: Option<BoxedEnhancer<S, A>>,
    config: StoreConfig,
}

impl<S, A> StoreBuilder<S, A>
where
    S: 'static,
    A: Action + 'static,
{
    fn new() -> Self {
        Self {
            reducer: None,
            preloaded_state: None,
            enhancer: None,
            config: StoreConfig::default(),
        }
    }

    /// Set the reducer (required)
    #[must_use]
    pub fn reducer<R>(mut self, reducer: R) -> Self
    where
        R: Reducer<State = S, Action = A> + 'static,
    {
        self.reducer = Some(Box::new(reducer));
        self
    }

    /// Set the state handed to the reducer with the `INIT` action
    #[must_use]
    pub fn preloaded_state(mut self, state: S) -> Self {
        self.preloaded_state = Some(state);
        self
    }

    /// Set or clear the preloaded state
    #[must_use]
    pub fn maybe_preloaded_state(mut self, state: Option<S>) -> Self {
        self.preloaded_state = state;
        self
    }

    /// Set the enhancer wrapping store construction
    ///
    /// A later call replaces an earlier one; use [`crate::compose`] to stack
    /// several.
    #[must_use]
    pub fn enhancer<E>(mut self, enhancer: E) -> Self
    where
        E: Enhancer<S, A> + 'static,
    {
        self.enhancer = Some(crate::enhancer::boxed(enhancer));
        self
    }

    /// Set the store configuration
    #[must_use]
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the store, running the `INIT` action through the reducer.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Configuration`]: no reducer was set
    /// - [`StoreError::Reducer`]: the reducer refused the `INIT` action
    pub fn build(self) -> Result<Store<S, A>, StoreError> {
        let reducer = self.reducer.ok_or_else(|| {
            StoreError::Configuration("expected a reducer, call .reducer(..) before .build()".to_string())
        })?;

        let create = Store::creator(self.config);
        match self.enhancer {
            Some(enhancer) => enhancer(create)(reducer, self.preloaded_state),
            None => create(reducer, self.preloaded_state),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use unistore_core::ReducerError;
    use unistore_core::reducer::{from_fn, try_from_fn};

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Init,
        Increment,
        Fail,
        Panic,
    }

    impl Action for TestAction {
        fn init() -> Self {
            Self::Init
        }

        fn is_init(&self) -> bool {
            matches!(self, Self::Init)
        }
    }

    fn test_reducer() -> impl Reducer<State = i32, Action = TestAction> {
        try_from_fn(|state: Option<&i32>, action: &TestAction| {
            let value = state.copied().unwrap_or(0);
            match action {
                TestAction::Init => Ok(value),
                TestAction::Increment => Ok(value + 1),
                TestAction::Fail => Err(ReducerError::new("refused")),
                TestAction::Panic => panic!("reducer panicked"),
            }
        })
    }

    #[test]
    fn test_store_creation_runs_init() {
        let store = create_store(test_reducer(), None).unwrap();
        assert_eq!(*store.get_state(), 0);

        let store = create_store(test_reducer(), Some(41)).unwrap();
        assert_eq!(*store.get_state(), 41);
    }

    #[test]
    fn test_dispatch_returns_action() {
        let store = create_store(test_reducer(), None).unwrap();
        assert_eq!(store.dispatch(TestAction::Increment).unwrap(), TestAction::Increment);
        assert_eq!(*store.get_state(), 1);
    }

    #[test]
    fn test_reducer_error_leaves_state_and_flag() {
        let store = create_store(test_reducer(), Some(3)).unwrap();

        let error = store.dispatch(TestAction::Fail).unwrap_err();
        assert!(matches!(error, StoreError::Reducer(_)));
        assert_eq!(*store.get_state(), 3);
        assert!(!store.is_dispatching());

        store.dispatch(TestAction::Increment).unwrap();
        assert_eq!(*store.get_state(), 4);
    }

    #[test]
    fn test_reducer_panic_releases_flag() {
        let store = create_store(test_reducer(), Some(3)).unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| store.dispatch(TestAction::Panic)));
        assert!(result.is_err());
        assert!(!store.is_dispatching());
        assert_eq!(*store.get_state(), 3);

        store.dispatch(TestAction::Increment).unwrap();
        assert_eq!(*store.get_state(), 4);
    }

    #[test]
    fn test_init_failure_fails_construction() {
        let reducer = try_from_fn(|_: Option<&i32>, _: &TestAction| Err(ReducerError::new("no default")));
        let result = create_store(reducer, None);
        assert!(matches!(result, Err(StoreError::Reducer(_))));
    }

    #[test]
    fn test_builder_requires_reducer() {
        let result = Store::<i32, TestAction>::builder().preloaded_state(1).build();
        match result {
            Err(StoreError::Configuration(message)) => assert!(message.contains("reducer")),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_builder_applies_config() {
        let store = Store::builder()
            .config(StoreConfig::default().with_name("counter"))
            .reducer(test_reducer())
            .build()
            .unwrap();
        assert_eq!(store.config().name, "counter");
        assert!(format!("{store:?}").contains("counter"));
    }

    #[test]
    fn test_clones_share_state() {
        let store = create_store(test_reducer(), None).unwrap();
        let clone = store.clone();

        clone.dispatch(TestAction::Increment).unwrap();
        assert_eq!(*store.get_state(), 1);
    }

    #[test]
    fn test_get_state_inside_reducer_sees_previous_state() {
        let slot: Rc<RefCell<Option<Store<i32, TestAction>>>> = Rc::new(RefCell::new(None));
        let seen = Rc::new(Cell::new(-1));

        let reducer = {
            let slot = Rc::clone(&slot);
            let seen = Rc::clone(&seen);
            from_fn(move |state: Option<&i32>, action: &TestAction| {
                if let Some(store) = slot.borrow().as_ref() {
                    seen.set(*store.get_state());
                }
                let value = state.copied().unwrap_or(0);
                if matches!(action, TestAction::Increment) { value + 10 } else { value }
            })
        };

        let store = create_store(reducer, Some(5)).unwrap();
        *slot.borrow_mut() = Some(store.clone());

        store.dispatch(TestAction::Increment).unwrap();
        assert_eq!(seen.get(), 5);
        assert_eq!(*store.get_state(), 15);

        slot.borrow_mut().take();
    }

    #[test]
    fn test_unsubscribe_after_store_dropped() {
        let store = create_store(test_reducer(), None).unwrap();
        let unsubscribe = store.subscribe(|| {});
        drop(store);

        unsubscribe.unsubscribe();
        assert!(!unsubscribe.is_subscribed());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let store = create_store(test_reducer(), None).unwrap();
        let first = store.subscribe(|| {});
        let _second = store.subscribe(|| {});
        assert_eq!(store.listener_count(), 2);

        first.unsubscribe();
        first.unsubscribe();
        assert_eq!(store.listener_count(), 1);
        assert!(format!("{first:?}").contains("subscribed: false"));
    }

    type StoreSlot = Rc<RefCell<Option<WeakStore<Tracked, TestAction>>>>;

    /// State that reads the store when it is dropped.
    struct Tracked {
        value: i32,
        store: StoreSlot,
        seen_on_drop: Rc<Cell<Option<i32>>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            if let Some(store) = self.store.borrow().as_ref().and_then(WeakStore::upgrade) {
                self.seen_on_drop.set(Some(store.get_state().value));
            }
        }
    }

    #[test]
    fn test_replaced_state_may_read_store_when_dropped() {
        let slot: StoreSlot = Rc::new(RefCell::new(None));
        let seen_on_drop = Rc::new(Cell::new(None));

        let reducer_slot = Rc::clone(&slot);
        let reducer_seen = Rc::clone(&seen_on_drop);
        let store = create_store(
            from_fn(move |state: Option<&Tracked>, _: &TestAction| Tracked {
                value: state.map_or(0, |s| s.value + 1),
                store: Rc::clone(&reducer_slot),
                seen_on_drop: Rc::clone(&reducer_seen),
            }),
            None,
        )
        .unwrap();
        *slot.borrow_mut() = Some(store.downgrade());

        store.dispatch(TestAction::Increment).unwrap();

        assert_eq!(store.get_state().value, 1);
        assert_eq!(seen_on_drop.get(), Some(1));
    }
}
