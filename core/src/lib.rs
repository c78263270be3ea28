//! # Unistore Core
//!
//! Core traits and types for the unistore state container.
//!
//! A store owns one value of state that only changes when an action is
//! dispatched through a reducer. This crate defines the two caller-supplied
//! pieces of that model; the store itself lives in `unistore-runtime`.
//!
//! ## Core Concepts
//!
//! - **State**: Any caller-defined type, replaced wholesale on every transition
//! - **Action**: A description of an intended change, see [`action::Action`]
//! - **Reducer**: Pure function `(Option<&State>, &Action) → State`
//!
//! ## Example
//!
//! ```
//! use unistore_core::{Action, Reducer, reducer};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum CounterAction {
//!     Init,
//!     Increment,
//! }
//!
//! impl Action for CounterAction {
//!     fn init() -> Self {
//!         Self::Init
//!     }
//!
//!     fn is_init(&self) -> bool {
//!         matches!(self, Self::Init)
//!     }
//! }
//!
//! let counter = reducer::from_fn(|state: Option<&i64>, action: &CounterAction| {
//!     let count = state.copied().unwrap_or_default();
//!     match action {
//!         CounterAction::Increment => count + 1,
//!         CounterAction::Init => count,
//!     }
//! });
//!
//! assert_eq!(counter.reduce(None, &CounterAction::init()).ok(), Some(0));
//! assert_eq!(counter.reduce(Some(&4), &CounterAction::Increment).ok(), Some(5));
//! ```

/// Actions and the reserved `INIT` type
pub mod action;

/// Reducer composition utilities
pub mod composition;

/// Reducer module - The core trait for transition logic
///
/// Reducers are pure functions: `(Option<&State>, &Action) → State`.
/// `None` means the store was created without preloaded state; the reducer
/// is expected to fall back to its own default.
pub mod reducer {
    use std::marker::PhantomData;
    use std::rc::Rc;
    use thiserror::Error;

    /// Error returned by a reducer that refuses a transition.
    ///
    /// The store leaves its state untouched and hands this error back to the
    /// caller of `dispatch`.
    #[derive(Error, Debug)]
    #[error("{message}")]
    pub struct ReducerError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    }

    impl ReducerError {
        /// Create an error with a message
        #[must_use]
        pub fn new(message: impl Into<String>) -> Self {
            Self {
                message: message.into(),
                source: None,
            }
        }

        /// Create an error with a message and an underlying cause
        #[must_use]
        pub fn with_source(
            message: impl Into<String>,
            source: impl std::error::Error + Send + Sync + 'static,
        ) -> Self {
            Self {
                message: message.into(),
                source: Some(Box::new(source)),
            }
        }

        /// The error message
        #[must_use]
        pub fn message(&self) -> &str {
            &self.message
        }
    }

    /// The Reducer trait - pure transition logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer computes
    /// - `Action`: The action type this reducer processes
    ///
    /// # Example
    ///
    /// ```
    /// use unistore_core::reducer::{Reducer, ReducerError};
    ///
    /// struct Balance;
    ///
    /// impl Reducer for Balance {
    ///     type State = u64;
    ///     type Action = i64;
    ///
    ///     fn reduce(&self, state: Option<&u64>, delta: &i64) -> Result<u64, ReducerError> {
    ///         let balance = state.copied().unwrap_or(0);
    ///         balance
    ///             .checked_add_signed(*delta)
    ///             .ok_or_else(|| ReducerError::new("balance would go negative"))
    ///     }
    /// }
    ///
    /// assert_eq!(Balance.reduce(Some(&10), &-4).ok(), Some(6));
    /// assert!(Balance.reduce(Some(&10), &-11).is_err());
    /// ```
    pub trait Reducer {
        /// The state type this reducer computes
        type State;

        /// The action type this reducer processes
        type Action;

        /// Compute the next state from the current one and an action
        ///
        /// Must not mutate anything outside its return value. The store
        /// replaces its state with the returned value.
        ///
        /// # Errors
        ///
        /// Returns [`ReducerError`] to refuse the transition.
        fn reduce(
            &self,
            state: Option<&Self::State>,
            action: &Self::Action,
        ) -> Result<Self::State, ReducerError>;
    }

    /// A type-erased reducer, as stored by the runtime.
    pub type BoxedReducer<S, A> = Box<dyn Reducer<State = S, Action = A>>;

    impl<R: Reducer + ?Sized> Reducer for Box<R> {
        type State = R::State;
        type Action = R::Action;

        fn reduce(
            &self,
            state: Option<&Self::State>,
            action: &Self::Action,
        ) -> Result<Self::State, ReducerError> {
            (**self).reduce(state, action)
        }
    }

    impl<R: Reducer + ?Sized> Reducer for Rc<R> {
        type State = R::State;
        type Action = R::Action;

        fn reduce(
            &self,
            state: Option<&Self::State>,
            action: &Self::Action,
        ) -> Result<Self::State, ReducerError> {
            (**self).reduce(state, action)
        }
    }

    /// Lift an infallible closure into a [`Reducer`].
    pub fn from_fn<S, A, F>(f: F) -> FnReducer<S, A, F>
    where
        F: Fn(Option<&S>, &A) -> S,
    {
        FnReducer {
            f,
            _phantom: PhantomData,
        }
    }

    /// Lift a fallible closure into a [`Reducer`].
    pub fn try_from_fn<S, A, F>(f: F) -> TryFnReducer<S, A, F>
    where
        F: Fn(Option<&S>, &A) -> Result<S, ReducerError>,
    {
        TryFnReducer {
            f,
            _phantom: PhantomData,
        }
    }

    /// A reducer backed by a closure.
    ///
    /// Created by [`from_fn`].
    pub struct FnReducer<S, A, F> {
        f: F,
        _phantom: PhantomData<fn(&S, &A) -> S>,
    }

    impl<S, A, F> Reducer for FnReducer<S, A, F>
    where
        F: Fn(Option<&S>, &A) -> S,
    {
        type State = S;
        type Action = A;

        fn reduce(&self, state: Option<&S>, action: &A) -> Result<S, ReducerError> {
            Ok((self.f)(state, action))
        }
    }

    /// A reducer backed by a fallible closure.
    ///
    /// Created by [`try_from_fn`].
    pub struct TryFnReducer<S, A, F> {
        f: F,
        _phantom: PhantomData<fn(&S, &A) -> S>,
    }

    impl<S, A, F> Reducer for TryFnReducer<S, A, F>
    where
        F: Fn(Option<&S>, &A) -> Result<S, ReducerError>,
    {
        type State = S;
        type Action = A;

        fn reduce(&self, state: Option<&S>, action: &A) -> Result<S, ReducerError> {
            (self.f)(state, action)
        }
    }
}

pub use action::{Action, ActionError, INIT};
pub use reducer::{BoxedReducer, Reducer, ReducerError};
