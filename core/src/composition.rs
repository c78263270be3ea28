//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`**: Run multiple reducers in sequence over the same state/action
//! - **`scope_reducer`**: Focus a reducer on a subset of state
//!
//! # Examples
//!
//! ## Combining Reducers
//!
//! ```
//! use unistore_core::composition::combine_reducers;
//! use unistore_core::reducer::{BoxedReducer, Reducer, from_fn};
//!
//! #[derive(Clone, Default, Debug, PartialEq)]
//! struct Stats {
//!     total: i64,
//!     events: u32,
//! }
//!
//! let sum = from_fn(|state: Option<&Stats>, n: &i64| {
//!     let mut next = state.cloned().unwrap_or_default();
//!     next.total += n;
//!     next
//! });
//! let count = from_fn(|state: Option<&Stats>, _n: &i64| {
//!     let mut next = state.cloned().unwrap_or_default();
//!     next.events += 1;
//!     next
//! });
//!
//! let reducers: Vec<BoxedReducer<Stats, i64>> = vec![Box::new(sum), Box::new(count)];
//! let combined = combine_reducers(reducers);
//! let stats = combined.reduce(None, &5).ok();
//! assert_eq!(stats, Some(Stats { total: 5, events: 1 }));
//! ```

use crate::reducer::{BoxedReducer, Reducer, ReducerError};
use smallvec::SmallVec;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Reducers run in order. The first sees the store's state; every later one
/// sees the state returned by its predecessor. The first error stops the
/// chain and is returned unchanged.
#[must_use]
pub fn combine_reducers<S, A>(reducers: Vec<BoxedReducer<S, A>>) -> CombinedReducer<S, A> {
    CombinedReducer {
        reducers: reducers.into_iter().collect(),
    }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A> {
    reducers: SmallVec<[BoxedReducer<S, A>; 4]>,
}

impl<S, A> CombinedReducer<S, A> {
    /// Number of reducers in the chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether the chain has no reducers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A> Reducer for CombinedReducer<S, A> {
    type State = S;
    type Action = A;

    fn reduce(&self, state: Option<&S>, action: &A) -> Result<S, ReducerError> {
        let mut reducers = self.reducers.iter();
        let Some(first) = reducers.next() else {
            return Err(ReducerError::new("combine_reducers needs at least one reducer"));
        };

        let mut next = first.reduce(state, action)?;
        for reducer in reducers {
            next = reducer.reduce(Some(&next), action)?;
        }

        Ok(next)
    }
}

/// Scopes a reducer to operate on a subset of a larger state.
///
/// When the parent state is unset, the child reducer also receives `None`
/// and its result is written into `S::default()`.
///
/// # Examples
///
/// ```
/// use unistore_core::composition::scope_reducer;
/// use unistore_core::reducer::{Reducer, from_fn};
///
/// #[derive(Clone, Default)]
/// struct AppState {
///     clicks: u32,
///     title: String,
/// }
///
/// let clicks = from_fn(|clicks: Option<&u32>, _: &()| clicks.copied().unwrap_or(0) + 1);
///
/// let scoped = scope_reducer(
///     clicks,
///     |app: &AppState| &app.clicks,
///     |app: &mut AppState, clicks| app.clicks = clicks,
/// );
///
/// let app = AppState { clicks: 2, title: "demo".into() };
/// let next = scoped.reduce(Some(&app), &()).ok().map(|s| (s.clicks, s.title));
/// assert_eq!(next, Some((3, "demo".to_string())));
/// ```
pub fn scope_reducer<S, SubS, A, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
) -> ScopedReducer<S, SubS, A, R>
where
    S: Clone + Default,
    R: Reducer<State = SubS, Action = A>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        _phantom: std::marker::PhantomData,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, R>
where
    R: Reducer<State = SubS, Action = A>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    _phantom: std::marker::PhantomData<fn(&A)>,
}

impl<S, SubS, A, R> Reducer for ScopedReducer<S, SubS, A, R>
where
    S: Clone + Default,
    R: Reducer<State = SubS, Action = A>,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: Option<&S>, action: &A) -> Result<S, ReducerError> {
        let sub_state = self.reducer.reduce(state.map(self.get_state), action)?;

        let mut next = state.cloned().unwrap_or_default();
        (self.set_state)(&mut next, sub_state);

        Ok(next)
    }
}
