//! Metrics and tracing for reducer execution.
//!
//! [`Instrumentation`] is an [`Enhancer`]: it wraps the reducer handed to
//! store construction so that every reduction is timed, counted and traced.
//! The store contract is unchanged.
//!
//! Metrics go through the `metrics` facade; install any recorder (for
//! example a Prometheus exporter) in the application to collect them.
//!
//! | metric | kind | labels |
//! |---|---|---|
//! | `unistore_dispatch_total` | counter | `store`, `action` |
//! | `unistore_reducer_errors_total` | counter | `store`, `action` |
//! | `unistore_reducer_duration_seconds` | histogram | `store` |
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use unistore_core::reducer::from_fn;
//! use unistore_runtime::{Instrumentation, create_store_with};
//! use serde_json::{Value, json};
//!
//! unistore_runtime::instrument::describe_metrics();
//!
//! let store = create_store_with(
//!     from_fn(|s: Option<&u64>, _: &Value| s.copied().unwrap_or(0) + 1),
//!     None,
//!     Instrumentation::new("clicks").with_slow_threshold(Duration::from_millis(5)),
//! )?;
//! store.dispatch(json!({ "type": "click" }))?;
//! assert_eq!(*store.get_state(), 2);
//! # Ok::<(), unistore_runtime::StoreError>(())
//! ```

use crate::enhancer::{Enhancer, StoreCreator};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::{Duration, Instant};
use unistore_core::{Action, Reducer, ReducerError};

/// Counter of reductions, successful or not.
pub const DISPATCH_TOTAL: &str = "unistore_dispatch_total";

/// Counter of reductions that returned an error.
pub const REDUCER_ERRORS_TOTAL: &str = "unistore_reducer_errors_total";

/// Histogram of reducer wall time in seconds.
pub const REDUCER_DURATION_SECONDS: &str = "unistore_reducer_duration_seconds";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Total number of actions run through a reducer");
    describe_counter!(
        REDUCER_ERRORS_TOTAL,
        "Total number of actions a reducer refused"
    );
    describe_histogram!(
        REDUCER_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Time spent inside reducers"
    );
}

/// Enhancer that instruments the store's reducer.
#[derive(Debug, Clone)]
pub struct Instrumentation {
    name: String,
    slow_threshold: Option<Duration>,
}

impl Instrumentation {
    /// Instrument a store, labelling its metrics with `name`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slow_threshold: None,
        }
    }

    /// Log a warning for reductions slower than `threshold`
    #[must_use]
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    /// Wrap a reducer directly.
    ///
    /// Use this for reducers installed with `Store::replace_reducer`, which
    /// do not pass through the enhancer again.
    #[must_use]
    pub fn wrap<R>(&self, reducer: R) -> InstrumentedReducer<R> {
        InstrumentedReducer {
            inner: reducer,
            name: self.name.clone(),
            slow_threshold: self.slow_threshold,
        }
    }
}

impl<S, A> Enhancer<S, A> for Instrumentation
where
    S: 'static,
    A: Action + 'static,
{
    fn enhance(self, create: StoreCreator<S, A>) -> StoreCreator<S, A> {
        Box::new(move |reducer, preloaded_state| {
            tracing::debug!(store = %self.name, "Instrumenting reducer");
            create(Box::new(self.wrap(reducer)), preloaded_state)
        })
    }
}

/// A reducer that records metrics around another reducer.
///
/// Created by [`Instrumentation::wrap`].
pub struct InstrumentedReducer<R> {
    inner: R,
    name: String,
    slow_threshold: Option<Duration>,
}

impl<R> Reducer for InstrumentedReducer<R>
where
    R: Reducer,
    R::Action: Action,
{
    type State = R::State;
    type Action = R::Action;

    fn reduce(
        &self,
        state: Option<&Self::State>,
        action: &Self::Action,
    ) -> Result<Self::State, ReducerError> {
        let action_type = action.type_name().into_owned();
        let _span = tracing::trace_span!("reduce", store = %self.name, action = %action_type).entered();

        let started = Instant::now();
        let result = self.inner.reduce(state, action);
        let elapsed = started.elapsed();

        counter!(DISPATCH_TOTAL, "store" => self.name.clone(), "action" => action_type.clone())
            .increment(1);
        histogram!(REDUCER_DURATION_SECONDS, "store" => self.name.clone())
            .record(elapsed.as_secs_f64());

        if let Err(error) = &result {
            counter!(REDUCER_ERRORS_TOTAL, "store" => self.name.clone(), "action" => action_type.clone())
                .increment(1);
            tracing::warn!(%error, action = %action_type, "Reducer refused action");
        }

        if let Some(threshold) = self.slow_threshold {
            if elapsed > threshold {
                tracing::warn!(
                    action = %action_type,
                    elapsed_ms = elapsed.as_millis(),
                    threshold_ms = threshold.as_millis(),
                    "Slow reducer"
                );
            }
        }

        result
    }
}
