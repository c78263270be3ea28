//! # Unistore Testing
//!
//! Testing utilities and helpers for unistore.
//!
//! This crate provides:
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Mocks for listeners and observers that record what they saw
//! - [`init_tracing`] to route store logs into the test output
//!
//! ## Example
//!
//! ```
//! use unistore_core::reducer::from_fn;
//! use unistore_runtime::create_store;
//! use unistore_testing::CallLog;
//! use serde_json::{Value, json};
//!
//! let store = create_store(from_fn(|s: Option<&u8>, _: &Value| s.copied().unwrap_or(0)), None)?;
//! let log = CallLog::new();
//!
//! store.subscribe(log.listener("a"));
//! store.subscribe(log.listener("b"));
//! store.dispatch(json!({ "type": "noop" }))?;
//!
//! assert_eq!(log.calls(), vec!["a", "b"]);
//! # Ok::<(), unistore_runtime::StoreError>(())
//! ```


/// Mock listeners and observers.
pub mod mocks {
    use std::cell::RefCell;
    use std::rc::Rc;
    use unistore_runtime::Observer;

    /// Shared, ordered log of listener calls.
    ///
    /// Clones share the same log, so one `CallLog` can hand out listeners to
    /// several subscriptions and still see the global call order.
    #[derive(Debug, Clone, Default)]
    pub struct CallLog {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl CallLog {
        /// Create an empty log
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// A listener that appends `name` each time it is called.
        #[must_use]
        pub fn listener(&self, name: impl Into<String>) -> impl Fn() + 'static {
            let log = self.clone();
            let name = name.into();
            move || log.record(name.clone())
        }

        /// Append an entry by hand, e.g. from inside a custom listener.
        pub fn record(&self, entry: impl Into<String>) {
            self.calls.borrow_mut().push(entry.into());
        }

        /// All entries so far, oldest first
        #[must_use]
        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        /// How many times `name` was recorded
        #[must_use]
        pub fn count(&self, name: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == name).count()
        }

        /// Forget everything recorded so far
        pub fn clear(&self) {
            self.calls.borrow_mut().clear();
        }
    }

    /// Observer that keeps every state it receives.
    #[derive(Debug)]
    pub struct RecordingObserver<S> {
        values: Rc<RefCell<Vec<S>>>,
    }

    impl<S> Clone for RecordingObserver<S> {
        fn clone(&self) -> Self {
            Self {
                values: Rc::clone(&self.values),
            }
        }
    }

    impl<S> Default for RecordingObserver<S> {
        fn default() -> Self {
            Self {
                values: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl<S: Clone> RecordingObserver<S> {
        /// Create an observer with nothing recorded
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Received states, oldest first
        #[must_use]
        pub fn values(&self) -> Vec<S> {
            self.values.borrow().clone()
        }

        /// Number of states received
        #[must_use]
        pub fn len(&self) -> usize {
            self.values.borrow().len()
        }

        /// Whether nothing has been received yet
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.values.borrow().is_empty()
        }
    }

    impl<S: Clone> Observer<S> for RecordingObserver<S> {
        fn next(&self, state: &S) {
            self.values.borrow_mut().push(state.clone());
        }
    }
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Filtering follows `RUST_LOG`. Safe to call from every test; only the
/// first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{CallLog, RecordingObserver};
pub use reducer_test::ReducerTest;
