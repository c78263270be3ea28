//! # Unistore Runtime
//!
//! The Store: a single value of state that only changes when an action is
//! dispatched through a reducer, with listeners notified after every
//! successful transition.
//!
//! ## Core Components
//!
//! - **Store**: Owns state, arbitrates transitions, manages listeners
//! - **Observable**: Push-style projection of the store's state
//! - **Enhancer**: Wraps store construction to add cross-cutting behaviour
//! - **Instrumentation**: Enhancer recording tracing spans and metrics
//!
//! Everything runs synchronously on the caller's thread. A store is not
//! `Send`; listeners and reducers may hold clones of it.
//!
//! ## Example
//!
//! ```
//! use unistore_core::reducer::from_fn;
//! use unistore_runtime::create_store;
//! use serde_json::{Value, json};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let counter = from_fn(|state: Option<&i64>, action: &Value| {
//!     let count = state.copied().unwrap_or(0);
//!     match action["type"].as_str() {
//!         Some("increment") => count + 1,
//!         _ => count,
//!     }
//! });
//!
//! let store = create_store(counter, None)?;
//! assert_eq!(*store.get_state(), 0);
//!
//! let notified = Rc::new(Cell::new(0));
//! let seen = Rc::clone(&notified);
//! let unsubscribe = store.subscribe(move || seen.set(seen.get() + 1));
//!
//! store.dispatch(json!({ "type": "increment" }))?;
//! assert_eq!(*store.get_state(), 1);
//! assert_eq!(notified.get(), 1);
//!
//! unsubscribe.unsubscribe();
//! store.dispatch(json!({ "type": "increment" }))?;
//! assert_eq!(notified.get(), 1);
//! # Ok::<(), unistore_runtime::StoreError>(())
//! ```

use serde::{Deserialize, Serialize};

/// Enhancers and enhancer composition
pub mod enhancer;

/// Metrics and tracing for reducers, packaged as an enhancer
pub mod instrument;

/// Observable projection of a store
pub mod observable;

/// The store itself
pub mod store;

mod listeners;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;
    use unistore_core::{ActionError, ReducerError};

    /// Errors that can occur during Store operations
    ///
    /// All of them are surfaced to the caller of the operation that caused
    /// them; the store never retries or swallows a failure.
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// The store could not be built from the supplied parts
        #[error("Invalid store configuration: {0}")]
        Configuration(String),

        /// The dispatched action failed validation
        ///
        /// State is unchanged and no listener was called.
        #[error(transparent)]
        InvalidAction(#[from] ActionError),

        /// `dispatch` was called while a reducer was running
        #[error("Reducers may not dispatch actions.")]
        Reentrancy,

        /// The reducer refused the transition
        ///
        /// State is unchanged and no listener was called.
        #[error(transparent)]
        Reducer(#[from] ReducerError),
    }
}

pub use enhancer::{BoxedEnhancer, Enhancer, StoreCreator, compose};
pub use error::StoreError;
pub use instrument::Instrumentation;
pub use observable::{Observable, Observer, Subscription};
pub use store::{Store, StoreBuilder, Unsubscribe, create_store, create_store_with};

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use unistore_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_name("todos")
///     .with_warn_on_rejected(false);
///
/// assert_eq!(config.name, "todos");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name used in log spans to tell stores apart
    pub name: String,
    /// Log rejected dispatches (invalid actions, reentrancy) at `warn`
    pub warn_on_rejected: bool,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub fn new(name: impl Into<String>, warn_on_rejected: bool) -> Self {
        Self {
            name: name.into(),
            warn_on_rejected,
        }
    }

    /// Set the store name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable or disable warnings for rejected dispatches
    #[must_use]
    pub const fn with_warn_on_rejected(mut self, warn: bool) -> Self {
        self.warn_on_rejected = warn;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            warn_on_rejected: true,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.name, "store");
        assert!(config.warn_on_rejected);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{ "name": "session" }"#).unwrap();
        assert_eq!(config, StoreConfig::new("session", true));

        let config: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StoreError::Reentrancy.to_string(),
            "Reducers may not dispatch actions."
        );

        let reducer_error = StoreError::from(unistore_core::ReducerError::new("boom"));
        assert_eq!(reducer_error.to_string(), "boom");

        let action_error = StoreError::from(unistore_core::ActionError::UndefinedType);
        assert!(matches!(action_error, StoreError::InvalidAction(_)));
    }
}
